//! Console negotiation from power-on to a bus-ready I2C prompt.
//!
//! The bridge may come up at the colour-mode question, at the high-impedance
//! prompt, or already in I2C mode, and it may or may not ask each of the
//! mode and power setup questions depending on what it remembers. Each
//! question is a state; a question that is not asked is skipped. States only
//! move forward, so a screen that repeats ends the negotiation.

use log::{debug, info, warn};

use crate::config::{ModeConfiguration, PsuConfig};
use crate::console::{self, Screen, POWER_ENABLED};
use crate::modes::Modes;
use crate::session::{Capture, Port, Session};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BridgeState {
    Boot,
    ColorPromptPending,
    AwaitingModeSelect,
    ModeMenu,
    /// Offer to reuse the previous mode settings.
    SettingsPrompt,
    SpeedPrompt,
    ClockStretchPrompt,
    /// Mode setup answered; the I2C prompt must now show.
    ModeCheck,
    PowerMenu,
    VoltagePrompt,
    CurrentPrompt,
    BusReady,
    NegotiationFailed,
}

const ANSWER_NO: &str = "n";
const MODE_MENU: &str = "m";
/// I2C entry in the mode-selection menu.
const I2C_MODE_ENTRY: &str = "5";
const POWER_ON: &str = "W";

fn shows_prompt(text: &str) -> bool {
    matches!(console::last_screen(text), Some(Screen::Prompt(_)))
}

fn shows_boot_screen(text: &str) -> bool {
    matches!(
        console::last_screen(text),
        Some(Screen::ColorQuery | Screen::Prompt(_))
    )
}

fn shows_mode_menu(text: &str) -> bool {
    console::last_screen(text) == Some(Screen::ModeMenu)
}

fn shows_mode_setup(text: &str) -> bool {
    matches!(
        console::last_screen(text),
        Some(
            Screen::PreviousSettings
                | Screen::SpeedQuery
                | Screen::ClockStretchQuery
                | Screen::Prompt(_)
        )
    )
}

fn shows_power_setup(text: &str) -> bool {
    matches!(
        console::last_screen(text),
        Some(Screen::VoltsQuery | Screen::CurrentQuery | Screen::Prompt(_))
    )
}

pub struct Negotiator<'a, P> {
    session: &'a mut Session<P>,
    mode: &'a ModeConfiguration,
    psu: &'a PsuConfig,
    state: BridgeState,
}

impl<'a, P: Port> Negotiator<'a, P> {
    pub fn new(
        session: &'a mut Session<P>,
        mode: &'a ModeConfiguration,
        psu: &'a PsuConfig,
    ) -> Self {
        Self {
            session,
            mode,
            psu,
            state: BridgeState::Boot,
        }
    }

    /// Drive the console to [`BridgeState::BusReady`].
    ///
    /// Returns the states passed through, starting with `Boot`.
    pub fn run(mut self) -> Result<Vec<BridgeState>, Error> {
        let mut path = vec![self.state];
        while self.state != BridgeState::BusReady {
            let next = self.step().and_then(|next| {
                if next > self.state {
                    Ok(next)
                } else {
                    Err(self.unexpected(String::from("screen repeated")))
                }
            });
            match next {
                Ok(next) => {
                    debug!("{:?} -> {:?}", self.state, next);
                    self.state = next;
                    path.push(next);
                }
                Err(error) => {
                    warn!("negotiation failed in {:?}: {error}", self.state);
                    self.state = BridgeState::NegotiationFailed;
                    return Err(error);
                }
            }
        }
        info!("bridge ready for I2C transactions");
        Ok(path)
    }

    fn step(&mut self) -> Result<BridgeState, Error> {
        use BridgeState::*;

        match self.state {
            Boot => self.wake(),
            ColorPromptPending => {
                let capture = self.answer(ANSWER_NO, shows_prompt)?;
                self.from_prompt(capture.text)
            }
            AwaitingModeSelect => {
                let capture = self.answer(MODE_MENU, shows_mode_menu)?;
                if !capture.matched {
                    return Err(self.unexpected(capture.text));
                }
                Ok(ModeMenu)
            }
            ModeMenu => self.mode_setup(I2C_MODE_ENTRY),
            SettingsPrompt => self.mode_setup(ANSWER_NO),
            SpeedPrompt => self.mode_setup(&self.mode.speed_answer()),
            ClockStretchPrompt => self.mode_setup(self.mode.clock_stretch_answer()),
            ModeCheck => {
                let capture = self.answer("", shows_prompt)?;
                if console::trailing_prompt(&capture.text) != Some(Modes::I2c) {
                    return Err(Error::ModeEntryFailed {
                        response: capture.text,
                    });
                }
                Ok(PowerMenu)
            }
            PowerMenu => self.power_setup(POWER_ON),
            VoltagePrompt => self.power_setup(&self.psu.voltage_answer()),
            CurrentPrompt => self.power_setup(&self.psu.current_answer()),
            BusReady | NegotiationFailed => Ok(self.state),
        }
    }

    /// Send blank lines until the console says anything at all.
    fn wake(&mut self) -> Result<BridgeState, Error> {
        let attempts = self.session.timing().wake_attempts;
        let interval = self.session.timing().wake_interval;

        for attempt in 1..=attempts {
            let capture = self.session.transact("", shows_boot_screen, interval)?;
            if !capture.text.is_empty() {
                if console::last_screen(&capture.text) == Some(Screen::ColorQuery) {
                    return Ok(BridgeState::ColorPromptPending);
                }
                return self.from_prompt(capture.text);
            }
            warn!("no response from the bridge, retrying ({attempt}/{attempts})");
        }
        Err(Error::NoResponse { attempts })
    }

    /// Continue from whichever mode prompt the console is showing.
    fn from_prompt(&self, text: String) -> Result<BridgeState, Error> {
        let Some(Screen::Prompt(mode)) = console::last_screen(&text) else {
            return Err(self.unexpected(text));
        };
        debug!("console at the {}> prompt", mode.name());
        Ok(match mode {
            Modes::I2c => BridgeState::PowerMenu,
            Modes::HiZ => BridgeState::AwaitingModeSelect,
        })
    }

    /// Answer one mode setup screen and move to whichever screen follows.
    fn mode_setup(&mut self, answer: &str) -> Result<BridgeState, Error> {
        let capture = self.answer(answer, shows_mode_setup)?;
        Ok(match console::last_screen(&capture.text) {
            Some(Screen::PreviousSettings) => BridgeState::SettingsPrompt,
            Some(Screen::SpeedQuery) => BridgeState::SpeedPrompt,
            Some(Screen::ClockStretchQuery) => BridgeState::ClockStretchPrompt,
            // Unasked questions use remembered settings.
            _ => BridgeState::ModeCheck,
        })
    }

    /// Answer one power setup screen and move to whichever screen follows.
    fn power_setup(&mut self, answer: &str) -> Result<BridgeState, Error> {
        let capture = self.answer(answer, shows_power_setup)?;
        match console::last_screen(&capture.text) {
            Some(Screen::VoltsQuery) => Ok(BridgeState::VoltagePrompt),
            Some(Screen::CurrentQuery) => Ok(BridgeState::CurrentPrompt),
            _ => {
                if console::trailing_prompt(&capture.text) != Some(Modes::I2c) {
                    return Err(self.unexpected(capture.text));
                }
                if !capture.text.contains(POWER_ENABLED) {
                    warn!("power supply may not have been enabled: {:?}", capture.text);
                }
                Ok(BridgeState::BusReady)
            }
        }
    }

    fn answer(&mut self, answer: &str, done: fn(&str) -> bool) -> Result<Capture, Error> {
        let timeout = self.session.timing().prompt_timeout;
        self.session.transact(answer, done, timeout)
    }

    fn unexpected(&self, response: String) -> Error {
        Error::UnexpectedResponse {
            state: self.state,
            response,
        }
    }
}
