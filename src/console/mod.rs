//! Reading the bridge's human-oriented console.
//!
//! Everything here works on text that has already been through [`scrub`].
//! A piece of console output is classified as noise, a menu screen, a
//! response field or something unrecognised, and the negotiator and bus
//! transactions act on that classification.

mod field;
mod prompt;
mod scrub;

pub use field::{rx_bytes, scan_addresses, tx_nacked};
pub use prompt::{last_prompt, trailing_prompt};
pub use scrub::scrub;

pub(crate) use scrub::is_blank;

use crate::modes::Modes;

/// A console screen that asks for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// `VT100 compatible color mode? (Y/n)`
    ColorQuery,
    /// The `m` menu listing bus modes.
    ModeMenu,
    /// Offer to reuse the mode settings from last time.
    PreviousSettings,
    /// I2C bus speed in kHz.
    SpeedQuery,
    ClockStretchQuery,
    /// Power supply output voltage.
    VoltsQuery,
    /// Power supply current limit.
    CurrentQuery,
    /// Command prompt of the given mode.
    Prompt(Modes),
}

impl Screen {
    const MENUS: [Screen; 7] = [
        Screen::ColorQuery,
        Screen::ModeMenu,
        Screen::PreviousSettings,
        Screen::SpeedQuery,
        Screen::ClockStretchQuery,
        Screen::VoltsQuery,
        Screen::CurrentQuery,
    ];

    fn marker(&self) -> Option<&'static str> {
        match self {
            Screen::ColorQuery => Some("VT100 compatible color mode?"),
            Screen::ModeMenu => Some("Mode selection"),
            Screen::PreviousSettings => Some("Use previous settings?"),
            Screen::SpeedQuery => Some("I2C speed"),
            Screen::ClockStretchQuery => Some("Clock stretching"),
            Screen::VoltsQuery => Some("Volts"),
            Screen::CurrentQuery => Some("Maximum current"),
            Screen::Prompt(_) => None,
        }
    }
}

/// The screen shown last in the scrubbed text, which is what the console is
/// currently waiting on.
pub fn last_screen(scrubbed: &str) -> Option<Screen> {
    let menus = Screen::MENUS.into_iter().filter_map(|screen| {
        let marker = screen.marker()?;
        // `I2C speed: 400 kHz` is a settings summary, not the question.
        scrubbed
            .rmatch_indices(marker)
            .find(|(at, _)| !scrubbed[at + marker.len()..].starts_with(':'))
            .map(|(at, _)| (at, screen))
    });
    let prompt = last_prompt(scrubbed).map(|(at, mode)| (at, Screen::Prompt(mode)));

    menus
        .chain(prompt)
        .max_by_key(|(at, _)| *at)
        .map(|(_, screen)| screen)
}

/// Text the power command prints once the supply is on.
pub(crate) const POWER_ENABLED: &str = "Power supply:Enabled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Only telemetry, escapes and whitespace.
    Noise,
    /// A response field with the bytes it carries.
    ResponseField(Vec<u8>),
    /// A screen waiting for input.
    Screen(Screen),
    Unrecognized,
}

pub fn classify(raw: &str) -> Classification {
    if is_blank(raw) {
        return Classification::Noise;
    }
    let scrubbed = scrub(raw);
    if let Some(bytes) = rx_bytes(&scrubbed) {
        Classification::ResponseField(bytes)
    } else if let Some(screen) = last_screen(&scrubbed) {
        Classification::Screen(screen)
    } else {
        Classification::Unrecognized
    }
}
