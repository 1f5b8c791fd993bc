//! Scripted stand-in for a bridge console.
//!
//! Each command line written to the fake is echoed back and answered with
//! the next scripted reply for that command. The last reply for a command
//! repeats once the script for it runs out. Replies are delivered one chunk
//! per poll, which is how partial reads are exercised.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use std::time::Duration;

use crate::config::{Config, Timing};
use crate::modes::I2c;
use crate::session::Port;
use crate::{BusPirate, Error};

pub(crate) fn fast_timing() -> Timing {
    Timing::builder()
        .poll_interval(Duration::from_millis(1))
        .wake_interval(Duration::from_millis(10))
        .prompt_timeout(Duration::from_millis(40))
        .command_timeout(Duration::from_millis(40))
        .build()
}

pub(crate) fn fast_config() -> Config {
    Config::builder().timing(fast_timing()).build()
}

#[derive(Default)]
pub(crate) struct FakeBridge {
    script: HashMap<String, VecDeque<Vec<Vec<u8>>>>,
    pending: VecDeque<Vec<u8>>,
    line: Vec<u8>,
    silent: bool,
    /// Every command line received, in order.
    pub(crate) commands: Vec<String>,
}

impl FakeBridge {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer the next `command` with `reply` in a single chunk.
    pub(crate) fn on(self, command: &str, reply: &str) -> Self {
        self.on_chunks(command, &[reply.as_bytes()])
    }

    /// Answer the next `command` with `chunks`, one per poll.
    pub(crate) fn on_chunks(mut self, command: &str, chunks: &[&[u8]]) -> Self {
        self.script
            .entry(command.to_owned())
            .or_default()
            .push_back(chunks.iter().map(|c| c.to_vec()).collect());
        self
    }

    /// Neither echo nor answer anything.
    pub(crate) fn silent(mut self) -> Self {
        self.go_silent();
        self
    }

    pub(crate) fn go_silent(&mut self) {
        self.silent = true;
        self.pending.clear();
    }

    fn respond(&mut self, command: String) {
        self.commands.push(command.clone());
        if self.silent {
            return;
        }

        let mut echo = command.clone().into_bytes();
        echo.extend_from_slice(b"\r\n");
        self.pending.push_back(echo);

        let Some(replies) = self.script.get_mut(&command) else {
            return;
        };
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        self.pending.extend(reply.into_iter().flatten());
    }
}

impl Read for FakeBridge {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.pending.front_mut() else {
            return Err(io::ErrorKind::TimedOut.into());
        };
        let n = buf.len().min(chunk.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        chunk.drain(..n);
        if chunk.is_empty() {
            self.pending.pop_front();
        }
        Ok(n)
    }
}

impl Write for FakeBridge {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if byte == b'\n' {
                let line = String::from_utf8_lossy(&self.line)
                    .trim_end_matches('\r')
                    .to_owned();
                self.line.clear();
                self.respond(line);
            } else {
                self.line.push(byte);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Port for FakeBridge {
    fn bytes_available(&mut self) -> Result<usize, Error> {
        Ok(self.pending.front().map_or(0, Vec::len))
    }
}

/// Script a bridge that is already at the I2C prompt with power enabled.
pub(crate) fn already_bus_ready(bridge: FakeBridge) -> FakeBridge {
    bridge
        .on("", "I2C> ")
        .on("W", "Power supply\r\nVolts (0.80V-5.00V)\r\nx to exit (3.30) > ")
        .on(
            "3.30",
            "Maximum current (0mA-500mA), <enter> for none\r\nx to exit (none) > ",
        )
        .on(
            "",
            "3.30V requested, closest value: 3.30V\r\nPower supply:Enabled\r\n\
             Vreg output: 3.3V, Vref/Vout pin: 3.3V, Current: 3.8mA\r\n\r\nI2C> ",
        )
}

/// Negotiate `bridge` (scripted on top of [`already_bus_ready`]) into I2C mode.
pub(crate) fn bus_ready(bridge: FakeBridge) -> BusPirate<I2c, FakeBridge> {
    BusPirate::new(already_bus_ready(bridge), fast_config())
        .enter_i2c_mode()
        .expect("scripted negotiation succeeds")
}
