//! I2C transactions as console commands.
//!
//! A write is `[0xEE 0xF4 0x55]`: start, address byte, payload, stop. A read
//! is `[0xEFr:6]`. The console prints the bytes on the bus, `TX:` for what
//! was written and `RX:` for what was read, then shows the prompt again.

use std::fmt::Write as _;

use log::debug;

use crate::console;
use crate::modes::I2c;
use crate::session::{Capture, Port};
use crate::{BusPirate, Error};

fn i2c_read_address(address: u8) -> u8 {
    (address << 1) + 1
}

fn i2c_write_address(address: u8) -> u8 {
    address << 1
}

/// One console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Command(String);

impl Command {
    pub(crate) fn write(address: u8, bytes: &[u8]) -> Self {
        let mut line = format!("[0x{:02X}", i2c_write_address(address));
        for byte in bytes {
            let _ = write!(line, " 0x{byte:02X}");
        }
        line.push(']');
        Self(line)
    }

    pub(crate) fn read(address: u8, count: usize) -> Self {
        Self(format!("[0x{:02X}r:{count}]", i2c_read_address(address)))
    }

    pub(crate) fn scan() -> Self {
        Self(String::from("scan"))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl<P: Port> BusPirate<I2c, P> {
    /// Send `command` and collect its output up to the next prompt.
    fn run(&mut self, command: &Command) -> Result<Capture, Error> {
        let timeout = self.session.timing().command_timeout;
        self.session.transact(
            command.as_str(),
            |text| console::trailing_prompt(text).is_some(),
            timeout,
        )
    }

    fn timeout(&self, command: Command) -> Error {
        Error::Timeout {
            command: command.0,
            after: self.session.timing().command_timeout,
        }
    }

    /// Write `bytes` to the 7-bit `address`.
    pub fn bus_write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error> {
        let command = Command::write(address, bytes);
        let capture = self.run(&command)?;
        if !capture.matched {
            return Err(self.timeout(command));
        }
        if console::tx_nacked(&capture.text) {
            return Err(Error::Nack { command: command.0 });
        }
        Ok(())
    }

    /// Read exactly `count` bytes from the 7-bit `address`.
    pub fn bus_read(&mut self, address: u8, count: usize) -> Result<Vec<u8>, Error> {
        let command = Command::read(address, count);
        let capture = self.run(&command)?;
        let Some(bytes) = console::rx_bytes(&capture.text) else {
            return Err(self.timeout(command));
        };
        if bytes.len() != count {
            return Err(Error::ShortRead {
                expected: count,
                got: bytes.len(),
            });
        }
        debug!("{} -> {bytes:02X?}", command.as_str());
        Ok(bytes)
    }

    /// 7-bit addresses of every device that answers on the bus.
    pub fn scan(&mut self) -> Result<Vec<u8>, Error> {
        let command = Command::scan();
        let capture = self.run(&command)?;
        if !capture.matched {
            return Err(self.timeout(command));
        }
        Ok(console::scan_addresses(&capture.text))
    }
}
