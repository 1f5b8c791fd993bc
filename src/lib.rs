//! Read a BME280 temperature sensor through a Bus Pirate's interactive
//! console.
//!
//! The Bus Pirate is driven through the same text menus a person would use:
//! [`BusPirate::enter_i2c_mode`] negotiates from whatever screen the console
//! is on to the I2C prompt with the power supply enabled, after which the
//! handle implements [`embedded_hal::i2c::I2c`] and can be given to the
//! [`Bme280`] driver.
//!
//! ```no_run
//! use buspirate_bme280::Bme280;
//! use embedded_hal_mock::eh1::delay::StdSleep;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bp = buspirate_bme280::open("/dev/ttyACM0")?.enter_i2c_mode()?;
//! let mut sensor = Bme280::new(bp);
//! sensor.read_calibration()?;
//! println!("{}", sensor.measure(&mut StdSleep::new())?);
//! # Ok(())
//! # }
//! ```

mod buspirate;
mod config;
mod eh_i2c;
mod error;
mod session;
mod transfer;

pub mod bme280;
pub mod console;
pub mod modes;
pub mod negotiate;

#[cfg(test)]
mod fake;

pub use bme280::{Bme280, Bme280Error, Calibration, Temperature};
pub use buspirate::{open, open_with, BusPirate};
pub use config::{Config, ModeConfiguration, PsuConfig, Timing};
pub use error::Error;
pub use negotiate::{BridgeState, Negotiator};
pub use session::{Capture, Port, Session};
