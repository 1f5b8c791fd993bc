use std::marker::PhantomData;

use log::debug;
use serialport::SerialPort;

use crate::config::Config;
use crate::modes::{ActiveMode, I2c, Unconfigured};
use crate::negotiate::Negotiator;
use crate::session::{Port, Session};
use crate::Error;

/// Handle on a Bus Pirate console, typed by the mode it has been brought to.
pub struct BusPirate<M: ActiveMode, P = Box<dyn SerialPort>> {
    _mode: PhantomData<M>,
    pub(crate) session: Session<P>,
    config: Config,
}

/// Consume $this and return it with the new mode type.
macro_rules! with_mode {
    ($this:ident, $mode:ty) => {{
        let Self {
            _mode,
            session,
            config,
        } = $this;
        BusPirate::<$mode, P> {
            _mode: PhantomData,
            session,
            config,
        }
    }};
}

/// Open the serial port with the default configuration.
pub fn open(address: &str) -> Result<BusPirate<Unconfigured>, Error> {
    open_with(address, Config::default())
}

pub fn open_with(address: &str, config: Config) -> Result<BusPirate<Unconfigured>, Error> {
    let port = serialport::new(address, config.baud_rate)
        .timeout(config.timing.command_timeout)
        .open()?;
    debug!("opened {address} at {} baud", config.baud_rate);
    Ok(BusPirate::new(port, config))
}

impl<M: ActiveMode, P: Port> BusPirate<M, P> {
    pub fn mode_name(&self) -> &'static str {
        M::mode_name()
    }
}

impl<P: Port> BusPirate<Unconfigured, P> {
    /// Wrap an already open byte stream.
    pub fn new(port: P, config: Config) -> Self {
        Self {
            _mode: PhantomData,
            session: Session::new(port, config.timing.clone()),
            config,
        }
    }

    /// Negotiate the console into I2C mode and switch the power rail on.
    ///
    /// Any failure leaves the console in an unknown state, so the handle is
    /// consumed either way.
    pub fn enter_i2c_mode(mut self) -> Result<BusPirate<I2c, P>, Error> {
        let path =
            Negotiator::new(&mut self.session, &self.config.mode, &self.config.psu).run()?;
        debug!("negotiated via {path:?}");
        let bp = with_mode!(self, I2c);
        debug!("bridge now in {} mode", bp.mode_name());
        Ok(bp)
    }
}
