use std::time::Duration;

use crate::negotiate::BridgeState;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The serial port could not be opened or queried.
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// Reading from or writing to the byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bridge stayed silent through every wake attempt.
    #[error("no response from the bridge after {attempts} wake attempts")]
    NoResponse { attempts: usize },

    /// A negotiation step saw a screen it cannot continue from.
    #[error("unexpected response in state {state:?}: {response:?}")]
    UnexpectedResponse {
        state: BridgeState,
        response: String,
    },

    /// Mode selection finished but the bus-ready prompt never showed.
    #[error("bridge failed to enter I2C mode: {response:?}")]
    ModeEntryFailed { response: String },

    /// No response field (or prompt) arrived before the deadline.
    #[error("timed out after {after:?} waiting for a response to {command:?}")]
    Timeout { command: String, after: Duration },

    /// The response field held a different number of bytes than requested.
    #[error("short read: expected exactly {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    /// The bridge reported that the target did not acknowledge a write.
    #[error("target did not acknowledge {command:?}")]
    Nack { command: String },

    #[error("unknown bridge mode {0:?}")]
    UnknownMode(String),
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match self {
            Error::Nack { .. } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            _ => ErrorKind::Other,
        }
    }
}
