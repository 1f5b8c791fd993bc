mod sealed {
    pub trait Sealed {}
}

pub trait ActiveMode: sealed::Sealed {
    fn mode_name() -> &'static str;
}

macro_rules! impl_mode {
    ($mode:ident) => {
        impl sealed::Sealed for $mode {}
        impl ActiveMode for $mode {
            fn mode_name() -> &'static str {
                ::std::stringify!($mode)
            }
        }
    };
}

/// Freshly opened bridge in an unknown console state.
pub struct Unconfigured;
impl_mode!(Unconfigured);

/// Bridge negotiated into I2C mode with the power rail on.
pub struct I2c;
impl_mode!(I2c);

/// Console modes the bridge can report in its prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modes {
    HiZ,
    I2c,
}

impl Modes {
    /// Name as printed in the console prompt, e.g. `I2C` in `I2C>`.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Modes::HiZ => "HiZ",
            Modes::I2c => "I2C",
        }
    }
}

impl std::str::FromStr for Modes {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HiZ" => Ok(Self::HiZ),
            "I2C" => Ok(Self::I2c),
            other => Err(crate::Error::UnknownMode(other.to_owned())),
        }
    }
}
