use std::time::Duration;

/// Deadlines and polling cadence for talking to the console.
#[derive(Debug, Clone, bon::Builder)]
pub struct Timing {
    /// Sleep between polls of the byte stream.
    #[builder(default = Duration::from_millis(50))]
    pub(crate) poll_interval: Duration,
    /// How long each wake attempt waits for the console to answer.
    #[builder(default = Duration::from_secs(1))]
    pub(crate) wake_interval: Duration,
    #[builder(default = 5)]
    pub(crate) wake_attempts: usize,
    /// Deadline for each negotiation screen to appear.
    #[builder(default = Duration::from_secs(4))]
    pub(crate) prompt_timeout: Duration,
    /// Deadline for a bus command to print its result.
    #[builder(default = Duration::from_secs(3))]
    pub(crate) command_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Answers for the I2C mode setup screens.
#[derive(Debug, Clone, bon::Builder)]
pub struct ModeConfiguration {
    #[builder(default = 400)]
    speed_khz: u16,
    #[builder(default = false)]
    clock_stretch: bool,
}

impl ModeConfiguration {
    pub(crate) fn speed_answer(&self) -> String {
        self.speed_khz.to_string()
    }

    /// Menu entry: 1 is off, 2 is on.
    pub(crate) fn clock_stretch_answer(&self) -> &'static str {
        if self.clock_stretch {
            "2"
        } else {
            "1"
        }
    }
}

impl Default for ModeConfiguration {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Answers for the power supply screens.
#[derive(Debug, Clone, bon::Builder)]
pub struct PsuConfig {
    #[builder(default = 3_300)]
    millivolts: u32,
    /// Current limit; `None` accepts the bridge's default.
    milliamps: Option<u16>,
}

impl PsuConfig {
    pub fn enable(millivolts: u32, milliamps: u16) -> Self {
        Self {
            millivolts,
            milliamps: Some(milliamps),
        }
    }

    /// Volts with two decimals, e.g. `3.30`.
    pub(crate) fn voltage_answer(&self) -> String {
        format!("{}.{:02}", self.millivolts / 1000, self.millivolts % 1000 / 10)
    }

    /// An empty answer takes the default.
    pub(crate) fn current_answer(&self) -> String {
        self.milliamps.map(|ma| ma.to_string()).unwrap_or_default()
    }
}

impl Default for PsuConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Everything needed to bring a bridge up, supplied once at startup.
#[derive(Debug, Clone, bon::Builder)]
pub struct Config {
    #[builder(default = 115_200)]
    pub(crate) baud_rate: u32,
    #[builder(default)]
    pub(crate) timing: Timing,
    #[builder(default)]
    pub(crate) mode: ModeConfiguration,
    #[builder(default)]
    pub(crate) psu: PsuConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}
