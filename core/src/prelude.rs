use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::hardware::{RadioBackend, Release, ScanPipeline};

/// Parameters handed to the radio backend every time the pipeline is opened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontendParams {
    pub threshold_db: f64,
    pub source_args: String,
    pub sample_rate: f64,
    pub bandwidth: f64,
    pub gain: f64,
    pub fft_len: usize,
    pub min_bandwidth_hz: f64,
}

impl FrontendParams {
    pub fn with_threshold(&self, threshold_db: f64) -> Self {
        Self {
            threshold_db,
            ..self.clone()
        }
    }
}

/// Per-channel timing budget plus the hand-off delays around the radio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanTiming {
    #[serde(with = "millis")]
    pub settle: Duration,
    #[serde(with = "millis")]
    pub dwell: Duration,
    #[serde(with = "millis")]
    pub cooldown: Duration,
    pub reopen_attempts: u32,
    #[serde(with = "millis")]
    pub reopen_delay: Duration,
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(120),
            dwell: Duration::from_millis(400),
            cooldown: Duration::from_secs(3),
            reopen_attempts: 5,
            reopen_delay: Duration::from_secs(2),
        }
    }
}

impl ScanTiming {
    /// Time a freshly tuned channel needs before its detection output is trusted.
    pub fn visit(&self) -> Duration {
        self.settle + self.dwell
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Errors raised by a radio backend while opening or driving the pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("device busy: {0}")]
    DeviceBusy(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("driver i/o failure: {0}")]
    Io(String),
}

impl DriverError {
    /// Busy and I/O failures may clear once the previous owner lets go of the device.
    pub fn is_transient(&self) -> bool {
        !matches!(self, DriverError::Configuration(_))
    }
}

/// Common error type for the scan/confirm control loop.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("failed to open radio after {attempts} attempts: {last}")]
    HardwareUnavailable { attempts: u32, last: DriverError },
    #[error("radio rejected configuration: {0}")]
    HardwareConfiguration(DriverError),
    #[error("hardware session is not open")]
    SessionClosed,
}

pub type ScanResult<T> = Result<T, ScanError>;
