//! Exclusive radio ownership: the backend/pipeline seams and the session
//! that opens, retunes and releases them.

pub mod session;

use crate::prelude::{DriverError, FrontendParams};

pub use session::{HardwareSession, SessionState};

/// One `(offset, bandwidth)` pair as reported by the detection oracle,
/// relative to the tuned centre frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleSignal {
    pub offset_hz: f64,
    pub bandwidth_hz: f64,
}

impl OracleSignal {
    pub fn new(offset_hz: f64, bandwidth_hz: f64) -> Self {
        Self {
            offset_hz,
            bandwidth_hz,
        }
    }
}

/// A single message emitted by the detection oracle.
pub type DetectionMessage = Vec<OracleSignal>;

/// How a pipeline reported its shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The driver confirmed the device handle is gone; no cooldown needed.
    Acknowledged,
    /// The driver gave no completion signal; the caller must wait out a cooldown.
    Unconfirmed,
}

/// Opens the physical radio together with its detection oracle.
pub trait RadioBackend {
    type Pipeline: ScanPipeline;

    fn open(&mut self, params: &FrontendParams) -> Result<Self::Pipeline, DriverError>;
}

/// A running sample pipeline: tuned source, detection oracle and spectrum probe.
pub trait ScanPipeline {
    fn set_center_frequency(&mut self, hz: f64);

    /// Most recent oracle message, or `None` before the oracle produced anything.
    fn latest_detection(&self) -> Option<DetectionMessage>;

    fn message_count(&self) -> usize;

    /// Latest instantaneous spectrum magnitudes (dB). Empty when no block has
    /// been processed yet.
    fn latest_spectrum(&self) -> Vec<f32>;

    fn stop(&mut self) -> Release;
}
