//! Scan/confirm control loop for analog FPV video detection.
//!
//! A single radio is shared between two exclusive consumers: the continuous
//! channel sweep and a one-shot external classifier that confirms candidates.
//! The modules here manage that hand-off, calibrate the detection threshold,
//! disable confirmation when the classifier is unusable and build the alerts.

pub mod confirm;
pub mod hardware;
pub mod interface;
pub mod math;
pub mod plan;
pub mod prelude;
pub mod processing;
pub mod scan;
pub mod telemetry;

pub use prelude::{DriverError, FrontendParams, ScanError, ScanResult, ScanTiming};
pub use scan::{ScanLoop, ScanState};
