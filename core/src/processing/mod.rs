pub mod calibrate;
pub mod detector;

pub use calibrate::{CalibratedThreshold, ThresholdCalibrator};
pub use detector::{Detection, DetectionReport, DetectorBridge};
