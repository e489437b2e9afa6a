//! Exclusive-access confirmation of energy detections by an external
//! PAL/NTSC classifier.

pub mod breaker;
pub mod engine;
pub mod record;

use std::time::Duration;

pub use breaker::{ConfirmBreaker, DisableReason};
pub use engine::{ClassifierConfig, ConfirmEngine};
pub use record::SignalScores;

/// Why a single confirmation attempt produced no scores.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfirmFailure {
    #[error("classifier timed out after {0:?} with no records")]
    TimedOut(Duration),
    #[error("classifier exited with status {0:?}")]
    ExitStatus(Option<i32>),
    #[error("failed to start classifier: {0}")]
    Spawn(String),
    #[error("failed waiting for classifier: {0}")]
    Wait(String),
}

/// Result of one confirmation request.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Scores(SignalScores),
    Failed(ConfirmFailure),
    Disabled(DisableReason),
}

/// Confirms a candidate frequency. Callers must have released the radio first.
#[allow(async_fn_in_trait)]
pub trait Confirm {
    async fn confirm(&mut self, candidate_hz: f64) -> ConfirmOutcome;
}
