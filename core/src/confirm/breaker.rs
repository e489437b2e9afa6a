use log::warn;
use std::fmt;

/// Why confirmation was switched off for the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableReason {
    BinaryNotFound { binary: String },
    UnknownCommand { binary: String, command: String },
}

impl fmt::Display for DisableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisableReason::BinaryNotFound { binary } => write!(f, "{} not found in PATH", binary),
            DisableReason::UnknownCommand { binary, command } => {
                write!(f, "{} {} command not available", binary, command)
            }
        }
    }
}

/// Sticky disable flag. The first reason wins and is never cleared.
#[derive(Debug, Default)]
pub struct ConfirmBreaker {
    reason: Option<DisableReason>,
}

impl ConfirmBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reason(&self) -> Option<&DisableReason> {
        self.reason.as_ref()
    }

    pub fn is_tripped(&self) -> bool {
        self.reason.is_some()
    }

    /// Records `reason` and warns, unless already tripped. Returns whether
    /// this call tripped the breaker.
    pub fn trip(&mut self, reason: DisableReason) -> bool {
        if self.reason.is_some() {
            return false;
        }
        warn!("suscli confirm disabled ({})", reason);
        self.reason = Some(reason);
        true
    }
}
