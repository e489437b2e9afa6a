use std::fmt;

/// Position of the scan loop in the detect/confirm cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    Detected,
    ReleasingForConfirm,
    Confirming,
    Reacquiring,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanState::Scanning => "scanning",
            ScanState::Detected => "detected",
            ScanState::ReleasingForConfirm => "releasing-for-confirm",
            ScanState::Confirming => "confirming",
            ScanState::Reacquiring => "reacquiring",
        };
        f.write_str(name)
    }
}
