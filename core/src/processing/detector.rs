use crate::hardware::{DetectionMessage, ScanPipeline};

/// A candidate signal in absolute frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub frequency_hz: f64,
    pub bandwidth_hz: f64,
}

/// Signals seen during one channel visit. Discarded once the visit is evaluated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionReport {
    pub center_hz: f64,
    pub signals: Vec<Detection>,
}

impl DetectionReport {
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// The widest signal; the earliest one wins a tie.
    pub fn candidate(&self) -> Option<Detection> {
        self.signals.iter().copied().reduce(|best, signal| {
            if signal.bandwidth_hz > best.bandwidth_hz {
                signal
            } else {
                best
            }
        })
    }

    pub fn summary(&self) -> String {
        self.signals
            .iter()
            .map(|s| {
                format!(
                    "{:.3}MHz bw={:.1}k",
                    s.frequency_hz / 1e6,
                    s.bandwidth_hz / 1e3
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Turns raw oracle messages into absolute-frequency detection reports.
#[derive(Debug, Clone, Copy)]
pub struct DetectorBridge {
    min_bandwidth_hz: f64,
}

impl DetectorBridge {
    pub fn new(min_bandwidth_hz: f64) -> Self {
        Self { min_bandwidth_hz }
    }

    pub fn min_bandwidth_hz(&self) -> f64 {
        self.min_bandwidth_hz
    }

    /// Reads the oracle's latest message. The pipeline must already be tuned to
    /// `center_hz` with settle and dwell elapsed.
    pub fn evaluate<P: ScanPipeline>(&self, pipeline: &P, center_hz: f64) -> DetectionReport {
        if pipeline.message_count() == 0 {
            return self.convert(None, center_hz);
        }
        self.convert(pipeline.latest_detection().as_ref(), center_hz)
    }

    pub fn convert(&self, message: Option<&DetectionMessage>, center_hz: f64) -> DetectionReport {
        let signals = message
            .into_iter()
            .flatten()
            .filter(|signal| signal.bandwidth_hz >= self.min_bandwidth_hz)
            .map(|signal| Detection {
                frequency_hz: center_hz + signal.offset_hz,
                bandwidth_hz: signal.bandwidth_hz,
            })
            .collect();
        DetectionReport { center_hz, signals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::OracleSignal;

    #[test]
    fn missing_message_yields_empty_report() {
        let bridge = DetectorBridge::new(4e6);
        let report = bridge.convert(None, 5805e6);
        assert!(report.is_empty());
        assert_eq!(report.candidate(), None);
    }

    #[test]
    fn narrow_signals_are_filtered() {
        let bridge = DetectorBridge::new(4e6);
        let message = vec![
            OracleSignal::new(-1.0e6, 3.99e6),
            OracleSignal::new(0.0, 4.0e6),
            OracleSignal::new(2.0e6, 0.5e6),
        ];
        let report = bridge.convert(Some(&message), 5740e6);
        assert_eq!(report.signals.len(), 1);
        assert!(report
            .signals
            .iter()
            .all(|s| s.bandwidth_hz >= bridge.min_bandwidth_hz()));
        assert_eq!(report.signals[0].frequency_hz, 5740e6);
    }

    #[test]
    fn widest_signal_becomes_candidate() {
        let bridge = DetectorBridge::new(4e6);
        let message = vec![
            OracleSignal::new(0.2e6, 4.2e6),
            OracleSignal::new(0.5e6, 6.0e6),
        ];
        let report = bridge.convert(Some(&message), 5805e6);
        let candidate = report.candidate().unwrap();
        assert_eq!(candidate.frequency_hz, 5805.5e6);
        assert_eq!(candidate.bandwidth_hz, 6.0e6);
        assert_eq!(
            report.summary(),
            "5805.200MHz bw=4200.0k, 5805.500MHz bw=6000.0k"
        );
    }

    #[test]
    fn equal_bandwidth_keeps_first_signal() {
        let bridge = DetectorBridge::new(1e6);
        let message = vec![OracleSignal::new(-1e6, 5e6), OracleSignal::new(1e6, 5e6)];
        let report = bridge.convert(Some(&message), 5800e6);
        assert_eq!(report.candidate().unwrap().frequency_hz, 5799e6);
    }
}
