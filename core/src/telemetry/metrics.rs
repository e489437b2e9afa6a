use std::sync::Mutex;

/// Counters describing one scanner run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSnapshot {
    pub channels_visited: usize,
    pub sweeps_completed: usize,
    pub detections: usize,
    pub confirmations: usize,
    pub confirmations_skipped: usize,
    pub confirmations_failed: usize,
    pub alerts_published: usize,
    pub publish_failures: usize,
}

pub struct ScanMetrics {
    inner: Mutex<ScanSnapshot>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ScanSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut ScanSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_visit(&self) {
        self.update(|m| m.channels_visited += 1);
    }

    pub fn record_sweep(&self) {
        self.update(|m| m.sweeps_completed += 1);
    }

    pub fn record_detection(&self) {
        self.update(|m| m.detections += 1);
    }

    pub fn record_confirmation(&self) {
        self.update(|m| m.confirmations += 1);
    }

    pub fn record_confirmation_skipped(&self) {
        self.update(|m| m.confirmations_skipped += 1);
    }

    pub fn record_confirmation_failed(&self) {
        self.update(|m| m.confirmations_failed += 1);
    }

    pub fn record_publish(&self, delivered: bool) {
        self.update(|m| {
            if delivered {
                m.alerts_published += 1;
            } else {
                m.publish_failures += 1;
            }
        });
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_outcomes_are_split() {
        let metrics = ScanMetrics::new();
        metrics.record_publish(true);
        metrics.record_publish(false);
        metrics.record_publish(true);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.alerts_published, 2);
        assert_eq!(snapshot.publish_failures, 1);
    }
}
