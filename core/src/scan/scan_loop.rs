use crate::confirm::{Confirm, ConfirmOutcome};
use crate::hardware::{HardwareSession, RadioBackend};
use crate::interface::{AlertEvent, AlertPublisher, AlertSink, LocationTracker, TelemetrySource};
use crate::plan::ChannelPlan;
use crate::prelude::{ScanResult, ScanTiming};
use crate::processing::{
    CalibratedThreshold, Detection, DetectionReport, DetectorBridge, ThresholdCalibrator,
};
use crate::scan::state::ScanState;
use crate::telemetry::{ScanMetrics, ScanSnapshot};
use log::{debug, info};
use tokio::time::sleep;

/// Sweeps the channel plan, hands the radio to the confirmer for every
/// detection and publishes alerts. Single-threaded by construction: the radio
/// is never shared between scanning and confirmation.
pub struct ScanLoop<B, C, S, T>
where
    B: RadioBackend,
    C: Confirm,
    S: AlertSink,
    T: TelemetrySource,
{
    plan: ChannelPlan,
    session: HardwareSession<B>,
    bridge: DetectorBridge,
    confirmer: C,
    publisher: Option<AlertPublisher<S>>,
    tracker: LocationTracker<T>,
    timing: ScanTiming,
    threshold: Option<CalibratedThreshold>,
    state: ScanState,
    metrics: ScanMetrics,
}

impl<B, C, S, T> ScanLoop<B, C, S, T>
where
    B: RadioBackend,
    C: Confirm,
    S: AlertSink,
    T: TelemetrySource,
{
    pub fn new(
        plan: ChannelPlan,
        session: HardwareSession<B>,
        confirmer: C,
        tracker: LocationTracker<T>,
        timing: ScanTiming,
    ) -> Self {
        let bridge = DetectorBridge::new(session.params().min_bandwidth_hz);
        Self {
            plan,
            session,
            bridge,
            confirmer,
            publisher: None,
            tracker,
            timing,
            threshold: None,
            state: ScanState::Scanning,
            metrics: ScanMetrics::new(),
        }
    }

    pub fn with_publisher(mut self, publisher: AlertPublisher<S>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn session(&self) -> &HardwareSession<B> {
        &self.session
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self) -> &mut HardwareSession<B> {
        &mut self.session
    }

    pub fn confirmer(&self) -> &C {
        &self.confirmer
    }

    pub fn publisher(&self) -> Option<&AlertPublisher<S>> {
        self.publisher.as_ref()
    }

    pub fn threshold(&self) -> Option<CalibratedThreshold> {
        self.threshold
    }

    pub fn metrics(&self) -> ScanSnapshot {
        self.metrics.snapshot()
    }

    fn transition(&mut self, next: ScanState) {
        debug!("state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Opens the radio and, when `calibrator` is given, runs the warm-up
    /// sweeps and reopens with the calibrated threshold.
    pub async fn start(
        &mut self,
        calibrator: Option<&ThresholdCalibrator>,
    ) -> ScanResult<CalibratedThreshold> {
        self.session.open().await?;
        let threshold = match calibrator.filter(|c| c.sweeps() > 0) {
            Some(calibrator) => {
                let threshold = calibrator
                    .calibrate(&mut self.session, &self.plan, &self.timing)
                    .await?;
                self.session.reopen_with_threshold(threshold.value_db).await?;
                threshold
            }
            None => CalibratedThreshold {
                value_db: self.session.params().threshold_db,
                samples: 0,
            },
        };
        info!(
            "scanning {} channels, threshold {:.2} dB",
            self.plan.len(),
            threshold.value_db
        );
        self.threshold = Some(threshold);
        self.state = ScanState::Scanning;
        Ok(threshold)
    }

    /// Sweeps forever. Only a fatal hardware error ends the loop; cancellation
    /// is done by dropping the future.
    pub async fn run(&mut self) -> ScanResult<()> {
        loop {
            self.sweep().await?;
        }
    }

    /// Visits every channel of the plan once, in plan order.
    pub async fn sweep(&mut self) -> ScanResult<()> {
        let centers: Vec<f64> = self.plan.iter_hz().collect();
        for center_hz in centers {
            self.visit(center_hz).await?;
        }
        self.metrics.record_sweep();
        Ok(())
    }

    pub async fn visit(&mut self, center_hz: f64) -> ScanResult<DetectionReport> {
        self.tracker.poll().await;
        self.session.set_center_frequency(center_hz)?;
        sleep(self.timing.settle).await;
        sleep(self.timing.dwell).await;

        let report = self.bridge.evaluate(self.session.pipeline()?, center_hz);
        self.metrics.record_visit();

        match report.candidate() {
            None => info!("center={:.0}MHz signals: none", center_hz / 1e6),
            Some(candidate) => {
                info!(
                    "center={:.0}MHz signals: {}",
                    center_hz / 1e6,
                    report.summary()
                );
                self.metrics.record_detection();
                self.transition(ScanState::Detected);
                self.handle_candidate(candidate).await?;
            }
        }
        Ok(report)
    }

    async fn handle_candidate(&mut self, candidate: Detection) -> ScanResult<()> {
        let Detection {
            frequency_hz,
            bandwidth_hz,
        } = candidate;
        self.publish(AlertEvent::energy(frequency_hz, bandwidth_hz)).await;

        self.transition(ScanState::ReleasingForConfirm);
        self.session.close();
        self.session.wait_cooldown().await;

        self.transition(ScanState::Confirming);
        let outcome = self.confirmer.confirm(frequency_hz).await;
        match outcome {
            ConfirmOutcome::Disabled(reason) => {
                self.metrics.record_confirmation_skipped();
                info!(
                    "confirm center={:.3}MHz skipped ({})",
                    frequency_hz / 1e6,
                    reason
                );
            }
            ConfirmOutcome::Failed(failure) => {
                self.session.note_external_release();
                self.metrics.record_confirmation_failed();
                info!(
                    "confirm center={:.3}MHz failed: {}",
                    frequency_hz / 1e6,
                    failure
                );
            }
            ConfirmOutcome::Scores(scores) => {
                self.session.note_external_release();
                self.metrics.record_confirmation();
                info!(
                    "confirm center={:.3}MHz pal={:.1} ntsc={:.1}",
                    frequency_hz / 1e6,
                    scores.pal,
                    scores.ntsc
                );
                debug!(
                    "confirm center={:.3}MHz bw={:.3}MHz pal={:.1} ntsc={:.1}",
                    frequency_hz / 1e6,
                    bandwidth_hz / 1e6,
                    scores.pal,
                    scores.ntsc
                );
                self.publish(AlertEvent::confirm(frequency_hz, bandwidth_hz, scores))
                    .await;
            }
        }

        self.transition(ScanState::Reacquiring);
        self.session.open().await?;
        self.transition(ScanState::Scanning);
        Ok(())
    }

    async fn publish(&mut self, event: AlertEvent) {
        let location = self.tracker.latest();
        if let Some(publisher) = self.publisher.as_mut() {
            let delivered = publisher.publish(&event, location).await;
            self.metrics.record_publish(delivered);
        }
    }

    /// Releases the radio and returns the run counters.
    pub fn shutdown(&mut self) -> ScanSnapshot {
        if self.session.close() {
            info!("radio released");
        }
        self.metrics.snapshot()
    }
}
