use crate::hardware::{HardwareSession, RadioBackend, ScanPipeline};
use crate::math::stats::StatsHelper;
use crate::plan::ChannelPlan;
use crate::prelude::{ScanResult, ScanTiming};
use log::debug;
use tokio::time::sleep;

/// Margin added on top of the measured noise floor.
pub const THRESHOLD_OFFSET_DB: f64 = 6.0;

/// Threshold used when no warm-up sample could be taken.
pub const STATIC_THRESHOLD_DB: f64 = -90.0;

/// Detection threshold fixed for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedThreshold {
    pub value_db: f64,
    /// Number of channel medians the value was derived from; zero for the static default.
    pub samples: usize,
}

impl CalibratedThreshold {
    pub fn is_static(&self) -> bool {
        self.samples == 0
    }
}

/// Estimates the ambient noise floor with warm-up sweeps over the channel plan.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdCalibrator {
    sweeps: u32,
    offset_db: f64,
    default_db: f64,
}

impl Default for ThresholdCalibrator {
    fn default() -> Self {
        Self::new(1, THRESHOLD_OFFSET_DB, STATIC_THRESHOLD_DB)
    }
}

impl ThresholdCalibrator {
    pub fn new(sweeps: u32, offset_db: f64, default_db: f64) -> Self {
        Self {
            sweeps,
            offset_db,
            default_db,
        }
    }

    pub fn sweeps(&self) -> u32 {
        self.sweeps
    }

    /// Runs the warm-up sweeps on an open session and derives the threshold.
    pub async fn calibrate<B: RadioBackend>(
        &self,
        session: &mut HardwareSession<B>,
        plan: &ChannelPlan,
        timing: &ScanTiming,
    ) -> ScanResult<CalibratedThreshold> {
        let mut medians = Vec::with_capacity(plan.len() * self.sweeps as usize);
        for _ in 0..self.sweeps {
            for center_hz in plan.iter_hz() {
                session.set_center_frequency(center_hz)?;
                sleep(timing.settle).await;
                sleep(timing.dwell).await;
                let spectrum = session.pipeline()?.latest_spectrum();
                if let Some(median) = StatsHelper::median_f32(&spectrum) {
                    medians.push(median);
                }
            }
        }
        let threshold = self.threshold_from_medians(&medians);
        debug!(
            "warmup threshold={:.2} dB from {} channel medians",
            threshold.value_db, threshold.samples
        );
        Ok(threshold)
    }

    pub fn threshold_from_medians(&self, medians: &[f64]) -> CalibratedThreshold {
        match StatsHelper::median(medians) {
            Some(floor) => CalibratedThreshold {
                value_db: floor + self.offset_db,
                samples: medians.len(),
            },
            None => CalibratedThreshold {
                value_db: self.default_db,
                samples: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{DetectionMessage, Release};
    use crate::prelude::{DriverError, FrontendParams};
    use std::collections::HashMap;

    #[test]
    fn threshold_is_median_plus_offset() {
        let calibrator = ThresholdCalibrator::default();
        let threshold = calibrator.threshold_from_medians(&[-95.0, -93.0, -94.0]);
        assert_eq!(threshold.value_db, -88.0);
        assert_eq!(threshold.samples, 3);
    }

    #[test]
    fn no_samples_falls_back_to_static_default() {
        let threshold = ThresholdCalibrator::default().threshold_from_medians(&[]);
        assert!(threshold.is_static());
        assert_eq!(threshold.value_db, STATIC_THRESHOLD_DB);
    }

    struct FloorBackend {
        floors: HashMap<u64, Vec<f32>>,
    }

    struct FloorPipeline {
        floors: HashMap<u64, Vec<f32>>,
        tuned: u64,
    }

    impl ScanPipeline for FloorPipeline {
        fn set_center_frequency(&mut self, hz: f64) {
            self.tuned = hz as u64;
        }

        fn latest_detection(&self) -> Option<DetectionMessage> {
            None
        }

        fn message_count(&self) -> usize {
            0
        }

        fn latest_spectrum(&self) -> Vec<f32> {
            self.floors.get(&self.tuned).cloned().unwrap_or_default()
        }

        fn stop(&mut self) -> Release {
            Release::Acknowledged
        }
    }

    impl RadioBackend for FloorBackend {
        type Pipeline = FloorPipeline;

        fn open(&mut self, _params: &FrontendParams) -> Result<FloorPipeline, DriverError> {
            Ok(FloorPipeline {
                floors: self.floors.clone(),
                tuned: 0,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn warmup_sweep_skips_empty_channels() {
        let plan = ChannelPlan::new([5740, 5760, 5780, 5800], []).unwrap();
        let floors = HashMap::from([
            (5_740_000_000, vec![-96.0, -95.0, -94.0]),
            (5_760_000_000, vec![-93.0]),
            (5_780_000_000, vec![-94.0, -94.0]),
            (5_800_000_000, Vec::new()),
        ]);
        let params = FrontendParams {
            threshold_db: STATIC_THRESHOLD_DB,
            source_args: String::new(),
            sample_rate: 8e6,
            bandwidth: 8e6,
            gain: 50.0,
            fft_len: 16,
            min_bandwidth_hz: 4e6,
        };
        let timing = ScanTiming::default();
        let mut session = HardwareSession::new(FloorBackend { floors }, params, timing);
        session.open().await.unwrap();

        let started = tokio::time::Instant::now();
        let threshold = ThresholdCalibrator::default()
            .calibrate(&mut session, &plan, &timing)
            .await
            .unwrap();
        assert_eq!(threshold.value_db, -88.0);
        assert_eq!(threshold.samples, 3);
        assert_eq!(started.elapsed(), timing.visit() * 4);
    }
}
