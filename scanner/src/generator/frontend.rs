//! Synthetic stand-in for the RF source and the FFT energy detector.

use crate::generator::profile::{build_block, GeneratorConfig};
use fpvcore::hardware::{DetectionMessage, OracleSignal, RadioBackend, Release, ScanPipeline};
use fpvcore::math::FftHelper;
use fpvcore::prelude::{DriverError, FrontendParams};
use log::debug;
use rand::{rngs::StdRng, SeedableRng};

/// Groups bins whose smoothed power exceeds `threshold_db` into signals.
pub fn detect_signals(
    power_db: &[f32],
    threshold_db: f64,
    smoothing_bins: usize,
    bin_hz: f64,
) -> DetectionMessage {
    let len = power_db.len();
    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0.0f64);
    for &db in power_db {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + 10f64.powf(f64::from(db) / 10.0));
    }

    let half = smoothing_bins.max(1) / 2;
    let above = |bin: usize| {
        let lo = bin.saturating_sub(half);
        let hi = (bin + half + 1).min(len);
        let mean = (prefix[hi] - prefix[lo]) / (hi - lo) as f64;
        10.0 * mean.log10() > threshold_db
    };

    let centre = len as f64 / 2.0;
    let mut signals = Vec::new();
    let mut start = None;
    for bin in 0..=len {
        match (start, bin < len && above(bin)) {
            (None, true) => start = Some(bin),
            (Some(first), false) => {
                let last = bin - 1;
                let mid = (first + last) as f64 / 2.0;
                signals.push(OracleSignal::new(
                    (mid - centre) * bin_hz,
                    (last - first + 1) as f64 * bin_hz,
                ));
                start = None;
            }
            _ => {}
        }
    }
    signals
}

pub struct SyntheticPipeline {
    config: GeneratorConfig,
    params: FrontendParams,
    fft: FftHelper,
    rng: StdRng,
    latest: Option<DetectionMessage>,
    messages: usize,
    spectrum: Vec<f32>,
}

impl ScanPipeline for SyntheticPipeline {
    fn set_center_frequency(&mut self, hz: f64) {
        let block = build_block(
            &self.config,
            &mut self.rng,
            hz,
            self.params.sample_rate,
            self.fft.len(),
        );
        self.spectrum = self.fft.power_db(&block);
        let bin_hz = self.params.sample_rate / self.fft.len() as f64;
        self.latest = Some(detect_signals(
            &self.spectrum,
            self.params.threshold_db,
            self.config.smoothing_bins,
            bin_hz,
        ));
        self.messages += 1;
    }

    fn latest_detection(&self) -> Option<DetectionMessage> {
        self.latest.clone()
    }

    fn message_count(&self) -> usize {
        self.messages
    }

    fn latest_spectrum(&self) -> Vec<f32> {
        self.spectrum.clone()
    }

    fn stop(&mut self) -> Release {
        self.latest = None;
        self.spectrum.clear();
        Release::Acknowledged
    }
}

/// Simulated radio. Can be told to report "device busy" for its first opens.
pub struct SyntheticBackend {
    config: GeneratorConfig,
    busy_remaining: u32,
    opens: u64,
}

impl SyntheticBackend {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            busy_remaining: config.busy_opens,
            config,
            opens: 0,
        }
    }

    #[cfg(test)]
    pub fn opens(&self) -> u64 {
        self.opens
    }
}

impl RadioBackend for SyntheticBackend {
    type Pipeline = SyntheticPipeline;

    fn open(&mut self, params: &FrontendParams) -> Result<SyntheticPipeline, DriverError> {
        if params.fft_len < 2 || params.sample_rate <= 0.0 {
            return Err(DriverError::Configuration(format!(
                "fft_len={} sample_rate={}",
                params.fft_len, params.sample_rate
            )));
        }
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return Err(DriverError::DeviceBusy(format!(
                "{} is held by another process",
                params.source_args
            )));
        }
        self.opens += 1;
        debug!(
            "synthetic front-end open #{} ({}) rate={} bw={} gain={}",
            self.opens, params.source_args, params.sample_rate, params.bandwidth, params.gain
        );
        Ok(SyntheticPipeline {
            config: self.config.clone(),
            params: params.clone(),
            fft: FftHelper::blackman_harris(params.fft_len),
            rng: StdRng::seed_from_u64(self.config.seed.wrapping_add(self.opens)),
            latest: None,
            messages: 0,
            spectrum: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::EmitterProfile;
    use fpvcore::math::StatsHelper;

    fn params(threshold_db: f64) -> FrontendParams {
        FrontendParams {
            threshold_db,
            source_args: "synthetic".into(),
            sample_rate: 8e6,
            bandwidth: 8e6,
            gain: 50.0,
            fft_len: 4096,
            min_bandwidth_hz: 4e6,
        }
    }

    fn with_emitter() -> GeneratorConfig {
        GeneratorConfig {
            seed: 11,
            emitters: vec![EmitterProfile {
                frequency_mhz: 5805.5,
                bandwidth_mhz: 6.0,
                power_db: -60.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn runs_above_threshold_become_signals() {
        let mut power = vec![-100.0f32; 100];
        for bin in 60..80 {
            power[bin] = -50.0;
        }
        let signals = detect_signals(&power, -90.0, 1, 1000.0);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].bandwidth_hz, 20_000.0);
        assert_eq!(signals[0].offset_hz, 19_500.0);
    }

    #[test]
    fn nothing_before_first_tune() {
        let mut backend = SyntheticBackend::new(with_emitter());
        let pipeline = backend.open(&params(-88.0)).unwrap();
        assert_eq!(pipeline.message_count(), 0);
        assert!(pipeline.latest_detection().is_none());
        assert!(pipeline.latest_spectrum().is_empty());
    }

    #[test]
    fn emitter_in_span_is_detected_near_its_frequency() {
        let mut backend = SyntheticBackend::new(with_emitter());
        let mut pipeline = backend.open(&params(-88.0)).unwrap();
        pipeline.set_center_frequency(5805e6);
        let message = pipeline.latest_detection().unwrap();
        let widest = message
            .iter()
            .copied()
            .reduce(|a, b| if b.bandwidth_hz > a.bandwidth_hz { b } else { a })
            .unwrap();
        assert!((widest.offset_hz - 0.5e6).abs() < 0.2e6, "{:?}", widest);
        assert!(
            (5.5e6..7.0e6).contains(&widest.bandwidth_hz),
            "{:?}",
            widest
        );
    }

    #[test]
    fn quiet_channel_reports_floor_and_no_signal() {
        let mut backend = SyntheticBackend::new(with_emitter());
        let mut pipeline = backend.open(&params(-88.0)).unwrap();
        pipeline.set_center_frequency(5740e6);
        assert_eq!(pipeline.latest_detection(), Some(Vec::new()));
        let median = StatsHelper::median_f32(&pipeline.latest_spectrum()).unwrap();
        assert!((-99.0..-94.0).contains(&median), "median {}", median);
    }

    #[test]
    fn busy_opens_fail_before_device_frees_up() {
        let config = GeneratorConfig {
            busy_opens: 2,
            ..Default::default()
        };
        let mut backend = SyntheticBackend::new(config);
        assert!(matches!(
            backend.open(&params(-90.0)),
            Err(DriverError::DeviceBusy(_))
        ));
        assert!(backend.open(&params(-90.0)).is_err());
        assert!(backend.open(&params(-90.0)).is_ok());
        assert_eq!(backend.opens(), 1);
    }

    #[test]
    fn invalid_parameters_are_configuration_errors() {
        let mut backend = SyntheticBackend::new(GeneratorConfig::default());
        let mut bad = params(-90.0);
        bad.fft_len = 0;
        assert!(matches!(
            backend.open(&bad),
            Err(DriverError::Configuration(_))
        ));
    }
}
