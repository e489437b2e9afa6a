use crate::generator::GeneratorConfig;
use anyhow::Context;
use fpvcore::confirm::ClassifierConfig;
use fpvcore::interface::ALERT_ID_PREFIX;
use fpvcore::plan::ChannelPlan;
use fpvcore::prelude::{FrontendParams, ScanTiming};
use fpvcore::processing::calibrate::{
    ThresholdCalibrator, STATIC_THRESHOLD_DB, THRESHOLD_OFFSET_DB,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PUBLISH_ENDPOINT: &str = "tcp://127.0.0.1:4226";
pub const DEFAULT_MONITOR_ENDPOINT: &str = "tcp://127.0.0.1:4225";
pub const DEFAULT_PLUTO_URI: &str = "ant.local";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PublishConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub alert_id_prefix: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_PUBLISH_ENDPOINT.into(),
            alert_id_prefix: ALERT_ID_PREFIX.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub endpoint: String,
    pub recv_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MONITOR_ENDPOINT.into(),
            recv_timeout_ms: 50,
        }
    }
}

impl MonitorConfig {
    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }
}

/// Everything fixed at startup: RF parameters, timing, classifier profile and endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub source_args: Option<String>,
    pub pluto_uri: String,
    pub sample_rate: f64,
    pub bandwidth: f64,
    pub gain: f64,
    pub fft_len: usize,
    pub threshold_db: f64,
    pub auto_threshold: bool,
    pub min_bandwidth_hz: f64,
    pub warmup_sweeps: u32,
    pub threshold_offset_db: f64,
    pub extra_mhz: Vec<u32>,
    pub timing: ScanTiming,
    pub classifier: ClassifierConfig,
    pub publish: PublishConfig,
    pub monitor: MonitorConfig,
    pub generator: GeneratorConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source_args: None,
            pluto_uri: DEFAULT_PLUTO_URI.into(),
            sample_rate: 8e6,
            bandwidth: 8e6,
            gain: 50.0,
            fft_len: 4096,
            threshold_db: STATIC_THRESHOLD_DB,
            auto_threshold: false,
            min_bandwidth_hz: 4.0e6,
            warmup_sweeps: 1,
            threshold_offset_db: THRESHOLD_OFFSET_DB,
            extra_mhz: Vec::new(),
            timing: ScanTiming::default(),
            classifier: ClassifierConfig::default(),
            publish: PublishConfig::default(),
            monitor: MonitorConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scan config {}", path_ref.display()))?;
        let config: ScanConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scan config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Radio source arguments; defaults to the Pluto at `pluto_uri` via SoapySDR.
    pub fn resolved_source_args(&self) -> String {
        match &self.source_args {
            Some(args) => args.clone(),
            None => format!("soapy=driver=plutosdr,addr={}", self.pluto_uri),
        }
    }

    pub fn channel_plan(&self) -> ChannelPlan {
        ChannelPlan::standard(&self.extra_mhz)
    }

    pub fn frontend_params(&self) -> FrontendParams {
        FrontendParams {
            threshold_db: self.threshold_db,
            source_args: self.resolved_source_args(),
            sample_rate: self.sample_rate,
            bandwidth: self.bandwidth,
            gain: self.gain,
            fft_len: self.fft_len,
            min_bandwidth_hz: self.min_bandwidth_hz,
        }
    }

    /// Warm-up calibration is skipped in auto-threshold mode or with zero sweeps.
    pub fn calibrator(&self) -> Option<ThresholdCalibrator> {
        if self.auto_threshold || self.warmup_sweeps == 0 {
            return None;
        }
        Some(ThresholdCalibrator::new(
            self.warmup_sweeps,
            self.threshold_offset_db,
            self.threshold_db,
        ))
    }
}
