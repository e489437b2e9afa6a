use anyhow::{bail, Context};
use num_complex::Complex32;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// A simulated video transmitter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EmitterProfile {
    pub frequency_mhz: f64,
    #[serde(default = "default_bandwidth_mhz")]
    pub bandwidth_mhz: f64,
    #[serde(default = "default_power_db")]
    pub power_db: f64,
}

fn default_bandwidth_mhz() -> f64 {
    6.0
}

fn default_power_db() -> f64 {
    -60.0
}

impl FromStr for EmitterProfile {
    type Err = anyhow::Error;

    /// Parses `MHZ[:BW_MHZ[:POWER_DB]]`.
    fn from_str(text: &str) -> anyhow::Result<Self> {
        let mut fields = text.split(':');
        let mut next = |name: &str, default: f64| -> anyhow::Result<f64> {
            match fields.next() {
                Some(value) => value
                    .trim()
                    .parse()
                    .with_context(|| format!("parsing emitter {} from {:?}", name, text)),
                None => Ok(default),
            }
        };
        let frequency_mhz = next("frequency", f64::NAN)?;
        let bandwidth_mhz = next("bandwidth", default_bandwidth_mhz())?;
        let power_db = next("power", default_power_db())?;
        if !frequency_mhz.is_finite() || bandwidth_mhz <= 0.0 {
            bail!("invalid emitter {:?}", text);
        }
        Ok(Self {
            frequency_mhz,
            bandwidth_mhz,
            power_db,
        })
    }
}

/// Configuration for the synthetic RF front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Mean per-bin noise power in dB.
    pub noise_floor_db: f64,
    pub seed: u64,
    /// Opens that fail with "device busy" before the device becomes available.
    pub busy_opens: u32,
    /// Bins averaged before the detector compares against the threshold.
    pub smoothing_bins: usize,
    pub emitters: Vec<EmitterProfile>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            noise_floor_db: -95.0,
            seed: 0,
            busy_opens: 0,
            smoothing_bins: 32,
            emitters: Vec::new(),
        }
    }
}

/// Carrier sweeps per block for each emitter.
const SWEEPS_PER_BLOCK: f64 = 4.0;

/// Builds one block of complex baseband samples for the span around `center_hz`.
///
/// Noise is scaled so the normalised FFT shows `noise_floor_db` per bin; each
/// emitter inside the span is a carrier swept across its bandwidth.
pub fn build_block(
    config: &GeneratorConfig,
    rng: &mut StdRng,
    center_hz: f64,
    sample_rate: f64,
    len: usize,
) -> Vec<Complex32> {
    let noise_variance = len as f64 * 10f64.powf(config.noise_floor_db / 10.0);
    let noise_amplitude = (1.5 * noise_variance).sqrt() as f32;
    let mut samples: Vec<Complex32> = (0..len)
        .map(|_| {
            Complex32::new(
                rng.gen_range(-noise_amplitude..=noise_amplitude),
                rng.gen_range(-noise_amplitude..=noise_amplitude),
            )
        })
        .collect();

    let bin_hz = sample_rate / len as f64;
    for emitter in &config.emitters {
        let offset_hz = emitter.frequency_mhz * 1e6 - center_hz;
        let half_bw = emitter.bandwidth_mhz * 1e6 / 2.0;
        if offset_hz.abs() + half_bw > sample_rate / 2.0 {
            continue;
        }
        let covered_bins = (2.0 * half_bw / bin_hz).max(1.0);
        let amplitude = (covered_bins * 10f64.powf(emitter.power_db / 10.0)).sqrt();
        let start_phase = rng.gen_range(0.0..2.0 * PI);
        let mut phase = start_phase;
        for (n, sample) in samples.iter_mut().enumerate() {
            let sweep = (2.0 * PI * SWEEPS_PER_BLOCK * n as f64 / len as f64).sin();
            let instantaneous_hz = offset_hz + half_bw * sweep;
            *sample += Complex32::from_polar(amplitude as f32, phase as f32);
            phase = (phase + 2.0 * PI * instantaneous_hz / sample_rate) % (2.0 * PI);
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn emitter_parses_with_defaults() {
        let emitter: EmitterProfile = "5805".parse().unwrap();
        assert_eq!(emitter.frequency_mhz, 5805.0);
        assert_eq!(emitter.bandwidth_mhz, 6.0);
        assert_eq!(emitter.power_db, -60.0);

        let emitter: EmitterProfile = "5740.5:4.5:-70".parse().unwrap();
        assert_eq!(emitter.bandwidth_mhz, 4.5);
        assert_eq!(emitter.power_db, -70.0);
    }

    #[test]
    fn emitter_rejects_garbage() {
        assert!("".parse::<EmitterProfile>().is_err());
        assert!("5805:wide".parse::<EmitterProfile>().is_err());
        assert!("5805:0".parse::<EmitterProfile>().is_err());
    }

    #[test]
    fn block_has_requested_length() {
        let config = GeneratorConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let block = build_block(&config, &mut rng, 5805e6, 8e6, 256);
        assert_eq!(block.len(), 256);
    }
}
