use num_complex::Complex32;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for reuse across retunes.
pub struct FftHelper {
    fft: Arc<dyn Fft<f32>>,
    len: usize,
    window: Option<Vec<f32>>,
    scale: f32,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let len = size.max(1);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        Self {
            fft,
            len,
            window: None,
            scale: len as f32,
        }
    }

    /// Same transform with a 4-term Blackman-Harris window applied first.
    /// Power is normalised by the window energy so the noise floor does not move.
    pub fn blackman_harris(size: usize) -> Self {
        let mut helper = Self::new(size);
        let span = (helper.len.max(2) - 1) as f32;
        let window: Vec<f32> = (0..helper.len)
            .map(|n| {
                let x = 2.0 * std::f32::consts::PI * n as f32 / span;
                0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos() - 0.01168 * (3.0 * x).cos()
            })
            .collect();
        let energy: f32 = window.iter().map(|w| w * w).sum();
        helper.scale = (helper.len as f32 * energy).sqrt();
        helper.window = Some(window);
        helper
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn forward(&self, input: &[Complex32]) -> Vec<Complex32> {
        let mut buffer: Vec<Complex32> = match &self.window {
            Some(window) => input.iter().zip(window).map(|(x, &w)| x.scale(w)).collect(),
            None => input.iter().take(self.len).copied().collect(),
        };
        buffer.resize(self.len, Complex32::zero());
        self.fft.process(&mut buffer);
        buffer
    }

    /// Power spectrum in dB, normalised by the transform length and rotated so
    /// the first bin is the most negative frequency offset.
    pub fn power_db(&self, input: &[Complex32]) -> Vec<f32> {
        let spectrum = self.forward(input);
        let scale = self.scale;
        let half = self.len / 2;
        (0..self.len)
            .map(|bin| {
                let magnitude = spectrum[(bin + half) % self.len].norm() / scale;
                20.0 * magnitude.max(1e-12).log10()
            })
            .collect()
    }
}
