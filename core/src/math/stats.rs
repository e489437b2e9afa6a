pub struct StatsHelper;

impl StatsHelper {
    /// Median of the finite values in `samples`; `None` when there are none.
    ///
    /// Even-length inputs average the two middle values.
    pub fn median(samples: &[f64]) -> Option<f64> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    pub fn median_f32(samples: &[f32]) -> Option<f64> {
        let widened: Vec<f64> = samples.iter().map(|&v| f64::from(v)).collect();
        Self::median(&widened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_empty_is_none() {
        assert_eq!(StatsHelper::median(&[]), None);
        assert_eq!(StatsHelper::median(&[f64::NAN]), None);
    }

    #[test]
    fn median_handles_odd_and_even_lengths() {
        assert_eq!(StatsHelper::median(&[-95.0, -93.0, -94.0]), Some(-94.0));
        assert_eq!(StatsHelper::median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn median_skips_non_finite_samples() {
        assert_eq!(StatsHelper::median_f32(&[f32::NEG_INFINITY, 2.0, 4.0]), Some(3.0));
    }
}
