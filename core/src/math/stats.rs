pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn variance(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let mean = Self::mean(samples);
        samples.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / samples.len() as f64
    }

    pub fn std_dev(samples: &[f64]) -> f64 {
        Self::variance(samples).sqrt()
    }

    /// `(max - min)` of the samples, zero when empty.
    pub fn span(samples: impl IntoIterator<Item = f64>) -> f64 {
        let (min, max) = samples
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min.is_finite() && max.is_finite() {
            max - min
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_yields_zero() {
        assert_eq!(StatsHelper::mean(&[]), 0.0);
        assert_eq!(StatsHelper::variance(&[]), 0.0);
        assert_eq!(StatsHelper::span(Vec::new()), 0.0);
    }

    #[test]
    fn variance_is_population_variance() {
        assert_eq!(StatsHelper::variance(&[1.0, 3.0]), 1.0);
        assert_eq!(StatsHelper::std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
    }

    #[test]
    fn span_handles_single_value() {
        assert_eq!(StatsHelper::span([4.0]), 0.0);
        assert_eq!(StatsHelper::span([0.2, 0.9, 0.5]), 0.9 - 0.2);
    }
}
