//! EMA (Exponential Moving Average) indicator

use crate::indicators::Indicator;

/// Adjusted exponentially weighted mean with `alpha = 2 / (span + 1)`:
/// `y_t = sum((1-alpha)^i * x_{t-i}) / sum((1-alpha)^i)`.
///
/// NaN inputs add no observation but still age the older ones.
#[derive(Debug, Clone)]
pub struct EMA {
    span: usize,
    decay: f64,
    weighted_sum: f64,
    weight_total: f64,
    observations: usize,
}

impl EMA {
    /// Create new EMA indicator
    pub fn new(span: usize) -> Self {
        let span = span.max(1);
        let alpha = 2.0 / (span as f64 + 1.0);
        Self {
            span,
            decay: 1.0 - alpha,
            weighted_sum: 0.0,
            weight_total: 0.0,
            observations: 0,
        }
    }

    /// Get EMA span
    pub fn span(&self) -> usize {
        self.span
    }
}

impl Indicator for EMA {
    type Input = f64;

    fn name(&self) -> &str {
        "EMA"
    }

    fn update(&mut self, value: f64) {
        self.weighted_sum *= self.decay;
        self.weight_total *= self.decay;
        if !value.is_nan() {
            self.weighted_sum += value;
            self.weight_total += 1.0;
            self.observations += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.observations > 0).then(|| self.weighted_sum / self.weight_total)
    }

    fn is_ready(&self) -> bool {
        self.observations >= self.span
    }
}

/// Calculate EMA from a series of values
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    let mut ema = EMA::new(span);
    values
        .iter()
        .map(|&value| {
            ema.update(value);
            ema.value()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_adjusted_weights() {
        let values = calculate_ema(&[1.0, 2.0, 3.0], 3);
        assert!(approx(values[0].unwrap(), 1.0));
        assert!(approx(values[1].unwrap(), 2.5 / 1.5));
        assert!(approx(values[2].unwrap(), 4.25 / 1.75));
    }

    #[test]
    fn test_constant_series_is_flat() {
        let values = calculate_ema(&[7.0; 30], 20);
        assert!(values.iter().all(|v| approx(v.unwrap(), 7.0)));
    }

    #[test]
    fn test_leading_nan_is_undefined() {
        let values = calculate_ema(&[f64::NAN, 4.0], 14);
        assert_eq!(values[0], None);
        assert!(approx(values[1].unwrap(), 4.0));
    }

    #[test]
    fn test_ready_after_full_span() {
        let mut ema = EMA::new(3);
        ema.update(1.0);
        ema.update(1.0);
        assert!(!ema.is_ready());
        ema.update(1.0);
        assert!(ema.is_ready());
        assert_eq!(ema.span(), 3);
    }
}
