//! OBV (On-Balance-Volume) indicator

use crate::indicators::Indicator;

/// Running volume flow: `+volume` when close rose against the previous
/// close, `-volume` when it fell, nothing when unchanged. The first candle
/// seeds the sum at 0.
#[derive(Debug, Clone, Default)]
pub struct OBV {
    total: Option<f64>,
    prev_close: Option<f64>,
}

impl OBV {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for OBV {
    /// `(close, volume)`
    type Input = (f64, f64);

    fn name(&self) -> &str {
        "OBV"
    }

    fn update(&mut self, (close, volume): (f64, f64)) {
        let flow = match self.prev_close {
            None => 0.0,
            Some(prev) if close > prev => volume,
            Some(prev) if close < prev => -volume,
            Some(_) => 0.0,
        };
        self.total = Some(self.total.unwrap_or(0.0) + flow);
        self.prev_close = Some(close);
    }

    fn value(&self) -> Option<f64> {
        self.total
    }

    fn is_ready(&self) -> bool {
        self.total.is_some()
    }
}

/// Calculate OBV from parallel close and volume slices
pub fn calculate_obv(closes: &[f64], volumes: &[f64]) -> Vec<Option<f64>> {
    let mut obv = OBV::new();
    closes
        .iter()
        .zip(volumes)
        .map(|(&close, &volume)| {
            obv.update((close, volume));
            obv.value()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_running_sum() {
        let closes = [10.0, 11.0, 11.0, 9.0, 12.0];
        let volumes = [5.0, 2.0, 7.0, 3.0, 4.0];
        let values: Vec<f64> = calculate_obv(&closes, &volumes)
            .into_iter()
            .map(|v| v.unwrap())
            .collect();
        assert_eq!(values, vec![0.0, 2.0, 2.0, -1.0, 3.0]);
    }

    #[test]
    fn test_direction_follows_close() {
        let closes: Vec<f64> = (0..50).map(|i| ((i * 13) % 9) as f64).collect();
        let volumes: Vec<f64> = (0..50).map(|i| 1.0 + (i % 4) as f64).collect();
        let values = calculate_obv(&closes, &volumes);
        for i in 1..closes.len() {
            let (prev, cur) = (values[i - 1].unwrap(), values[i].unwrap());
            if closes[i] > closes[i - 1] {
                assert!(cur >= prev);
            } else if closes[i] < closes[i - 1] {
                assert!(cur <= prev);
            } else {
                assert_eq!(cur, prev);
            }
        }
    }
}
