//! Unit tests for signal-engine indicators and features

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use signal_engine::data::Candle;
    use signal_engine::features::{build, forward_return_labels, FeatureTable, FEATURE_COLUMNS};
    use signal_engine::indicators::{calculate_ema, calculate_obv, calculate_rsi, Indicator, EMA, RSI};

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(
                    base + Duration::hours(i as i64),
                    c,
                    c + 0.5,
                    c - 0.5,
                    c,
                    100.0 + i as f64,
                )
            })
            .collect()
    }

    /// Weighted form of the adjusted exponential mean
    fn adjusted_mean(values: &[f64], span: usize) -> f64 {
        let decay = 1.0 - 2.0 / (span as f64 + 1.0);
        let (mut num, mut den) = (0.0, 0.0);
        for (age, value) in values.iter().rev().enumerate() {
            let w = decay.powi(age as i32);
            num += w * value;
            den += w;
        }
        num / den
    }

    #[test]
    fn test_ema_matches_weighted_form() {
        let closes = [10.0, 11.0, 9.5, 12.0, 12.5, 11.0];
        let ema = calculate_ema(&closes, 20);
        for i in 0..closes.len() {
            let expected = adjusted_mean(&closes[..=i], 20);
            assert!((ema[i].unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ema_indicator() {
        let mut ema = EMA::new(50);
        assert!(ema.value().is_none());
        ema.update(42.0);
        assert_eq!(ema.value(), Some(42.0));
        assert!(!ema.is_ready());
    }

    #[test]
    fn test_rsi_bounds() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 37) % 13) as f64 - 6.0).collect();
        let rsi = calculate_rsi(&closes, 14);
        assert!(rsi[0].is_none());
        for value in rsi.iter().skip(1) {
            let v = value.unwrap();
            assert!((0.0..=100.0).contains(&v), "rsi out of range: {}", v);
        }
    }

    #[test]
    fn test_rsi_indicator_rising_series() {
        let mut rsi = RSI::new(14);
        for i in 0..20 {
            rsi.update(100.0 + i as f64);
        }
        assert!(rsi.is_ready());
        assert_eq!(rsi.value(), Some(100.0));
    }

    #[test]
    fn test_obv_follows_close_direction() {
        let obv = calculate_obv(&[10.0, 11.0, 11.0, 10.0], &[5.0, 3.0, 7.0, 2.0]);
        assert_eq!(obv, vec![Some(0.0), Some(3.0), Some(3.0), Some(1.0)]);
    }

    #[test]
    fn test_feature_rows_keep_candle_index() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0]);
        let rows = build(&candles);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3].timestamp, candles[3].timestamp);
        assert_eq!(rows[3].volume, 103.0);
        assert_eq!(rows[3].rsi, Some(100.0));
    }

    #[test]
    fn test_feature_table_layout() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        let table = FeatureTable::from_candles(&candles);
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names().len(), FEATURE_COLUMNS.len());
        assert_eq!(table.column("close").unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_labels_horizon() {
        let candles = candles_from_closes(&[1.0, 2.0, 1.5, 3.0]);
        let labels = forward_return_labels(&candles, 2);
        assert_eq!(&labels[..2], &[1.0, 1.0]);
        assert!(labels[2].is_nan() && labels[3].is_nan());
    }
}
