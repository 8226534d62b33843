//! Market data source abstraction

use async_trait::async_trait;
use futures::future::join_all;

use crate::data::{Candle, Timeframe};
use crate::exchange::DataFetchError;

/// Candles (or the failure) for one symbol of a batch fetch
#[derive(Debug)]
pub struct SymbolCandles {
    pub symbol: String,
    pub result: Result<Vec<Candle>, DataFetchError>,
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the newest `limit` candles of `symbol`, ascending by time
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Candle>, DataFetchError>;

    /// Fetch several symbols concurrently and wait for all of them.
    ///
    /// The output has one entry per input symbol, in input order. A failed
    /// symbol carries its own error and does not affect the others.
    async fn fetch_many(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        limit: u32,
    ) -> Vec<SymbolCandles> {
        let tasks = symbols.iter().map(|symbol| async move {
            SymbolCandles {
                symbol: symbol.clone(),
                result: self.fetch(symbol, timeframe, limit).await,
            }
        });
        join_all(tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};

    /// Answers after a per-symbol delay and records completion order
    struct DelayedSource {
        completed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MarketDataSource for DelayedSource {
        async fn fetch(
            &self,
            symbol: &str,
            _timeframe: Timeframe,
            limit: u32,
        ) -> Result<Vec<Candle>, DataFetchError> {
            let delay = match symbol {
                "A" => 60,
                _ => 5,
            };
            sleep(Duration::from_millis(delay)).await;
            self.completed.lock().unwrap().push(symbol.to_string());
            if symbol == "BAD" {
                return Err(DataFetchError::Api {
                    code: 10001,
                    message: "symbol invalid".into(),
                });
            }
            let ts = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
            Ok((0..limit)
                .map(|i| Candle::new(ts, i as f64, i as f64, i as f64, i as f64, 1.0))
                .collect())
        }
    }

    #[tokio::test]
    async fn results_follow_input_order() {
        let source = DelayedSource {
            completed: Mutex::new(Vec::new()),
        };
        let symbols = vec!["A".to_string(), "B".to_string()];
        let results = source.fetch_many(&symbols, Timeframe::H1, 3).await;

        // B finished first, but A still comes first in the output
        assert_eq!(*source.completed.lock().unwrap(), vec!["B", "A"]);
        let order: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
        assert!(results.iter().all(|r| r.result.as_ref().unwrap().len() == 3));
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_symbol() {
        let source = DelayedSource {
            completed: Mutex::new(Vec::new()),
        };
        let symbols = vec!["A".to_string(), "BAD".to_string(), "C".to_string()];
        let results = source.fetch_many(&symbols, Timeframe::M5, 2).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].result.is_ok());
        assert!(matches!(results[1].result, Err(DataFetchError::Api { .. })));
        assert_eq!(results[2].result.as_ref().unwrap().len(), 2);
    }
}
