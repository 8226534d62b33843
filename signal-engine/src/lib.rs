//! Signal engine: market data, features and scoring for the signal bot
//!
//! # Features
//!
//! - **Market Data**: rate limited Bybit kline fetching behind the
//!   `MarketDataSource` trait, with concurrent multi-symbol fetches
//! - **Technical Indicators**: EMA 20/50/200, RSI(14), OBV
//! - **Feature Tables**: named columns indexed by candle time
//! - **Model**: gradient boosted trees persisted with their feature order
//! - **Rules**: probability to LONG/SHORT proposal, and closing rules
//!
//! # Example
//!
//! ```no_run
//! use signal_engine::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BybitClient::new(BybitConfig::default())?;
//! let candles = client.fetch("BTCUSDT", Timeframe::H1, 200).await?;
//! let model = SignalModel::load("model")?;
//! let scores = model.predict(&FeatureTable::from_candles(&candles))?;
//! if let (Some(p_up), Some(last)) = (scores.last(), candles.last()) {
//!     let proposal = SignalRules::default().evaluate(last.close, *p_up);
//!     println!("{:?}", proposal);
//! }
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod exchange;
pub mod features;
pub mod indicators;
pub mod model;
pub mod strategy;

// Re-export commonly used types
pub mod prelude {
    pub use crate::data::*;
    pub use crate::exchange::*;
    pub use crate::features::*;
    pub use crate::indicators::*;
    pub use crate::model::*;
    pub use crate::strategy::*;
}
