//! Fits the signal model on recent Bybit candles and writes the artifacts
//! into `MODEL_DIR`.
//!
//! ```text
//! train --pairs BTCUSDT,ETHUSDT --timeframe 1h --limit 1000 --horizon 24
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use shared::{Config, SignalStore};
use signal_engine::data::Timeframe;
use signal_engine::exchange::{BybitClient, BybitConfig, MarketDataSource, SymbolCandles};
use signal_engine::features::{forward_return_labels, FeatureTable};
use signal_engine::model::{GbmParams, SignalModel};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LABEL: &str = "target";

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the signal model on Bybit candles")]
struct Args {
    /// Comma separated symbols
    #[arg(long, value_delimiter = ',', default_value = "BTCUSDT,ETHUSDT")]
    pairs: Vec<String>,

    /// Also train on every pair tracked in the database
    #[arg(long)]
    tracked: bool,

    #[arg(long, default_value = "1h")]
    timeframe: Timeframe,

    /// Candles per pair (at most 1000)
    #[arg(long, default_value_t = 1000)]
    limit: u32,

    /// Candles ahead used for the up/down label
    #[arg(long, default_value_t = 24)]
    horizon: usize,

    /// Share of the newest rows per pair held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    holdout: f64,

    /// Overrides MODEL_DIR
    #[arg(long)]
    model_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    n_estimators: usize,

    #[arg(long, default_value_t = 3)]
    max_depth: usize,

    #[arg(long, default_value_t = 0.1)]
    learning_rate: f64,
}

fn labelled_table(candles: &[signal_engine::data::Candle], horizon: usize) -> Result<FeatureTable> {
    let mut table = FeatureTable::from_candles(candles);
    table.insert_column(LABEL, forward_return_labels(candles, horizon))?;
    Ok(table)
}

/// Share of rows where the score lands on the same side of 0.5 as the label
fn accuracy(scores: &[f64], labels: &[f64]) -> Option<f64> {
    let (hits, total) = scores
        .iter()
        .zip(labels)
        .filter(|(_, y)| !y.is_nan())
        .fold((0usize, 0usize), |(hits, total), (p, y)| {
            let predicted = if *p >= 0.5 { 1.0 } else { 0.0 };
            (hits + usize::from(predicted == *y), total + 1)
        });
    (total > 0).then(|| hits as f64 / total as f64)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    if !SignalModel::is_available() {
        bail!("this build has no gradient boosting backend (enable the `gbm` feature)");
    }
    if !(0.0..1.0).contains(&args.holdout) {
        bail!("--holdout must be within [0, 1), got {}", args.holdout);
    }

    let mut pairs = args.pairs.clone();
    if args.tracked {
        let store = SignalStore::open(&config.database_path).await?;
        pairs.extend(store.get_pairs().await?);
    }
    pairs.retain(|p| !p.trim().is_empty());
    pairs.sort();
    pairs.dedup();
    if pairs.is_empty() {
        bail!("no pairs to train on");
    }

    let client = BybitClient::new(BybitConfig::from_shared(&config))?;
    info!(
        "Fetching {} {} candles for {} pair(s)",
        args.limit,
        args.timeframe,
        pairs.len()
    );
    let results = client.fetch_many(&pairs, args.timeframe, args.limit).await;
    client.close();

    let mut train = FeatureTable::default();
    let mut test = FeatureTable::default();
    for SymbolCandles { symbol, result } in results {
        let candles = match result {
            Ok(candles) => candles,
            Err(e) => {
                warn!("Skipping {}: {}", symbol, e);
                continue;
            }
        };
        let table = labelled_table(&candles, args.horizon)
            .with_context(|| format!("building features for {}", symbol))?;
        let test_rows = (table.len() as f64 * args.holdout).round() as usize;
        train.append(&table.head(table.len() - test_rows))?;
        test.append(&table.tail(test_rows))?;
        info!("{}: {} rows", symbol, table.len());
    }
    if train.is_empty() {
        bail!("no candles fetched, nothing to train on");
    }

    let model_dir = args.model_dir.unwrap_or_else(|| config.model_dir.clone());
    let params = GbmParams {
        n_estimators: args.n_estimators,
        max_depth: args.max_depth,
        learning_rate: args.learning_rate,
        ..GbmParams::default()
    };
    let mut model = SignalModel::load(&model_dir)?.with_params(params);
    let summary = model.train(&train, LABEL)?;
    info!(
        "Trained on {} rows ({} up) with features {:?}",
        summary.rows, summary.positives, summary.features
    );

    if let Some(labels) = test.column(LABEL) {
        let scores = model.predict(&test)?;
        match accuracy(&scores, labels) {
            Some(acc) => info!("Holdout accuracy: {:.2}% over {} rows", acc * 100.0, test.len()),
            None => info!("Holdout has no labelled rows"),
        }
    }

    info!("Model written to {}", model_dir.display());
    Ok(())
}
