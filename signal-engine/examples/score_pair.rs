//! Example: score the latest finished candle of one pair
//!
//! Run with: cargo run -p signal-engine --example score_pair -- BTCUSDT model

use signal_engine::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let symbol = args.next().unwrap_or_else(|| "BTCUSDT".to_string());
    let model_dir = args.next().unwrap_or_else(|| "model".to_string());

    let client = BybitClient::new(BybitConfig::default())?;
    let fetched = client.fetch(&symbol, Timeframe::H1, 200).await?;
    client.close();
    let candles = closed_candles(&fetched, Timeframe::H1, chrono::Utc::now());
    println!("Fetched {} candles for {} ({} finished)", fetched.len(), symbol, candles.len());

    let rows = build(candles);
    if let Some(row) = rows.last() {
        println!(
            "close {:.4}  ema20 {:?}  ema200 {:?}  rsi {:?}  obv {:?}",
            row.close, row.ema20, row.ema200, row.rsi, row.obv
        );
    }

    let model = SignalModel::load(&model_dir)?;
    let scores = match model.predict(&FeatureTable::from_rows(&rows).tail(1)) {
        Ok(scores) => scores,
        Err(ModelError::NotTrained) => {
            println!("No trained model in {}, run the train binary first", model_dir);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let (Some(p_up), Some(last)) = (scores.first(), candles.last()) {
        println!("p(up) = {:.3}", p_up);
        match SignalRules::default().evaluate(last.close, *p_up) {
            Some(proposal) => println!("{:#?}", proposal),
            None => println!("No signal at the default threshold"),
        }
    }
    Ok(())
}
