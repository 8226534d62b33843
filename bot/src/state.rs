use std::sync::Arc;

use shared::{Config, SignalStore};
use signal_engine::data::Timeframe;
use signal_engine::exchange::{BybitClient, BybitConfig, MarketDataSource};
use signal_engine::model::SignalModel;
use signal_engine::strategy::SignalRules;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub type MyDialogue = Dialogue<BotState, InMemStorage<BotState>>;
pub type HandlerResult = Result<(), anyhow::Error>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub timeframe: Timeframe,
    pub store: Arc<SignalStore>,
    pub market: Arc<dyn MarketDataSource>,
    pub model: Arc<SignalModel>,
    pub rules: SignalRules,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let store = SignalStore::open(&config.database_path).await?;
        tracing::info!("Connected to database successfully");

        let market = BybitClient::new(BybitConfig::from_shared(&config))?;
        let model = SignalModel::load(&config.model_dir)?;
        if !model.is_trained() {
            tracing::warn!(
                "No trained model in {}; run the `train` binary to enable signals",
                config.model_dir.display()
            );
        }

        Self::from_parts(
            config,
            Arc::new(store),
            Arc::new(market),
            Arc::new(model),
        )
    }

    pub fn from_parts(
        config: Config,
        store: Arc<SignalStore>,
        market: Arc<dyn MarketDataSource>,
        model: Arc<SignalModel>,
    ) -> Result<Self, anyhow::Error> {
        let timeframe: Timeframe = config
            .scan_timeframe
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        let rules = SignalRules::from_config(&config);
        Ok(AppState {
            config: Arc::new(config),
            timeframe,
            store,
            market,
            model,
            rules,
        })
    }
}

#[derive(Clone, Default, Debug, PartialEq)]
pub enum BotState {
    #[default]
    Normal,
    WaitingForPair,
}
