//! SQLite-backed store for signals, tracked pairs and result history.
//!
//! One `SignalStore` is created at startup and shared through `Arc`; it keeps a
//! single connection open for the lifetime of the process.

use chrono::{TimeZone, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbBackend, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr, Statement, TransactionTrait,
};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::entity::{pairs, signals, stats};
use crate::models::{NewSignal, ResultCount, Signal, SignalStatus};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS signals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pair TEXT NOT NULL,
        direction TEXT NOT NULL,
        price REAL NOT NULL,
        tp REAL NOT NULL,
        sl REAL NOT NULL,
        probability REAL NOT NULL,
        eta INTEGER NOT NULL,
        timeframe TEXT NOT NULL DEFAULT '1h',
        status TEXT NOT NULL DEFAULT 'ACTIVE',
        created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    )",
    // At most one ACTIVE signal per pair, enforced by the database itself
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_signals_one_active
        ON signals(pair) WHERE status = 'ACTIVE'",
    "CREATE TABLE IF NOT EXISTS pairs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pair TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS stats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pair TEXT NOT NULL,
        result TEXT NOT NULL
    )",
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),

    #[error("pair {0} already has an active signal")]
    ActiveSignalExists(String),

    #[error("invalid row in signals table: {0}")]
    InvalidRow(String),

    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn get_db_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    info!("Connecting to database via Sea-ORM at: {}", database_url);
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(options).await
}

pub struct SignalStore {
    db: DatabaseConnection,
}

impl SignalStore {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::connect(&format!("sqlite://{}?mode=rwc", path.display())).await
    }

    /// Connect to `database_url` and create the schema if it is absent.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db = get_db_connection(database_url).await?;
        for statement in SCHEMA {
            db.execute_unprepared(statement).await?;
        }
        debug!("Signal store schema ready");
        Ok(Self { db })
    }

    // -- signals ---------------------------------------------------------

    /// Insert a signal with status ACTIVE. The caller is expected to check
    /// `has_active_signal` first; a second ACTIVE row for the same pair is
    /// rejected with `ActiveSignalExists`.
    pub async fn add_signal(&self, signal: &NewSignal) -> Result<i64, StoreError> {
        insert_signal(&self.db, signal).await
    }

    /// Check-and-insert in one transaction. Returns `None` when the pair
    /// already has an ACTIVE signal.
    pub async fn open_signal(&self, signal: &NewSignal) -> Result<Option<i64>, StoreError> {
        let txn = self.db.begin().await?;
        if active_exists(&txn, &signal.pair).await? {
            txn.rollback().await?;
            debug!("Skipping {}: active signal already present", signal.pair);
            return Ok(None);
        }
        let id = insert_signal(&txn, signal).await?;
        txn.commit().await?;
        Ok(Some(id))
    }

    pub async fn has_active_signal(&self, pair: &str) -> Result<bool, StoreError> {
        Ok(active_exists(&self.db, pair).await?)
    }

    pub async fn update_signal_status(
        &self,
        signal_id: i64,
        status: SignalStatus,
    ) -> Result<(), StoreError> {
        let result = signals::Entity::update_many()
            .col_expr(signals::Column::Status, Expr::value(status.as_str()))
            .filter(signals::Column::Id.eq(signal_id))
            .exec(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, &format!("signal #{}", signal_id)))?;
        if result.rows_affected == 0 {
            debug!("update_signal_status: no signal with id {}", signal_id);
        }
        Ok(())
    }

    /// Moves an ACTIVE signal to a closed `status` and appends its result to
    /// stats, both in one transaction. Returns `false` if the signal was no
    /// longer ACTIVE.
    pub async fn close_signal(
        &self,
        signal_id: i64,
        status: SignalStatus,
    ) -> Result<bool, StoreError> {
        let label = status
            .result_label()
            .ok_or_else(|| StoreError::InvalidRow(format!("cannot close signal as {}", status)))?;

        let txn = self.db.begin().await?;
        let Some(row) = signals::Entity::find_by_id(signal_id)
            .filter(signals::Column::Status.eq(SignalStatus::Active.as_str()))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(false);
        };

        signals::Entity::update_many()
            .col_expr(signals::Column::Status, Expr::value(status.as_str()))
            .filter(signals::Column::Id.eq(signal_id))
            .exec(&txn)
            .await?;
        stats::Entity::insert(stats::ActiveModel {
            pair: Set(row.pair.clone()),
            result: Set(label.to_string()),
            ..Default::default()
        })
        .exec(&txn)
        .await?;
        txn.commit().await?;

        info!("Signal #{} for {} closed as {}", signal_id, row.pair, status);
        Ok(true)
    }

    pub async fn get_signal(&self, signal_id: i64) -> Result<Option<Signal>, StoreError> {
        signals::Entity::find_by_id(signal_id)
            .one(&self.db)
            .await?
            .map(Signal::try_from)
            .transpose()
    }

    pub async fn active_signals(&self) -> Result<Vec<Signal>, StoreError> {
        signals::Entity::find()
            .filter(signals::Column::Status.eq(SignalStatus::Active.as_str()))
            .order_by_asc(signals::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Signal::try_from)
            .collect()
    }

    // -- pairs -----------------------------------------------------------

    pub async fn add_pair(&self, pair: &str) -> Result<(), StoreError> {
        self.db
            .execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                "INSERT OR IGNORE INTO pairs(pair) VALUES(?)",
                [pair.into()],
            ))
            .await?;
        Ok(())
    }

    pub async fn get_pairs(&self) -> Result<Vec<String>, StoreError> {
        let rows = pairs::Entity::find()
            .order_by_asc(pairs::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|row| row.pair).collect())
    }

    // -- stats -----------------------------------------------------------

    pub async fn log_result(&self, pair: &str, result: &str) -> Result<(), StoreError> {
        let entry = stats::ActiveModel {
            pair: Set(pair.to_string()),
            result: Set(result.to_string()),
            ..Default::default()
        };
        stats::Entity::insert(entry).exec(&self.db).await?;
        Ok(())
    }

    pub async fn result_summary(&self) -> Result<Vec<ResultCount>, StoreError> {
        let rows: Vec<(String, i64)> = stats::Entity::find()
            .select_only()
            .column(stats::Column::Result)
            .column_as(Expr::col(stats::Column::Id).count(), "count")
            .group_by(stats::Column::Result)
            .order_by_asc(stats::Column::Result)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(result, count)| ResultCount { result, count })
            .collect())
    }
}

async fn active_exists<C: ConnectionTrait>(conn: &C, pair: &str) -> Result<bool, DbErr> {
    let row = signals::Entity::find()
        .filter(signals::Column::Pair.eq(pair))
        .filter(signals::Column::Status.eq(SignalStatus::Active.as_str()))
        .one(conn)
        .await?;
    Ok(row.is_some())
}

async fn insert_signal<C: ConnectionTrait>(conn: &C, signal: &NewSignal) -> Result<i64, StoreError> {
    let model = signals::ActiveModel {
        pair: Set(signal.pair.clone()),
        direction: Set(signal.direction.as_str().to_string()),
        price: Set(signal.price),
        tp: Set(signal.tp),
        sl: Set(signal.sl),
        probability: Set(signal.probability),
        eta: Set(signal.eta),
        timeframe: Set(signal.timeframe.clone()),
        status: Set(SignalStatus::Active.as_str().to_string()),
        created_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };
    let result = signals::Entity::insert(model)
        .exec(conn)
        .await
        .map_err(|e| map_unique_violation(e, &signal.pair))?;
    info!(
        "Stored {} signal #{} for {} at {:.4}",
        signal.direction, result.last_insert_id, signal.pair, signal.price
    );
    Ok(result.last_insert_id)
}

fn map_unique_violation(err: DbErr, subject: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::ActiveSignalExists(subject.to_string())
        }
        _ => StoreError::Db(err),
    }
}

impl TryFrom<signals::Model> for Signal {
    type Error = StoreError;

    fn try_from(row: signals::Model) -> Result<Self, Self::Error> {
        let created_at = Utc
            .timestamp_opt(row.created_at, 0)
            .single()
            .ok_or_else(|| StoreError::InvalidRow(format!("bad created_at {}", row.created_at)))?;
        Ok(Signal {
            id: row.id,
            direction: row.direction.parse().map_err(StoreError::InvalidRow)?,
            status: row.status.parse().map_err(StoreError::InvalidRow)?,
            pair: row.pair,
            price: row.price,
            tp: row.tp,
            sl: row.sl,
            probability: row.probability,
            eta: row.eta,
            timeframe: row.timeframe,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    async fn memory_store() -> SignalStore {
        SignalStore::connect("sqlite::memory:").await.unwrap()
    }

    fn btc_long() -> NewSignal {
        NewSignal {
            pair: "BTCUSDT".to_string(),
            direction: Direction::Long,
            price: 100.0,
            tp: 110.0,
            sl: 95.0,
            probability: 0.7,
            eta: 24,
            timeframe: "1h".to_string(),
        }
    }

    #[tokio::test]
    async fn active_flag_follows_status() {
        let store = memory_store().await;
        assert!(!store.has_active_signal("BTCUSDT").await.unwrap());

        let id = store.add_signal(&btc_long()).await.unwrap();
        assert!(store.has_active_signal("BTCUSDT").await.unwrap());

        store
            .update_signal_status(id, SignalStatus::ClosedWin)
            .await
            .unwrap();
        assert!(!store.has_active_signal("BTCUSDT").await.unwrap());

        let stored = store.get_signal(id).await.unwrap().unwrap();
        assert_eq!(stored.status, SignalStatus::ClosedWin);
        assert_eq!(stored.direction, Direction::Long);
        assert_eq!(stored.eta, 24);
    }

    #[tokio::test]
    async fn status_update_is_idempotent() {
        let store = memory_store().await;
        let id = store.add_signal(&btc_long()).await.unwrap();
        store.update_signal_status(id, SignalStatus::Cancelled).await.unwrap();
        store.update_signal_status(id, SignalStatus::Cancelled).await.unwrap();
        let stored = store.get_signal(id).await.unwrap().unwrap();
        assert_eq!(stored.status, SignalStatus::Cancelled);
    }

    #[tokio::test]
    async fn second_active_signal_is_rejected() {
        let store = memory_store().await;
        store.add_signal(&btc_long()).await.unwrap();
        let err = store.add_signal(&btc_long()).await.unwrap_err();
        assert!(matches!(err, StoreError::ActiveSignalExists(_)));
    }

    #[tokio::test]
    async fn open_signal_skips_pairs_with_active_signal() {
        let store = memory_store().await;
        let first = store.open_signal(&btc_long()).await.unwrap();
        assert!(first.is_some());
        assert_eq!(store.open_signal(&btc_long()).await.unwrap(), None);

        store
            .update_signal_status(first.unwrap(), SignalStatus::ClosedLoss)
            .await
            .unwrap();
        assert!(store.open_signal(&btc_long()).await.unwrap().is_some());
        assert_eq!(store.active_signals().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn close_signal_logs_result_once() {
        let store = memory_store().await;
        let id = store.add_signal(&btc_long()).await.unwrap();

        assert!(store.close_signal(id, SignalStatus::Cancelled).await.unwrap());
        assert!(!store.close_signal(id, SignalStatus::ClosedWin).await.unwrap());

        let stored = store.get_signal(id).await.unwrap().unwrap();
        assert_eq!(stored.status, SignalStatus::Cancelled);
        assert_eq!(
            store.result_summary().await.unwrap(),
            vec![ResultCount { result: "EXPIRED".into(), count: 1 }]
        );
        assert!(store.close_signal(id, SignalStatus::Active).await.is_err());
    }

    #[tokio::test]
    async fn add_pair_is_idempotent() {
        let store = memory_store().await;
        store.add_pair("ETHUSDT").await.unwrap();
        store.add_pair("ETHUSDT").await.unwrap();
        store.add_pair("BTCUSDT").await.unwrap();
        assert_eq!(store.get_pairs().await.unwrap(), vec!["ETHUSDT", "BTCUSDT"]);
    }

    #[tokio::test]
    async fn results_are_appended_and_counted() {
        let store = memory_store().await;
        store.log_result("BTCUSDT", "WIN").await.unwrap();
        store.log_result("BTCUSDT", "WIN").await.unwrap();
        store.log_result("ETHUSDT", "LOSS").await.unwrap();

        let summary = store.result_summary().await.unwrap();
        assert_eq!(
            summary,
            vec![
                ResultCount { result: "LOSS".into(), count: 1 },
                ResultCount { result: "WIN".into(), count: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn schema_creation_is_repeatable_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bot.db");
        {
            let store = SignalStore::open(&path).await.unwrap();
            store.add_pair("SOLUSDT").await.unwrap();
        }
        let reopened = SignalStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_pairs().await.unwrap(), vec!["SOLUSDT"]);
    }
}
