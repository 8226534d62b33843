pub mod config;
pub mod database;
pub mod entity;
pub mod models;

pub use config::{Config, TIMEFRAMES};
pub use database::{get_db_connection, SignalStore, StoreError};
pub use models::*;
