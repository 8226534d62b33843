//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "signals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub pair: String,
    pub direction: String, // "long" or "short"
    pub price: f64,
    pub tp: f64,
    pub sl: f64,
    pub probability: f64,
    pub eta: i32, // horizon in candles of `timeframe`
    pub timeframe: String,
    pub status: String, // "ACTIVE", "CLOSED_WIN", "CLOSED_LOSS", "CANCELLED"
    pub created_at: i64, // unix seconds
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
