use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade direction of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Lifecycle status of a signal. Only `Active` is written on insert;
/// the monitor moves a signal to one of the closed states exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Active,
    ClosedWin,
    ClosedLoss,
    Cancelled,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Active => "ACTIVE",
            SignalStatus::ClosedWin => "CLOSED_WIN",
            SignalStatus::ClosedLoss => "CLOSED_LOSS",
            SignalStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SignalStatus::Active)
    }

    /// Text written to the stats table when a signal leaves `Active`.
    pub fn result_label(&self) -> Option<&'static str> {
        match self {
            SignalStatus::Active => None,
            SignalStatus::ClosedWin => Some("WIN"),
            SignalStatus::ClosedLoss => Some("LOSS"),
            SignalStatus::Cancelled => Some("EXPIRED"),
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(SignalStatus::Active),
            "CLOSED_WIN" => Ok(SignalStatus::ClosedWin),
            "CLOSED_LOSS" => Ok(SignalStatus::ClosedLoss),
            "CANCELLED" => Ok(SignalStatus::Cancelled),
            other => Err(format!("unknown signal status: {}", other)),
        }
    }
}

/// Values needed to open a signal; status is always ACTIVE on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSignal {
    pub pair: String,
    pub direction: Direction,
    pub price: f64,
    pub tp: f64,
    pub sl: f64,
    pub probability: f64,
    /// Horizon in candles of `timeframe`
    pub eta: i32,
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: i64,
    pub pair: String,
    pub direction: Direction,
    pub price: f64,
    pub tp: f64,
    pub sl: f64,
    pub probability: f64,
    pub eta: i32,
    pub timeframe: String,
    pub status: SignalStatus,
    pub created_at: DateTime<Utc>,
}

/// Count of logged results per result text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCount {
    pub result: String,
    pub count: i64,
}
