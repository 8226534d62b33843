//! Signal scoring model
//!
//! A binary gradient-boosted tree classifier over named feature columns,
//! persisted as two JSON artifacts in the model directory.

pub mod gbm;
pub mod signal_model;

pub use gbm::{Booster, GbmParams};
pub use signal_model::*;
