//! Feature engineering
//!
//! Turns a candle series into indicator rows and the named-column table the
//! model trains and predicts on.

pub mod builder;
pub mod labels;
pub mod table;

pub use builder::*;
pub use labels::*;
pub use table::*;
