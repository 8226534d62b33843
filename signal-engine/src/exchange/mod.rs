//! Exchange integration module
//!
//! Market data source trait and the Bybit REST implementation.

pub mod bybit;
pub mod error;
pub mod rate_limit;
pub mod source;

pub use bybit::*;
pub use error::*;
pub use rate_limit::*;
pub use source::*;
