//! Signal rules
//!
//! Turns a model probability into a trade proposal and decides when an open
//! signal is finished.

pub mod outcome;
pub mod rules;

pub use outcome::*;
pub use rules::*;
