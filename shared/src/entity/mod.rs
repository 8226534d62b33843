pub mod pairs;
pub mod signals;
pub mod stats;
