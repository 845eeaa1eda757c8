//! Mathematical utilities: min-max scaling and fit metrics.

pub mod metrics;
pub mod scaler;

pub use metrics::*;
pub use scaler::*;
