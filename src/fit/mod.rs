//! Estimator training orchestration.
//!
//! Responsibilities:
//!
//! - split validated records into train / test partitions (seeded)
//! - fit scalers and the forest on the training partition
//! - compute fit diagnostics

pub mod split;
pub mod trainer;

pub use split::*;
pub use trainer::*;
