//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - dataset and batch result exports (`export`)
//! - atomic estimator state persistence (`state`)

pub mod export;
pub mod ingest;
pub mod state;

pub use export::*;
pub use ingest::*;
pub use state::*;
