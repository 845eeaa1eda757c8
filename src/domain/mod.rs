//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - bureaus, their native ranges and the canonical range (`Bureau`, `ScoreRange`)
//! - customer profiles and normalized/unified scores
//! - configuration for scoring, training and sample generation

pub mod types;

pub use types::*;
