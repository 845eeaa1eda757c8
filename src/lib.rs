//! `unified-score` library crate.
//!
//! The binary (`uscore`) is a thin wrapper around this library so that:
//!
//! - the scoring core is testable without spawning processes
//! - the deterministic and learned paths can be embedded in other services
//!
//! Two ways to get a unified score from three bureau readings:
//!
//! - deterministic: `score::score_profile` (normalize → aggregate → classify)
//! - learned: `models::Estimator` loaded with `io::load_estimator`

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod score;
