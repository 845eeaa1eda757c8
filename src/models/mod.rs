//! Learned estimator: regression trees, the bagged forest, and the trained
//! state used for inference.

pub mod estimator;
pub mod forest;
pub mod tree;

pub use estimator::*;
pub use forest::*;
pub use tree::*;
