//! Reporting: terminal summaries and the plain-text explanation adapter.

pub mod explain;
pub mod format;

pub use explain::{Explain, TemplateExplainer};
pub use format::*;
