//! Transformation module.
//!
//! This module turns raw scraped listings into canonical tables:
//! - Steps: typed derivation steps and their interpreter
//! - Rules: per-source rule sets (rename, steps, defaults, schema)
//! - Pipeline: the rename → derive → fill → clean → finalize run

pub mod pipeline;
pub mod rules;
pub mod steps;

pub use pipeline::*;
pub use rules::*;
pub use steps::*;
