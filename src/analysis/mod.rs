//! Analysis modules.
//!
//! Block aggregation feeds both the consistency analyzer and the profile
//! synthesizer.

pub mod aggregator;
pub mod consistency;

pub use aggregator::*;
pub use consistency::{analyze_consistency, ConsistencyThresholds};
