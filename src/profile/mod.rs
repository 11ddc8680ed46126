//! Profile synthesis.
//!
//! A deterministic baseline is always produced first; an optional LLM
//! enrichment is merged over it field by field.

pub mod baseline;
pub mod enrichment;
pub mod prompt;

pub use baseline::synthesize_baseline;
pub use enrichment::{enrich, EnrichmentStatus};
pub use prompt::build_enrichment_prompt;
