//! Text generation backends used for profile enrichment.
//!
//! The synthesizer only sees the `TextGenerator` trait: a prompt goes in,
//! opaque text comes out.

pub mod ollama;

use anyhow::Result;

pub use ollama::{OllamaClient, OllamaConfig};

/// A free-text generator. Output is never assumed to be well formed.
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
