//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.learnprofile.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".learnprofile.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Enrichment model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Questionnaire layout.
    #[serde(default)]
    pub questionnaire: QuestionnaireConfig,

    /// Consistency analysis thresholds.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Number of respondents processed concurrently in cohort mode.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "learning_profile.txt".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// Enrichment LLM settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Ask the model to enrich the baseline profile.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound for the single enrichment request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout() -> u64 {
    60
}

/// Questionnaire layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireConfig {
    /// Number of questions in the questionnaire.
    #[serde(default = "default_total_questions")]
    pub total_questions: u32,

    /// Questions per block; the trailing block may hold fewer.
    #[serde(default = "default_questions_per_block")]
    pub questions_per_block: u32,

    /// Lowest value on the answer scale.
    #[serde(default = "default_scale_min")]
    pub scale_min: u8,

    /// Highest value on the answer scale.
    #[serde(default = "default_scale_max")]
    pub scale_max: u8,
}

impl Default for QuestionnaireConfig {
    fn default() -> Self {
        Self {
            total_questions: default_total_questions(),
            questions_per_block: default_questions_per_block(),
            scale_min: default_scale_min(),
            scale_max: default_scale_max(),
        }
    }
}

fn default_total_questions() -> u32 {
    67
}

fn default_questions_per_block() -> u32 {
    10
}

fn default_scale_min() -> u8 {
    1
}

fn default_scale_max() -> u8 {
    5
}

/// Consistency analysis thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Fewer answers than this short-circuits to an incomplete verdict.
    #[serde(default = "default_min_answers")]
    pub min_answers: usize,

    /// Block variance above this is flagged as highly variable.
    #[serde(default = "default_variance_threshold")]
    pub variance_threshold: f64,

    /// Mean difference above this between correlated blocks is a contradiction.
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,

    /// Fraction of extreme answers above this is flagged as polarized.
    #[serde(default = "default_extremity_threshold")]
    pub extremity_threshold: f64,

    /// Length of the identical-value window for repetition detection.
    #[serde(default = "default_repetition_window")]
    pub repetition_window: usize,

    /// More identical windows than this is flagged as repetitive.
    #[serde(default = "default_max_repetitions")]
    pub max_repetitions: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_answers: default_min_answers(),
            variance_threshold: default_variance_threshold(),
            correlation_threshold: default_correlation_threshold(),
            extremity_threshold: default_extremity_threshold(),
            repetition_window: default_repetition_window(),
            max_repetitions: default_max_repetitions(),
        }
    }
}

fn default_min_answers() -> usize {
    60
}

fn default_variance_threshold() -> f64 {
    2.5
}

fn default_correlation_threshold() -> f64 {
    2.0
}

fn default_extremity_threshold() -> f64 {
    0.7
}

fn default_repetition_window() -> usize {
    5
}

fn default_max_repetitions() -> usize {
    3
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Column width for paragraph wrapping.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    /// Sentence fragments shorter than this are dropped from action lists.
    #[serde(default = "default_min_fragment_chars")]
    pub min_fragment_chars: usize,

    /// Maximum length of a short summary.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Append the fixed "important notes" disclaimer.
    #[serde(default = "default_true")]
    pub include_notes: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
            min_fragment_chars: default_min_fragment_chars(),
            summary_max_chars: default_summary_max_chars(),
            include_notes: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_wrap_width() -> usize {
    78
}

fn default_min_fragment_chars() -> usize {
    10
}

fn default_summary_max_chars() -> usize {
    150
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings when given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if args.offline {
            self.model.enabled = false;
        }

        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert!(config.model.enabled);
        assert_eq!(config.questionnaire.total_questions, 67);
        assert_eq!(config.analysis.min_answers, 60);
        assert_eq!(config.analysis.variance_threshold, 2.5);
        assert_eq!(config.report.wrap_width, 78);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"

[model]
name = "qwen2.5:14b"
enabled = false

[analysis]
min_answers = 50
max_repetitions = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert_eq!(config.model.name, "qwen2.5:14b");
        assert!(!config.model.enabled);
        assert_eq!(config.model.timeout_seconds, 60);
        assert_eq!(config.analysis.min_answers, 50);
        assert_eq!(config.analysis.max_repetitions, 5);
        assert_eq!(config.analysis.repetition_window, 5);
        assert_eq!(config.questionnaire.questions_per_block, 10);
    }

    #[test]
    fn test_logging_is_not_a_config_setting() {
        assert!(!Config::default_toml().contains("verbose"));

        let config: Config = toml::from_str("[general]\nverbose = true\nconcurrency = 2\n").unwrap();
        assert_eq!(config.general.concurrency, 2);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[questionnaire]"));
        assert!(toml_str.contains("[analysis]"));
        assert!(toml_str.contains("[report]"));
    }

    #[test]
    fn test_default_toml_parses_back() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(config.analysis.extremity_threshold, 0.7);
        assert_eq!(config.report.summary_max_chars, 150);
    }
}
