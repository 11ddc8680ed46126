//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// LearnProfile - questionnaire analysis and learning-profile reports
///
/// Scores how trustworthy a student's questionnaire answers are, derives a
/// learning profile, optionally enriches it with a local LLM, and renders a
/// report for educators.
///
/// Examples:
///   learnprofile --input sheets/ana.json
///   learnprofile --input sheets/ana.json --offline --format markdown
///   learnprofile --input sheets/ --output cohort.txt
///   learnprofile --input sheets/ana.json --audience student
///   learnprofile --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Answer sheet (JSON) or a directory of answer sheets
    ///
    /// A directory switches to cohort mode: every *.json sheet below it is
    /// processed and a cohort report is written.
    #[arg(short, long, value_name = "PATH", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (text, markdown, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Who the report is rendered for
    ///
    /// Student reports never include reliability scores, anomalies,
    /// divergence indicators or teacher recommendations.
    #[arg(long, default_value = "educator", value_name = "ROLE")]
    pub audience: Audience,

    /// Render compact summaries instead of detailed reports
    #[arg(long)]
    pub summary: bool,

    /// Skip LLM enrichment and use the baseline profile only
    #[arg(long)]
    pub offline: bool,

    /// Ollama model used for enrichment
    ///
    /// Can also be set via LEARNPROFILE_MODEL env var or .learnprofile.toml config.
    #[arg(short, long, env = "LEARNPROFILE_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Enrichment request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .learnprofile.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of respondents processed concurrently in cohort mode
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .learnprofile.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

/// Role of the report reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Audience {
    /// Full report including response reliability
    #[default]
    Educator,
    /// Encouraging subset without any authenticity scoring
    Student,
}

impl Audience {
    /// Whether this reader may see consistency verdicts and anomaly text.
    pub fn can_view_consistency(self) -> bool {
        matches!(self, Audience::Educator)
    }

    pub fn label(self) -> &'static str {
        match self {
            Audience::Educator => "educator",
            Audience::Student => "student",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input path does not exist: {}", input.display()));
            }
        }

        if let Some(ref url) = self.ollama_url {
            if !self.offline && !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// True when the input is a directory of sheets.
    pub fn is_cohort(&self) -> bool {
        self.input.as_ref().is_some_and(|p| p.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: None,
            output: None,
            format: OutputFormat::Text,
            audience: Audience::Educator,
            summary: false,
            offline: false,
            model: None,
            ollama_url: None,
            temperature: None,
            timeout: None,
            config: None,
            concurrency: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_ollama_url() {
        let mut args = make_args();
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());

        args.offline = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_audience_access() {
        assert!(Audience::Educator.can_view_consistency());
        assert!(!Audience::Student.can_view_consistency());
    }
}
