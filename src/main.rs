//! LearnProfile - questionnaire analysis and learning-profile reports
//!
//! A CLI tool that scores how trustworthy a student's questionnaire answers
//! are, derives a learning profile (optionally enriched by a local Ollama
//! model), and renders reports for educators and students.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable input, invalid answers, config, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod llm;
mod models;
mod pipeline;
mod profile;
mod report;
mod sheets;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use llm::{OllamaClient, OllamaConfig};
use pipeline::Assessment;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("LearnProfile v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default configuration file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, thresholds, and report layout.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete workflow. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let input = args
        .input
        .clone()
        .context("An input answer sheet or directory is required")?;

    let generator = if config.model.enabled {
        if !args.quiet {
            println!("🤖 Enrichment model: {}", config.model.name);
            println!("   Ollama: {}", config.model.ollama_url);
            println!("   Timeout: {}s", config.model.timeout_seconds);
        }
        Some(OllamaClient::new(OllamaConfig::from(&config.model))?)
    } else {
        info!("Enrichment disabled, using baseline profiles only");
        None
    };

    let generated_at = Utc::now();

    let content = if args.is_cohort() {
        run_cohort(&args, &config, &input, generator.as_ref(), generated_at).await?
    } else {
        run_single(&args, &config, &input, generator.as_ref(), generated_at).await?
    };

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.general.output));

    std::fs::write(&output_path, &content)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    Ok(0)
}

/// Analyze one answer sheet and render its report.
async fn run_single(
    args: &Args,
    config: &Config,
    input: &Path,
    generator: Option<&OllamaClient>,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let sheet = sheets::load_sheet(input)?;

    if !args.quiet {
        println!("📋 Analyzing answers for {}...", sheet.respondent.name);
    }

    let assessment = match generator {
        Some(generator) => pipeline::assess(&sheet, config, Some(generator)).await,
        None => pipeline::assess_baseline(&sheet, config),
    }
    .with_context(|| format!("Invalid answers in {}", input.display()))?;

    if !args.quiet {
        print_assessment_summary(args, &assessment);
    }

    let assessments = std::slice::from_ref(&assessment);

    let content = match args.format {
        OutputFormat::Json => report::render_export(&report::build_export(
            assessments,
            args.audience,
            &config.report,
            generated_at,
        ))?,
        OutputFormat::Text | OutputFormat::Markdown if args.summary => {
            let overview = report::build_cohort_report(
                assessments,
                0,
                args.audience,
                &config.report,
                generated_at,
            );
            render_overview(args.format, &overview)
        }
        OutputFormat::Markdown => report::render_markdown(&assessment.report(
            args.audience,
            &config.report,
            generated_at,
        )),
        OutputFormat::Text => report::render_text(&assessment.report(
            args.audience,
            &config.report,
            generated_at,
        )),
    };

    Ok(content)
}

/// Analyze every sheet below a directory and render the cohort report.
async fn run_cohort(
    args: &Args,
    config: &Config,
    input: &Path,
    generator: Option<&OllamaClient>,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let loaded = sheets::load_sheets(input)?;
    if loaded.is_empty() {
        anyhow::bail!("No answer sheets found in {}", input.display());
    }

    if !args.quiet {
        println!(
            "📋 Analyzing {} answer sheets (concurrency {})...",
            loaded.len(),
            config.general.concurrency
        );
    }

    let progress = (!args.quiet).then(|| {
        let pb = ProgressBar::new(loaded.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map(|style| style.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    });
    let progress_ref = progress.as_ref();

    let mut results: Vec<_> = stream::iter(loaded.iter())
        .map(|loaded| async move {
            let result = match generator {
                Some(generator) => pipeline::assess(&loaded.sheet, config, Some(generator)).await,
                None => pipeline::assess_baseline(&loaded.sheet, config),
            };
            if let Some(pb) = progress_ref {
                pb.set_message(loaded.sheet.respondent.name.clone());
                pb.inc(1);
            }
            (loaded, result)
        })
        .buffer_unordered(config.general.concurrency.max(1))
        .collect()
        .await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    // Restore input order
    results.sort_by(|a, b| a.0.path.cmp(&b.0.path));

    let mut assessments: Vec<Assessment> = Vec::with_capacity(results.len());
    let mut rejected = 0;

    for (loaded, result) in results {
        match result {
            Ok(assessment) => assessments.push(assessment),
            Err(e) => {
                warn!("Skipping {}: {}", loaded.path.display(), e);
                rejected += 1;
            }
        }
    }

    info!(
        "Assessed {} respondents, {} sheets rejected",
        assessments.len(),
        rejected
    );

    if args.format == OutputFormat::Json {
        return report::render_export(&report::build_export(
            &assessments,
            args.audience,
            &config.report,
            generated_at,
        ));
    }

    let overview = report::build_cohort_report(
        &assessments,
        rejected,
        args.audience,
        &config.report,
        generated_at,
    );

    if !args.quiet {
        println!("\n📊 Cohort Summary:");
        println!("   Profiles: {}", overview.total_profiles);
        for (label, count) in &overview.type_distribution {
            println!("   - {}: {}", label, count);
        }
        if rejected > 0 {
            println!("   ⛔ Rejected sheets: {}", rejected);
        }
    }

    let mut content = render_overview(args.format, &overview);

    if !args.summary {
        for assessment in &assessments {
            let formatted = assessment.report(args.audience, &config.report, generated_at);
            content.push('\n');
            content.push_str(&match args.format {
                OutputFormat::Markdown => report::render_markdown(&formatted),
                _ => report::render_text(&formatted),
            });
        }
    }

    Ok(content)
}

fn render_overview(format: OutputFormat, overview: &report::cohort::CohortReport) -> String {
    match format {
        OutputFormat::Markdown => report::render_cohort_markdown(overview),
        _ => report::render_cohort_text(overview),
    }
}

/// Print a short console summary of one assessment.
fn print_assessment_summary(args: &Args, assessment: &Assessment) {
    println!("\n📊 Assessment Summary:");
    println!("   Answers: {}", assessment.answer_count);

    match assessment.profile {
        Some(ref profile) => println!(
            "   Profile type: {}",
            report::formatter::profile_type_label(&profile.profile_type)
        ),
        None => println!("   ⏳ Profile not yet available"),
    }

    if args.audience.can_view_consistency() {
        let verdict = &assessment.verdict;
        println!(
            "   {} Confidence: {:.0}% ({})",
            verdict.tier.emoji(),
            verdict.confidence * 100.0,
            verdict.recommendation
        );
        for anomaly in &verdict.anomalies {
            println!("   - {}", anomaly);
        }
    }

    println!("   Enrichment: {}", assessment.enrichment);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
