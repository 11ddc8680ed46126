//! Cohort overview and JSON export.
//!
//! The overview aggregates many assessments into profile-type counts and
//! one compact digest per respondent. The JSON export carries full
//! profiles alongside the rendered text reports.

use crate::cli::Audience;
use crate::config::ReportConfig;
use crate::models::{BlockStatistics, ConsistencyVerdict, Profile, Respondent};
use crate::pipeline::Assessment;
use crate::profile::EnrichmentStatus;
use crate::report::formatter::ProfileDigest;
use crate::report::generator::render_text;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// One row of the cohort overview.
#[derive(Debug, Clone, Serialize)]
pub struct CohortEntry {
    pub name: String,
    pub cohort_label: String,
    /// Educator-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// `None` when the respondent has no answers yet.
    pub digest: Option<ProfileDigest>,
}

/// System-wide statistics over a set of assessments.
#[derive(Debug, Clone, Serialize)]
pub struct CohortReport {
    pub generated_at: DateTime<Utc>,
    pub total_profiles: usize,
    pub pending_profiles: usize,
    /// Sheets rejected for invalid answers.
    pub rejected_sheets: usize,
    /// Display label and count, most frequent first.
    pub type_distribution: Vec<(String, usize)>,
    pub entries: Vec<CohortEntry>,
}

/// Build the cohort overview.
pub fn build_cohort_report(
    assessments: &[Assessment],
    rejected_sheets: usize,
    audience: Audience,
    config: &ReportConfig,
    generated_at: DateTime<Utc>,
) -> CohortReport {
    let entries: Vec<CohortEntry> = assessments
        .iter()
        .map(|a| CohortEntry {
            name: a.respondent.name.clone(),
            cohort_label: a.respondent.cohort_label().to_string(),
            confidence: audience
                .can_view_consistency()
                .then_some(a.verdict.confidence),
            digest: a.digest(audience, config.summary_max_chars),
        })
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for digest in entries.iter().filter_map(|e| e.digest.as_ref()) {
        *counts.entry(digest.profile_type.clone()).or_insert(0) += 1;
    }

    let mut type_distribution: Vec<(String, usize)> = counts.into_iter().collect();
    type_distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let total_profiles = assessments.iter().filter(|a| a.is_available()).count();

    CohortReport {
        generated_at,
        total_profiles,
        pending_profiles: entries.len() - total_profiles,
        rejected_sheets,
        type_distribution,
        entries,
    }
}

/// Render one digest as an indented block of text lines.
pub fn render_digest_text(digest: &ProfileDigest) -> String {
    let mut block = String::new();

    block.push_str(&format!("   🏷️  Type: {}\n", digest.profile_type));
    block.push_str(&format!("   🧠 Strengths: {}\n", digest.main_strengths));
    if let Some(ref indicators) = digest.main_indicators {
        block.push_str(&format!("   🔍 Indicators: {}\n", indicators));
    }
    if let Some(ref priority) = digest.priority_recommendation {
        block.push_str(&format!("   👉 Priority: {}\n", priority));
    }

    block
}

/// Render the cohort overview as plain text.
pub fn render_cohort_text(report: &CohortReport) -> String {
    let mut output = String::new();

    output.push_str("📊 COHORT OVERVIEW\n");
    output.push_str(&format!("{}\n", "━".repeat(78)));
    output.push_str(&format!(
        "📅 Generated: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!("👥 Profiles: {}\n", report.total_profiles));
    if report.pending_profiles > 0 {
        output.push_str(&format!("⏳ Not yet available: {}\n", report.pending_profiles));
    }
    if report.rejected_sheets > 0 {
        output.push_str(&format!("⛔ Rejected sheets: {}\n", report.rejected_sheets));
    }
    output.push('\n');

    if !report.type_distribution.is_empty() {
        output.push_str("Profile types:\n");
        for (label, count) in &report.type_distribution {
            output.push_str(&format!("   {} - {}\n", label, count));
        }
        output.push('\n');
    }

    for entry in &report.entries {
        output.push_str(&format!("👤 {} ({})", entry.name, entry.cohort_label));
        if let Some(confidence) = entry.confidence {
            output.push_str(&format!(" - confidence {:.0}%", confidence * 100.0));
        }
        output.push('\n');

        match entry.digest {
            Some(ref digest) => output.push_str(&render_digest_text(digest)),
            None => output.push_str("   ⏳ Profile not yet available\n"),
        }
        output.push('\n');
    }

    output
}

/// Render the cohort overview as Markdown.
pub fn render_cohort_markdown(report: &CohortReport) -> String {
    let mut output = String::new();

    output.push_str("# Cohort Overview\n\n");
    output.push_str(&format!(
        "- **Generated:** {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("- **Profiles:** {}\n", report.total_profiles));
    if report.pending_profiles > 0 {
        output.push_str(&format!("- **Not yet available:** {}\n", report.pending_profiles));
    }
    if report.rejected_sheets > 0 {
        output.push_str(&format!("- **Rejected sheets:** {}\n", report.rejected_sheets));
    }
    output.push('\n');

    if !report.type_distribution.is_empty() {
        output.push_str("## Profile Types\n\n");
        output.push_str("| Profile Type | Count |\n");
        output.push_str("|:---|:---:|\n");
        for (label, count) in &report.type_distribution {
            output.push_str(&format!("| {} | {} |\n", label, count));
        }
        output.push('\n');
    }

    output.push_str("## Respondents\n\n");
    for entry in &report.entries {
        output.push_str(&format!("### {} ({})\n\n", entry.name, entry.cohort_label));
        if let Some(confidence) = entry.confidence {
            output.push_str(&format!("- **Confidence:** {:.0}%\n", confidence * 100.0));
        }
        match entry.digest {
            Some(ref digest) => {
                output.push_str(&format!("- **Type:** {}\n", digest.profile_type));
                output.push_str(&format!("- **Strengths:** {}\n", digest.main_strengths));
                if let Some(ref indicators) = digest.main_indicators {
                    output.push_str(&format!("- **Indicators:** {}\n", indicators));
                }
                if let Some(ref priority) = digest.priority_recommendation {
                    output.push_str(&format!("- **Priority:** {}\n", priority));
                }
            }
            None => output.push_str("- *Profile not yet available*\n"),
        }
        output.push('\n');
    }

    output
}

/// Export metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub audience: String,
    pub total_respondents: usize,
}

/// One respondent in the JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct RespondentExport {
    pub respondent: Respondent,
    /// Educator-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    /// Educator-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_statistics: Option<Vec<BlockStatistics>>,
    /// Educator-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency: Option<ConsistencyVerdict>,
    /// Educator-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentStatus>,
    pub digest: Option<ProfileDigest>,
    pub report_text: String,
}

/// Full JSON export of one or more assessments.
#[derive(Debug, Clone, Serialize)]
pub struct JsonExport {
    pub metadata: ExportMetadata,
    pub respondents: Vec<RespondentExport>,
}

/// Build the JSON export. Student exports carry only the student view.
pub fn build_export(
    assessments: &[Assessment],
    audience: Audience,
    config: &ReportConfig,
    generated_at: DateTime<Utc>,
) -> JsonExport {
    let educator = audience.can_view_consistency();

    let respondents = assessments
        .iter()
        .map(|a| RespondentExport {
            respondent: a.respondent.clone(),
            profile: a.profile.clone().filter(|_| educator),
            block_statistics: educator.then(|| a.stats.clone()),
            consistency: educator.then(|| a.verdict.clone()),
            enrichment: educator.then(|| a.enrichment.clone()),
            digest: a.digest(audience, config.summary_max_chars),
            report_text: render_text(&a.report(audience, config, generated_at)),
        })
        .collect();

    JsonExport {
        metadata: ExportMetadata {
            tool: "LearnProfile".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at,
            audience: audience.label().to_string(),
            total_respondents: assessments.len(),
        },
        respondents,
    }
}

pub fn render_export(export: &JsonExport) -> Result<String> {
    serde_json::to_string_pretty(export).map_err(Into::into)
}
