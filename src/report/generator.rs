//! Learning-profile report generation.
//!
//! A report is built once as a list of titled sections, then rendered as
//! boxed plain text or Markdown.

use crate::cli::Audience;
use crate::config::ReportConfig;
use crate::models::{ConsistencyVerdict, Profile, Respondent};
use crate::report::formatter::{
    format_action_list, format_paragraph, profile_type_label, wrap_text,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Width of section rules and the title box.
const RULE_WIDTH: usize = 78;

const NOT_AVAILABLE_TYPE: &str = "Not yet available";

/// Fixed disclaimer appended to educator reports.
pub const IMPORTANT_NOTES: &str = "\
• This report is based on computational analysis and must be complemented
  by pedagogical observation and, where needed, specialist assessment.
• Divergence indicators are not diagnoses and require professional
  confirmation.
• Suggested strategies should be adapted to the specific school context.";

/// Identifying information at the top of a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportHeader {
    pub respondent_name: String,
    pub grade_label: String,
    pub cohort_label: String,
    pub generated_at: DateTime<Utc>,
    pub profile_type_label: String,
}

impl ReportHeader {
    fn new(respondent: &Respondent, profile_type_label: String, generated_at: DateTime<Utc>) -> Self {
        Self {
            respondent_name: display_or(&respondent.name, "Name not provided"),
            grade_label: display_or(&respondent.grade_label, "Not provided"),
            cohort_label: display_or(respondent.cohort_label(), "Not provided"),
            generated_at,
            profile_type_label,
        }
    }
}

fn display_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// A titled block of already formatted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub icon: String,
    pub title: String,
    pub body: String,
}

impl ReportSection {
    fn new(icon: &str, title: &str, body: String) -> Self {
        Self {
            icon: icon.to_string(),
            title: title.to_string(),
            body,
        }
    }
}

/// A report ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct FormattedReport {
    pub header: ReportHeader,
    pub sections: Vec<ReportSection>,
    /// False for the "profile not yet available" report.
    pub available: bool,
}

impl FormattedReport {
    /// Report for a respondent with no recorded answers.
    pub fn unavailable(respondent: &Respondent, generated_at: DateTime<Utc>) -> Self {
        Self {
            header: ReportHeader::new(respondent, NOT_AVAILABLE_TYPE.to_string(), generated_at),
            sections: vec![ReportSection::new(
                "⏳",
                "Profile not yet available",
                format_paragraph(
                    "No answers have been recorded for this student yet. The profile \
                     will be generated once the questionnaire has been answered.",
                    RULE_WIDTH,
                ),
            )],
            available: false,
        }
    }

    #[cfg(test)]
    pub fn section(&self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.title == title)
    }
}

/// Build a report for one respondent.
///
/// Divergence indicators, teacher recommendations, the reliability
/// section and the notes are included for educators only.
pub fn build_report(
    profile: &Profile,
    respondent: &Respondent,
    verdict: Option<&ConsistencyVerdict>,
    audience: Audience,
    config: &ReportConfig,
    generated_at: DateTime<Utc>,
) -> FormattedReport {
    let width = config.wrap_width;
    let min_fragment = config.min_fragment_chars;
    let educator = audience.can_view_consistency();

    let mut sections = vec![
        ReportSection::new(
            "🎯",
            "Overall Profile",
            format_paragraph(&profile.overall_summary, width),
        ),
        ReportSection::new(
            "✨",
            "Expressive Strengths",
            format_paragraph(&profile.expressive_strengths, width),
        ),
        ReportSection::new(
            "🧠",
            "Cognitive Strengths",
            format_paragraph(&profile.cognitive_strengths, width),
        ),
    ];

    if educator {
        sections.push(ReportSection::new(
            "🔍",
            "Divergence Indicators",
            format_paragraph(&profile.divergence_indicators, width),
        ));
        sections.push(ReportSection::new(
            "👩‍🏫",
            "Recommendations for Teachers",
            format_action_list(&profile.teacher_recommendations, width, min_fragment),
        ));
    }

    sections.push(ReportSection::new(
        "💪",
        "Motivational Reinforcement",
        format_action_list(&profile.motivational_reinforcement, width, min_fragment),
    ));

    if educator {
        if let Some(verdict) = verdict {
            sections.push(ReportSection::new(
                verdict.tier.emoji(),
                "Response Reliability",
                reliability_body(verdict, width),
            ));
        }
        if config.include_notes {
            sections.push(ReportSection::new(
                "⚠️",
                "Important Notes",
                IMPORTANT_NOTES.to_string(),
            ));
        }
    }

    FormattedReport {
        header: ReportHeader::new(
            respondent,
            profile_type_label(&profile.profile_type),
            generated_at,
        ),
        sections,
        available: true,
    }
}

/// Body of the reliability section.
fn reliability_body(verdict: &ConsistencyVerdict, width: usize) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "Confidence: {:.0}%\n",
        verdict.confidence * 100.0
    ));
    body.push_str(&format!("Recommendation: {}\n", verdict.recommendation));

    if verdict.anomalies.is_empty() {
        body.push_str("• No anomalies detected");
    } else {
        let anomalies: Vec<String> = verdict
            .anomalies
            .iter()
            .map(|a| format!("• {}", a))
            .collect();
        body.push_str(&anomalies.join("\n"));
    }

    wrap_text(&body, width)
}

/// Render a report as boxed plain text.
pub fn render_text(report: &FormattedReport) -> String {
    let mut output = String::new();

    output.push_str(&generate_title_box());
    output.push_str(&generate_text_header(&report.header));

    for section in &report.sections {
        output.push_str(&generate_text_section(section));
    }

    output.push_str(&generate_text_footer());

    output
}

/// Generate the boxed title.
fn generate_title_box() -> String {
    let mut title = String::new();
    let border = "═".repeat(RULE_WIDTH);

    title.push_str(&format!("╔{}╗\n", border));
    title.push_str(&format!("║{:^width$}║\n", "LEARNING PROFILE REPORT", width = RULE_WIDTH));
    title.push_str(&format!(
        "║{:^width$}║\n",
        format!("LearnProfile v{}", env!("CARGO_PKG_VERSION")),
        width = RULE_WIDTH
    ));
    title.push_str(&format!("╚{}╝\n\n", border));

    title
}

fn section_heading(icon: &str, title: &str) -> String {
    format!("{} {}\n{}\n", icon, title.to_uppercase(), "━".repeat(RULE_WIDTH))
}

/// Generate the general information block.
fn generate_text_header(header: &ReportHeader) -> String {
    let mut section = section_heading("📊", "General Information");

    section.push_str(&format!("👤 Student: {}\n", header.respondent_name));
    section.push_str(&format!("📚 Grade: {}\n", header.grade_label));
    if header.cohort_label != header.grade_label {
        section.push_str(&format!("👥 Class: {}\n", header.cohort_label));
    }
    section.push_str(&format!(
        "📅 Report date: {}\n",
        header.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    section.push_str(&format!("🏷️  Profile type: {}\n\n", header.profile_type_label));

    section
}

fn generate_text_section(section: &ReportSection) -> String {
    let mut block = section_heading(&section.icon, &section.title);
    block.push_str(&section.body);
    block.push_str("\n\n");
    block
}

fn generate_text_footer() -> String {
    let rule = "─".repeat(RULE_WIDTH);
    format!("{}\nGenerated by LearnProfile\n{}\n", rule, rule)
}

/// Render a report as Markdown.
pub fn render_markdown(report: &FormattedReport) -> String {
    let mut output = String::new();

    output.push_str("# Learning Profile Report\n\n");
    output.push_str(&generate_metadata_section(&report.header));

    for section in &report.sections {
        output.push_str(&format!("## {} {}\n\n", section.icon, section.title));
        output.push_str(&markdown_body(&section.body));
        output.push_str("\n\n");
    }

    output.push_str(&generate_markdown_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(header: &ReportHeader) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Student:** {}\n", header.respondent_name));
    section.push_str(&format!("- **Grade:** {}\n", header.grade_label));
    if header.cohort_label != header.grade_label {
        section.push_str(&format!("- **Class:** {}\n", header.cohort_label));
    }
    section.push_str(&format!(
        "- **Report Date:** {}\n",
        header.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Profile Type:** {}\n", header.profile_type_label));
    section.push('\n');

    section
}

/// Bullet lines become Markdown list items; other lines are kept and get a
/// hard line break so the text layout survives rendering.
fn markdown_body(body: &str) -> String {
    body.lines()
        .map(|line| match line.strip_prefix("• ") {
            Some(item) => format!("- {}", item),
            None if line.starts_with(' ') => line.to_string(),
            None => format!("{}  ", line),
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

fn generate_markdown_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by LearnProfile v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}
