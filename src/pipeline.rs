//! Per-respondent pipeline: aggregate, analyze, synthesize.
//!
//! Stages run strictly in sequence for one respondent. Only the optional
//! enrichment step is async; everything else is pure.

use crate::analysis::{
    aggregate, analyze_consistency, record_answers, values_by_block, ConsistencyThresholds,
    QuestionnaireLayout,
};
use crate::cli::Audience;
use crate::config::{Config, ReportConfig};
use crate::error::AnswerError;
use crate::llm::TextGenerator;
use crate::models::{Answer, AnswerSheet, BlockStatistics, ConsistencyVerdict, Profile, Respondent};
use crate::profile::{build_enrichment_prompt, enrich, synthesize_baseline, EnrichmentStatus};
use crate::report::{build_report, FormattedReport, ProfileDigest};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info};

/// Everything derived from one answer sheet.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub respondent: Respondent,
    pub answer_count: usize,
    pub stats: Vec<BlockStatistics>,
    pub verdict: ConsistencyVerdict,
    /// `None` when the sheet has no answers yet.
    pub profile: Option<Profile>,
    pub enrichment: EnrichmentStatus,
}

impl Assessment {
    pub fn is_available(&self) -> bool {
        self.profile.is_some()
    }

    /// Build the report for this respondent.
    pub fn report(
        &self,
        audience: Audience,
        config: &ReportConfig,
        generated_at: DateTime<Utc>,
    ) -> FormattedReport {
        match &self.profile {
            Some(profile) => build_report(
                profile,
                &self.respondent,
                Some(&self.verdict),
                audience,
                config,
                generated_at,
            ),
            None => FormattedReport::unavailable(&self.respondent, generated_at),
        }
    }

    pub fn digest(&self, audience: Audience, max_chars: usize) -> Option<ProfileDigest> {
        self.profile
            .as_ref()
            .map(|profile| ProfileDigest::new(profile, audience, max_chars))
    }
}

/// Validate answers and run the deterministic stages.
fn prepare(sheet: &AnswerSheet, config: &Config) -> Result<(Assessment, Vec<Answer>), AnswerError> {
    let layout = QuestionnaireLayout::from(&config.questionnaire);
    let thresholds = ConsistencyThresholds::from(&config.analysis);

    let answers = record_answers(&layout, &sheet.raw_pairs())?;
    let stats = aggregate(&layout, &answers);
    let verdict = analyze_consistency(&layout, &stats, &answers, &thresholds);

    debug!(
        "{}: {} answers, confidence {:.2}, {} anomalies",
        sheet.respondent.name,
        answers.len(),
        verdict.confidence,
        verdict.anomaly_count
    );

    let profile = if answers.is_empty() {
        info!(
            "No answers recorded for {}, profile not yet available",
            sheet.respondent.name
        );
        None
    } else {
        Some(synthesize_baseline(&sheet.respondent, &stats))
    };

    let assessment = Assessment {
        respondent: sheet.respondent.clone(),
        answer_count: answers.len(),
        stats,
        verdict,
        profile,
        enrichment: EnrichmentStatus::Skipped,
    };

    Ok((assessment, answers))
}

/// Assess a sheet without enrichment.
pub fn assess_baseline(sheet: &AnswerSheet, config: &Config) -> Result<Assessment, AnswerError> {
    prepare(sheet, config).map(|(assessment, _)| assessment)
}

/// Assess a sheet, enriching the baseline profile when a generator is given.
///
/// Enrichment failures never surface as errors; only invalid answers do.
pub async fn assess<G: TextGenerator>(
    sheet: &AnswerSheet,
    config: &Config,
    generator: Option<&G>,
) -> Result<Assessment, AnswerError> {
    let (mut assessment, answers) = prepare(sheet, config)?;

    let Some(generator) = generator else {
        return Ok(assessment);
    };
    let Some(baseline) = assessment.profile.clone() else {
        return Ok(assessment);
    };

    let layout = QuestionnaireLayout::from(&config.questionnaire);
    let prompt = build_enrichment_prompt(&assessment.respondent, &values_by_block(&layout, &answers));
    let timeout = Duration::from_secs(config.model.timeout_seconds);

    debug!("Requesting enrichment for {}", assessment.respondent.name);
    let outcome = enrich(&baseline, generator, &prompt, timeout).await;

    assessment.profile = Some(outcome.profile);
    assessment.enrichment = outcome.status;

    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawAnswer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sheet(values: impl Fn(u32) -> i64, count: u32) -> AnswerSheet {
        AnswerSheet {
            respondent: Respondent {
                name: "Ana Clara".to_string(),
                grade_label: "7th Grade".to_string(),
                age: 12,
                cohort: None,
            },
            answers: (1..=count)
                .map(|q| RawAnswer {
                    question: q,
                    value: values(q),
                })
                .collect(),
        }
    }

    struct CountingGenerator {
        calls: AtomicUsize,
        response: &'static str,
    }

    impl CountingGenerator {
        fn new(response: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response,
            }
        }
    }

    impl TextGenerator for CountingGenerator {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.to_string())
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("Cannot connect to Ollama at http://localhost:11434"))
        }
    }

    #[test]
    fn test_baseline_assessment_of_neutral_sheet() {
        let assessment = assess_baseline(&sheet(|_| 3, 67), &Config::default()).unwrap();

        assert_eq!(assessment.answer_count, 67);
        assert_eq!(assessment.stats.len(), 7);
        assert_eq!(assessment.verdict.confidence, 0.8);
        assert_eq!(assessment.enrichment, EnrichmentStatus::Skipped);
        assert!(assessment.profile.unwrap().is_complete());
    }

    #[test]
    fn test_invalid_answer_is_an_error() {
        let result = assess_baseline(&sheet(|q| if q == 5 { 9 } else { 3 }, 67), &Config::default());
        assert!(matches!(result, Err(AnswerError::ValueOutOfRange { question: 5, .. })));
    }

    #[test]
    fn test_empty_sheet_has_no_profile() {
        let assessment = assess_baseline(&sheet(|_| 3, 0), &Config::default()).unwrap();

        assert!(!assessment.is_available());
        assert_eq!(assessment.verdict.confidence, 0.5);

        let report = assessment.report(Audience::Educator, &ReportConfig::default(), Utc::now());
        assert!(!report.available);
        assert!(assessment.digest(Audience::Educator, 150).is_none());
    }

    #[test]
    fn test_incomplete_sheet_still_gets_a_profile() {
        let assessment = assess_baseline(&sheet(|q| 2 + (q % 3) as i64, 30), &Config::default()).unwrap();

        assert!(assessment.is_available());
        assert_eq!(assessment.verdict.anomalies, vec!["Incomplete questionnaire"]);
    }

    #[tokio::test]
    async fn test_assess_with_generator_applies_enrichment() {
        let generator = CountingGenerator::new(r#"{"profile_type": "gifted"}"#);

        let assessment = assess(&sheet(|_| 5, 67), &Config::default(), Some(&generator))
            .await
            .unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(assessment.enrichment, EnrichmentStatus::Applied);
        assert_eq!(assessment.profile.unwrap().profile_type, "gifted");
    }

    #[tokio::test]
    async fn test_assess_generator_failure_keeps_baseline() {
        let config = Config::default();
        let input = sheet(|q| 2 + (q % 3) as i64, 67);

        let baseline = assess_baseline(&input, &config).unwrap();
        let enriched = assess(&input, &config, Some(&FailingGenerator)).await.unwrap();

        assert_eq!(enriched.profile, baseline.profile);
        assert!(matches!(enriched.enrichment, EnrichmentStatus::GeneratorFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_sheet_skips_generator() {
        let generator = CountingGenerator::new("{}");

        let assessment = assess(&sheet(|_| 3, 0), &Config::default(), Some(&generator))
            .await
            .unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(!assessment.is_available());
    }

    #[test]
    fn test_fixture_sheets() {
        let fixtures = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let config = Config::default();

        let ana = crate::sheets::load_sheet(&fixtures.join("ana.json")).unwrap();
        let ana = assess_baseline(&ana, &config).unwrap();
        assert_eq!(ana.verdict.confidence, 0.95);
        assert_eq!(ana.profile.unwrap().profile_type, "Creative Thinker");

        let bruno = crate::sheets::load_sheet(&fixtures.join("bruno.json")).unwrap();
        let bruno = assess_baseline(&bruno, &config).unwrap();
        assert_eq!(bruno.verdict.confidence, 0.6);
        assert!(bruno.verdict.anomalies[0].contains("(block 2)"));

        let caio = crate::sheets::load_sheet(&fixtures.join("caio.json")).unwrap();
        assert!(!assess_baseline(&caio, &config).unwrap().is_available());
    }

    #[tokio::test]
    async fn test_assess_without_generator() {
        let assessment = assess::<FailingGenerator>(&sheet(|_| 4, 67), &Config::default(), None)
            .await
            .unwrap();

        assert_eq!(assessment.enrichment, EnrichmentStatus::Skipped);
    }
}
