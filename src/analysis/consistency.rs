//! Response-pattern consistency analysis.
//!
//! Flags answer sets that look careless, fabricated or incomplete. The
//! checks run in a fixed order and the confidence score is a step
//! function of how many of them fire.
//!
//! Known false positive: a respondent who deliberately answers every
//! question with the same neutral value trips the repetition check, since
//! nothing in the answer set distinguishes that from inattention.

use crate::analysis::aggregator::{block_mean_or, QuestionnaireLayout};
use crate::config::AnalysisConfig;
use crate::models::{block_name, Answer, Block, BlockStatistics, ConsistencyVerdict, ReliabilityTier};
use tracing::debug;

/// Block pairs whose means are expected to move together.
pub const CORRELATED_BLOCKS: [(Block, Block); 2] = [
    (Block::AttentionFocus, Block::Organization),
    (Block::Communication, Block::SocialInteraction),
];

/// Thresholds for the consistency checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyThresholds {
    pub min_answers: usize,
    pub variance: f64,
    pub correlation: f64,
    pub extremity: f64,
    pub repetition_window: usize,
    pub max_repetitions: usize,
}

impl Default for ConsistencyThresholds {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for ConsistencyThresholds {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            min_answers: config.min_answers,
            variance: config.variance_threshold,
            correlation: config.correlation_threshold,
            extremity: config.extremity_threshold,
            repetition_window: config.repetition_window.max(2),
            max_repetitions: config.max_repetitions,
        }
    }
}

pub const INCOMPLETE_ANOMALY: &str = "Incomplete questionnaire";

/// Score how trustworthy an answer set is.
///
/// `answers` must be in question order, as returned by `record_answers`.
pub fn analyze_consistency(
    layout: &QuestionnaireLayout,
    stats: &[BlockStatistics],
    answers: &[Answer],
    thresholds: &ConsistencyThresholds,
) -> ConsistencyVerdict {
    if answers.len() < thresholds.min_answers {
        debug!(
            "Only {} of {} required answers, skipping checks",
            answers.len(),
            thresholds.min_answers
        );
        return ConsistencyVerdict::new(
            ReliabilityTier::Incomplete,
            vec![INCOMPLETE_ANOMALY.to_string()],
        );
    }

    let mut anomalies = Vec::new();

    if let Some(anomaly) = check_dispersion(stats, thresholds.variance) {
        anomalies.push(anomaly);
    }
    anomalies.extend(check_correlations(layout, stats, thresholds.correlation));
    if let Some(anomaly) = check_extremity(layout, answers, thresholds.extremity) {
        anomalies.push(anomaly);
    }
    if let Some(anomaly) = check_repetition(
        answers,
        thresholds.repetition_window,
        thresholds.max_repetitions,
    ) {
        anomalies.push(anomaly);
    }

    debug!("Consistency analysis found {} anomalies", anomalies.len());

    let tier = ReliabilityTier::from_anomaly_count(anomalies.len());
    ConsistencyVerdict::new(tier, anomalies)
}

/// Blocks with answers whose variance exceeds the threshold, in one anomaly.
fn check_dispersion(stats: &[BlockStatistics], threshold: f64) -> Option<String> {
    let variable: Vec<String> = stats
        .iter()
        .filter(|s| !s.is_empty() && s.variance > threshold)
        .map(|s| s.block_index.to_string())
        .collect();

    if variable.is_empty() {
        None
    } else {
        Some(format!("High variability in blocks: {}", variable.join(", ")))
    }
}

/// One contradiction anomaly per correlated pair whose means drift apart.
fn check_correlations(
    layout: &QuestionnaireLayout,
    stats: &[BlockStatistics],
    threshold: f64,
) -> Vec<String> {
    let midpoint = layout.midpoint();

    CORRELATED_BLOCKS
        .iter()
        .filter_map(|(a, b)| {
            let mean_a = block_mean_or(stats, a.index(), midpoint);
            let mean_b = block_mean_or(stats, b.index(), midpoint);

            if (mean_a - mean_b).abs() > threshold {
                Some(format!(
                    "Contradiction between {} (block {}) and {} (block {})",
                    block_name(a.index()),
                    a.index(),
                    block_name(b.index()),
                    b.index()
                ))
            } else {
                None
            }
        })
        .collect()
}

fn check_extremity(
    layout: &QuestionnaireLayout,
    answers: &[Answer],
    threshold: f64,
) -> Option<String> {
    if answers.is_empty() {
        return None;
    }

    let extreme = answers.iter().filter(|a| layout.is_extreme(a.value)).count();
    let fraction = extreme as f64 / answers.len() as f64;

    (fraction > threshold)
        .then(|| "Excess of extreme answers (polarized responses)".to_string())
}

/// Count sliding windows of identical values over the answer sequence.
pub fn count_identical_windows(answers: &[Answer], window: usize) -> usize {
    if window == 0 || answers.len() < window {
        return 0;
    }

    answers
        .windows(window)
        .filter(|w| w.iter().all(|a| a.value == w[0].value))
        .count()
}

fn check_repetition(answers: &[Answer], window: usize, max_runs: usize) -> Option<String> {
    let runs = count_identical_windows(answers, window);

    (runs > max_runs)
        .then(|| "Repetitive pattern detected (possible lack of attention)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::{aggregate, record_answers};

    fn analyze(raw: &[(u32, i64)]) -> ConsistencyVerdict {
        let layout = QuestionnaireLayout::default();
        let answers = record_answers(&layout, raw).unwrap();
        let stats = aggregate(&layout, &answers);
        analyze_consistency(&layout, &stats, &answers, &ConsistencyThresholds::default())
    }

    /// Varied, moderate answers: cycles 2,3,4 so no window repeats and
    /// nothing is extreme.
    fn attentive_sheet() -> Vec<(u32, i64)> {
        (1..=67).map(|q| (q, 2 + (q % 3) as i64)).collect()
    }

    #[test]
    fn test_attentive_sheet_is_highly_reliable() {
        let verdict = analyze(&attentive_sheet());

        assert!(verdict.anomalies.is_empty());
        assert_eq!(verdict.anomaly_count, 0);
        assert_eq!(verdict.confidence, 0.95);
        assert_eq!(verdict.tier, ReliabilityTier::HighlyReliable);
        assert_eq!(verdict.recommendation, "Highly reliable profile");
    }

    #[test]
    fn test_incomplete_sheet_short_circuits() {
        // 59 answers, all 1: would trip extremity and repetition if checked.
        let raw: Vec<(u32, i64)> = (1..=59).map(|q| (q, 1)).collect();
        let verdict = analyze(&raw);

        assert_eq!(verdict.anomalies, vec![INCOMPLETE_ANOMALY.to_string()]);
        assert_eq!(verdict.anomaly_count, 1);
        assert_eq!(verdict.confidence, 0.5);
        assert_eq!(verdict.recommendation, "Complete the questionnaire");
        assert_eq!(verdict.tier, ReliabilityTier::Incomplete);

        assert_eq!(analyze(&raw), verdict);
    }

    #[test]
    fn test_sixty_answers_pass_the_gate() {
        let raw: Vec<(u32, i64)> = attentive_sheet().into_iter().take(60).collect();
        let verdict = analyze(&raw);
        assert_ne!(verdict.tier, ReliabilityTier::Incomplete);
    }

    #[test]
    fn test_all_neutral_sheet_trips_repetition_only() {
        let raw: Vec<(u32, i64)> = (1..=67).map(|q| (q, 3)).collect();
        let verdict = analyze(&raw);

        assert_eq!(verdict.anomaly_count, 1);
        assert!(verdict.anomalies[0].starts_with("Repetitive pattern"));
        assert_eq!(verdict.confidence, 0.8);
        assert_eq!(verdict.tier, ReliabilityTier::Reliable);
    }

    #[test]
    fn test_count_identical_windows() {
        let layout = QuestionnaireLayout::default();
        let raw: Vec<(u32, i64)> = (1..=67).map(|q| (q, 3)).collect();
        let answers = record_answers(&layout, &raw).unwrap();
        assert_eq!(count_identical_windows(&answers, 5), 63);

        let answers = record_answers(&layout, &[(1, 2), (2, 2), (3, 2), (4, 2), (5, 2)]).unwrap();
        assert_eq!(count_identical_windows(&answers, 5), 1);
        assert_eq!(count_identical_windows(&answers, 6), 0);
    }

    #[test]
    fn test_single_run_of_five_is_tolerated() {
        let mut raw = attentive_sheet();
        for item in raw.iter_mut().take(5) {
            item.1 = 4;
        }
        let verdict = analyze(&raw);
        assert!(!verdict.anomalies.iter().any(|a| a.starts_with("Repetitive")));
    }

    #[test]
    fn test_attention_organization_contradiction() {
        // Block 2 all 5, block 4 all 1, everything else varied and moderate.
        let raw: Vec<(u32, i64)> = attentive_sheet()
            .into_iter()
            .map(|(q, v)| match q {
                11..=20 => (q, 5),
                31..=40 => (q, 1),
                _ => (q, v),
            })
            .collect();
        let verdict = analyze(&raw);

        let contradiction = verdict
            .anomalies
            .iter()
            .find(|a| a.starts_with("Contradiction"))
            .expect("contradiction anomaly");
        assert!(contradiction.contains("block 2"));
        assert!(contradiction.contains("block 4"));
        assert!(verdict.confidence <= 0.8);
    }

    #[test]
    fn test_missing_block_counts_as_midpoint_for_correlation() {
        let layout = QuestionnaireLayout::default();
        // Block 3 all 5, block 6 missing entirely (treated as 3): diff 2.0, not > 2.0.
        let raw: Vec<(u32, i64)> = attentive_sheet()
            .into_iter()
            .filter(|(q, _)| !(51..=60).contains(q))
            .map(|(q, v)| if (21..=30).contains(&q) { (q, 5) } else { (q, v) })
            .collect();
        let answers = record_answers(&layout, &raw).unwrap();
        let stats = aggregate(&layout, &answers);
        let thresholds = ConsistencyThresholds {
            min_answers: 50,
            ..ConsistencyThresholds::default()
        };
        let verdict = analyze_consistency(&layout, &stats, &answers, &thresholds);

        assert!(!verdict.anomalies.iter().any(|a| a.contains("block 6")));
    }

    #[test]
    fn test_high_variance_blocks_named_together() {
        // Blocks 1 and 5 alternate 1/5 (variance 4).
        let raw: Vec<(u32, i64)> = attentive_sheet()
            .into_iter()
            .map(|(q, v)| match q {
                1..=10 | 41..=50 => (q, if q % 2 == 0 { 1 } else { 5 }),
                _ => (q, v),
            })
            .collect();
        let verdict = analyze(&raw);

        assert!(verdict
            .anomalies
            .contains(&"High variability in blocks: 1, 5".to_string()));
    }

    #[test]
    fn test_polarized_sheet_is_unreliable() {
        // Alternating 1/5 everywhere: extreme, highly variable.
        let raw: Vec<(u32, i64)> = (1..=67).map(|q| (q, if q % 2 == 0 { 1 } else { 5 })).collect();
        let verdict = analyze(&raw);

        assert!(verdict
            .anomalies
            .iter()
            .any(|a| a.contains("polarized responses")));
        assert!(verdict.anomalies.iter().any(|a| a.starts_with("High variability")));
        assert_eq!(verdict.anomaly_count, 2);
        assert_eq!(verdict.confidence, 0.6);
    }

    #[test]
    fn test_three_or_more_anomalies_is_low_confidence() {
        // Blocks 2 and 3 all 5, blocks 4 and 6 all 1, rest all 5:
        // two contradictions, polarized, repetitive.
        let raw: Vec<(u32, i64)> = (1..=67)
            .map(|q| match q {
                31..=40 | 51..=60 => (q, 1),
                _ => (q, 5),
            })
            .collect();
        let verdict = analyze(&raw);

        assert!(verdict.anomaly_count >= 3);
        assert_eq!(verdict.confidence, 0.3);
        assert_eq!(verdict.tier, ReliabilityTier::Unreliable);
        assert!(verdict.recommendation.contains("Re-administer"));
    }
}
