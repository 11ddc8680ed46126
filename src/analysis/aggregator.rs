//! Answer validation and per-block statistics.
//!
//! This module is the validation boundary for raw answers and computes
//! the descriptive statistics consumed by both the consistency analyzer
//! and the profile synthesizer.

use crate::config::QuestionnaireConfig;
use crate::error::AnswerError;
use crate::models::{Answer, BlockStatistics};
use std::collections::{BTreeMap, HashSet};

/// Shape of the questionnaire: question count, block size and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionnaireLayout {
    pub total_questions: u32,
    pub questions_per_block: u32,
    pub scale_min: u8,
    pub scale_max: u8,
}

impl Default for QuestionnaireLayout {
    fn default() -> Self {
        Self::from(&QuestionnaireConfig::default())
    }
}

impl From<&QuestionnaireConfig> for QuestionnaireLayout {
    fn from(config: &QuestionnaireConfig) -> Self {
        Self {
            total_questions: config.total_questions,
            questions_per_block: config.questions_per_block.max(1),
            scale_min: config.scale_min,
            scale_max: config.scale_max,
        }
    }
}

impl QuestionnaireLayout {
    /// Number of blocks, counting a shorter trailing block.
    pub fn block_count(&self) -> u32 {
        self.total_questions.div_ceil(self.questions_per_block)
    }

    /// Block a question belongs to.
    pub fn block_of(&self, question_index: u32) -> Result<u32, AnswerError> {
        if question_index == 0 || question_index > self.total_questions {
            return Err(AnswerError::UnknownQuestion {
                question: question_index,
                total: self.total_questions,
            });
        }
        Ok((question_index - 1) / self.questions_per_block + 1)
    }

    /// Midpoint of the answer scale, used as the empty-block default.
    pub fn midpoint(&self) -> f64 {
        (f64::from(self.scale_min) + f64::from(self.scale_max)) / 2.0
    }

    /// True for the lowest and highest scale values.
    pub fn is_extreme(&self, value: u8) -> bool {
        value == self.scale_min || value == self.scale_max
    }
}

/// Validate raw `(question_index, value)` pairs and record them as answers.
///
/// Rejects out-of-scale values, unknown questions and duplicates. The
/// returned answers are ordered by question index.
pub fn record_answers(
    layout: &QuestionnaireLayout,
    raw: &[(u32, i64)],
) -> Result<Vec<Answer>, AnswerError> {
    let mut seen = HashSet::new();
    let mut answers = Vec::with_capacity(raw.len());

    for &(question, value) in raw {
        let Some(value) = u8::try_from(value)
            .ok()
            .filter(|v| (layout.scale_min..=layout.scale_max).contains(v))
        else {
            return Err(AnswerError::ValueOutOfRange {
                question,
                value,
                min: layout.scale_min,
                max: layout.scale_max,
            });
        };

        let block_index = layout.block_of(question)?;

        if !seen.insert(question) {
            return Err(AnswerError::DuplicateQuestion(question));
        }

        answers.push(Answer {
            question_index: question,
            block_index,
            value,
        });
    }

    answers.sort_by_key(|a| a.question_index);
    Ok(answers)
}

/// Compute mean and population variance per block.
///
/// Always returns one entry per block, in block order. Blocks without
/// answers carry the scale midpoint and zero variance with
/// `sample_count == 0`.
pub fn aggregate(layout: &QuestionnaireLayout, answers: &[Answer]) -> Vec<BlockStatistics> {
    let mut grouped: BTreeMap<u32, Vec<f64>> = (1..=layout.block_count())
        .map(|b| (b, Vec::new()))
        .collect();

    for answer in answers {
        grouped
            .entry(answer.block_index)
            .or_default()
            .push(f64::from(answer.value));
    }

    grouped
        .into_iter()
        .map(|(block_index, values)| {
            if values.is_empty() {
                return BlockStatistics {
                    block_index,
                    mean: layout.midpoint(),
                    variance: 0.0,
                    sample_count: 0,
                };
            }

            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

            BlockStatistics {
                block_index,
                mean,
                variance,
                sample_count: values.len(),
            }
        })
        .collect()
}

/// Mean of a block, or `fallback` when the block is missing or empty.
pub fn block_mean_or(stats: &[BlockStatistics], block_index: u32, fallback: f64) -> f64 {
    stats
        .iter()
        .find(|s| s.block_index == block_index && !s.is_empty())
        .map(|s| s.mean)
        .unwrap_or(fallback)
}

/// Raw answer values per block, in question order. Used for prompts.
pub fn values_by_block(layout: &QuestionnaireLayout, answers: &[Answer]) -> BTreeMap<u32, Vec<u8>> {
    let mut grouped: BTreeMap<u32, Vec<u8>> = (1..=layout.block_count())
        .map(|b| (b, Vec::new()))
        .collect();

    for answer in answers {
        grouped.entry(answer.block_index).or_default().push(answer.value);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_sheet(value: i64) -> Vec<(u32, i64)> {
        (1..=67).map(|q| (q, value)).collect()
    }

    #[test]
    fn test_layout_blocks() {
        let layout = QuestionnaireLayout::default();
        assert_eq!(layout.block_count(), 7);
        assert_eq!(layout.block_of(1), Ok(1));
        assert_eq!(layout.block_of(10), Ok(1));
        assert_eq!(layout.block_of(11), Ok(2));
        assert_eq!(layout.block_of(61), Ok(7));
        assert_eq!(layout.block_of(67), Ok(7));
        assert!(layout.block_of(0).is_err());
        assert!(layout.block_of(68).is_err());
        assert_eq!(layout.midpoint(), 3.0);
    }

    #[test]
    fn test_record_answers_sorts_by_question() {
        let layout = QuestionnaireLayout::default();
        let answers = record_answers(&layout, &[(12, 4), (3, 2), (61, 5)]).unwrap();

        let order: Vec<u32> = answers.iter().map(|a| a.question_index).collect();
        assert_eq!(order, vec![3, 12, 61]);
        assert_eq!(answers[1].block_index, 2);
        assert_eq!(answers[2].block_index, 7);
    }

    #[test]
    fn test_record_answers_rejects_bad_input() {
        let layout = QuestionnaireLayout::default();

        assert_eq!(
            record_answers(&layout, &[(1, 6)]),
            Err(AnswerError::ValueOutOfRange {
                question: 1,
                value: 6,
                min: 1,
                max: 5
            })
        );
        assert_eq!(
            record_answers(&layout, &[(1, 0)]).unwrap_err(),
            AnswerError::ValueOutOfRange {
                question: 1,
                value: 0,
                min: 1,
                max: 5
            }
        );
        assert_eq!(
            record_answers(&layout, &[(2, 300)]).unwrap_err(),
            AnswerError::ValueOutOfRange {
                question: 2,
                value: 300,
                min: 1,
                max: 5
            }
        );
        assert!(matches!(
            record_answers(&layout, &[(3, -1)]),
            Err(AnswerError::ValueOutOfRange { value: -1, .. })
        ));
        assert_eq!(
            record_answers(&layout, &[(70, 3)]),
            Err(AnswerError::UnknownQuestion {
                question: 70,
                total: 67
            })
        );
        assert_eq!(
            record_answers(&layout, &[(4, 3), (4, 2)]),
            Err(AnswerError::DuplicateQuestion(4))
        );
    }

    #[test]
    fn test_aggregate_mean_and_variance() {
        let layout = QuestionnaireLayout::default();
        // Block 1: five 1s and five 5s -> mean 3, variance 4.
        let raw: Vec<(u32, i64)> = (1..=10).map(|q| (q, if q <= 5 { 1 } else { 5 })).collect();
        let answers = record_answers(&layout, &raw).unwrap();
        let stats = aggregate(&layout, &answers);

        assert_eq!(stats.len(), 7);
        assert_eq!(stats[0].block_index, 1);
        assert_eq!(stats[0].sample_count, 10);
        assert!((stats[0].mean - 3.0).abs() < 1e-9);
        assert!((stats[0].variance - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_empty_blocks_use_midpoint() {
        let layout = QuestionnaireLayout::default();
        let answers = record_answers(&layout, &[(1, 5)]).unwrap();
        let stats = aggregate(&layout, &answers);

        for block in &stats[1..] {
            assert!(block.is_empty());
            assert_eq!(block.mean, 3.0);
            assert_eq!(block.variance, 0.0);
        }
        assert_eq!(stats[0].sample_count, 1);
        assert_eq!(stats[0].mean, 5.0);
    }

    #[test]
    fn test_sample_counts_match_layout() {
        let layout = QuestionnaireLayout::default();
        let answers = record_answers(&layout, &full_sheet(3)).unwrap();
        let stats = aggregate(&layout, &answers);

        let counts: Vec<usize> = stats.iter().map(|s| s.sample_count).collect();
        assert_eq!(counts, vec![10, 10, 10, 10, 10, 10, 7]);
    }

    #[test]
    fn test_block_mean_or_ignores_empty_blocks() {
        let layout = QuestionnaireLayout::default();
        let answers = record_answers(&layout, &[(11, 5)]).unwrap();
        let stats = aggregate(&layout, &answers);

        assert_eq!(block_mean_or(&stats, 2, 3.0), 5.0);
        assert_eq!(block_mean_or(&stats, 4, 3.0), 3.0);
        assert_eq!(block_mean_or(&stats, 42, 2.5), 2.5);
    }

    #[test]
    fn test_values_by_block() {
        let layout = QuestionnaireLayout::default();
        let answers = record_answers(&layout, &[(2, 4), (1, 3), (15, 1)]).unwrap();
        let grouped = values_by_block(&layout, &answers);

        assert_eq!(grouped[&1], vec![3, 4]);
        assert_eq!(grouped[&2], vec![1]);
        assert!(grouped[&7].is_empty());
    }
}
