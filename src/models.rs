//! Data models for the learning-profile pipeline.
//!
//! This module contains the core data structures shared by the aggregator,
//! the consistency analyzer, the profile synthesizer and the report
//! formatter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Thematic block of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    SensoryPerception,
    AttentionFocus,
    Communication,
    Organization,
    Learning,
    SocialInteraction,
    Creativity,
}

impl Block {
    /// All blocks in questionnaire order.
    pub const ALL: [Block; 7] = [
        Block::SensoryPerception,
        Block::AttentionFocus,
        Block::Communication,
        Block::Organization,
        Block::Learning,
        Block::SocialInteraction,
        Block::Creativity,
    ];

    /// 1-based block index as used by answers and statistics.
    pub fn index(self) -> u32 {
        match self {
            Block::SensoryPerception => 1,
            Block::AttentionFocus => 2,
            Block::Communication => 3,
            Block::Organization => 4,
            Block::Learning => 5,
            Block::SocialInteraction => 6,
            Block::Creativity => 7,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.index() == index)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::SensoryPerception => write!(f, "Sensory Perception"),
            Block::AttentionFocus => write!(f, "Attention & Focus"),
            Block::Communication => write!(f, "Communication"),
            Block::Organization => write!(f, "Organization"),
            Block::Learning => write!(f, "Learning"),
            Block::SocialInteraction => write!(f, "Social Interaction"),
            Block::Creativity => write!(f, "Creativity"),
        }
    }
}

/// Display name for a block index, falling back to "Block N" for indices
/// outside the standard questionnaire.
pub fn block_name(index: u32) -> String {
    match Block::from_index(index) {
        Some(block) => block.to_string(),
        None => format!("Block {}", index),
    }
}

/// A single recorded answer. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Question number (1-indexed).
    pub question_index: u32,
    /// Thematic block the question belongs to (1-indexed).
    pub block_index: u32,
    /// Agreement value on the answer scale.
    pub value: u8,
}

/// Who answered the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respondent {
    pub name: String,
    /// School grade or year, also used as the cohort label in reports.
    pub grade_label: String,
    pub age: u32,
    /// Optional class or group identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort: Option<String>,
}

impl Respondent {
    /// Label shown in the report header.
    pub fn cohort_label(&self) -> &str {
        self.cohort.as_deref().unwrap_or(&self.grade_label)
    }
}

/// Raw `(question_index, value)` pair as submitted.
///
/// The value is kept wide so that out-of-scale answers reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnswer {
    pub question: u32,
    pub value: i64,
}

/// A submitted answer sheet: respondent metadata plus raw answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub respondent: Respondent,
    #[serde(default)]
    pub answers: Vec<RawAnswer>,
}

impl AnswerSheet {
    pub fn raw_pairs(&self) -> Vec<(u32, i64)> {
        self.answers.iter().map(|a| (a.question, a.value)).collect()
    }
}

/// Descriptive statistics for one block, recomputed on every run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockStatistics {
    pub block_index: u32,
    /// Arithmetic mean, or the scale midpoint when `sample_count == 0`.
    pub mean: f64,
    /// Population variance, or 0 when `sample_count == 0`.
    pub variance: f64,
    pub sample_count: usize,
}

impl BlockStatistics {
    /// True when the block had no answers and carries policy defaults.
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

/// Step of the confidence function a verdict landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityTier {
    Incomplete,
    HighlyReliable,
    Reliable,
    NeedsCorroboration,
    Unreliable,
}

impl ReliabilityTier {
    /// Tier for a complete questionnaire with the given anomaly count.
    pub fn from_anomaly_count(count: usize) -> Self {
        match count {
            0 => ReliabilityTier::HighlyReliable,
            1 => ReliabilityTier::Reliable,
            2 => ReliabilityTier::NeedsCorroboration,
            _ => ReliabilityTier::Unreliable,
        }
    }

    pub fn confidence(self) -> f64 {
        match self {
            ReliabilityTier::Incomplete => 0.5,
            ReliabilityTier::HighlyReliable => 0.95,
            ReliabilityTier::Reliable => 0.8,
            ReliabilityTier::NeedsCorroboration => 0.6,
            ReliabilityTier::Unreliable => 0.3,
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            ReliabilityTier::Incomplete => "Complete the questionnaire",
            ReliabilityTier::HighlyReliable => "Highly reliable profile",
            ReliabilityTier::Reliable => "Reliable profile with minor caveats",
            ReliabilityTier::NeedsCorroboration => "Corroborate with behavioral observation",
            ReliabilityTier::Unreliable => {
                "ATTENTION: Re-administer the questionnaire under supervision"
            }
        }
    }

    /// Returns an emoji representation of the tier.
    pub fn emoji(self) -> &'static str {
        match self {
            ReliabilityTier::Incomplete => "⚪",
            ReliabilityTier::HighlyReliable => "🟢",
            ReliabilityTier::Reliable => "🟡",
            ReliabilityTier::NeedsCorroboration => "🟠",
            ReliabilityTier::Unreliable => "🔴",
        }
    }
}

/// Trust verdict over one answer set. Educator-only output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyVerdict {
    /// Trust score in [0, 1].
    pub confidence: f64,
    /// Detected anomalies in detection order.
    pub anomalies: Vec<String>,
    pub recommendation: String,
    pub anomaly_count: usize,
    pub tier: ReliabilityTier,
}

impl ConsistencyVerdict {
    pub fn new(tier: ReliabilityTier, anomalies: Vec<String>) -> Self {
        Self {
            confidence: tier.confidence(),
            anomaly_count: anomalies.len(),
            anomalies,
            recommendation: tier.recommendation().to_string(),
            tier,
        }
    }
}

/// Named section of a learning profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    OverallSummary,
    ExpressiveStrengths,
    CognitiveStrengths,
    DivergenceIndicators,
    TeacherRecommendations,
    MotivationalReinforcement,
    ProfileType,
}

impl ProfileField {
    pub const ALL: [ProfileField; 7] = [
        ProfileField::OverallSummary,
        ProfileField::ExpressiveStrengths,
        ProfileField::CognitiveStrengths,
        ProfileField::DivergenceIndicators,
        ProfileField::TeacherRecommendations,
        ProfileField::MotivationalReinforcement,
        ProfileField::ProfileType,
    ];

    /// Key used in enrichment payloads and serialized profiles.
    pub fn key(self) -> &'static str {
        match self {
            ProfileField::OverallSummary => "overall_summary",
            ProfileField::ExpressiveStrengths => "expressive_strengths",
            ProfileField::CognitiveStrengths => "cognitive_strengths",
            ProfileField::DivergenceIndicators => "divergence_indicators",
            ProfileField::TeacherRecommendations => "teacher_recommendations",
            ProfileField::MotivationalReinforcement => "motivational_reinforcement",
            ProfileField::ProfileType => "profile_type",
        }
    }
}

/// A learning profile. Baseline and enriched profiles share this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub overall_summary: String,
    pub expressive_strengths: String,
    pub cognitive_strengths: String,
    pub divergence_indicators: String,
    pub teacher_recommendations: String,
    pub motivational_reinforcement: String,
    pub profile_type: String,
}

impl Profile {
    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::OverallSummary => &self.overall_summary,
            ProfileField::ExpressiveStrengths => &self.expressive_strengths,
            ProfileField::CognitiveStrengths => &self.cognitive_strengths,
            ProfileField::DivergenceIndicators => &self.divergence_indicators,
            ProfileField::TeacherRecommendations => &self.teacher_recommendations,
            ProfileField::MotivationalReinforcement => &self.motivational_reinforcement,
            ProfileField::ProfileType => &self.profile_type,
        }
    }

    pub fn set(&mut self, field: ProfileField, value: String) {
        let slot = match field {
            ProfileField::OverallSummary => &mut self.overall_summary,
            ProfileField::ExpressiveStrengths => &mut self.expressive_strengths,
            ProfileField::CognitiveStrengths => &mut self.cognitive_strengths,
            ProfileField::DivergenceIndicators => &mut self.divergence_indicators,
            ProfileField::TeacherRecommendations => &mut self.teacher_recommendations,
            ProfileField::MotivationalReinforcement => &mut self.motivational_reinforcement,
            ProfileField::ProfileType => &mut self.profile_type,
        };
        *slot = value;
    }

    /// True when every section holds non-whitespace text.
    #[cfg(test)]
    pub fn is_complete(&self) -> bool {
        ProfileField::ALL
            .iter()
            .all(|f| !self.get(*f).trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_index_round_trip() {
        for block in Block::ALL {
            assert_eq!(Block::from_index(block.index()), Some(block));
        }
        assert_eq!(Block::from_index(0), None);
        assert_eq!(Block::from_index(8), None);
    }

    #[test]
    fn test_block_name_fallback() {
        assert_eq!(block_name(2), "Attention & Focus");
        assert_eq!(block_name(9), "Block 9");
    }

    #[test]
    fn test_reliability_tier_steps() {
        assert_eq!(ReliabilityTier::from_anomaly_count(0).confidence(), 0.95);
        assert_eq!(ReliabilityTier::from_anomaly_count(1).confidence(), 0.8);
        assert_eq!(ReliabilityTier::from_anomaly_count(2).confidence(), 0.6);
        assert_eq!(ReliabilityTier::from_anomaly_count(3).confidence(), 0.3);
        assert_eq!(ReliabilityTier::from_anomaly_count(9).confidence(), 0.3);
    }

    #[test]
    fn test_verdict_counts_anomalies() {
        let verdict = ConsistencyVerdict::new(
            ReliabilityTier::NeedsCorroboration,
            vec!["a".to_string(), "b".to_string()],
        );
        assert_eq!(verdict.anomaly_count, 2);
        assert_eq!(verdict.confidence, 0.6);
        assert_eq!(verdict.recommendation, "Corroborate with behavioral observation");
    }

    #[test]
    fn test_profile_get_set() {
        let mut profile = Profile::default();
        assert!(!profile.is_complete());

        for field in ProfileField::ALL {
            profile.set(field, format!("text for {}", field.key()));
        }

        assert!(profile.is_complete());
        assert_eq!(profile.get(ProfileField::ProfileType), "text for profile_type");
    }

    #[test]
    fn test_cohort_label_prefers_cohort() {
        let mut respondent = Respondent {
            name: "Ana".to_string(),
            grade_label: "7th Grade".to_string(),
            age: 12,
            cohort: None,
        };
        assert_eq!(respondent.cohort_label(), "7th Grade");

        respondent.cohort = Some("7B".to_string());
        assert_eq!(respondent.cohort_label(), "7B");
    }
}
