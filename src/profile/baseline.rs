//! Deterministic baseline profile.
//!
//! The baseline is derived from block statistics alone and never fails.
//! Every section is filled from a template, with generic phrasing when no
//! strengths stand out.

use crate::models::{block_name, Block, BlockStatistics, Profile, Respondent};

/// Mean at or above which a block counts as a strength.
pub const STRENGTH_THRESHOLD: f64 = 4.0;
/// Mean at or below which a block counts as a challenge.
pub const CHALLENGE_THRESHOLD: f64 = 2.0;

/// Profile type used when no rule matches.
pub const DEFAULT_PROFILE_TYPE: &str = "Balanced Profile";

/// Strength and challenge blocks for one respondent, in block order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockClassification {
    pub strengths: Vec<u32>,
    pub challenges: Vec<u32>,
}

impl BlockClassification {
    pub fn has_strength(&self, block: Block) -> bool {
        self.strengths.contains(&block.index())
    }

    pub fn strength_names(&self) -> Vec<String> {
        self.strengths.iter().map(|b| block_name(*b)).collect()
    }

    pub fn challenge_names(&self) -> Vec<String> {
        self.challenges.iter().map(|b| block_name(*b)).collect()
    }
}

/// Classify blocks with answers as strengths or challenges.
pub fn classify_blocks(stats: &[BlockStatistics]) -> BlockClassification {
    let mut classification = BlockClassification::default();

    for block in stats.iter().filter(|s| !s.is_empty()) {
        if block.mean >= STRENGTH_THRESHOLD {
            classification.strengths.push(block.block_index);
        } else if block.mean <= CHALLENGE_THRESHOLD {
            classification.challenges.push(block.block_index);
        }
    }

    classification
}

/// One entry of the profile-type rule table.
#[derive(Clone, Copy)]
pub struct ProfileRule {
    pub label: &'static str,
    pub matches: fn(&BlockClassification) -> bool,
}

fn creative_thinker(c: &BlockClassification) -> bool {
    c.has_strength(Block::Creativity) && c.has_strength(Block::Learning)
}

fn methodical_organizer(c: &BlockClassification) -> bool {
    c.has_strength(Block::Organization) && c.has_strength(Block::AttentionFocus)
}

fn social_communicator(c: &BlockClassification) -> bool {
    c.has_strength(Block::Communication) && c.has_strength(Block::SocialInteraction)
}

fn detail_oriented_observer(c: &BlockClassification) -> bool {
    c.has_strength(Block::SensoryPerception)
}

/// Profile-type rules, evaluated top-down; the first match wins.
pub const PROFILE_RULES: [ProfileRule; 4] = [
    ProfileRule {
        label: "Creative Thinker",
        matches: creative_thinker,
    },
    ProfileRule {
        label: "Methodical Organizer",
        matches: methodical_organizer,
    },
    ProfileRule {
        label: "Social Communicator",
        matches: social_communicator,
    },
    ProfileRule {
        label: "Detail-Oriented Observer",
        matches: detail_oriented_observer,
    },
];

pub fn classify_profile_type(classification: &BlockClassification) -> &'static str {
    PROFILE_RULES
        .iter()
        .find(|rule| (rule.matches)(classification))
        .map(|rule| rule.label)
        .unwrap_or(DEFAULT_PROFILE_TYPE)
}

/// Join names, or use `fallback` when there are none.
fn list_or(names: &[String], fallback: &str) -> String {
    if names.is_empty() {
        fallback.to_string()
    } else {
        names.join(", ")
    }
}

/// Join the first `n` names when at least `n` exist, else `fallback`.
fn leading_or(names: &[String], n: usize, fallback: &str) -> String {
    if names.len() >= n {
        names[..n].join(", ")
    } else {
        fallback.to_string()
    }
}

/// Build the baseline profile for a respondent.
pub fn synthesize_baseline(respondent: &Respondent, stats: &[BlockStatistics]) -> Profile {
    let classification = classify_blocks(stats);
    let strengths = classification.strength_names();
    let challenges = classification.challenge_names();

    let overall_summary = format!(
        "{} ({}) presents a learning profile with marked characteristics in {}. \
         Their strengths include {}, which indicates significant potential for \
         academic development.",
        respondent.name,
        respondent.grade_label,
        list_or(&strengths, "multiple areas"),
        list_or(&strengths, "a diversified set of skills"),
    );

    let expressive_strengths = format!(
        "The student expresses themselves most easily through {}. Offering varied \
         opportunities for expression helps them reach their communicative potential.",
        leading_or(&strengths, 2, "different modalities"),
    );

    let cognitive_strengths = format!(
        "The areas of greatest cognitive strength are {}. The profile favors learning \
         activities that draw on these competencies.",
        list_or(&strengths, "balanced across different domains"),
    );

    let divergence_indicators = if challenges.is_empty() {
        "The responses indicate a typical profile with individual learning \
         characteristics that should be considered in pedagogical planning."
            .to_string()
    } else {
        format!(
            "The responses point to areas that may need additional support: {}. \
             These are indicators only and require confirmation through pedagogical \
             observation and, where appropriate, specialist assessment.",
            challenges.join(", "),
        )
    };

    let mut teacher_recommendations = format!(
        "1. Build on strengths in {}. 2. Offer diversified activities. \
         3. Respect the individual learning pace. 4. Promote self-confidence \
         through positive feedback.",
        list_or(
            &strengths[..strengths.len().min(3)],
            "multiple areas"
        ),
    );
    if !challenges.is_empty() {
        teacher_recommendations.push_str(&format!(
            " 5. Provide structured support in {}.",
            challenges.join(", ")
        ));
    }

    let motivational_reinforcement = format!(
        "You have unique and special talents! Keep exploring your skills in {} \
         and always believe in your potential!",
        leading_or(&strengths, 2, "different areas"),
    );

    Profile {
        overall_summary,
        expressive_strengths,
        cognitive_strengths,
        divergence_indicators,
        teacher_recommendations,
        motivational_reinforcement,
        profile_type: classify_profile_type(&classification).to_string(),
    }
}
