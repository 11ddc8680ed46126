//! Text formatting helpers for reports.
//!
//! All helpers are pure and deterministic. Wrapping never splits a word and
//! re-wrapping already wrapped text leaves it unchanged.

use crate::cli::Audience;
use crate::models::Profile;
use serde::{Deserialize, Serialize};

/// Placeholder for an empty narrative section.
pub const EMPTY_PARAGRAPH: &str = "• Information not available";
/// Placeholder for an empty action list.
pub const EMPTY_ACTION_LIST: &str = "• No specific strategy identified";
/// Priority recommendation used when the profile has none.
pub const DEFAULT_PRIORITY: &str = "Observe the student's learning patterns";

/// Hard cap for the priority recommendation in digests.
pub const PRIORITY_MAX_CHARS: usize = 100;

const BULLET: &str = "•";
const CONTINUATION_INDENT: &str = "  ";

/// Wrap every line of `text` to `width` columns.
///
/// Line breaks are preserved. A line that fits is only trimmed at the end;
/// a longer line is re-flowed at word boundaries, continuation lines
/// indented two spaces past the line's own indentation. A single word
/// longer than the width stays on its own line.
pub fn wrap_text(text: &str, width: usize) -> String {
    text.lines()
        .map(|line| wrap_line(line, width))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_line(line: &str, width: usize) -> String {
    let line = line.trim_end();
    if line.chars().count() <= width {
        return line.to_string();
    }

    let indent = &line[..line.len() - line.trim_start().len()];
    let continuation = format!("{}{}", indent, CONTINUATION_INDENT);

    let mut lines = Vec::new();
    let mut current = indent.to_string();
    let mut current_len = indent.chars().count();
    let mut has_word = false;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();

        if has_word && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(&continuation);
            current.push_str(word);
            current_len = continuation.chars().count() + word_len;
        } else {
            if has_word {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
        has_word = true;
    }
    lines.push(current);

    lines.join("\n")
}

/// Format a narrative section.
pub fn format_paragraph(text: &str, width: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return EMPTY_PARAGRAPH.to_string();
    }
    wrap_text(text, width)
}

/// True when a line starts with a bullet marker (`•`, `-`, `*`).
fn is_bullet_line(line: &str) -> bool {
    line.trim_start().starts_with(['•', '-', '*'])
}

/// Byte ranges of numbered markers such as `1.` or `12.`.
///
/// A marker is a run of ASCII digits followed by a period that is itself
/// followed by whitespace or the end of the text, so decimals like `4.5`
/// are not markers.
fn numbered_markers(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }

        let followed_by_period = bytes.get(i) == Some(&b'.');
        let then_space = bytes.get(i + 1).map_or(true, |b| b.is_ascii_whitespace());
        if followed_by_period && then_space {
            markers.push((start, i + 1));
            i += 1;
        }
    }

    markers
}

/// True when the text already carries bullet or numbered markers.
pub fn has_list_markers(text: &str) -> bool {
    text.lines().any(is_bullet_line) || !numbered_markers(text).is_empty()
}

/// Format a recommendation or strategy list.
///
/// Text that is already a list is only wrapped. Running prose is split on
/// `.`, `;` and line breaks; fragments shorter than `min_fragment_chars` are dropped and
/// the rest become capitalized bullet lines.
pub fn format_action_list(text: &str, width: usize, min_fragment_chars: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return EMPTY_ACTION_LIST.to_string();
    }

    if has_list_markers(text) {
        return wrap_text(text, width);
    }

    let items: Vec<String> = text
        .split(['.', ';', '\n'])
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() >= min_fragment_chars)
        .map(|fragment| format!("{} {}", BULLET, capitalize_first(fragment)))
        .collect();

    if items.is_empty() {
        return wrap_text(&format!("{} {}", BULLET, text), width);
    }

    wrap_text(&items.join("\n"), width)
}

/// Uppercase the first character; the rest is left as is.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Title-case a raw identifier: `social_butterfly` becomes `Social Butterfly`.
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Known profile types and their display labels.
///
/// Covers the baseline classifier's labels and the categories the
/// enrichment prompt asks for.
const PROFILE_TYPE_LABELS: &[(&str, &str)] = &[
    ("neurotypical", "🟢 Neurotypical"),
    ("adhd", "🔵 ADHD - Attention-Deficit/Hyperactivity Disorder"),
    ("autism", "🟡 ASD - Autism Spectrum Disorder"),
    ("asd", "🟡 ASD - Autism Spectrum Disorder"),
    ("gifted", "🟣 Giftedness/High Abilities"),
    ("dyslexia", "🟠 Dyslexia"),
    ("mixed", "🔄 Mixed Profile"),
    ("creative thinker", "🎨 Creative Thinker"),
    ("methodical organizer", "📋 Methodical Organizer"),
    ("social communicator", "💬 Social Communicator"),
    ("detail-oriented observer", "🔍 Detail-Oriented Observer"),
    ("balanced profile", "⚖️ Balanced Profile"),
];

const UNKNOWN_TYPE_TAG: &str = "🔄";

/// Display label for a raw profile type. Lookup is case-insensitive.
pub fn profile_type_label(raw: &str) -> String {
    let key = raw.trim().to_lowercase();

    if let Some((_, label)) = PROFILE_TYPE_LABELS.iter().find(|(k, _)| *k == key) {
        return label.to_string();
    }

    if key.is_empty() {
        return format!("{} Undefined", UNKNOWN_TYPE_TAG);
    }

    format!("{} {}", UNKNOWN_TYPE_TAG, title_case(raw.trim()))
}

/// First `max_chars - 3` characters followed by `...`.
fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

fn first_sentence(text: &str) -> String {
    let sentence = text.split('.').next().unwrap_or(text).trim();
    format!("{}.", sentence)
}

/// Shorten text to at most `max_chars` characters.
///
/// Text within the limit is returned unchanged; otherwise the first sentence
/// when it fits, else a hard truncation ending in `...`.
pub fn short_summary(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let sentence = first_sentence(text);
    if sentence.chars().count() <= max_chars {
        return sentence;
    }

    truncate_with_ellipsis(text, max_chars)
}

/// The first recommendation of a list, or the first sentence of prose.
pub fn priority_recommendation(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return DEFAULT_PRIORITY.to_string();
    }

    if let Some(line) = text.lines().find(|line| is_bullet_line(line)) {
        let item = line.trim_start().trim_start_matches(['•', '-', '*']).trim();
        if !item.is_empty() {
            return item.to_string();
        }
    }

    let markers = numbered_markers(text);
    if let Some(&(_, end)) = markers.first() {
        let next = markers.get(1).map_or(text.len(), |m| m.0);
        let item = text[end..next].lines().next().unwrap_or("").trim();
        if !item.is_empty() {
            return item.to_string();
        }
    }

    let sentence = first_sentence(text);
    if sentence.chars().count() < PRIORITY_MAX_CHARS {
        sentence
    } else {
        truncate_with_ellipsis(&sentence, PRIORITY_MAX_CHARS)
    }
}

/// Compact view of a profile for summary listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDigest {
    pub profile_type: String,
    pub main_strengths: String,
    /// Educator-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_indicators: Option<String>,
    /// Educator-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_recommendation: Option<String>,
}

impl ProfileDigest {
    pub fn new(profile: &Profile, audience: Audience, max_chars: usize) -> Self {
        let educator = audience.can_view_consistency();

        Self {
            profile_type: profile_type_label(&profile.profile_type),
            main_strengths: short_summary(&profile.cognitive_strengths, max_chars),
            main_indicators: educator
                .then(|| short_summary(&profile.divergence_indicators, max_chars)),
            priority_recommendation: educator
                .then(|| priority_recommendation(&profile.teacher_recommendations)),
        }
    }
}
