//! Best-effort enrichment of a baseline profile with LLM output.
//!
//! Raw generator text is unwrapped and parsed into an [`Enrichment`]; every
//! way that can go wrong collapses into `Enrichment::Invalid`, and merging
//! an invalid enrichment returns the baseline untouched. Nothing in this
//! module returns an error to its caller.

use crate::llm::TextGenerator;
use crate::models::{Profile, ProfileField};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Parsed generator output.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Valid(Map<String, Value>),
    Invalid(String),
}

impl Enrichment {
    /// Unwrap and parse raw generator text.
    pub fn parse(raw: &str) -> Self {
        let unwrapped = strip_code_fences(raw);
        if unwrapped.is_empty() {
            return Enrichment::Invalid("empty response".to_string());
        }

        let candidate = extract_json_object(unwrapped).unwrap_or(unwrapped);

        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(fields)) => Enrichment::Valid(fields),
            Ok(other) => Enrichment::Invalid(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )),
            Err(e) => Enrichment::Invalid(format!("malformed JSON: {}", e)),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Remove a wrapping Markdown code fence (with or without a language tag).
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string ("json", "JSON", ...) up to the first newline.
        text = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Slice from the first `{` to the last `}` when the text has chatter around
/// the object.
fn extract_json_object(text: &str) -> Option<&str> {
    if text.starts_with('{') && text.ends_with('}') {
        return None;
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Coerce any JSON value to plain text.
///
/// Lists become newline-joined items, mappings become `key: value` lines,
/// strings pass through, everything else is stringified.
pub fn coerce_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(coerce_to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, coerce_to_text(v)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// Overlay an enrichment onto a baseline, field by field.
///
/// A field is replaced only when the enrichment carries a non-null value
/// that is non-empty after trimming.
pub fn merge(baseline: &Profile, enrichment: &Enrichment) -> Profile {
    match enrichment {
        Enrichment::Valid(fields) => apply_fields(baseline, fields).0,
        Enrichment::Invalid(reason) => {
            warn!("Discarding enrichment, keeping baseline profile: {}", reason);
            baseline.clone()
        }
    }
}

/// Merge the usable fields and return how many were applied.
fn apply_fields(baseline: &Profile, fields: &Map<String, Value>) -> (Profile, usize) {
    let mut merged = baseline.clone();
    let mut applied = 0;

    for field in ProfileField::ALL {
        let Some(value) = fields.get(field.key()) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        let text = coerce_to_text(value);
        if text.trim().is_empty() {
            continue;
        }

        merged.set(field, text);
        applied += 1;
    }

    debug!("Applied {} of {} enrichment fields", applied, ProfileField::ALL.len());
    (merged, applied)
}

/// What happened to the enrichment attempt. Diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Enrichment disabled; baseline used.
    Skipped,
    /// Generator output parsed and merged.
    Applied,
    /// Generator did not answer in time.
    TimedOut,
    /// Generator returned an error.
    GeneratorFailed(String),
    /// Generator answered with unusable text.
    Unparseable(String),
}

impl fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrichmentStatus::Skipped => write!(f, "skipped (baseline profile)"),
            EnrichmentStatus::Applied => write!(f, "applied"),
            EnrichmentStatus::TimedOut => write!(f, "timed out (baseline profile)"),
            EnrichmentStatus::GeneratorFailed(reason) => {
                write!(f, "failed (baseline profile): {}", reason)
            }
            EnrichmentStatus::Unparseable(reason) => {
                write!(f, "unusable response (baseline profile): {}", reason)
            }
        }
    }
}

/// Result of the enrichment phase: always a complete profile.
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub profile: Profile,
    pub status: EnrichmentStatus,
}

/// Make one bounded enrichment attempt and merge its result.
///
/// Timeout, generator errors and malformed output all fall back to the
/// baseline; the reason is logged and reported in the outcome status.
pub async fn enrich<G: TextGenerator>(
    baseline: &Profile,
    generator: &G,
    prompt: &str,
    timeout: Duration,
) -> EnrichmentOutcome {
    let raw = match tokio::time::timeout(timeout, generator.generate(prompt)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!("Enrichment request failed, using baseline profile: {}", e);
            return EnrichmentOutcome {
                profile: baseline.clone(),
                status: EnrichmentStatus::GeneratorFailed(e.to_string()),
            };
        }
        Err(_) => {
            warn!(
                "Enrichment request timed out after {}s, using baseline profile",
                timeout.as_secs_f64()
            );
            return EnrichmentOutcome {
                profile: baseline.clone(),
                status: EnrichmentStatus::TimedOut,
            };
        }
    };

    let fields = match Enrichment::parse(&raw) {
        Enrichment::Valid(fields) => fields,
        Enrichment::Invalid(reason) => {
            warn!("Discarding enrichment, keeping baseline profile: {}", reason);
            return EnrichmentOutcome {
                profile: baseline.clone(),
                status: EnrichmentStatus::Unparseable(reason),
            };
        }
    };

    let (profile, applied) = apply_fields(baseline, &fields);
    if applied == 0 {
        warn!("Enrichment carried no usable fields, using baseline profile");
        return EnrichmentOutcome {
            profile,
            status: EnrichmentStatus::Unparseable("no usable fields".to_string()),
        };
    }

    info!("Enrichment applied ({} fields)", applied);
    EnrichmentOutcome {
        profile,
        status: EnrichmentStatus::Applied,
    }
}
