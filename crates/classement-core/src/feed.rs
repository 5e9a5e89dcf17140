// Match dump decoding.
//
// Accepts the three shapes the fetch side produces: a bare array of match
// objects, a raw API page (`hydra:member`), or the proxy response body
// (`matches`). Malformed items are skipped, not fatal.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::match_record::MatchRecord;

const DEFAULT_COMPETITION_NAME: &str = "Compétition";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid JSON in match dump: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected match dump shape: {0}")]
    UnexpectedShape(String),
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Decode a match dump. Empty input and `null` decode as no matches.
pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchRecord>, FeedError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(trimmed)?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("hydra:member")
            .or_else(|| obj.get("matches"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                FeedError::UnexpectedShape(
                    "object without a `hydra:member` or `matches` array".to_string(),
                )
            })?,
        other => {
            return Err(FeedError::UnexpectedShape(format!(
                "expected an array or object, got {}",
                json_kind(other)
            )))
        }
    };

    let mut matches = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match MatchRecord::deserialize(item) {
            Ok(record) => {
                if record.kickoff().is_none() {
                    debug!("match {} has no resolvable date", record.id);
                }
                matches.push(record);
            }
            Err(e) => {
                warn!("skipping malformed match #{}: {}", idx, e);
            }
        }
    }
    Ok(matches)
}

/// Read and decode a match dump file.
pub fn load_matches(path: &Path) -> Result<Vec<MatchRecord>, FeedError> {
    let raw = std::fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_matches_json(&raw)
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

// ---------------------------------------------------------------------------
// Title
// ---------------------------------------------------------------------------

/// Competition heading from the first match, e.g.
/// "U13 Niveau A - Phase 1 Poule D". Empty when there are no matches.
pub fn competition_title(matches: &[MatchRecord]) -> String {
    let Some(sample) = matches.first() else {
        return String::new();
    };
    let competition = sample
        .competition
        .as_ref()
        .and_then(|c| c.name.as_deref())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(DEFAULT_COMPETITION_NAME);
    let phase = sample
        .phase
        .as_ref()
        .and_then(|p| p.number)
        .filter(|n| *n > 0)
        .map(|n| format!("Phase {n}"));
    let poule = sample
        .poule
        .as_ref()
        .and_then(|p| p.name.as_deref())
        .filter(|n| !n.trim().is_empty())
        .map(|n| n.replacen("POULE ", "Poule ", 1));

    let suffix: Vec<String> = phase.into_iter().chain(poule).collect();
    format!("{competition} - {}", suffix.join(" "))
        .trim()
        .to_string()
}
