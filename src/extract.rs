//! Best-effort recovery of a JSON payload from a model reply.
//!
//! Assistant replies are supposed to be bare JSON but routinely arrive
//! wrapped in prose or markdown fences. This module normalizes the reply to
//! plain text, tries a strict parse, and falls back to scanning for the
//! first balanced top-level object or array literal. Extraction either
//! fully succeeds or fully fails; there are no retries and no partial
//! results. Schema conformance of the recovered value is advisory and is
//! not enforced here.

use serde_json::Value;
use thiserror::Error;

/// Raw reply from the language-model provider.
///
/// Providers expose the generated text under different shapes; this closed
/// set covers the ones we accept, in normalization order.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Direct text content of the primary candidate
    Content(String),
    /// Keyed payload that may carry the text under a `content` entry
    Keyed(serde_json::Map<String, Value>),
    /// Bare text field
    Text(String),
    /// Anything else; stringified as a last resort
    Raw(Value),
}

impl ModelReply {
    /// Flatten the reply to plain text with fixed fallback precedence:
    /// direct content, then a `content` key, then a `text` key, then a
    /// string rendering of the whole payload.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            ModelReply::Content(text) | ModelReply::Text(text) => text,
            ModelReply::Keyed(map) => match map.get("content") {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => match map.get("text") {
                    Some(Value::String(text)) => text.clone(),
                    _ => Value::Object(map).to_string(),
                },
                Some(other) => other.to_string(),
            },
            ModelReply::Raw(Value::String(text)) => text,
            ModelReply::Raw(other) => other.to_string(),
        }
    }
}

/// Why extraction failed. Carries the offending text for diagnostic logging.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The assistant returned nothing (or only whitespace)
    #[error("assistant returned an empty reply")]
    EmptyReply,

    /// A JSON-looking span was found but did not parse
    #[error("assistant reply contained invalid JSON: {source}")]
    InvalidJson {
        /// Normalized reply text, for server-side logging
        raw: String,
        source: serde_json::Error,
    },

    /// The reply contained no object or array literal at all
    #[error("assistant reply contained no JSON payload")]
    NoJsonFound {
        /// Normalized reply text, for server-side logging
        raw: String,
    },
}

impl ExtractionError {
    /// The normalized reply text that caused the failure, if any was seen
    #[must_use]
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            ExtractionError::EmptyReply => None,
            ExtractionError::InvalidJson { raw, .. } | ExtractionError::NoJsonFound { raw } => {
                Some(raw)
            }
        }
    }
}

/// Recover the JSON payload from a model reply.
///
/// The returned value is whatever parsed, verbatim; callers project it onto
/// the expected shape separately.
pub fn extract(reply: ModelReply) -> Result<Value, ExtractionError> {
    let text = reply.into_text();
    let text = text.trim();

    if text.is_empty() {
        return Err(ExtractionError::EmptyReply);
    }

    // Happy path: the reply is bare JSON.
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    let Some(start) = text.find(['{', '[']) else {
        return Err(ExtractionError::NoJsonFound {
            raw: text.to_string(),
        });
    };

    // First balanced span if there is one, otherwise everything from the
    // opener so the parser reports what is wrong with it.
    let candidate = balanced_span(&text[start..]).unwrap_or(&text[start..]);

    serde_json::from_str(candidate).map_err(|source| ExtractionError::InvalidJson {
        raw: text.to_string(),
        source,
    })
}

/// Return the first balanced top-level `{...}` or `[...]` span of `text`.
///
/// `text` must start at an opening delimiter. The scan is a single bounded
/// pass tracking nesting depth, skipping over string literals and escape
/// sequences so braces inside strings don't count. Returns `None` when the
/// opener is never closed.
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (pos, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=pos]);
                }
            }
            _ => {}
        }
    }

    None
}
