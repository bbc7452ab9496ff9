//! Recovering a JSON document from a model's raw text reply.
//!
//! Models are told to answer with a bare JSON object but often wrap it in a
//! markdown fence or a sentence of commentary. [`sanitize`] strips the fence
//! tokens; when the rest is not JSON on its own, the top-level balanced
//! `{...}` spans are tried in order.

use serde_json::Value;

use crate::error::{MarksheetError, MarksheetResult};

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Trim whitespace and strip a leading "```json" and trailing "```" token.
///
/// Repeats until nothing changes, so `sanitize(sanitize(s)) == sanitize(s)`.
pub fn sanitize(raw: &str) -> String {
    let mut current = raw.trim();
    loop {
        let mut next = current;
        if let Some(rest) = next.strip_prefix(FENCE_OPEN) {
            next = rest.trim();
        }
        if let Some(rest) = next.strip_suffix(FENCE_CLOSE) {
            next = rest.trim();
        }
        if next.len() == current.len() {
            return current.to_string();
        }
        current = next;
    }
}

/// Find the first `{` and its matching `}`, skipping braces inside strings.
///
/// Returns `None` when there is no opening brace or it is never closed.
pub fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    balanced_object_at(text, start)
}

/// The balanced `{...}` starting at byte `start`, which must hold a `{`.
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Try each top-level `{...}` in turn and return the first that parses.
///
/// Objects nested inside a candidate are never tried on their own, and an
/// unclosed brace ends the search.
fn first_parseable_object(text: &str) -> Option<Value> {
    let mut from = 0;
    while let Some(found) = text[from..].find('{') {
        let start = from + found;
        let candidate = balanced_object_at(text, start)?;
        if let Ok(value) = serde_json::from_str(candidate) {
            return Some(value);
        }
        from = start + candidate.len();
    }
    None
}

/// Sanitize and parse a model reply into JSON.
///
/// The whole sanitized text is parsed first and returned whatever its JSON
/// type; the brace scan only runs when that fails.
pub fn parse_model_output(raw: &str) -> MarksheetResult<Value> {
    let cleaned = sanitize(raw);
    if cleaned.is_empty() {
        return Err(MarksheetError::malformed("model returned an empty response"));
    }

    let direct = match serde_json::from_str(&cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    first_parseable_object(&cleaned).ok_or_else(|| {
        MarksheetError::malformed(format!(
            "Failed to parse model response as JSON: {}",
            direct
        ))
    })
}
