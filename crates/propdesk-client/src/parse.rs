//! Lenient JSON parsing.
//!
//! Some backend deployments print warnings or debug output before the JSON
//! payload. The body is parsed as-is first; when that fails every embedded
//! `{...}` or `[...]` is tried in order and the first one that parses wins.
//! Log prefixes such as `[WARN]` are candidates too, so a failed candidate
//! never stops the scan.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse JSON from response")]
    Unparsable,

    #[error("No valid JSON found in response")]
    NotFound,
}

/// Parses a response body. An empty body is `null`.
pub fn parse_lenient(text: &str) -> Result<Value, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let mut found = false;
    for (start, candidate) in candidates(trimmed) {
        found = true;
        if let Ok(value) = serde_json::from_str(candidate) {
            tracing::debug!(skipped = start, "Recovered JSON payload from noisy response body");
            return Ok(value);
        }
    }

    Err(if found {
        ParseError::Unparsable
    } else {
        ParseError::NotFound
    })
}

/// Returns the first embedded JSON object or array in `text` that parses.
pub fn extract_json(text: &str) -> Option<&str> {
    candidates(text)
        .map(|(_, candidate)| candidate)
        .find(|candidate| serde_json::from_str::<Value>(candidate).is_ok())
}

/// Every bracket-balanced `{...}` / `[...]` span, by start position.
fn candidates(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.match_indices(['{', '['])
        .filter_map(move |(start, _)| {
            balanced_end(text, start).map(|end| (start, &text[start..=end]))
        })
}

fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                if closers.pop() != Some(c) {
                    return None;
                }
                if closers.is_empty() {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}
