//! Response parsing: envelope → text, text → suggestions.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Error;
use crate::llm::{Candidate, ErrorEnvelope, GeminiResponse};
use crate::Result;

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 3;

fn numbered_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\.\s*").expect("valid numbered-line regex"))
}

fn first_candidate(raw: &str) -> Result<Candidate> {
    let response: GeminiResponse = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidResponseShape(format!("body is not valid JSON: {}", e)))?;

    response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| Error::InvalidResponseShape("no candidates in response".to_string()))
}

/// Text of the first part of the first candidate, trimmed.
pub fn extract_answer_text(raw: &str) -> Result<String> {
    first_candidate(raw)?
        .content
        .and_then(|c| c.parts)
        .and_then(|p| p.into_iter().next())
        .and_then(|p| p.text)
        .map(|t| t.trim().to_string())
        .ok_or_else(|| Error::InvalidResponseShape("first candidate has no text".to_string()))
}

/// Succeeds when the first candidate carries content, text or not.
///
/// A tiny token budget can end a valid reply before any text part is
/// produced, which still proves the key works.
pub fn ensure_candidate_content(raw: &str) -> Result<()> {
    match first_candidate(raw)?.content {
        Some(_) => Ok(()),
        None => Err(Error::InvalidResponseShape("first candidate has no content".to_string())),
    }
}

/// Up to [`MAX_SUGGESTIONS`] suggestions from a raw response body.
pub fn extract_suggestions(raw: &str) -> Result<Vec<String>> {
    let text = extract_answer_text(raw)?;
    Ok(parse_suggestions(&text))
}

/// Keep numbered lines, strip the `N.` prefix, take the first three.
pub fn parse_suggestions(text: &str) -> Vec<String> {
    let re = numbered_line();
    text.lines()
        .filter_map(|line| {
            let prefix = re.find(line)?;
            Some(line[prefix.end()..].trim().to_string())
        })
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// `error.message` from an error envelope, if present.
pub fn extract_error_message(raw: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(raw)
        .ok()?
        .error?
        .message
        .filter(|m| !m.trim().is_empty())
}
