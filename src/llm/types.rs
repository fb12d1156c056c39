//! Wire types for the Gemini `generateContent` endpoint.
//!
//! Response types are deliberately permissive (every level optional) so that
//! a malformed envelope surfaces as `InvalidResponseShape` from the parser
//! rather than as a JSON error.

use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling randomness, 0.0–1.0.
    pub temperature: f64,
    /// Vocabulary restriction size.
    pub top_k: u32,
    /// Cumulative-probability cutoff.
    pub top_p: f64,
    /// Hard output length cap.
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Defaults for single-answer mode.
    pub const ANSWER: Self = Self {
        temperature: 0.8,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 2048,
    };

    /// Defaults for three-suggestion mode.
    pub const SUGGESTIONS: Self = Self {
        temperature: 0.9,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 1024,
    };

    /// Low-token settings for the API key check.
    pub const KEY_CHECK: Self = Self {
        temperature: 0.0,
        top_k: 1,
        top_p: 1.0,
        max_output_tokens: 10,
    };
}

/// Request body: `{contents:[{parts:[{text}]}], generationConfig:{..}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    /// Wrap a single prompt.
    pub fn new(prompt: impl Into<String>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
            generation_config,
        }
    }

    /// Text of the first part, if any.
    pub fn prompt(&self) -> &str {
        self.contents
            .first()
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub text: String,
}

/// Top-level success envelope.
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    pub candidates: Option<Vec<Candidate>>,
}

/// A single generated candidate.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

/// Error envelope: `{error:{message}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}
