//! Generation backend abstraction.
//!
//! This module provides:
//! - [`GenerationBackend`] trait: one POST to the generation endpoint
//! - [`GeminiClient`]: the reqwest implementation
//! - Wire types shared by the prompt builder and the response parser
//!
//! Backends return the raw [`HttpReply`]; status classification and body
//! parsing live in [`crate::service::AnswerService`] so they behave the same
//! for every backend, including the fake one used in tests.

mod types;

pub mod gemini;

use async_trait::async_trait;

use crate::Result;

pub use gemini::{GeminiClient, GEMINI_API_URL};
pub use types::*;

/// Raw HTTP outcome of a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status.
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Generation backend trait — sends exactly one request, never retries.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// POST the request, authenticated with `api_key`.
    async fn generate(&self, request: &GenerateRequest, api_key: &str) -> Result<HttpReply>;

    /// Model the backend talks to.
    fn model(&self) -> &str;
}

/// Fake backend for testing: replays canned replies and records requests.
#[cfg(test)]
pub struct FakeBackend {
    replies: std::sync::Mutex<std::collections::VecDeque<HttpReply>>,
    requests: std::sync::Mutex<Vec<(GenerateRequest, String)>>,
}

#[cfg(test)]
impl FakeBackend {
    pub fn new(replies: Vec<HttpReply>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Successful reply wrapping `text` in a Gemini envelope.
    pub fn text(text: &str) -> HttpReply {
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        });
        HttpReply::new(200, body.to_string())
    }

    /// Requests seen so far, with the API key they were sent with.
    pub fn requests(&self) -> Vec<(GenerateRequest, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn generate(&self, request: &GenerateRequest, api_key: &str) -> Result<HttpReply> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), api_key.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| crate::Error::Other("No more fake replies".to_string()))
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}
