//! Answer service — prompt, one request, classified result.

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::llm::{GenerateRequest, GenerationBackend, GenerationConfig, HttpReply};
use crate::{parser, prompt, Result};

/// Generation parameters for both modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeSettings {
    pub answer: GenerationConfig,
    pub suggestions: GenerationConfig,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            answer: GenerationConfig::ANSWER,
            suggestions: GenerationConfig::SUGGESTIONS,
        }
    }
}

/// Orchestrates prompt building, the request and response parsing.
pub struct AnswerService<B: GenerationBackend> {
    backend: B,
    settings: ModeSettings,
}

impl<B: GenerationBackend> AnswerService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, ModeSettings::default())
    }

    pub fn with_settings(backend: B, settings: ModeSettings) -> Self {
        Self { backend, settings }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Turn a short answer into a full reply to the client.
    pub async fn generate_answer(
        &self,
        short_answer: &str,
        client_message: &str,
        credential: &str,
    ) -> Result<String> {
        let request = prompt::build_answer_prompt(client_message, short_answer, self.settings.answer);
        info!("Generating answer with {}", self.backend.model());

        let reply = self.send(&request, credential).await?;
        let text = parser::extract_answer_text(&reply.body)?;
        debug!("Answer: {} chars", text.len());
        Ok(text)
    }

    /// Produce up to three short reply suggestions.
    pub async fn generate_suggestions(
        &self,
        client_message: &str,
        credential: &str,
    ) -> Result<Vec<String>> {
        let request = prompt::build_suggestions_prompt(client_message, self.settings.suggestions);
        info!("Generating suggestions with {}", self.backend.model());

        let reply = self.send(&request, credential).await?;
        let suggestions = parser::extract_suggestions(&reply.body)?;
        if suggestions.len() < parser::MAX_SUGGESTIONS {
            warn!("Model returned only {} suggestion(s)", suggestions.len());
        }
        Ok(suggestions)
    }

    /// Check a key with a minimal request.
    pub async fn test_credential(&self, candidate: &str) -> Result<()> {
        let request = prompt::build_key_check_request();
        info!("Testing API key against {}", self.backend.model());

        let reply = self.send(&request, candidate).await?;
        parser::ensure_candidate_content(&reply.body)
    }

    async fn send(&self, request: &GenerateRequest, credential: &str) -> Result<HttpReply> {
        if credential.trim().is_empty() {
            return Err(Error::MissingCredential);
        }

        let reply = self.backend.generate(request, credential).await?;
        if !reply.is_success() {
            let message = parser::extract_error_message(&reply.body)
                .unwrap_or_else(|| format!("Request failed with status {}", reply.status));
            warn!("Generation failed with status {}: {}", reply.status, message);
            return Err(Error::Upstream {
                status: reply.status,
                message,
            });
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeBackend;

    #[tokio::test]
    async fn test_generate_answer() {
        let backend = FakeBackend::new(vec![FakeBackend::text("Friday at 5pm works for me.")]);
        let service = AnswerService::new(backend);

        let answer = service
            .generate_answer("friday 5pm", "When can you deliver?", "key-1")
            .await
            .unwrap();
        assert_eq!(answer, "Friday at 5pm works for me.");

        let requests = service.backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, "key-1");
        assert!(requests[0].0.prompt().contains("When can you deliver?"));
        assert_eq!(requests[0].0.generation_config, GenerationConfig::ANSWER);
    }

    #[tokio::test]
    async fn test_upstream_error_carries_message() {
        let backend = FakeBackend::new(vec![HttpReply::new(
            429,
            r#"{"error":{"message":"quota exceeded"}}"#,
        )]);
        let service = AnswerService::new(backend);

        let err = service.generate_answer("ok", "hi", "key").await.unwrap_err();
        match err {
            Error::Upstream { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_error_generic_fallback() {
        let backend = FakeBackend::new(vec![HttpReply::new(502, "<html>Bad Gateway</html>")]);
        let service = AnswerService::new(backend);

        let err = service.generate_suggestions("hi", "key").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Upstream { status: 502, ref message } if message == "Request failed with status 502"
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        let service = AnswerService::new(FakeBackend::new(vec![]));

        let err = service.generate_answer("ok", "hi", "  ").await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
        assert!(service.backend.requests().is_empty());
    }

    #[test]
    fn test_blank_key_is_missing_credential() {
        let service = AnswerService::new(FakeBackend::new(vec![]));
        let result = tokio_test::block_on(service.test_credential("\t"));
        assert!(matches!(result, Err(Error::MissingCredential)));
    }

    #[tokio::test]
    async fn test_malformed_success_is_invalid_shape() {
        let backend = FakeBackend::new(vec![HttpReply::new(200, r#"{"usageMetadata":{}}"#)]);
        let service = AnswerService::new(backend);

        let err = service.generate_answer("ok", "hi", "key").await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponseShape(_)));
    }

    #[tokio::test]
    async fn test_generate_suggestions_uses_suggestion_settings() {
        let backend = FakeBackend::new(vec![FakeBackend::text("1. Yes.\n2. No.")]);
        let service = AnswerService::new(backend);

        let suggestions = service.generate_suggestions("Rate?", "key").await.unwrap();
        assert_eq!(suggestions, vec!["Yes.", "No."]);
        assert_eq!(
            service.backend.requests()[0].0.generation_config,
            GenerationConfig::SUGGESTIONS
        );
    }

    #[tokio::test]
    async fn test_custom_settings_are_sent() {
        let settings = ModeSettings {
            answer: GenerationConfig {
                temperature: 0.2,
                ..GenerationConfig::ANSWER
            },
            ..ModeSettings::default()
        };
        let backend = FakeBackend::new(vec![FakeBackend::text("done")]);
        let service = AnswerService::with_settings(backend, settings);

        service.generate_answer("a", "b", "key").await.unwrap();
        assert_eq!(service.backend.requests()[0].0.generation_config.temperature, 0.2);
    }

    #[tokio::test]
    async fn test_credential_outcomes() {
        let backend = FakeBackend::new(vec![
            FakeBackend::text("OK"),
            HttpReply::new(400, r#"{"error":{"message":"API key not valid"}}"#),
            HttpReply::new(200, r#"{"candidates":[]}"#),
            HttpReply::new(200, r#"{"candidates":[{"content":{"role":"model"},"finishReason":"MAX_TOKENS"}]}"#),
        ]);
        let service = AnswerService::new(backend);

        assert!(service.test_credential("good").await.is_ok());
        assert!(matches!(
            service.test_credential("bad").await,
            Err(Error::Upstream { status: 400, .. })
        ));
        assert!(matches!(
            service.test_credential("odd").await,
            Err(Error::InvalidResponseShape(_))
        ));
        assert!(service.test_credential("cut-short").await.is_ok());
        assert!(matches!(service.test_credential("").await, Err(Error::MissingCredential)));
    }
}
