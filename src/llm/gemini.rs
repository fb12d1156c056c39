//! Gemini backend (API key authentication).

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::Result;

use super::{GenerateRequest, GenerationBackend, HttpReply};

/// Default base URL of the Gemini models API.
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client. The API key is supplied per request.
#[derive(Clone)]
pub struct GeminiClient {
    api_base: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    /// Create a client against the public Gemini endpoint.
    pub fn new(model: &str) -> Self {
        Self::with_base_url(GEMINI_API_URL, model)
    }

    /// Create a client against a custom base URL (proxies, local test servers).
    pub fn with_base_url(api_base: &str, model: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: Client::new(),
        }
    }

    fn build_url(&self, api_key: &str) -> Result<Url> {
        let endpoint = format!("{}/{}:generateContent", self.api_base, self.model);
        Url::parse_with_params(&endpoint, &[("key", api_key)])
            .map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", endpoint, e)))
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(&self, request: &GenerateRequest, api_key: &str) -> Result<HttpReply> {
        let url = self.build_url(api_key)?;

        info!("Calling Gemini model {}", self.model);
        debug!(
            "Prompt: {} chars, maxOutputTokens: {}",
            request.prompt().len(),
            request.generation_config.max_output_tokens
        );

        let response = self.client.post(url).json(request).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Gemini replied with status {} ({} bytes)", status, body.len());

        Ok(HttpReply { status, body })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_build_url_carries_key_as_query() {
        let client = GeminiClient::with_base_url("https://example.com/v1beta/models/", "gemini-2.0-flash");
        let url = client.build_url("a b&c").unwrap();

        assert_eq!(url.path(), "/v1beta/models/gemini-2.0-flash:generateContent");
        let key = url.query_pairs().find(|(k, _)| k == "key").map(|(_, v)| v.into_owned());
        assert_eq!(key.as_deref(), Some("a b&c"));
    }

    // Drain headers plus a Content-Length body before replying.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut data = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            data.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&data);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    /// One-shot HTTP server answering with a fixed status and body.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/models", addr)
    }

    #[tokio::test]
    async fn test_generate_returns_status_and_body() {
        let base = serve_once("429 Too Many Requests", r#"{"error":{"message":"quota exceeded"}}"#).await;
        let client = GeminiClient::with_base_url(&base, "test-model");
        let request = GenerateRequest::new("hi", GenerationConfig::KEY_CHECK);

        let reply = client.generate(&request, "key").await.unwrap();
        assert_eq!(reply.status, 429);
        assert!(reply.body.contains("quota exceeded"));
    }
}
