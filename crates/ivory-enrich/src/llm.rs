//! Language model access.
//!
//! [`LlmClient`] is the seam the enrichment engine talks to; [`GeminiClient`]
//! implements it against the Gemini `generateContent` REST endpoint.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use crate::error::EnrichError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// A text-in, text-out language model.
pub trait LlmClient {
    /// Sends `prompt` and returns the model's raw text reply.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, EnrichError>>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: GEMINI_BASE_URL.to_owned(),
        })
    }

    /// Points the client at a different API host (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        base_url.trim_end_matches('/').clone_into(&mut self.base_url);
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, EnrichError> {
        let req_body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.1 }
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&req_body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let message = response.text().await.unwrap_or_default();
            return Err(EnrichError::Quota(truncate(&message)));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EnrichError::Api {
                status: status.as_u16(),
                message: truncate(&message),
            });
        }

        let body: Value = response.json().await?;
        body.get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or(EnrichError::EmptyResponse)
    }
}

/// Keeps error bodies short enough for a log line.
fn truncate(message: &str) -> String {
    const MAX_CHARS: usize = 300;
    message.chars().take(MAX_CHARS).collect()
}
