//! Ollama client for single-shot text generation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::collaborators::TextGenerator;
use crate::error::SignalError;

/// Ollama HTTP client bound to one model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    /// Create a client for `{base_url}/api/generate`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, model: &str) -> Result<Self, SignalError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }

    /// Run a non-streaming completion of `prompt`.
    ///
    /// # Errors
    ///
    /// - [`SignalError::Timeout`] if no reply arrives within `timeout`.
    /// - [`SignalError::Generator`] on a non-2xx status, an unreadable body
    ///   or a body without a `response` field.
    /// - [`SignalError::Http`] on any other transport failure.
    pub async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, SignalError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let response = self
            .client
            .post(&self.url)
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SignalError::Timeout(timeout)
                } else {
                    SignalError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(SignalError::Generator(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SignalError::Generator(format!("Ollama response parse error: {e}")))?;

        Ok(body.response)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, SignalError> {
        self.complete(prompt, timeout).await
    }
}
