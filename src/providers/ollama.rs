//! Ollama provider implementation
//!
//! Connects to a local or remote Ollama server and generates completions
//! through the non-streaming `/api/chat` endpoint.

use crate::config::OllamaConfig;
use crate::error::{Result, StoryMagicError};
use crate::providers::{CompletionOptions, CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use storymagic::config::OllamaConfig;
/// use storymagic::providers::{CompletionOptions, Message, OllamaProvider, Provider};
///
/// # async fn example() -> storymagic::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let response = provider
///     .complete(&[Message::user("Hello!")], &CompletionOptions::default())
///     .await?;
/// println!("{}", response.content());
/// # Ok(())
/// # }
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: OllamaOptions,
}

/// Sampling options in Ollama's naming
#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: Option<String>,
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("storymagic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoryMagicError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let request = OllamaRequest {
            model: &self.config.model,
            messages,
            stream: false,
            options: OllamaOptions {
                num_predict: options.max_tokens,
                temperature: options.temperature,
            },
        };

        tracing::debug!("Sending Ollama request: {} messages", messages.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                StoryMagicError::Provider(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(StoryMagicError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            StoryMagicError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: prompt_tokens={}, completion_tokens={}",
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        if ollama_response.message.content.trim().is_empty() {
            return Err(StoryMagicError::Provider("Ollama returned no content".to_string()).into());
        }

        let model = ollama_response
            .model
            .unwrap_or_else(|| self.config.model.clone());
        let mut completion =
            CompletionResponse::new(Message::assistant(ollama_response.message.content), model);

        // Ollama omits counts for cached prompts
        if ollama_response.prompt_eval_count > 0 || ollama_response.eval_count > 0 {
            completion = completion.with_usage(TokenUsage::new(
                ollama_response.prompt_eval_count,
                ollama_response.eval_count,
            ));
        }

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OllamaProvider {
        OllamaProvider::new(OllamaConfig {
            host: server.uri(),
            model: "llama3.2:latest".to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_host() {
        let provider = OllamaProvider::new(OllamaConfig::default()).unwrap();
        assert_eq!(provider.host(), "http://localhost:11434");
        assert_eq!(provider.name(), "ollama");
    }

    #[tokio::test]
    async fn test_complete_maps_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3.2:latest",
                "stream": false,
                "options": {"num_predict": 2000}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2:latest",
                "message": {"role": "assistant", "content": "The dragon smiled."},
                "done": true,
                "prompt_eval_count": 30,
                "eval_count": 5
            })))
            .mount(&server)
            .await;

        let response = provider(&server)
            .complete(&[Message::user("story")], &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(response.content(), "The dragon smiled.");
        assert_eq!(response.usage, Some(TokenUsage::new(30, 5)));
    }

    #[tokio::test]
    async fn test_complete_without_counts_has_no_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "Hi"},
                "done": true
            })))
            .mount(&server)
            .await;

        let response = provider(&server)
            .complete(&[Message::user("story")], &CompletionOptions::default())
            .await
            .unwrap();
        assert!(response.usage.is_none());
        assert_eq!(response.model, "llama3.2:latest");
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(&[Message::user("story")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
