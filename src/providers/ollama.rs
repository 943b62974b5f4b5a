use async_trait::async_trait;
use log::{error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{error_for_status, ChatMessage, Provider, RetryPolicy};
use crate::translation::engine::ChatCompletion;

/// Default Ollama server
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model to chat with
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Transport retry settings
    retry: RetryPolicy,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    pub model: String,
    /// Messages of the conversation
    pub messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,
    /// Whether to stream the response
    pub stream: bool,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Create a new non-streaming chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            stream: false,
            keep_alive: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        match &mut self.options {
            Some(options) => options.temperature = Some(temperature),
            None => {
                self.options = Some(GenerationOptions {
                    temperature: Some(temperature),
                    num_predict: None,
                })
            }
        }
        self
    }

    /// Set the keep-alive duration
    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

/// Parse a chat body, accepting both a single object and streamed JSONL
///
/// Some servers ignore `stream: false`; their lines are concatenated in order.
pub fn parse_chat_body(body: &str) -> Result<ChatResponse, ProviderError> {
    let first_error = match serde_json::from_str::<ChatResponse>(body) {
        Ok(response) => return Ok(response),
        Err(e) => e,
    };

    let chunks: Vec<ChatResponse> = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<ChatResponse>(line).ok())
        .collect();

    if chunks.is_empty() {
        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama chat response: {}. Raw response (first 500 chars): {}", first_error, preview);
        return Err(ProviderError::ParseError(format!("Ollama chat response: {}", first_error)));
    }

    warn!("Ollama answered with {} streamed chunks, concatenating", chunks.len());
    let content: String = chunks.iter().map(|c| c.message.content.as_str()).collect();
    let last = chunks.last();
    Ok(ChatResponse {
        model: last.map(|c| c.model.clone()).unwrap_or_default(),
        message: ChatMessage::assistant(content),
        done: true,
        prompt_eval_count: last.and_then(|c| c.prompt_eval_count),
        eval_count: last.and_then(|c| c.eval_count),
    })
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        let endpoint = endpoint.into();
        let base_url = if endpoint.is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", endpoint.trim_end_matches('/'))
        };

        Self {
            base_url,
            client: Client::builder()
                .timeout(timeout)
                // Ollama speaks HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            model: model.into(),
            temperature,
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = ChatRequest;
    type Response = ChatResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .retry
            .send("Ollama", || self.client.post(&url).json(&request))
            .await?;
        let response = error_for_status(response).await.inspect_err(|e| {
            error!("Ollama API error: {}", e);
        })?;

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to get response text from Ollama API: {}", e)))?;
        parse_chat_body(&body)
    }
}

#[async_trait]
impl ChatCompletion for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<Option<ChatMessage>, ProviderError> {
        let request = ChatRequest::new(self.model.clone(), messages.to_vec()).temperature(self.temperature);
        let response = self.complete(request).await?;

        if response.message.content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(response.message))
    }
}
