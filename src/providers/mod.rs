/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported engines:
 * - DeepLX: self-hosted DeepL proxy
 * - Baidu: Baidu Fanyi general translation API
 * - Google: Google Cloud Translation v2 (API key)
 * - OpenAI: OpenAI-compatible chat completions
 * - Ollama: Local LLM server
 */

use async_trait::async_trait;
use log::warn;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::ProviderError;

/// Common trait for all HTTP providers
///
/// This trait defines the wire-level interface that provider implementations
/// follow; the translation engines are built on top of it.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;
}

/// Chat message shared by the chat-style providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Retry settings for provider transports
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base backoff time in milliseconds, doubled on each retry
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self { max_retries, backoff_base_ms }
    }

    /// Backoff before the given retry (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << shift))
    }

    /// Statuses worth another attempt
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::REQUEST_TIMEOUT
                | StatusCode::TOO_MANY_REQUESTS
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    }

    /// Send a request, retrying transient failures with exponential backoff
    ///
    /// `build` is called once per attempt. The final response is returned as
    /// is, whatever its status; callers decide what a failure status means.
    pub async fn send<F>(&self, label: &str, mut build: F) -> Result<Response, ProviderError>
    where
        F: FnMut() -> RequestBuilder + Send,
    {
        let mut attempt = 0;
        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if attempt < self.max_retries && Self::is_retryable_status(status) {
                        attempt += 1;
                        warn!("{} returned {} - retry {}/{}", label, status, attempt, self.max_retries);
                        tokio::time::sleep(self.backoff(attempt)).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if attempt < self.max_retries && (e.is_connect() || e.is_timeout()) {
                        attempt += 1;
                        warn!("{} network error: {} - retry {}/{}", label, e, attempt, self.max_retries);
                        tokio::time::sleep(self.backoff(attempt)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

/// Turn a non-success response into a provider error
pub async fn error_for_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    Err(ProviderError::from_status(status, body))
}

pub mod baidu;
pub mod deeplx;
pub mod google;
pub mod mock;
pub mod ollama;
pub mod openai;
