use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{error_for_status, Provider, RetryPolicy};
use crate::translation::codec;
use crate::translation::engine::{EngineMode, TranslationEngine};

/// Default DeepLX endpoint (self-hosted)
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:1188/translate";

/// DeepLX client
#[derive(Debug)]
pub struct DeepLx {
    /// HTTP client for making requests
    client: Client,
    /// Full translate endpoint URL
    endpoint: String,
    /// Transport retry settings
    retry: RetryPolicy,
}

/// Translate request for the DeepLX API
#[derive(Debug, Serialize)]
pub struct DeepLxRequest {
    /// Joined text to translate
    pub text: String,
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
}

/// Translate response from the DeepLX API
#[derive(Debug, Deserialize)]
pub struct DeepLxResponse {
    /// Status code reported in the body
    #[serde(default)]
    pub code: i64,
    /// Translated text
    #[serde(default)]
    pub data: String,
    /// Alternative translations
    #[serde(default)]
    pub alternatives: Vec<String>,
    /// Request id
    #[serde(default)]
    pub id: i64,
    /// Translation method reported by the proxy
    #[serde(default)]
    pub method: String,
}

impl DeepLx {
    /// Create a new DeepLX client
    pub fn new(endpoint: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        let mut endpoint = endpoint.into();
        if endpoint.is_empty() {
            info!("No url provided, using default url: {}", DEFAULT_ENDPOINT);
            endpoint = DEFAULT_ENDPOINT.to_string();
        }

        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            endpoint,
            retry,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Check the body-level status of a DeepLX response
///
/// Older proxies omit `code`; only an explicit non-200 value is an error.
pub fn check_response(response: &DeepLxResponse) -> Result<(), ProviderError> {
    if response.code != 0 && response.code != 200 {
        return Err(ProviderError::ServiceError {
            code: response.code.to_string(),
            message: response.data.clone(),
        });
    }
    Ok(())
}

#[async_trait]
impl Provider for DeepLx {
    type Request = DeepLxRequest;
    type Response = DeepLxResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let response = self
            .retry
            .send("DeepLX", || self.client.post(&self.endpoint).json(&request))
            .await?;
        let response = error_for_status(response).await.inspect_err(|e| {
            error!("DeepLX translation failed: {}", e);
        })?;

        response
            .json::<DeepLxResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("DeepLX response: {}", e)))
    }
}

#[async_trait]
impl TranslationEngine for DeepLx {
    fn name(&self) -> &str {
        "deeplx"
    }

    fn mode(&self) -> EngineMode {
        EngineMode::Stateless
    }

    async fn translate(
        &mut self,
        segments: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let request = DeepLxRequest {
            text: codec::join(segments),
            source_lang: source_language.to_uppercase(),
            target_lang: target_language.to_uppercase(),
        };

        let response = self.complete(request).await?;
        check_response(&response)?;

        if response.data.is_empty() {
            return Ok(Vec::new());
        }
        Ok(codec::split(&response.data))
    }
}
