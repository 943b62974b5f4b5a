use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{error_for_status, Provider, RetryPolicy};
use crate::translation::engine::{EngineMode, TranslationEngine};

/// Default Cloud Translation v2 endpoint
pub const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google Cloud Translation (basic edition) client
///
/// The v2 API accepts an array of strings, so lines are sent as they are
/// and no separator is involved.
#[derive(Debug)]
pub struct Google {
    client: Client,
    api_key: String,
    endpoint: String,
    retry: RetryPolicy,
}

/// Translate request body
#[derive(Debug, Serialize)]
pub struct GoogleRequest {
    /// Lines to translate
    pub q: Vec<String>,
    /// Target language
    pub target: String,
    /// Source language, omitted for auto-detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Input format
    pub format: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleTranslation {
    #[serde(rename = "translatedText")]
    pub translated_text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GoogleData {
    #[serde(default)]
    pub translations: Vec<GoogleTranslation>,
}

/// Translate response body
#[derive(Debug, Deserialize)]
pub struct GoogleResponse {
    #[serde(default)]
    pub data: GoogleData,
}

impl GoogleRequest {
    pub fn new(lines: &[String], source_language: &str, target_language: &str) -> Self {
        let source = match source_language.trim() {
            "" | "auto" => None,
            code => Some(code.to_string()),
        };
        Self {
            q: lines.to_vec(),
            target: target_language.trim().to_string(),
            source,
            format: "text".to_string(),
        }
    }
}

impl Google {
    /// Create a new Google client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
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
            api_key: api_key.into(),
            endpoint,
            retry,
        }
    }
}

#[async_trait]
impl Provider for Google {
    type Request = GoogleRequest;
    type Response = GoogleResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let response = self
            .retry
            .send("Google", || {
                self.client
                    .post(&self.endpoint)
                    .query(&[("key", self.api_key.as_str())])
                    .json(&request)
            })
            .await?;
        let response = error_for_status(response).await.inspect_err(|e| {
            error!("Google translation failed: {}", e);
        })?;

        response
            .json::<GoogleResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Google response: {}", e)))
    }
}

#[async_trait]
impl TranslationEngine for Google {
    fn name(&self) -> &str {
        "google"
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
        let request = GoogleRequest::new(segments, source_language, target_language);
        let response = self.complete(request).await?;

        if response.data.translations.is_empty() {
            info!("Google translation result is empty");
        }
        Ok(response
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect())
    }
}
