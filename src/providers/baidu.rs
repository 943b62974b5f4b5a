use async_trait::async_trait;
use log::{error, info};
use md5::{Digest, Md5};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{error_for_status, Provider, RetryPolicy};
use crate::translation::codec;
use crate::translation::engine::{EngineMode, TranslationEngine};

/// Default Baidu general translation endpoint
pub const DEFAULT_ENDPOINT: &str = "https://fanyi-api.baidu.com/api/trans/vip/translate";

/// Maximum size of the `q` parameter in bytes
pub const MAX_QUERY_BYTES: usize = 6000;

/// Error code Baidu uses for success
pub const SUCCESS_CODE: &str = "52000";

/// Baidu Fanyi client
#[derive(Debug)]
pub struct Baidu {
    /// HTTP client for API requests
    client: Client,
    /// Application id
    app_id: String,
    /// Application secret used for signing
    secret: String,
    /// API endpoint URL
    endpoint: String,
    /// Transport retry settings
    retry: RetryPolicy,
}

/// Form request for the Baidu API
#[derive(Debug, Clone, Serialize)]
pub struct BaiduRequest {
    /// Query text (UTF-8)
    pub q: String,
    /// Source language (Baidu code)
    pub from: String,
    /// Target language (Baidu code)
    pub to: String,
    /// Application id
    pub appid: String,
    /// Random salt
    pub salt: String,
    /// md5(appid + q + salt + secret)
    pub sign: String,
}

/// A single translated line
#[derive(Debug, Deserialize)]
pub struct TransResult {
    /// Source text
    pub src: String,
    /// Translated text
    pub dst: String,
}

/// Baidu response
#[derive(Debug, Deserialize)]
pub struct BaiduResponse {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    /// Translated lines, one per line of the query
    #[serde(default)]
    pub trans_result: Vec<TransResult>,
    /// Error code, sent as string or number depending on the error
    #[serde(default)]
    pub error_code: Option<serde_json::Value>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

impl BaiduResponse {
    /// Error code as a string, if one was sent
    pub fn error_code(&self) -> Option<String> {
        self.error_code.as_ref().map(|code| match code {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Map an ISO language code to the code Baidu expects
///
/// Codes Baidu spells differently are translated; anything else is passed
/// through lowercased.
pub fn map_language(code: &str) -> String {
    let code = code.trim().to_lowercase();
    let mapped = match code.as_str() {
        "ja" | "jpn" => "jp",
        "ko" | "kor" => "kor",
        "fr" | "fra" | "fre" => "fra",
        "es" | "spa" => "spa",
        "ar" | "ara" => "ara",
        "bg" | "bul" => "bul",
        "et" | "est" => "est",
        "da" | "dan" => "dan",
        "fi" | "fin" => "fin",
        "ro" | "ron" | "rum" => "rom",
        "sl" | "slv" => "slo",
        "sv" | "swe" => "swe",
        "vi" | "vie" => "vie",
        "zh-tw" | "zh-hant" | "cht" => "cht",
        "zh-cn" | "zh-hans" | "zho" | "chi" => "zh",
        "yue" => "yue",
        _ => return code,
    };
    mapped.to_string()
}

/// Compute the request signature
pub fn sign(app_id: &str, query: &str, salt: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(app_id.as_bytes());
    hasher.update(query.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl Baidu {
    /// Create a new Baidu client
    pub fn new(
        app_id: impl Into<String>,
        secret: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
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
            app_id: app_id.into(),
            secret: secret.into(),
            endpoint,
            retry,
        }
    }

    /// Build a signed request for the given query
    pub fn build_request(&self, query: String, source_language: &str, target_language: &str) -> BaiduRequest {
        let salt = rand::rng().random_range(10_000_000u32..100_000_000).to_string();
        let sign = sign(&self.app_id, &query, &salt, &self.secret);
        BaiduRequest {
            q: query,
            from: map_language(source_language),
            to: map_language(target_language),
            appid: self.app_id.clone(),
            salt,
            sign,
        }
    }
}

/// Turn a decoded response into translated lines
pub fn parse_response(response: BaiduResponse) -> Result<Vec<String>, ProviderError> {
    if let Some(code) = response.error_code() {
        if !code.is_empty() && code != SUCCESS_CODE {
            return Err(ProviderError::ServiceError {
                code,
                message: response.error_msg.unwrap_or_default(),
            });
        }
    }

    Ok(codec::strip_leaked(
        response.trans_result.into_iter().map(|line| line.dst),
    ))
}

#[async_trait]
impl Provider for Baidu {
    type Request = BaiduRequest;
    type Response = BaiduResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let response = self
            .retry
            .send("Baidu", || self.client.post(&self.endpoint).form(&request))
            .await?;
        let response = error_for_status(response).await.inspect_err(|e| {
            error!("Baidu translation failed: {}", e);
        })?;

        response
            .json::<BaiduResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Baidu response: {}", e)))
    }
}

#[async_trait]
impl TranslationEngine for Baidu {
    fn name(&self) -> &str {
        "baidu"
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
        let query = codec::join(segments);
        if query.len() > MAX_QUERY_BYTES {
            error!("Baidu translation failed: text too long ({} bytes)", query.len());
            return Err(ProviderError::PayloadTooLarge {
                size: query.len(),
                limit: MAX_QUERY_BYTES,
            });
        }

        let request = self.build_request(query, source_language, target_language);
        let response = self.complete(request).await?;
        let lines = parse_response(response).inspect_err(|e| {
            error!("Baidu translation failed: {}", e);
        })?;

        if lines.is_empty() {
            info!("Baidu translation result is empty");
        }
        Ok(lines)
    }
}
