/*!
 * Error types for the srtt application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation engine
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// The provider answered with a service-level error code in a successful HTTP response
    #[error("Service reported error code {code}: {message}")]
    ServiceError {
        /// Provider-specific error code
        code: String,
        /// Error message, if the provider sent one
        message: String,
    },

    /// The joined request exceeds the provider's payload ceiling
    #[error("Request payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge {
        /// Size of the joined request in bytes
        size: usize,
        /// Maximum accepted size in bytes
        limit: usize,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Build an error from a non-success HTTP status and its body
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::AuthenticationError(body),
            429 => Self::RateLimitExceeded(body),
            code => Self::ApiError { status_code: code, message: body },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The SRT content could not be parsed into entries
    #[error("Failed to parse subtitles: {0}")]
    Parse(String),

    /// Translated lines do not line up with the subtitle entries
    #[error("Expected {expected} translated lines, got {actual}")]
    LineCountMismatch {
        /// Number of subtitle entries
        expected: usize,
        /// Number of lines supplied
        actual: usize,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Window geometry that would never make progress
    #[error("Invalid window: overlap ({overlap}) must be smaller than block size ({block_size})")]
    InvalidWindow {
        /// Lines per window
        block_size: usize,
        /// Lines shared between consecutive windows
        overlap: usize,
    },

    /// Throttle settings that cannot describe a token bucket
    #[error("Invalid throttle: {0}")]
    InvalidThrottle(String),

    /// Error with subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),
}
