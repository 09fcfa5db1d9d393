use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Fallback when the provider fails without saying why
pub(crate) const NO_IMAGE_MESSAGE: &str = "No image data returned from AI or API error.";

/// Shown to callers instead of configuration details
pub(crate) const CONFIGURATION_MESSAGE: &str = "Server configuration error: API key missing or inaccessible.";

/// Image generation errors with their HTTP mapping
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Malformed or missing input from the caller
    #[error("{0}")]
    InvalidRequest(String),

    /// Server-side misconfiguration; the detail is logged, never returned
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider answered with a failure status or without an artifact
    #[error("Provider API error ({status:?}): {message:?}")]
    Provider { status: Option<u16>, message: Option<String> },

    /// The provider could not be reached or its answer could not be read
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Coarse failure class used for status mapping and logging
///
/// A provider status code is the primary signal. Matching on error text
/// only applies when no status exists and is best effort: the provider
/// does not guarantee these phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Billing,
    RateLimit,
    Upstream,
}

impl ErrorCategory {
    /// Classify a failure, preferring the status code over the message text
    pub fn classify(status: Option<u16>, text: &str) -> Self {
        status.map_or_else(|| Self::from_message(text), Self::from_status)
    }

    /// Classify by provider HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            402 => Self::Billing,
            429 => Self::RateLimit,
            _ => Self::Upstream,
        }
    }

    /// Classify by substrings of an error message
    ///
    /// Matching ignores ASCII case, so it also catches phrasings such as
    /// `Invalid API key` that an exact-case match would miss.
    pub fn from_message(text: &str) -> Self {
        let text = text.to_ascii_lowercase();

        if text.contains("invalid api key") {
            Self::Authentication
        } else if text.contains("rate limit exceeded") {
            Self::RateLimit
        } else if text.contains("insufficient_balance") {
            Self::Billing
        } else {
            Self::Upstream
        }
    }

    /// Machine-readable name for logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication_error",
            Self::Billing => "billing_error",
            Self::RateLimit => "rate_limit_error",
            Self::Upstream => "api_error",
        }
    }
}

impl ImageGenError {
    /// Failure class of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest(_) | Self::Configuration(_) => ErrorCategory::Upstream,
            Self::Provider { status, message } => ErrorCategory::classify(*status, message.as_deref().unwrap_or_default()),
            Self::Transport(detail) => ErrorCategory::classify(None, detail),
        }
    }

    /// Get the appropriate HTTP status code for this error
    ///
    /// Provider failures mirror the provider's status, including a success
    /// status that came without artifacts. A missing status becomes 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Provider { status, .. } => status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Transport(_) => match self.category() {
                ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
                ErrorCategory::Billing => StatusCode::PAYMENT_REQUIRED,
                ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
                ErrorCategory::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message that is safe to expose to API consumers
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(message) => message.clone(),
            Self::Configuration(_) => CONFIGURATION_MESSAGE.to_string(),
            Self::Provider { message, .. } => {
                let reason = message.as_deref().filter(|m| !m.is_empty()).unwrap_or(NO_IMAGE_MESSAGE);
                format!("Failed to generate image: {reason}")
            }
            Self::Transport(detail) => match self.category() {
                ErrorCategory::Authentication => "Authentication error: Invalid Stability AI API key.".to_string(),
                ErrorCategory::RateLimit => {
                    "Rate limit exceeded with Stability AI API. Please try again later.".to_string()
                }
                ErrorCategory::Billing => "Billing issue with Stability AI API. Check your account.".to_string(),
                ErrorCategory::Upstream => {
                    format!("Failed to generate image due to an unexpected server error: {detail}.")
                }
            },
        }
    }
}

/// Error body returned to the frontend
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ImageGenError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::warn!(
                status = %status,
                error_type = self.category().as_str(),
                error = %self,
                "image generation failed"
            );
        }

        (status, Json(ErrorResponse { error: self.client_message() })).into_response()
    }
}
