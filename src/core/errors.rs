//! Error types shared by the identify and translate services

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Errors raised while serving an identify or translate request
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A required query parameter was absent or empty
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        name: String,
    },

    /// Language model string is not of the form `xx-yy`
    #[error("Malformed model code: {code:?} (expected two lowercase language codes joined by '-')")]
    MalformedModelCode {
        code: String,
    },

    /// Provider answered but proposed no candidate language
    #[error("Provider returned no candidate languages")]
    EmptyIdentification,

    /// Authentication or quota failure at the provider
    #[error("Provider rejected the request: {status} - {message}")]
    ProviderRejected {
        status: u16,
        message: String,
    },

    /// Any other non-success answer from the provider
    #[error("Provider error: {status} - {message}")]
    ProviderError {
        status: u16,
        message: String,
    },

    /// Provider body could not be decoded
    #[error("Invalid response: {message}")]
    InvalidResponse {
        message: String,
    },

    /// Network failure or timeout talking to the provider
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },
}

impl ServiceError {
    /// HTTP status this error is surfaced with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter { .. } | Self::MalformedModelCode { .. } => StatusCode::BAD_REQUEST,
            Self::EmptyIdentification => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProviderRejected { .. }
            | Self::ProviderError { .. }
            | Self::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code placed in the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } => "MISSING_PARAMETER",
            Self::MalformedModelCode { .. } => "MALFORMED_MODEL_CODE",
            Self::EmptyIdentification => "EMPTY_IDENTIFICATION",
            Self::ProviderRejected { .. } => "PROVIDER_REJECTED",
            Self::ProviderError { .. } => "PROVIDER_ERROR",
            Self::InvalidResponse { .. } => "INVALID_RESPONSE",
            Self::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Whether the failure is ours (or upstream's) rather than the caller's
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    pub(crate) fn missing(name: &str) -> Self {
        Self::MissingParameter {
            name: name.to_string(),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            ServiceError::UpstreamUnavailable {
                message: err.to_string(),
            }
        }
    }
}

/// JSON error envelope returned by the proxy services
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(error.kind = self.error_code(), "{}", self);
        } else {
            warn!(error.kind = self.error_code(), "{}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
