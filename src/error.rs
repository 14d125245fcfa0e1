// Error types for the request builder, the upstream client and the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::SearchMode;

// Rejected search input. Never forwarded upstream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("top_n must be a positive integer, got {0}")]
    NonPositiveTopN(i64),
    #[error("user location needs both latitude and longitude")]
    PartialLocation,
    #[error("user location ({latitude}, {longitude}) is outside valid coordinate ranges")]
    LocationOutOfRange { latitude: f64, longitude: f64 },
    #[error("{mode} search requires a non-empty {field}")]
    MissingIdentifier { mode: SearchMode, field: &'static str },
}

// The upstream ranking did not hold its ordering contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("recommendation at position {index} has rank {current} after rank {previous}")]
    RankOutOfOrder { index: usize, previous: u32, current: u32 },
}

// Failures talking to the prediction / recommendation API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("car id {0:?} is not a valid catalog identifier")]
    InvalidCarId(String),
}

impl ApiError {
    // Worth another attempt: transport failures and server-side errors
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Request { source, .. } => source.is_timeout() || source.is_connect(),
            ApiError::Status { status, .. } => status.is_server_error(),
            ApiError::Decode { .. } | ApiError::InvalidCarId(_) => false,
        }
    }
}

// Application error returned by the HTTP handlers
#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    BadRequest(String),
    Upstream(ApiError),
    DataIntegrity(IntegrityError),
}

// Implement conversion from anyhow::Error for easier error propagation
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::BadRequest(error.to_string())
    }
}

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        AppError::Upstream(error)
    }
}

impl From<IntegrityError> for AppError {
    fn from(error: IntegrityError) -> Self {
        AppError::DataIntegrity(error)
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Upstream(ApiError::Status { status, body, .. })
                if status.is_client_error() =>
            {
                // Client errors from upstream describe the caller's input, pass them on
                let status =
                    StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_REQUEST);
                (status, body.clone())
            }
            AppError::Upstream(e @ ApiError::InvalidCarId(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            // Upstream URLs and bodies stay in the logs
            AppError::Upstream(_) => {
                (StatusCode::BAD_GATEWAY, "Upstream service error".to_string())
            }
            AppError::DataIntegrity(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            // Log the detailed error here, don't expose internals to the client
            AppError::InternalServerError(e) => tracing::error!("Internal server error: {:?}", e),
            AppError::BadRequest(message) => tracing::warn!("Rejected request: {}", message),
            AppError::Upstream(e) => tracing::error!("Upstream API error: {}", e),
            AppError::DataIntegrity(e) => {
                tracing::error!("Upstream returned inconsistent data: {}", e)
            }
        }
        let (status, error_message) = self.status_and_message();
        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

// Define a custom Result type using our AppError
pub type AppResult<T> = Result<T, AppError>;
