use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use trtc_client::ClientError;

use crate::metrics::Outcome;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed, check SecretId, SecretKey and SdkAppId")]
    AuthFailure,

    #[error("Parameter error: {0}")]
    InvalidParameter(String),

    #[error("Request rate limit exceeded, please try again later")]
    RateLimitExceeded,

    #[error("No audio data received, check credentials and parameters")]
    NoAudio,

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Synthesis timed out after {0} seconds")]
    Timeout(u64),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn outcome(&self) -> Outcome {
        match self {
            ApiError::InvalidInput(_) => Outcome::InvalidInput,
            ApiError::AuthFailure => Outcome::AuthFailure,
            ApiError::InvalidParameter(_) => Outcome::InvalidParameter,
            ApiError::RateLimitExceeded => Outcome::RateLimited,
            ApiError::NoAudio => Outcome::NoAudio,
            ApiError::Timeout(_) => Outcome::Timeout,
            ApiError::SynthesisFailed(_) | ApiError::InternalError(_) => Outcome::Failed,
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(e: ClientError) -> Self {
        if e.is_timeout() {
            return ApiError::SynthesisFailed(format!("remote call timed out: {e}"));
        }
        match e {
            ClientError::AuthFailure(_) => ApiError::AuthFailure,
            ClientError::InvalidParameter(text) => ApiError::InvalidParameter(text),
            ClientError::RateLimited(_) => ApiError::RateLimitExceeded,
            ClientError::NoAudio => ApiError::NoAudio,
            other => ApiError::SynthesisFailed(other.to_string()),
        }
    }
}

// Malformed body or a field of the wrong type
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidInput(_) | ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthFailure => StatusCode::UNAUTHORIZED,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NoAudio | ApiError::SynthesisFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error_message = self.to_string();
        if status.is_server_error() {
            tracing::error!("{}", error_message);
        } else {
            tracing::warn!("{}", error_message);
        }

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
