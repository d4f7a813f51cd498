use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Extraction(msg) => Self::ValidationError(format!("invalid document: {msg}")),
            AppError::Validation(msg) => Self::ValidationError(msg),
            AppError::NotFound(msg) => Self::NotFound(msg),
            AppError::OpenAI(err) => {
                tracing::error!("Upstream OpenAI error: {:?}", err);
                Self::UpstreamError(err.to_string())
            }
            AppError::Embedding(msg) => {
                tracing::error!("Upstream embedding error: {msg}");
                Self::UpstreamError(msg)
            }
            // A topic failure is classified by its root cause, with the
            // topic kept in the client-visible message.
            AppError::Rag { topic, source } => Self::from(*source).for_topic(&topic),
            _ => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError("Internal server error".to_string())
            }
        }
    }
}

impl ApiError {
    fn for_topic(self, topic: &str) -> Self {
        match self {
            Self::ValidationError(msg) => Self::ValidationError(format!("topic '{topic}': {msg}")),
            Self::NotFound(msg) => Self::NotFound(format!("topic '{topic}': {msg}")),
            Self::UpstreamError(msg) => Self::UpstreamError(format!("topic '{topic}': {msg}")),
            Self::PayloadTooLarge(msg) => Self::PayloadTooLarge(format!("topic '{topic}': {msg}")),
            Self::InternalError(msg) => Self::InternalError(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::InternalError(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::UpstreamError(message) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
            Self::PayloadTooLarge(message) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse {
                    error: message,
                    status: "error".to_string(),
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}
