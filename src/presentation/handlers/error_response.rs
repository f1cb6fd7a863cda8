use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::{AsrError, BackendError};
use crate::application::services::ExtractionError;
use crate::domain::AudioInputError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Every way a request can end without a success payload.
#[derive(Debug)]
pub enum ApiError {
    PayloadTooLarge(&'static str),
    InvalidJson,
    BadRequest(String),
    NotFound,
    TaskFailed(String),
    Internal { error: String, details: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidJson | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::TaskFailed(_) | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn into_body(self) -> ErrorResponse {
        let (error, details) = match self {
            ApiError::PayloadTooLarge(message) => (message.to_string(), None),
            ApiError::InvalidJson => ("Invalid JSON in request".to_string(), None),
            ApiError::BadRequest(message) => (message, None),
            ApiError::NotFound => ("Endpoint not found".to_string(), None),
            ApiError::TaskFailed(details) => ("Task execution failed".to_string(), Some(details)),
            ApiError::Internal { error, details } => (error, Some(details)),
        };
        ErrorResponse { error, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}

impl From<AudioInputError> for ApiError {
    fn from(e: AudioInputError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<AsrError> for ApiError {
    fn from(e: AsrError) -> Self {
        ApiError::Internal {
            error: "ASR transcription failed".to_string(),
            details: e.to_string(),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(e: ExtractionError) -> Self {
        let error = e.to_string();
        match e {
            ExtractionError::EmptyTranscript { raw } => ApiError::Internal {
                error,
                details: raw,
            },
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        ApiError::Internal {
            error: "Internal server error".to_string(),
            details: e.to_string(),
        }
    }
}
