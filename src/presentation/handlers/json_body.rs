use axum::body::Body;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_LENGTH;
use http_body_util::LengthLimitError;
use serde_json::Value;

use super::error_response::ApiError;

pub const TASK_BODY_LIMIT: usize = 1024 * 1024;
pub const ASR_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Reads at most `limit` bytes of body and parses them as JSON.
///
/// A declared `Content-Length` over the limit is refused before any byte is read.
pub async fn read_json_body(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
    too_large: &'static str,
) -> Result<Value, ApiError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    if let Some(length) = declared.filter(|length| *length > limit as u64) {
        tracing::warn!(length, limit, "Declared body length over limit");
        return Err(ApiError::PayloadTooLarge(too_large));
    }

    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        let source = e.into_inner();
        if is_length_limit(source.as_ref()) {
            tracing::warn!(limit, "Streamed body over limit");
            ApiError::PayloadTooLarge(too_large)
        } else {
            tracing::warn!(error = %source, "Failed to read request body");
            ApiError::BadRequest("Failed to read request body".to_string())
        }
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::warn!(error = %e, "Request body is not valid JSON");
        ApiError::InvalidJson
    })
}

fn is_length_limit(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
