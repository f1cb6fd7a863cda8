use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use super::error_response::ApiError;
use super::json_body::{ASR_BODY_LIMIT, read_json_body};
use super::task::execute_task;
use crate::application::services::extract_transcript;
use crate::domain::{AudioInput, TaskRequest, TaskResult};
use crate::infrastructure::observability::sanitize_for_log;
use crate::presentation::state::AppState;

const TOO_LARGE: &str = "Request entity too large. Max 10MB allowed.";

#[derive(Debug, Serialize)]
pub struct AsrResponse {
    pub success: bool,
    pub transcribed_text: String,
    pub agent_result: TaskResult,
}

/// `POST /asr`: transcribe the audio, then run the transcript as a task.
#[tracing::instrument(skip_all)]
pub async fn asr_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<AsrResponse>, ApiError> {
    let payload = read_json_body(&headers, body, ASR_BODY_LIMIT, TOO_LARGE).await?;
    let field = |name: &str| payload.get(name).and_then(Value::as_str);

    let input = AudioInput::from_fields(
        field("audio_url"),
        field("audio_base64"),
        field("audio_format"),
    )
    .inspect_err(|e| tracing::warn!(error = %e, "Rejected ASR request"))?;

    match &input {
        AudioInput::RemoteUrl { url } => {
            tracing::info!(url = %sanitize_for_log(url), "Processing audio from URL");
        }
        AudioInput::InlineEncoded { bytes, format } => {
            tracing::info!(bytes = bytes.len(), format = %format.as_str(), "Processing inline audio");
        }
    }

    let raw = state
        .transcription_service
        .transcribe(input)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "ASR transcription failed"))?;

    let transcribed_text = extract_transcript(&raw)
        .inspect_err(|e| tracing::error!(error = %e, "Transcript extraction failed"))?;

    tracing::info!(text = %sanitize_for_log(&transcribed_text), "ASR transcription");

    let task = TaskRequest::new(transcribed_text.clone()).map_err(|e| ApiError::Internal {
        error: "Internal server error".to_string(),
        details: e.to_string(),
    })?;
    let agent_result = execute_task(&state, task).await?;

    Ok(Json(AsrResponse {
        success: true,
        transcribed_text,
        agent_result,
    }))
}
