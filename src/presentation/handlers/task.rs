use axum::Json;
use axum::body::Body;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use super::error_response::ApiError;
use super::json_body::{TASK_BODY_LIMIT, read_json_body};
use crate::domain::{TaskRequest, TaskResult};
use crate::infrastructure::observability::sanitize_for_log;
use crate::presentation::state::AppState;

const TOO_LARGE: &str = "Request entity too large";
const MISSING_TASK_PARAMETER: &str =
    "Missing task parameter. Please provide task in query string or path.";
const MISSING_TASK_FIELD: &str = "Missing \"task\" field in request";

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub result: String,
    pub details: String,
}

type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// `GET /task?task=...`
#[tracing::instrument(skip_all)]
pub async fn task_query_handler(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<TaskResponse>, ApiError> {
    respond_to_task(&state, query_task(query), MISSING_TASK_PARAMETER).await
}

/// `GET /task/<percent-encoded task>`; a non-empty `task` query value still wins.
#[tracing::instrument(skip_all)]
pub async fn task_path_handler(
    State(state): State<AppState>,
    query: QueryPairs,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = query_task(query).or_else(|| match path {
        Ok(Path(task)) => Some(task).filter(|t| !t.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable task path");
            None
        }
    });

    respond_to_task(&state, task, MISSING_TASK_PARAMETER).await
}

/// `POST /task` with `{"task": "..."}`.
#[tracing::instrument(skip_all)]
pub async fn task_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<TaskResponse>, ApiError> {
    let payload = read_json_body(&headers, body, TASK_BODY_LIMIT, TOO_LARGE).await?;
    let task = payload
        .get("task")
        .and_then(Value::as_str)
        .map(str::to_owned);

    respond_to_task(&state, task, MISSING_TASK_FIELD).await
}

fn query_task(query: QueryPairs) -> Option<String> {
    let Query(pairs) = query.ok()?;
    pairs
        .into_iter()
        .find(|(key, value)| key == "task" && !value.is_empty())
        .map(|(_, value)| value)
}

async fn respond_to_task(
    state: &AppState,
    task: Option<String>,
    missing: &'static str,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = task
        .and_then(|t| TaskRequest::new(t).ok())
        .ok_or_else(|| ApiError::BadRequest(missing.to_string()))?;

    tracing::info!(task = %sanitize_for_log(task.as_str()), "Received task");

    let result = execute_task(state, task).await?;
    if !result.success {
        return Err(ApiError::TaskFailed(result.details().to_string()));
    }

    Ok(Json(TaskResponse {
        result: "Task executed successfully".to_string(),
        details: result.details().to_string(),
    }))
}

/// Hands the task to the shared backend session, building it on first use.
pub(crate) async fn execute_task(
    state: &AppState,
    task: TaskRequest,
) -> Result<TaskResult, ApiError> {
    let session = state.backend.get_or_create().await.map_err(|e| {
        tracing::error!(error = %e, "Backend session unavailable");
        ApiError::from(e)
    })?;

    Ok(session.run(&task).await)
}
