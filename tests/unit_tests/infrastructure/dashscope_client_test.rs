use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use voice_task_gateway::application::ports::{AsrError, AsrProvider, AudioSource, JobOutcome};
use voice_task_gateway::application::services::extract_transcript;
use voice_task_gateway::domain::{JobStatus, RawTranscription};
use voice_task_gateway::infrastructure::asr::DashScopeClient;

struct Scenario {
    submit_status: StatusCode,
    submit_response: Value,
    final_task: fn(&str) -> Value,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            submit_status: StatusCode::OK,
            submit_response: json!({
                "request_id": "req-1",
                "output": {"task_id": "t-1", "task_status": "PENDING"}
            }),
            final_task: succeeded_task,
        }
    }
}

fn succeeded_task(base_url: &str) -> Value {
    json!({
        "request_id": "req-2",
        "output": {
            "task_id": "t-1",
            "task_status": "SUCCEEDED",
            "results": [{
                "file_url": "https://example.com/a.wav",
                "transcription_url": format!("{}/files/t-1.json", base_url),
                "subtask_status": "SUCCEEDED"
            }]
        }
    })
}

struct MockState {
    base_url: String,
    scenario: Scenario,
    polls: AtomicUsize,
    submits: Mutex<Vec<(HeaderMap, Value)>>,
    policy_models: Mutex<Vec<String>>,
    uploads: Mutex<Vec<Bytes>>,
    downloads: Mutex<Vec<String>>,
}

async fn submit_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.submits.lock().unwrap().push((headers, body));
    (
        state.scenario.submit_status,
        Json(state.scenario.submit_response.clone()),
    )
}

async fn task_handler(
    State(state): State<Arc<MockState>>,
    Path(task_id): Path<String>,
) -> Json<Value> {
    if state.polls.fetch_add(1, Ordering::SeqCst) == 0 {
        return Json(json!({"output": {"task_id": task_id, "task_status": "RUNNING"}}));
    }
    Json((state.scenario.final_task)(&state.base_url))
}

async fn transcription_file_handler(
    State(state): State<Arc<MockState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    state.downloads.lock().unwrap().push(name.clone());
    match name.as_str() {
        "t-1.json" => Ok(hello_world_document()),
        "failed.json" => Ok(Json(json!({
            "transcripts": [{"sentences": [{"text": "never delivered"}]}]
        }))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

fn hello_world_document() -> Json<Value> {
    Json(json!({
        "file_url": "https://example.com/a.wav",
        "transcripts": [{
            "channel_id": 0,
            "text": "hello world",
            "sentences": [
                {"begin_time": 0, "end_time": 500, "text": "hello"},
                {"begin_time": 500, "end_time": 900, "text": "world"}
            ]
        }]
    }))
}

async fn upload_policy_handler(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state
        .policy_models
        .lock()
        .unwrap()
        .push(params.get("model").cloned().unwrap_or_default());
    Json(json!({
        "request_id": "req-3",
        "data": {
            "policy": "cG9saWN5",
            "signature": "c2lnbmF0dXJl",
            "upload_dir": "dashscope-instant/abc",
            "upload_host": format!("{}/oss", state.base_url),
            "expire_in_seconds": 300,
            "max_file_size_mb": 100,
            "oss_access_key_id": "LTAI-test",
            "x_oss_object_acl": "private",
            "x_oss_forbid_overwrite": "true"
        }
    }))
}

async fn oss_upload_handler(State(state): State<Arc<MockState>>, body: Bytes) -> StatusCode {
    state.uploads.lock().unwrap().push(body);
    StatusCode::OK
}

async fn start_mock_dashscope(scenario: Scenario) -> (Arc<MockState>, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = Arc::new(MockState {
        base_url: format!("http://{}", addr),
        scenario,
        polls: AtomicUsize::new(0),
        submits: Mutex::new(Vec::new()),
        policy_models: Mutex::new(Vec::new()),
        uploads: Mutex::new(Vec::new()),
        downloads: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/services/audio/asr/transcription", post(submit_handler))
        .route("/tasks/{task_id}", get(task_handler))
        .route("/files/{name}", get(transcription_file_handler))
        .route("/uploads", get(upload_policy_handler))
        .route("/oss", post(oss_upload_handler))
        .with_state(Arc::clone(&state));

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (state, shutdown_tx)
}

fn client_for(state: &MockState) -> DashScopeClient {
    DashScopeClient::new("test-key".to_string(), Some(format!("{}/", state.base_url)))
        .with_poll_interval(Duration::from_millis(5), Duration::from_millis(20))
}

#[tokio::test]
async fn given_remote_url_when_submitting_and_waiting_then_hydrated_transcript_is_returned() {
    let (state, shutdown_tx) = start_mock_dashscope(Scenario::default()).await;
    let client = client_for(&state);

    let job = client
        .submit(&AudioSource::Urls(vec!["https://example.com/a.wav".to_string()]))
        .await
        .unwrap();
    assert_eq!(job.handle.as_str(), "t-1");
    assert_eq!(job.status, JobStatus::Pending);

    let outcome = client.wait(&job).await.unwrap();

    assert_eq!(outcome.job.status, JobStatus::Succeeded);
    assert!(matches!(outcome.output, RawTranscription::Structured(_)));
    assert_eq!(extract_transcript(&outcome.output).unwrap(), "hello world");
    assert_eq!(state.polls.load(Ordering::SeqCst), 2);

    let submits = state.submits.lock().unwrap();
    let (headers, body) = &submits[0];
    assert_eq!(headers.get("x-dashscope-async").unwrap(), "enable");
    assert_eq!(headers.get("authorization").unwrap(), "Bearer test-key");
    assert!(headers.get("x-dashscope-ossresourceresolve").is_none());
    assert_eq!(body["model"], "fun-asr-mtl");
    assert_eq!(body["input"]["file_urls"], json!(["https://example.com/a.wav"]));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_local_file_when_submitting_then_uploaded_and_submitted_as_oss_reference() {
    let (state, shutdown_tx) = start_mock_dashscope(Scenario::default()).await;
    let client = client_for(&state).with_models("url-model", "file-model");
    let audio = tempfile::Builder::new()
        .prefix("vtg-test-")
        .suffix(".wav")
        .tempfile()
        .unwrap();
    std::fs::write(audio.path(), b"RIFF fake wav").unwrap();
    let file_name = audio
        .path()
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let job = client
        .submit(&AudioSource::LocalFiles(vec![audio.path().to_path_buf()]))
        .await
        .unwrap();

    assert_eq!(job.handle.as_str(), "t-1");
    assert_eq!(*state.policy_models.lock().unwrap(), vec!["file-model"]);

    let uploads = state.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let upload = String::from_utf8_lossy(&uploads[0]);
    assert!(upload.contains(&format!("dashscope-instant/abc/{}", file_name)));
    assert!(upload.contains("RIFF fake wav"));
    assert!(upload.contains("LTAI-test"));

    let submits = state.submits.lock().unwrap();
    let (headers, body) = &submits[0];
    assert_eq!(headers.get("x-dashscope-ossresourceresolve").unwrap(), "enable");
    assert_eq!(body["model"], "file-model");
    assert_eq!(
        body["input"]["file_urls"],
        json!([format!("oss://dashscope-instant/abc/{}", file_name)])
    );
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_missing_local_file_when_submitting_then_returns_file_not_found() {
    let (state, shutdown_tx) = start_mock_dashscope(Scenario::default()).await;
    let client = client_for(&state);
    let missing = std::env::temp_dir().join("vtg-no-such-file.wav");

    let result = client
        .submit(&AudioSource::LocalFiles(vec![missing.clone()]))
        .await;

    assert!(matches!(result, Err(AsrError::FileNotFound { path }) if path == missing));
    assert!(state.submits.lock().unwrap().is_empty());
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_rejected_submission_when_submitting_then_returns_non_ok_status() {
    let scenario = Scenario {
        submit_status: StatusCode::BAD_REQUEST,
        submit_response: json!({
            "request_id": "req-9",
            "code": "InvalidParameter",
            "message": "file_urls must not be empty"
        }),
        ..Scenario::default()
    };
    let (state, shutdown_tx) = start_mock_dashscope(scenario).await;
    let client = client_for(&state);

    let result = client.submit(&AudioSource::Urls(Vec::new())).await;

    match result {
        Err(AsrError::NonOkStatus { code, message }) => {
            assert_eq!(code, "400");
            assert_eq!(message, "InvalidParameter: file_urls must not be empty");
        }
        other => panic!("expected NonOkStatus, got {:?}", other),
    }
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_failed_task_when_waiting_then_outcome_carries_provider_code() {
    let scenario = Scenario {
        final_task: |_| {
            json!({"output": {
                "task_id": "t-1",
                "task_status": "FAILED",
                "code": "InvalidFile.DecodeFailed",
                "message": "cannot decode audio"
            }})
        },
        ..Scenario::default()
    };
    let (state, shutdown_tx) = start_mock_dashscope(scenario).await;
    let client = client_for(&state);

    let job = client
        .submit(&AudioSource::Urls(vec!["https://example.com/a.wav".to_string()]))
        .await
        .unwrap();
    let outcome = client.wait(&job).await.unwrap();

    assert_eq!(outcome.job.status, JobStatus::Failed);
    assert_eq!(outcome.code.as_deref(), Some("InvalidFile.DecodeFailed"));
    assert_eq!(outcome.message.as_deref(), Some("cannot decode audio"));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_inline_transcription_when_waiting_then_no_download_is_needed() {
    let scenario = Scenario {
        final_task: |_| {
            json!({"output": {
                "task_id": "t-1",
                "task_status": "SUCCEEDED",
                "results": [{"transcription": {"sentences": [{"text": "already here"}]}}]
            }})
        },
        ..Scenario::default()
    };
    let (state, shutdown_tx) = start_mock_dashscope(scenario).await;
    let client = client_for(&state);

    let job = client
        .submit(&AudioSource::Urls(vec!["https://example.com/a.wav".to_string()]))
        .await
        .unwrap();
    let outcome = client.wait(&job).await.unwrap();

    assert_eq!(extract_transcript(&outcome.output).unwrap(), "already here");
    shutdown_tx.send(()).ok();
}

fn mixed_results_task(base_url: &str) -> Value {
    json!({"output": {
        "task_id": "t-1",
        "task_status": "SUCCEEDED",
        "results": [
            {
                "file_url": "https://example.com/broken.wav",
                "transcription_url": format!("{}/files/failed.json", base_url),
                "subtask_status": "FAILED",
                "code": "InvalidFile.DecodeFailed"
            },
            {
                "file_url": "https://example.com/a.wav",
                "transcription_url": format!("{}/files/t-1.json", base_url),
                "subtask_status": "SUCCEEDED"
            }
        ]
    }})
}

fn missing_document_task(base_url: &str) -> Value {
    json!({"output": {
        "task_id": "t-1",
        "task_status": "SUCCEEDED",
        "results": [
            {
                "file_url": "https://example.com/expired.wav",
                "transcription_url": format!("{}/files/expired.json", base_url),
                "subtask_status": "SUCCEEDED"
            },
            {
                "file_url": "https://example.com/a.wav",
                "transcription_url": format!("{}/files/t-1.json", base_url),
                "subtask_status": "SUCCEEDED"
            }
        ]
    }})
}

async fn wait_for_url_job(client: &DashScopeClient) -> JobOutcome {
    let job = client
        .submit(&AudioSource::Urls(vec!["https://example.com/a.wav".to_string()]))
        .await
        .unwrap();
    client.wait(&job).await.unwrap()
}

#[tokio::test]
async fn given_failed_subtask_when_waiting_then_it_is_skipped_and_not_downloaded() {
    let scenario = Scenario {
        final_task: mixed_results_task,
        ..Scenario::default()
    };
    let (state, shutdown_tx) = start_mock_dashscope(scenario).await;
    let client = client_for(&state);

    let outcome = wait_for_url_job(&client).await;

    assert_eq!(outcome.job.status, JobStatus::Succeeded);
    assert_eq!(extract_transcript(&outcome.output).unwrap(), "hello world");
    assert_eq!(*state.downloads.lock().unwrap(), vec!["t-1.json"]);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_undownloadable_transcription_when_waiting_then_other_results_still_arrive() {
    let scenario = Scenario {
        final_task: missing_document_task,
        ..Scenario::default()
    };
    let (state, shutdown_tx) = start_mock_dashscope(scenario).await;
    let client = client_for(&state);

    let outcome = wait_for_url_job(&client).await;

    assert_eq!(outcome.job.status, JobStatus::Succeeded);
    assert_eq!(extract_transcript(&outcome.output).unwrap(), "hello world");
    assert_eq!(
        *state.downloads.lock().unwrap(),
        vec!["expired.json", "t-1.json"]
    );
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_unreachable_provider_when_submitting_then_returns_transport_failure() {
    let client = DashScopeClient::new("k".to_string(), Some("http://127.0.0.1:1".to_string()));

    let result = client
        .submit(&AudioSource::Urls(vec!["https://example.com/a.wav".to_string()]))
        .await;

    assert!(matches!(result, Err(AsrError::TransportFailure { .. })));
}
