use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, multipart};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::response_decoder::{collect_transcript_sentences, decode_transcription_output};
use crate::application::ports::{AsrError, AsrProvider, AudioSource, JobOutcome};
use crate::domain::{JobHandle, JobStatus, TranscriptionJob};

pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";
pub const DEFAULT_URL_MODEL: &str = "fun-asr-mtl";
pub const DEFAULT_FILE_MODEL: &str = "paraformer-v2";

const ASYNC_HEADER: &str = "X-DashScope-Async";
const OSS_RESOLVE_HEADER: &str = "X-DashScope-OssResourceResolve";
const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(500);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// DashScope file-transcription REST client.
///
/// Remote URLs are submitted directly. Local files are uploaded to the provider's temporary
/// storage first and submitted as `oss://` references.
pub struct DashScopeClient {
    client: Client,
    api_key: String,
    base_url: String,
    url_model: String,
    file_model: String,
    poll_interval: Duration,
    max_poll_interval: Duration,
}

impl DashScopeClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            url_model: DEFAULT_URL_MODEL.to_string(),
            file_model: DEFAULT_FILE_MODEL.to_string(),
            poll_interval: INITIAL_POLL_INTERVAL,
            max_poll_interval: MAX_POLL_INTERVAL,
        }
    }

    pub fn with_models(mut self, url_model: impl Into<String>, file_model: impl Into<String>) -> Self {
        self.url_model = url_model.into();
        self.file_model = file_model.into();
        self
    }

    pub fn with_poll_interval(mut self, initial: Duration, max: Duration) -> Self {
        self.poll_interval = initial;
        self.max_poll_interval = max.max(initial);
        self
    }

    async fn upload_local_file(&self, path: &Path) -> Result<String, AsrError> {
        let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AsrError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => AsrError::transport(format!("read {}: {}", path.display(), e)),
        })?;

        let policy = self.fetch_upload_policy().await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();
        let key = format!("{}/{}", policy.upload_dir.trim_end_matches('/'), file_name);

        let mut form = multipart::Form::new()
            .text("OSSAccessKeyId", policy.oss_access_key_id)
            .text("Signature", policy.signature)
            .text("policy", policy.policy)
            .text("key", key.clone())
            .text("success_action_status", "200");
        if let Some(acl) = policy.x_oss_object_acl {
            form = form.text("x-oss-object-acl", acl);
        }
        if let Some(forbid) = policy.x_oss_forbid_overwrite {
            form = form.text("x-oss-forbid-overwrite", forbid);
        }
        let form = form.part("file", multipart::Part::bytes(data).file_name(file_name));

        tracing::debug!(key = %key, "Uploading audio to provider storage");

        let response = self
            .client
            .post(&policy.upload_host)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AsrError::transport(format!("upload: {}", e)))?;

        if !response.status().is_success() {
            return Err(non_ok_status(response).await);
        }

        Ok(format!("oss://{}", key))
    }

    async fn fetch_upload_policy(&self) -> Result<UploadPolicy, AsrError> {
        let url = format!(
            "{}/uploads?action=getPolicy&model={}",
            self.base_url, self.file_model
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AsrError::transport(format!("upload policy: {}", e)))?;

        if !response.status().is_success() {
            return Err(non_ok_status(response).await);
        }

        let envelope: UploadPolicyEnvelope = response
            .json()
            .await
            .map_err(|e| AsrError::transport(format!("parse upload policy: {}", e)))?;
        Ok(envelope.data)
    }

    /// Inlines every result's `transcription_url` document as `transcription.sentences`.
    ///
    /// Failed subtasks and documents that cannot be downloaded are left without a transcription.
    async fn hydrate_transcriptions(&self, output: &mut Value) {
        let Some(results) = output.get_mut("results").and_then(Value::as_array_mut) else {
            return;
        };

        for result in results.iter_mut() {
            if result.get("transcription").is_some() {
                continue;
            }
            let subtask_failed = result
                .get("subtask_status")
                .and_then(Value::as_str)
                .is_some_and(|s| JobStatus::from_provider(s) == JobStatus::Failed);
            if subtask_failed {
                tracing::warn!(file_url = ?result.get("file_url"), "Transcription subtask failed");
                continue;
            }
            let Some(url) = result
                .get("transcription_url")
                .and_then(Value::as_str)
                .map(str::to_owned)
            else {
                continue;
            };

            let document = match self.fetch_transcription(&url).await {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        file_url = ?result.get("file_url"),
                        "Transcription download failed, result skipped"
                    );
                    continue;
                }
            };
            let sentences = collect_transcript_sentences(&document);
            if let Some(fields) = result.as_object_mut() {
                fields.insert("transcription".to_string(), json!({ "sentences": sentences }));
            }
        }
    }

    async fn fetch_transcription(&self, url: &str) -> Result<Value, AsrError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AsrError::transport(format!("transcription download: {}", e)))?;

        if !response.status().is_success() {
            return Err(non_ok_status(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AsrError::transport(format!("parse transcription: {}", e)))
    }
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    model: &'a str,
    input: SubmitInput<'a>,
    parameters: Value,
}

#[derive(Serialize)]
struct SubmitInput<'a> {
    file_urls: &'a [String],
}

#[derive(Deserialize)]
struct TaskState {
    #[serde(default)]
    task_id: Option<String>,
    task_status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct TaskEnvelope {
    output: TaskState,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct UploadPolicyEnvelope {
    data: UploadPolicy,
}

#[derive(Deserialize)]
struct UploadPolicy {
    upload_host: String,
    upload_dir: String,
    policy: String,
    signature: String,
    oss_access_key_id: String,
    #[serde(default)]
    x_oss_object_acl: Option<String>,
    #[serde(default)]
    x_oss_forbid_overwrite: Option<String>,
}

async fn non_ok_status(response: reqwest::Response) -> AsrError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            code: Some(code),
            message,
        }) => format!("{}: {}", code, message.unwrap_or_default()),
        Ok(ErrorBody {
            code: None,
            message: Some(message),
        }) => message,
        _ if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        _ => body,
    };

    AsrError::NonOkStatus {
        code: status.as_u16().to_string(),
        message,
    }
}

#[async_trait]
impl AsrProvider for DashScopeClient {
    async fn submit(&self, source: &AudioSource) -> Result<TranscriptionJob, AsrError> {
        let (model, file_urls) = match source {
            AudioSource::Urls(urls) => (self.url_model.as_str(), urls.clone()),
            AudioSource::LocalFiles(paths) => {
                let mut urls = Vec::with_capacity(paths.len());
                for path in paths {
                    urls.push(self.upload_local_file(path).await?);
                }
                (self.file_model.as_str(), urls)
            }
        };

        let body = SubmitRequest {
            model,
            input: SubmitInput {
                file_urls: &file_urls,
            },
            parameters: json!({}),
        };

        let mut request = self
            .client
            .post(format!("{}/services/audio/asr/transcription", self.base_url))
            .bearer_auth(&self.api_key)
            .header(ASYNC_HEADER, "enable")
            .json(&body);
        if file_urls.iter().any(|u| u.starts_with("oss://")) {
            request = request.header(OSS_RESOLVE_HEADER, "enable");
        }

        tracing::debug!(model = %model, files = file_urls.len(), "Submitting transcription job");

        let response = request
            .send()
            .await
            .map_err(|e| AsrError::transport(format!("submit: {}", e)))?;

        if !response.status().is_success() {
            return Err(non_ok_status(response).await);
        }

        let envelope: TaskEnvelope = response
            .json()
            .await
            .map_err(|e| AsrError::transport(format!("parse submit response: {}", e)))?;
        let task_id = envelope
            .output
            .task_id
            .ok_or_else(|| AsrError::transport("submit response carried no task_id"))?;

        Ok(TranscriptionJob::new(
            JobHandle::new(task_id),
            JobStatus::from_provider(&envelope.output.task_status),
        ))
    }

    async fn wait(&self, job: &TranscriptionJob) -> Result<JobOutcome, AsrError> {
        let url = format!("{}/tasks/{}", self.base_url, job.handle);
        let mut poll_interval = self.poll_interval;

        loop {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .send()
                .await
                .map_err(|e| AsrError::transport(format!("poll: {}", e)))?;

            if !response.status().is_success() {
                return Err(non_ok_status(response).await);
            }

            let mut body: Value = response
                .json()
                .await
                .map_err(|e| AsrError::transport(format!("parse poll response: {}", e)))?;
            let mut output = body
                .get_mut("output")
                .map(Value::take)
                .unwrap_or(Value::Null);
            let state = TaskState::deserialize(&output)
                .map_err(|e| AsrError::transport(format!("parse task state: {}", e)))?;

            let status = JobStatus::from_provider(&state.task_status);
            if !status.is_terminal() {
                tracing::debug!(handle = %job.handle, task_status = %state.task_status, "Transcription job still running");
                tokio::time::sleep(poll_interval).await;
                poll_interval = std::cmp::min(poll_interval * 2, self.max_poll_interval);
                continue;
            }

            if status == JobStatus::Succeeded {
                self.hydrate_transcriptions(&mut output).await;
            }

            return Ok(JobOutcome {
                job: TranscriptionJob::new(job.handle.clone(), status),
                code: state.code.or(Some(state.task_status)),
                message: state.message,
                output: decode_transcription_output(output),
            });
        }
    }
}
