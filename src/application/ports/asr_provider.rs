use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{RawTranscription, TranscriptionJob};

/// Where the provider should fetch audio from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Urls(Vec<String>),
    LocalFiles(Vec<PathBuf>),
}

/// A job that reached a terminal status, with whatever the provider returned.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: TranscriptionJob,
    pub code: Option<String>,
    pub message: Option<String>,
    pub output: RawTranscription,
}

#[async_trait]
pub trait AsrProvider: Send + Sync {
    async fn submit(&self, source: &AudioSource) -> Result<TranscriptionJob, AsrError>;

    /// Blocks until the job is terminal.
    async fn wait(&self, job: &TranscriptionJob) -> Result<JobOutcome, AsrError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AsrError {
    #[error("ASR service returned non-OK status {code}: {message}")]
    NonOkStatus { code: String, message: String },
    #[error("ASR request failed: {details}")]
    TransportFailure { details: String },
    #[error("audio file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    #[error("ASR transcription timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("failed to stage inline audio: {details}")]
    Staging { details: String },
}

impl AsrError {
    pub fn transport(details: impl std::fmt::Display) -> Self {
        AsrError::TransportFailure {
            details: details.to_string(),
        }
    }
}
