use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;

use crate::application::ports::{AsrError, AsrProvider, AudioSource};
use crate::domain::{AudioFormat, AudioInput, JobStatus, RawTranscription};

/// Turns an [`AudioInput`] into raw provider output: submit, then wait, bounded by one timeout.
pub struct TranscriptionService {
    provider: Arc<dyn AsrProvider>,
    timeout: Duration,
}

impl TranscriptionService {
    pub fn new(provider: Arc<dyn AsrProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    #[tracing::instrument(skip(self, input), fields(kind = input.kind()))]
    pub async fn transcribe(&self, input: AudioInput) -> Result<RawTranscription, AsrError> {
        match input {
            AudioInput::RemoteUrl { url } => {
                self.transcribe_source(AudioSource::Urls(vec![url])).await
            }
            AudioInput::InlineEncoded { bytes, format } => {
                // Removed from disk when `staged` drops, whichever way this arm exits.
                let staged = stage_inline_audio(bytes, format).await?;
                tracing::debug!(path = %staged.path().display(), "Inline audio staged");

                self.transcribe_source(AudioSource::LocalFiles(vec![staged.path().to_path_buf()]))
                    .await
            }
        }
    }

    pub async fn transcribe_source(
        &self,
        source: AudioSource,
    ) -> Result<RawTranscription, AsrError> {
        if let AudioSource::LocalFiles(paths) = &source {
            for path in paths {
                if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                    tracing::warn!(path = %path.display(), "Audio file missing");
                    return Err(AsrError::FileNotFound { path: path.clone() });
                }
            }
        }

        let outcome = tokio::time::timeout(self.timeout, async {
            let job = self.provider.submit(&source).await?;
            tracing::debug!(handle = %job.handle, status = %job.status, "Transcription job submitted");
            self.provider.wait(&job).await
        })
        .await
        .map_err(|_| AsrError::Timeout {
            seconds: self.timeout.as_secs(),
        })??;

        if outcome.job.status != JobStatus::Succeeded {
            tracing::warn!(
                handle = %outcome.job.handle,
                status = %outcome.job.status,
                code = ?outcome.code,
                "Transcription job did not succeed"
            );
            return Err(AsrError::NonOkStatus {
                code: outcome
                    .code
                    .unwrap_or_else(|| outcome.job.status.to_string()),
                message: outcome
                    .message
                    .unwrap_or_else(|| "transcription job did not succeed".to_string()),
            });
        }

        tracing::info!(handle = %outcome.job.handle, "Transcription job succeeded");
        Ok(outcome.output)
    }
}

async fn stage_inline_audio(bytes: Vec<u8>, format: AudioFormat) -> Result<NamedTempFile, AsrError> {
    let staging = |e: std::io::Error| AsrError::Staging {
        details: e.to_string(),
    };

    tokio::task::spawn_blocking(move || {
        let mut file = tempfile::Builder::new()
            .prefix("vtg-audio-")
            .suffix(&format.as_suffix())
            .tempfile()
            .map_err(staging)?;
        file.write_all(&bytes).map_err(staging)?;
        file.flush().map_err(staging)?;
        Ok(file)
    })
    .await
    .map_err(|e| AsrError::Staging {
        details: e.to_string(),
    })?
}
