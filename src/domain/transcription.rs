use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider-side identifier of a transcription job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Maps a provider task status onto the three job states.
    pub fn from_provider(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "PENDING" | "RUNNING" => JobStatus::Pending,
            "SUCCEEDED" => JobStatus::Succeeded,
            _ => JobStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionJob {
    pub handle: JobHandle,
    pub status: JobStatus,
}

impl TranscriptionJob {
    pub fn new(handle: JobHandle, status: JobStatus) -> Self {
        Self { handle, status }
    }
}

/// Typed view of a provider output: `results[*].transcription.sentences[*].text`.
///
/// Every level is optional; a missing level contributes no text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionOutput {
    #[serde(default)]
    pub results: Option<Vec<TranscriptionResult>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    #[serde(default)]
    pub transcription: Option<Transcription>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub sentences: Option<Vec<Sentence>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    #[serde(default)]
    pub text: Option<String>,
}

impl Sentence {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

impl TranscriptionOutput {
    /// One result per inner vector, each holding the given sentence texts.
    pub fn from_sentences<I, S>(results: I) -> Self
    where
        I: IntoIterator<Item = Vec<S>>,
        S: Into<String>,
    {
        let results = results
            .into_iter()
            .map(|sentences| TranscriptionResult {
                transcription: Some(Transcription {
                    sentences: Some(sentences.into_iter().map(Sentence::new).collect()),
                }),
            })
            .collect();

        Self {
            results: Some(results),
        }
    }
}

/// Provider output after boundary decoding: either the typed shape or, when the
/// payload does not fit it, the untyped mapping it arrived as.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTranscription {
    Structured(TranscriptionOutput),
    Mapping(serde_json::Value),
}

impl RawTranscription {
    /// Compact rendering for error details and logs.
    pub fn render(&self) -> String {
        let rendered = match self {
            RawTranscription::Structured(output) => serde_json::to_string(output),
            RawTranscription::Mapping(value) => serde_json::to_string(value),
        };
        rendered.unwrap_or_else(|_| "<unrenderable>".to_string())
    }
}
