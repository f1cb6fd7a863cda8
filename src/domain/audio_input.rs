use base64::{Engine as _, engine::general_purpose};

const DEFAULT_FORMAT: &str = "wav";

/// Container format of inline audio, used as the temp file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat(String);

impl AudioFormat {
    /// Keeps ASCII alphanumerics only so the value is always a safe file suffix.
    pub fn new(raw: &str) -> Self {
        let cleaned: String = raw
            .trim()
            .trim_start_matches('.')
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if cleaned.is_empty() {
            Self::default()
        } else {
            Self(cleaned)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_suffix(&self) -> String {
        format!(".{}", self.0)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self(DEFAULT_FORMAT.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioInput {
    RemoteUrl { url: String },
    InlineEncoded { bytes: Vec<u8>, format: AudioFormat },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AudioInputError {
    #[error("Missing audio_url or audio_base64 field")]
    Missing,
    #[error("Invalid base64 data: {0}")]
    InvalidBase64(String),
}

impl AudioInput {
    /// Builds the input from the raw request fields.
    ///
    /// Empty strings count as absent. A URL takes precedence over an inline payload.
    pub fn from_fields(
        audio_url: Option<&str>,
        audio_base64: Option<&str>,
        audio_format: Option<&str>,
    ) -> Result<Self, AudioInputError> {
        if let Some(url) = audio_url.filter(|u| !u.is_empty()) {
            return Ok(Self::RemoteUrl {
                url: url.to_string(),
            });
        }

        let encoded = audio_base64
            .filter(|b| !b.is_empty())
            .ok_or(AudioInputError::Missing)?;

        let compact: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| AudioInputError::InvalidBase64(e.to_string()))?;

        Ok(Self::InlineEncoded {
            bytes,
            format: audio_format.map(AudioFormat::new).unwrap_or_default(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AudioInput::RemoteUrl { .. } => "remote_url",
            AudioInput::InlineEncoded { .. } => "inline_encoded",
        }
    }
}
