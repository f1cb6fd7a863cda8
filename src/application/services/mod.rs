mod backend_session;
mod transcript_extractor;
mod transcription_service;

pub use backend_session::{
    API_KEY_VAR, AgentConfig, BASE_URL_VAR, BackendSession, BackendSessionCell, BackendSettings,
    LANG_VAR, MAX_STEPS_VAR, MODEL_VAR, ModelConfig, TIMEOUT_VAR,
};
pub use transcript_extractor::{ExtractionError, extract_transcript};
pub use transcription_service::TranscriptionService;
