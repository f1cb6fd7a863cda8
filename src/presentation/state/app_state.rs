use std::sync::Arc;

use crate::application::services::{BackendSessionCell, TranscriptionService};
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub transcription_service: Arc<TranscriptionService>,
    pub backend: Arc<BackendSessionCell>,
    pub settings: Settings,
}
