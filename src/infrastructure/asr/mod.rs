mod dashscope_client;
mod response_decoder;

pub use dashscope_client::{
    DEFAULT_BASE_URL, DEFAULT_FILE_MODEL, DEFAULT_URL_MODEL, DashScopeClient,
};
pub use response_decoder::{collect_transcript_sentences, decode_transcription_output};
