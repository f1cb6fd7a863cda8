use serde_json::Value;

use crate::domain::{RawTranscription, TranscriptionOutput};

/// Decodes a provider `output` object into the canonical [`RawTranscription`].
///
/// The typed shape is preferred; payloads that do not fit it (a `results` that is not a list,
/// a non-string `text`, a non-object output) are kept as the untyped mapping.
pub fn decode_transcription_output(output: Value) -> RawTranscription {
    match serde_json::from_value::<TranscriptionOutput>(output.clone()) {
        Ok(typed) if output.is_object() => RawTranscription::Structured(typed),
        _ => RawTranscription::Mapping(output),
    }
}

/// Collects `transcripts[*].sentences[*]` of a fetched transcription document.
pub fn collect_transcript_sentences(document: &Value) -> Vec<Value> {
    document
        .get("transcripts")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|transcript| transcript.get("sentences").and_then(Value::as_array))
        .flatten()
        .cloned()
        .collect()
}
