use serde_json::Value;

use crate::domain::{RawTranscription, TranscriptionOutput};

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("ASR returned an empty or unparseable transcript")]
    EmptyTranscript { raw: String },
}

/// Flattens `results[*].transcription.sentences[*].text` into one space-separated string.
///
/// Only the representation actually carried by `output` is walked, so the same sentence is
/// never counted twice. Absent and empty texts are skipped rather than joined, so a blank
/// sentence never leaves a double space in the transcript.
pub fn extract_transcript(output: &RawTranscription) -> Result<String, ExtractionError> {
    let texts = match output {
        RawTranscription::Structured(typed) => structured_texts(typed),
        RawTranscription::Mapping(value) => mapping_texts(value),
    };

    let joined = texts
        .into_iter()
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let transcript = joined.trim();

    if transcript.is_empty() {
        return Err(ExtractionError::EmptyTranscript {
            raw: output.render(),
        });
    }

    Ok(transcript.to_string())
}

fn structured_texts(output: &TranscriptionOutput) -> Vec<&str> {
    output
        .results
        .iter()
        .flatten()
        .filter_map(|result| result.transcription.as_ref())
        .flat_map(|transcription| transcription.sentences.iter().flatten())
        .filter_map(|sentence| sentence.text.as_deref())
        .collect()
}

fn mapping_texts(value: &Value) -> Vec<&str> {
    value
        .get("results")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|result| result.get("transcription"))
        .filter_map(|transcription| transcription.get("sentences").and_then(Value::as_array))
        .flatten()
        .filter_map(|sentence| sentence.get("text").and_then(Value::as_str))
        .collect()
}
