use serde_json::json;

use voice_task_gateway::application::services::{ExtractionError, extract_transcript};
use voice_task_gateway::domain::{RawTranscription, TranscriptionOutput};

#[test]
fn given_sentences_across_results_when_extracting_then_joined_in_order() {
    let output = RawTranscription::Structured(TranscriptionOutput::from_sentences([
        vec!["open", "the"],
        vec!["calculator"],
    ]));

    assert_eq!(extract_transcript(&output).unwrap(), "open the calculator");
}

#[test]
fn given_same_content_as_typed_and_mapping_when_extracting_then_results_match() {
    let mapping = json!({
        "results": [
            {"transcription": {"sentences": [{"text": "hello"}, {"text": "world"}]}},
            {"transcription": {"sentences": [{"text": "again"}]}}
        ]
    });
    let typed: TranscriptionOutput = serde_json::from_value(mapping.clone()).unwrap();

    let from_typed = extract_transcript(&RawTranscription::Structured(typed)).unwrap();
    let from_mapping = extract_transcript(&RawTranscription::Mapping(mapping)).unwrap();

    assert_eq!(from_typed, "hello world again");
    assert_eq!(from_typed, from_mapping);
}

#[test]
fn given_surrounding_whitespace_when_extracting_then_result_is_trimmed() {
    let output =
        RawTranscription::Structured(TranscriptionOutput::from_sentences([vec!["  hi", "there  "]]));

    assert_eq!(extract_transcript(&output).unwrap(), "hi there");
}

#[test]
fn given_empty_sentence_texts_when_extracting_then_no_double_spaces() {
    let output = RawTranscription::Mapping(json!({
        "results": [{"transcription": {"sentences": [
            {"text": "a"}, {"text": ""}, {"begin_time": 10}, {"text": "b"}
        ]}}]
    }));

    assert_eq!(extract_transcript(&output).unwrap(), "a b");
}

#[test]
fn given_no_results_when_extracting_then_returns_empty_transcript_with_raw() {
    let output = RawTranscription::Mapping(json!({"results": []}));

    let error = extract_transcript(&output).unwrap_err();

    let ExtractionError::EmptyTranscript { raw } = &error;
    assert_eq!(raw, r#"{"results":[]}"#);
    assert_eq!(
        error.to_string(),
        "ASR returned an empty or unparseable transcript"
    );
}

#[test]
fn given_whitespace_only_sentences_when_extracting_then_returns_empty_transcript() {
    let output = RawTranscription::Structured(TranscriptionOutput::from_sentences([vec![" ", "  "]]));

    assert!(matches!(
        extract_transcript(&output),
        Err(ExtractionError::EmptyTranscript { .. })
    ));
}

#[test]
fn given_non_object_mapping_when_extracting_then_returns_empty_transcript() {
    for value in [json!(null), json!("text"), json!({"results": "nope"})] {
        let output = RawTranscription::Mapping(value);
        assert!(extract_transcript(&output).is_err());
    }
}
