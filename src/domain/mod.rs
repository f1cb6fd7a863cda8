mod audio_input;
mod task;
mod transcription;

pub use audio_input::{AudioFormat, AudioInput, AudioInputError};
pub use task::{TaskRequest, TaskRequestError, TaskResult};
pub use transcription::{
    JobHandle, JobStatus, RawTranscription, Sentence, Transcription, TranscriptionJob,
    TranscriptionOutput, TranscriptionResult,
};
