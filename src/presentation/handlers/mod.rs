mod asr;
mod error_response;
mod fallback;
mod json_body;
mod task;

pub use asr::{AsrResponse, asr_handler};
pub use error_response::{ApiError, ErrorResponse};
pub use fallback::{not_found_handler, preflight_middleware};
pub use json_body::{ASR_BODY_LIMIT, TASK_BODY_LIMIT, read_json_body};
pub use task::{TaskResponse, task_path_handler, task_post_handler, task_query_handler};
