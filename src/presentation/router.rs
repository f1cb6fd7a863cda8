use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    asr_handler, not_found_handler, preflight_middleware, task_path_handler, task_post_handler,
    task_query_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.http.cors_allow_origin);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route(
            "/task",
            get(task_query_handler)
                .post(task_post_handler)
                .fallback(not_found_handler),
        )
        .route("/task/", get(task_query_handler).fallback(not_found_handler))
        .route(
            "/task/{*task}",
            get(task_path_handler).fallback(not_found_handler),
        )
        .route("/asr", post(asr_handler).fallback(not_found_handler))
        .fallback(not_found_handler)
        .layer(cors)
        .layer(middleware::from_fn(preflight_middleware))
        .layer(trace_layer)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        .with_state(state)
}

/// `*` (or nothing) allows any origin. A single origin is always sent as is; a comma-separated
/// list echoes whichever listed origin the request came from.
fn cors_layer(allow_origin: &str) -> CorsLayer {
    let allow_origin = allow_origin.trim();
    let origin = if allow_origin.is_empty() || allow_origin == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allow_origin
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        match <[HeaderValue; 1]>::try_from(origins) {
            Ok([single]) => AllowOrigin::exact(single),
            Err(origins) => AllowOrigin::list(origins),
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}
