use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{ALLOW, CONTENT_LENGTH};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::Response;

use super::error_response::ApiError;

const PREFLIGHT_BODY: &str = "{}";

pub async fn not_found_handler(method: Method, uri: Uri) -> ApiError {
    tracing::debug!(%method, path = %uri.path(), "No endpoint matched");
    ApiError::NotFound
}

/// Every `OPTIONS` answers `200 {}` on any path, keeping the CORS headers set further in.
pub async fn preflight_middleware(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }

    let (mut parts, _) = next.run(request).await.into_parts();
    parts.status = StatusCode::OK;
    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.remove(ALLOW);
    Response::from_parts(parts, Body::from(PREFLIGHT_BODY))
}
