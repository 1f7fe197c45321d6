use axum::http::HeaderMap;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Caller-supplied request id for log correlation, `-` when absent.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}
