//! HTTP response building module
//!
//! Builders for the fixed-status responses of the static server. Builders
//! never panic: a build failure is logged and a bare response returned.

use super::body::{self, ResponseBody};
use crate::error::ServeError;
use hyper::{Response, StatusCode};

/// Methods answered by the static server
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Build a plain-text response with the given status
fn build_text_response(status: StatusCode, text: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", text.len())
        .body(body::full(text))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback(status)
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::BAD_REQUEST, "400 Bad Request")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Allow", ALLOWED_METHODS)
        .body(body::full("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::METHOD_NOT_ALLOWED, &e);
            fallback(StatusCode::METHOD_NOT_ALLOWED)
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOWED_METHODS);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
            .header(
                "Access-Control-Allow-Headers",
                "Range, If-Match, If-None-Match, If-Modified-Since, If-Unmodified-Since, If-Range",
            )
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(body::empty()).unwrap_or_else(|e| {
        log_build_error(StatusCode::NO_CONTENT, &e);
        fallback(StatusCode::NO_CONTENT)
    })
}

/// Build 301 redirect to `location`
pub fn build_301_response(location: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header("Location", location)
        .header("Content-Length", 0)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::MOVED_PERMANENTLY, &e);
            fallback(StatusCode::MOVED_PERMANENTLY)
        })
}

/// Build 412 Precondition Failed response
pub fn build_412_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::PRECONDITION_FAILED, "412 Precondition Failed")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(body::full("416 Range Not Satisfiable"))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::RANGE_NOT_SATISFIABLE, &e);
            fallback(StatusCode::RANGE_NOT_SATISFIABLE)
        })
}

/// Build 503 response for content that is not released yet
pub fn build_paused_response(retry_after: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::SERVICE_UNAVAILABLE)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Retry-After", retry_after)
        .header("Cache-Control", "no-store")
        .body(body::full("503 Content Not Yet Released"))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::SERVICE_UNAVAILABLE, &e);
            fallback(StatusCode::SERVICE_UNAVAILABLE)
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<ResponseBody> {
    build_text_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "500 Internal Server Error",
    )
}

/// Map a serving error to its response
pub fn build_error_response(err: &ServeError) -> Response<ResponseBody> {
    match err {
        ServeError::NotFound(_) => build_404_response(),
        ServeError::Path(_) => build_400_response(),
        ServeError::Paused { retry_after } => build_paused_response(*retry_after),
        ServeError::Sidecar(_) | ServeError::Io(_) => build_500_response(),
    }
}

fn fallback(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(body::empty());
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        assert_eq!(build_404_response().status(), 404);
        assert_eq!(build_400_response().status(), 400);
        assert_eq!(build_412_response().status(), 412);
        assert_eq!(build_500_response().status(), 500);
    }

    #[test]
    fn test_405_lists_methods() {
        let resp = build_405_response();
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers()["allow"], ALLOWED_METHODS);
    }

    #[test]
    fn test_paused_response() {
        let resp = build_paused_response(42);
        assert_eq!(resp.status(), 503);
        assert_eq!(resp.headers()["retry-after"], "42");
        assert_eq!(resp.headers()["cache-control"], "no-store");
    }

    #[test]
    fn test_416_content_range() {
        let resp = build_416_response(1234);
        assert_eq!(resp.status(), 416);
        assert_eq!(resp.headers()["content-range"], "bytes */1234");
    }

    #[test]
    fn test_redirect() {
        let resp = build_301_response("/docs/?v=1");
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["location"], "/docs/?v=1");
    }

    #[test]
    fn test_error_mapping() {
        let resp = build_error_response(&ServeError::Paused { retry_after: 7 });
        assert_eq!(resp.status(), 503);
        assert_eq!(resp.headers()["retry-after"], "7");
        let resp = build_error_response(&ServeError::Path("bad".into()));
        assert_eq!(resp.status(), 400);
    }

    #[test]
    fn test_options_cors() {
        let resp = build_options_response(true);
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert!(build_options_response(false)
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }
}
