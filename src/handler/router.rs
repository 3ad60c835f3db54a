//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method
//! validation, route matching, dispatching and access logging.

use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::static_files;
use crate::http::conditional::ConditionalHeaders;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, RouteTarget};
use hyper::header::{
    HeaderName, HeaderValue, CONTENT_LENGTH, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    IF_RANGE, IF_UNMODIFIED_SINCE, RANGE, SERVER,
};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestContext<'a> {
    /// URL path, still percent-encoded
    pub path: &'a str,
    /// Query string without the leading `?`
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub range: Option<&'a str>,
    pub conditional: ConditionalHeaders<'a>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let header = move |name: HeaderName| req.headers().get(name).and_then(|v| v.to_str().ok());

        Self {
            path: req.uri().path(),
            query: req.uri().query(),
            is_head: req.method() == Method::HEAD,
            range: header(RANGE),
            conditional: ConditionalHeaders {
                if_match: header(IF_MATCH),
                if_none_match: header(IF_NONE_MATCH),
                if_modified_since: header(IF_MODIFIED_SINCE),
                if_unmodified_since: header(IF_UNMODIFIED_SINCE),
                if_range: header(IF_RANGE),
            },
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let access_log = state.cached_access_log.load(Ordering::Relaxed);

    let mut response = match check_http_method(req.method(), state.config.http.enable_cors) {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext::from_request(&req);
            route_request(&ctx, &state).await.unwrap_or_else(|err| {
                log_serve_error(&ctx, &err);
                http::build_error_response(&err)
            })
        }
    };

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if access_log {
        let mut entry = AccessLogEntry::from_request(&req, remote_addr);
        entry.status = response.status().as_u16();
        entry.body_bytes = body_bytes(&req, &response);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<ResponseBody>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Route request to the mount or file route serving its path
async fn route_request(
    ctx: &RequestContext<'_>,
    state: &AppState,
) -> Result<Response<ResponseBody>, ServeError> {
    let Some(matched) = routing::match_route(&state.routes, ctx.path) else {
        return Err(ServeError::NotFound(ctx.path.to_string()));
    };

    match matched.target {
        RouteTarget::Dir { root } => {
            static_files::serve_directory(ctx, root, matched.tail, state).await
        }
        RouteTarget::File { path } => static_files::serve_file(ctx, path, state).await,
    }
}

fn log_serve_error(ctx: &RequestContext<'_>, err: &ServeError) {
    if err.is_server_error() {
        logger::log_error(&format!("Failed to serve '{}': {err}", ctx.path));
    } else {
        logger::log_debug(&format!("'{}': {err}", ctx.path));
    }
}

/// Bytes sent in the body, as announced by Content-Length
fn body_bytes<B>(req: &Request<B>, response: &Response<ResponseBody>) -> u64 {
    if req.method() == Method::HEAD {
        return 0;
    }
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
