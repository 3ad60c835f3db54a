//! Static file serving module
//!
//! Resolves mounted directory paths safely and hands the result to the
//! content server.

use crate::config::AppState;
use crate::error::ServeError;
use crate::gate;
use crate::handler::content;
use crate::handler::router::RequestContext;
use crate::http::{self, ResponseBody};
use hyper::Response;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a request captured by a directory mount
///
/// `tail` is the part of the URL path below the mount prefix, still
/// percent-encoded.
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    root: &Path,
    tail: &str,
    state: &AppState,
) -> Result<Response<ResponseBody>, ServeError> {
    let path = resolve_path(root, tail)?;

    // One gate read decides the whole request; missing paths and directory
    // redirects are only revealed once the content is released
    if let Some(retry_after) = state.gate.retry_after(gate::now_unix()) {
        return Err(ServeError::Paused { retry_after });
    }

    let meta = fs::metadata(&path)
        .await
        .map_err(|_| ServeError::NotFound(ctx.path.to_string()))?;
    if meta.is_dir() && !ctx.path.ends_with('/') {
        return Ok(http::build_301_response(&directory_location(ctx)));
    }

    content::serve_released(ctx, &path, state.sidecar_source(), &state.ignore).await
}

/// Serve one file, with its sidecar when sidecars are enabled
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    state: &AppState,
) -> Result<Response<ResponseBody>, ServeError> {
    content::serve(ctx, path, state.sidecar_source(), &state.gate, &state.ignore).await
}

/// Map a percent-encoded URL tail to a path under `root`
///
/// The decoded tail is cleaned as an absolute path before it is joined, so
/// the result never escapes `root`.
pub fn resolve_path(root: &Path, tail: &str) -> Result<PathBuf, ServeError> {
    validate_escapes(tail)?;
    let decoded = percent_decode_str(tail)
        .decode_utf8()
        .map_err(|_| ServeError::Path(tail.to_string()))?;
    if decoded.contains('\0') {
        return Err(ServeError::Path(tail.to_string()));
    }

    let cleaned = clean_path(&decoded);
    let relative = cleaned.trim_start_matches('/');
    if relative.is_empty() {
        Ok(root.to_path_buf())
    } else {
        Ok(root.join(relative))
    }
}

/// Lexically clean `path` as if rooted at `/`
///
/// Empty and `.` segments are dropped, `..` removes the previous segment and
/// is discarded at the root.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// `percent_decode_str` passes malformed escapes through; reject them instead
fn validate_escapes(tail: &str) -> Result<(), ServeError> {
    let bytes = tail.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(ServeError::Path(tail.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Same-origin Location for the slash-terminated directory URL
///
/// Leading slashes and backslashes collapse to one `/`, so `//host` can never
/// become a scheme-relative redirect.
fn directory_location(ctx: &RequestContext<'_>) -> String {
    let path = ctx.path.trim_start_matches(['/', '\\']);
    match ctx.query {
        Some(query) => format!("/{path}/?{query}"),
        None => format!("/{path}/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, RouteConfig, RouteKind};
    use crate::gate::PauseGate;
    use http_body_util::BodyExt;
    use std::sync::Arc;

    fn state_for(root: &Path) -> AppState {
        let mut config = Config::default();
        config.routes.push(RouteConfig {
            prefix: "/".to_string(),
            kind: RouteKind::Dir,
            path: root.display().to_string(),
        });
        AppState::new(&config)
    }

    fn ctx<'a>(path: &'a str, query: Option<&'a str>) -> RequestContext<'a> {
        RequestContext {
            path,
            query,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("a/b/c"), "/a/b/c");
        assert_eq!(clean_path("/a/./b//c/"), "/a/b/c");
        assert_eq!(clean_path("a/../b"), "/b");
        assert_eq!(clean_path("../../etc/passwd"), "/etc/passwd");
        assert_eq!(clean_path("/a/b/../../../.."), "/");
    }

    #[test]
    fn test_resolve_path_stays_under_root() {
        let root = Path::new("/srv/www");
        let cases = [
            ("index.html", "/srv/www/index.html"),
            ("", "/srv/www"),
            ("../../etc/passwd", "/srv/www/etc/passwd"),
            ("%2e%2e/%2e%2e/etc/passwd", "/srv/www/etc/passwd"),
            ("a/..%2F..%2F..%2Fsecret", "/srv/www/secret"),
            ("dir/../file.txt", "/srv/www/file.txt"),
            ("my%20file.txt", "/srv/www/my file.txt"),
        ];
        for (tail, expected) in cases {
            let resolved = resolve_path(root, tail).unwrap();
            assert_eq!(resolved, PathBuf::from(expected), "tail {tail:?}");
            assert!(resolved.starts_with(root));
        }
    }

    #[test]
    fn test_resolve_path_rejects_bad_encoding() {
        let root = Path::new("/srv/www");
        for tail in ["%zz", "bad%2", "trailing%", "%00", "%ff%fe"] {
            assert!(
                matches!(resolve_path(root, tail), Err(ServeError::Path(_))),
                "tail {tail:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());
        let err = serve_directory(&ctx("/nope.txt", None), dir.path(), "nope.txt", &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_directory_redirect_preserves_query() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let state = state_for(dir.path());

        let response = serve_directory(&ctx("/docs", Some("v=1")), dir.path(), "docs", &state)
            .await
            .unwrap();
        assert_eq!(response.status(), 301);
        assert_eq!(response.headers()["location"], "/docs/?v=1");
    }

    #[tokio::test]
    async fn test_redirect_target_does_not_redirect_again() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "docs home").unwrap();
        let state = state_for(dir.path());

        let first = serve_directory(&ctx("/docs", None), dir.path(), "docs", &state)
            .await
            .unwrap();
        let location = first.headers()["location"].to_str().unwrap().to_string();
        assert_eq!(location, "/docs/");

        let tail = location.trim_start_matches('/');
        let second = serve_directory(&ctx(&location, None), dir.path(), tail, &state)
            .await
            .unwrap();
        assert_eq!(second.status(), 200);
        let body = second.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"docs home");
    }

    #[tokio::test]
    async fn test_report_directory_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report");
        std::fs::create_dir(&report).unwrap();
        std::fs::write(report.join("index.html"), "<p>report</p>").unwrap();
        std::fs::write(report.join("index.html.header"), "X-Custom\n1\nhello\n").unwrap();

        let mut config = Config::default();
        config.routes.push(RouteConfig {
            prefix: "/assets".to_string(),
            kind: RouteKind::Dir,
            path: dir.path().display().to_string(),
        });
        let state = AppState::new(&config);

        let response = serve_directory(&ctx("/assets/report/", None), dir.path(), "report/", &state)
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["x-custom"], "hello");
        assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");

        let response = serve_directory(&ctx("/assets/report", None), dir.path(), "report", &state)
            .await
            .unwrap();
        assert_eq!(response.status(), 301);
        assert_eq!(response.headers()["location"], "/assets/report/");
    }

    #[tokio::test]
    async fn test_paused_hides_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let state = AppState::with_gate(&config, Arc::new(PauseGate::armed(60)));

        let err = serve_directory(&ctx("/nope.txt", None), dir.path(), "nope.txt", &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::Paused { .. }));
    }

    #[tokio::test]
    async fn test_paused_directory_without_slash_is_not_redirected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let gate = Arc::new(PauseGate::armed(60));
        let state = AppState::with_gate(&Config::default(), Arc::clone(&gate));

        let err = serve_directory(&ctx("/docs", None), dir.path(), "docs", &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ServeError::Paused { .. }));

        gate.arm(0);
        let response = serve_directory(&ctx("/docs", None), dir.path(), "docs", &state)
            .await
            .unwrap();
        assert_eq!(response.status(), 301);
    }

    #[tokio::test]
    async fn test_redirect_stays_on_same_origin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("evil.example")).unwrap();
        let state = state_for(dir.path());

        let cases = [
            ("//evil.example", None, "/evil.example/"),
            ("///evil.example", Some("a=1"), "/evil.example/?a=1"),
            ("/\\evil.example", None, "/evil.example/"),
        ];
        for (path, query, expected) in cases {
            let response = serve_directory(&ctx(path, query), dir.path(), "evil.example", &state)
                .await
                .unwrap();
            assert_eq!(response.status(), 301, "path {path:?}");
            assert_eq!(response.headers()["location"], expected, "path {path:?}");
        }
    }
}
