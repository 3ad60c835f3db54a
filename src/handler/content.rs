//! Conditional content server
//!
//! Serves a single file: consults the pause gate, falls back to `index.html`
//! for directories, merges sidecar headers, evaluates preconditions and
//! answers byte ranges.

use crate::error::ServeError;
use crate::gate::{self, PauseGate};
use crate::handler::router::RequestContext;
use crate::http::conditional::{self, Precondition, Validators};
use crate::http::range::RangeParseResult;
use crate::http::{self, body, mime, ResponseBody};
use crate::logger;
use crate::sidecar::{self, HeaderSet, IgnoreSet};
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_RANGES, CONTENT_ENCODING, CONTENT_LENGTH,
    CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED,
};
use hyper::{Response, StatusCode};
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::{self, File};
use tokio::io::AsyncSeekExt;

/// Document served for directory requests
pub const INDEX_FILE: &str = "index.html";

/// Where a served file's extra headers come from
#[derive(Debug, Clone)]
pub enum SidecarSource {
    /// Read `<file>.header` next to the resolved file
    Adjacent,
    /// Headers supplied by the caller
    Provided(HeaderSet),
    /// No extra headers
    Disabled,
}

/// An open file and the metadata needed to serve it
#[derive(Debug)]
pub struct ServedFile {
    /// Resolved path (after the index fallback)
    pub path: PathBuf,
    pub file: File,
    pub size: u64,
    pub modified: SystemTime,
}

impl ServedFile {
    /// Open `path`, substituting `index.html` when it is a directory
    pub async fn open(path: &Path) -> Result<Self, ServeError> {
        let meta = fs::metadata(path).await.map_err(|e| open_error(path, e))?;
        let path = if meta.is_dir() {
            path.join(INDEX_FILE)
        } else {
            path.to_path_buf()
        };

        let file = File::open(&path).await.map_err(|e| open_error(&path, e))?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(ServeError::NotFound(path.display().to_string()));
        }

        Ok(Self {
            size: meta.len(),
            modified: meta.modified().unwrap_or(UNIX_EPOCH),
            file,
            path,
        })
    }
}

/// Serve the file at `path`
///
/// The gate is consulted once, before anything is opened.
pub async fn serve(
    ctx: &RequestContext<'_>,
    path: &Path,
    sidecar: SidecarSource,
    gate: &PauseGate,
    ignore: &IgnoreSet,
) -> Result<Response<ResponseBody>, ServeError> {
    if let Some(retry_after) = gate.retry_after(gate::now_unix()) {
        return Err(ServeError::Paused { retry_after });
    }
    serve_released(ctx, path, sidecar, ignore).await
}

/// Serve the file at `path` for a request the gate has already let through
///
/// The open file moves into the response body and is closed when the body
/// is finished or dropped.
pub async fn serve_released(
    ctx: &RequestContext<'_>,
    path: &Path,
    sidecar: SidecarSource,
    ignore: &IgnoreSet,
) -> Result<Response<ResponseBody>, ServeError> {
    let served = ServedFile::open(path).await?;
    let extra = match sidecar {
        SidecarSource::Adjacent => load_sidecar(&served.path, ignore).await?,
        SidecarSource::Provided(headers) => headers,
        SidecarSource::Disabled => HeaderSet::new(),
    };

    let mut headers = HeaderMap::new();
    merge_headers(&mut headers, &extra, ignore);

    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(mime::content_type_for(&served.path)),
        );
    }

    let modified = conditional::unix_seconds(served.modified);
    if let Ok(value) = HeaderValue::from_str(&conditional::format_http_date(served.modified)) {
        headers.insert(LAST_MODIFIED, value);
    }
    if !headers.contains_key(ETAG) {
        if let Ok(value) = HeaderValue::from_str(&conditional::generate_etag(modified, served.size))
        {
            headers.insert(ETAG, value);
        }
    }
    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    let validators = Validators {
        etag: etag.as_deref(),
        modified,
    };
    match conditional::evaluate(&ctx.conditional, &validators) {
        Precondition::Failed => return Ok(http::build_412_response()),
        Precondition::NotModified => return Ok(not_modified(headers)),
        Precondition::Proceed => {}
    }

    let range_header = ctx
        .range
        .filter(|_| conditional::range_applies(ctx.conditional.if_range, &validators));

    let ServedFile { mut file, size, .. } = served;
    let (status, len) = match http::parse_range_header(range_header, size) {
        RangeParseResult::Valid(range) => {
            if let Ok(value) = HeaderValue::from_str(&range.content_range(size)) {
                headers.insert(CONTENT_RANGE, value);
            }
            if !ctx.is_head {
                file.seek(SeekFrom::Start(range.start)).await?;
            }
            (StatusCode::PARTIAL_CONTENT, range.len())
        }
        RangeParseResult::NotSatisfiable => return Ok(http::build_416_response(size)),
        RangeParseResult::None => (StatusCode::OK, size),
    };

    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));

    let body = if ctx.is_head {
        body::empty()
    } else {
        body::file(file, len)
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Read the sidecar of `file`. Absent or malformed sidecars yield no headers.
async fn load_sidecar(file: &Path, ignore: &IgnoreSet) -> Result<HeaderSet, ServeError> {
    let path = sidecar::sidecar_path(file);
    match sidecar::read(&path, ignore).await {
        Ok(headers) => Ok(headers),
        Err(e) if e.is_not_found() => Ok(HeaderSet::new()),
        Err(e) if e.is_format() => {
            logger::log_warning(&format!(
                "Ignoring malformed sidecar '{}': {e}",
                path.display()
            ));
            Ok(HeaderSet::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Append every non-ignored header of `extra` to `headers`
pub fn merge_headers(headers: &mut HeaderMap, extra: &HeaderSet, ignore: &IgnoreSet) {
    for (name, values) in extra.iter() {
        if ignore.contains(name) {
            continue;
        }
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            logger::log_warning(&format!("Skipping invalid sidecar header name '{name}'"));
            continue;
        };
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.append(header_name.clone(), value);
                }
                Err(_) => logger::log_warning(&format!(
                    "Skipping invalid value for sidecar header '{name}'"
                )),
            }
        }
    }
}

/// 304 keeps validators and sidecar headers, drops representation metadata
fn not_modified(mut headers: HeaderMap) -> Response<ResponseBody> {
    headers.remove(CONTENT_TYPE);
    headers.remove(CONTENT_LENGTH);
    headers.remove(CONTENT_ENCODING);
    if headers.contains_key(ETAG) {
        headers.remove(LAST_MODIFIED);
    }

    let mut response = Response::new(body::empty());
    *response.status_mut() = StatusCode::NOT_MODIFIED;
    *response.headers_mut() = headers;
    response
}

fn open_error(path: &Path, err: io::Error) -> ServeError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
            ServeError::NotFound(path.display().to_string())
        }
        _ => ServeError::Io(err),
    }
}
