//! Response body types
//!
//! Small bodies are sent from memory; files are streamed so the open handle
//! lives exactly as long as the response body.

use futures_util::TryStreamExt;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

/// Body type of every response produced by this crate
pub type ResponseBody = http_body_util::combinators::UnsyncBoxBody<Bytes, std::io::Error>;

/// Read buffer size for streamed files
const CHUNK_SIZE: usize = 64 * 1024;

/// In-memory body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Empty body
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream `len` bytes from the current position of `file`.
///
/// The file is owned by the stream and closed when the body completes, fails,
/// or is dropped because the client went away.
pub fn file(file: File, len: u64) -> ResponseBody {
    let reader = ReaderStream::with_capacity(file.take(len), CHUNK_SIZE);
    StreamBody::new(reader.map_ok(Frame::data)).boxed_unsync()
}
