//! Header sidecar module
//!
//! A served file `foo.css` may have a companion `foo.css.header` listing extra
//! response headers. Sidecars are read from disk on every request so that a
//! regenerated sidecar takes effect immediately.

mod error;
mod parser;

pub use error::SidecarError;
pub use parser::{encode, parse};

use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Sidecar file suffix
pub const SIDECAR_SUFFIX: &str = ".header";

/// Headers the transport computes itself and a sidecar must not override
pub const DEFAULT_IGNORED_HEADERS: &[&str] = &[
    "Content-Length",
    "Connection",
    "Server",
    "Last-Modified",
    "Expires",
    "Access-Control-Allow-Origin",
    "Allow",
    "Content-Encoding",
];

/// Ordered header name to values mapping.
///
/// Names keep the spelling of their first occurrence; lookups are ASCII
/// case-insensitive. Repeated names append to the existing values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderSet {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a value under `name`
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some((_, values)) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            values.push(value);
        } else {
            self.entries.push((name.to_string(), vec![value]));
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate `(name, values)` in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write this set as a sidecar file
    pub async fn write(&self, path: &Path) -> io::Result<()> {
        fs::write(path, encode(self)).await
    }
}

/// Header names excluded from sidecar injection (ASCII case-insensitive)
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    names: HashSet<String>,
}

impl IgnoreSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Path of the sidecar belonging to `file`
pub fn sidecar_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Read and parse a sidecar file.
///
/// Returns `SidecarError::NotFound` when the file does not exist and
/// `SidecarError::Encoding` when it is not valid UTF-8.
pub async fn read(path: &Path, ignore: &IgnoreSet) -> Result<HeaderSet, SidecarError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SidecarError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let content = String::from_utf8(bytes).map_err(|e| SidecarError::Encoding {
        path: path.to_path_buf(),
        offset: e.utf8_error().valid_up_to(),
    })?;
    parse(&content, ignore)
}
