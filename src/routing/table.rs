//! Route table
//!
//! Holds exact and wildcard routes. A static mount registers its routes the
//! way conventional static mounts do:
//!
//! - `/prefix/` registers only the wildcard `/prefix/*`
//! - `/prefix` registers the exact `/prefix` and the wildcard `/prefix/*`

use std::fmt;
use std::path::PathBuf;

/// Route path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// Matches one path exactly
    Exact(String),
    /// Matches every path starting with the stored prefix; the remainder is
    /// the wildcard tail
    Wildcard(String),
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(path) => write!(f, "{path}"),
            Self::Wildcard(prefix) => write!(f, "{prefix}*"),
        }
    }
}

/// What a matched route serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Static mount rooted at a directory
    Dir { root: PathBuf },
    /// One file
    File { path: PathBuf },
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dir { root } => write!(f, "dir {}", root.display()),
            Self::File { path } => write!(f, "file {}", path.display()),
        }
    }
}

/// A registered route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub pattern: RoutePattern,
    pub target: RouteTarget,
}

/// Ordered set of routes
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Mount the directory `root` at URL `prefix`.
    ///
    /// An empty `root` is taken as the working directory. Returns the number
    /// of routes registered.
    pub fn mount_static(&mut self, prefix: &str, root: impl Into<PathBuf>) -> usize {
        let mut root: PathBuf = root.into();
        if root.as_os_str().is_empty() {
            root = PathBuf::from(".");
        }
        let target = RouteTarget::Dir { root };

        if prefix.ends_with('/') {
            self.push(RoutePattern::Wildcard(prefix.to_string()), target);
            return 1;
        }

        let mut added = 0;
        if !prefix.is_empty() {
            self.push(RoutePattern::Exact(prefix.to_string()), target.clone());
            added += 1;
        }
        self.push(RoutePattern::Wildcard(format!("{prefix}/")), target);
        added + 1
    }

    /// Serve the file at `path` for exactly `url`
    pub fn mount_file(&mut self, url: &str, path: impl Into<PathBuf>) {
        self.push(
            RoutePattern::Exact(url.to_string()),
            RouteTarget::File { path: path.into() },
        );
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, pattern: RoutePattern, target: RouteTarget) {
        self.entries.push(RouteEntry { pattern, target });
    }
}
