//! Route matching module
//!
//! Exact routes win over wildcards; among wildcards the longest prefix wins.

use super::table::{RouteEntry, RoutePattern, RouteTable, RouteTarget};

/// A matched route and the part of the path captured by its wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub target: &'a RouteTarget,
    /// Wildcard tail, still percent-encoded; empty for exact matches
    pub tail: &'a str,
}

/// Find the route serving `path`
pub fn match_route<'a>(table: &'a RouteTable, path: &'a str) -> Option<RouteMatch<'a>> {
    let entries = table.entries();

    if let Some(entry) = entries
        .iter()
        .find(|entry| matches!(&entry.pattern, RoutePattern::Exact(exact) if exact == path))
    {
        return Some(RouteMatch {
            target: &entry.target,
            tail: "",
        });
    }

    entries
        .iter()
        .filter_map(|entry| wildcard_tail(entry, path).map(|tail| (entry, tail)))
        .max_by_key(|(entry, _)| prefix_len(entry))
        .map(|(entry, tail)| RouteMatch {
            target: &entry.target,
            tail,
        })
}

/// Tail captured by a wildcard entry, if it matches
fn wildcard_tail<'a>(entry: &RouteEntry, path: &'a str) -> Option<&'a str> {
    match &entry.pattern {
        RoutePattern::Wildcard(prefix) => path.strip_prefix(prefix.as_str()),
        RoutePattern::Exact(_) => None,
    }
}

fn prefix_len(entry: &RouteEntry) -> usize {
    match &entry.pattern {
        RoutePattern::Wildcard(prefix) | RoutePattern::Exact(prefix) => prefix.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dir(root: &str) -> RouteTarget {
        RouteTarget::Dir {
            root: PathBuf::from(root),
        }
    }

    #[test]
    fn test_exact_prefix_match() {
        let mut table = RouteTable::new();
        table.mount_static("/assets", "a");

        let m = match_route(&table, "/assets").unwrap();
        assert_eq!(m.target, &dir("a"));
        assert_eq!(m.tail, "");
    }

    #[test]
    fn test_wildcard_tail() {
        let mut table = RouteTable::new();
        table.mount_static("/assets", "a");

        assert_eq!(match_route(&table, "/assets/").unwrap().tail, "");
        assert_eq!(
            match_route(&table, "/assets/css/site.css").unwrap().tail,
            "css/site.css"
        );
        assert!(match_route(&table, "/assetsX").is_none());
        assert!(match_route(&table, "/other").is_none());
    }

    #[test]
    fn test_longest_wildcard_wins() {
        let mut table = RouteTable::new();
        table.mount_static("/", "root");
        table.mount_static("/media/", "media");

        let m = match_route(&table, "/media/clip.mp4").unwrap();
        assert_eq!(m.target, &dir("media"));
        assert_eq!(m.tail, "clip.mp4");

        let m = match_route(&table, "/index.html").unwrap();
        assert_eq!(m.target, &dir("root"));
        assert_eq!(m.tail, "index.html");
    }

    #[test]
    fn test_exact_beats_wildcard() {
        let mut table = RouteTable::new();
        table.mount_static("/", "root");
        table.mount_file("/report.pdf", "files/report.pdf");

        let m = match_route(&table, "/report.pdf").unwrap();
        assert!(matches!(m.target, RouteTarget::File { .. }));
    }
}
