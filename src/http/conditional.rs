//! HTTP conditional request module
//!
//! Validator generation (`ETag`, `Last-Modified`) and precondition evaluation
//! following RFC 7232 in the order static file servers conventionally apply it:
//! `If-Match`, `If-Unmodified-Since`, `If-None-Match`, `If-Modified-Since`.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// IMF-fixdate, the preferred HTTP-date format
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// Obsolete ANSI C `asctime()` format
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Request headers that make a request conditional
#[derive(Debug, Default, Clone, Copy)]
pub struct ConditionalHeaders<'a> {
    pub if_match: Option<&'a str>,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub if_unmodified_since: Option<&'a str>,
    pub if_range: Option<&'a str>,
}

/// Validators of the representation being served
#[derive(Debug, Clone, Copy)]
pub struct Validators<'a> {
    /// Quoted entity tag, possibly `W/`-prefixed
    pub etag: Option<&'a str>,
    /// Modification time in unix seconds
    pub modified: i64,
}

/// Outcome of precondition evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Serve the representation
    Proceed,
    /// Respond 304 Not Modified
    NotModified,
    /// Respond 412 Precondition Failed
    Failed,
}

/// Generate an `ETag` from modification time and size
///
/// # Returns
/// Quoted `ETag` string, e.g., `"65a1b2c3-1f4"`
pub fn generate_etag(modified: i64, size: u64) -> String {
    format!("\"{modified:x}-{size:x}\"")
}

/// Evaluate request preconditions for a GET/HEAD request
pub fn evaluate(headers: &ConditionalHeaders<'_>, validators: &Validators<'_>) -> Precondition {
    if let Some(if_match) = headers.if_match {
        if !etag_list_matches(if_match, validators.etag, true) {
            return Precondition::Failed;
        }
    } else if let Some(since) = headers.if_unmodified_since.and_then(parse_http_date) {
        if validators.modified > since {
            return Precondition::Failed;
        }
    }

    if let Some(if_none_match) = headers.if_none_match {
        if etag_list_matches(if_none_match, validators.etag, false) {
            return Precondition::NotModified;
        }
    } else if let Some(since) = headers.if_modified_since.and_then(parse_http_date) {
        if validators.modified <= since {
            return Precondition::NotModified;
        }
    }

    Precondition::Proceed
}

/// Whether a `Range` header should be honored given `If-Range`
///
/// An entity-tag `If-Range` needs a strong match; a date needs an exact match
/// with the modification time. Anything else drops the range.
pub fn range_applies(if_range: Option<&str>, validators: &Validators<'_>) -> bool {
    let Some(value) = if_range.map(str::trim) else {
        return true;
    };

    if value.starts_with('"') || value.starts_with("W/") {
        return validators
            .etag
            .is_some_and(|etag| strong_match(value, etag));
    }

    parse_http_date(value) == Some(validators.modified)
}

/// Check a comma separated entity-tag list (or `*`) against the current tag
fn etag_list_matches(list: &str, etag: Option<&str>, strong: bool) -> bool {
    let list = list.trim();
    if list == "*" {
        return true;
    }
    let Some(etag) = etag else {
        return false;
    };
    list.split(',').map(str::trim).any(|candidate| {
        if strong {
            strong_match(candidate, etag)
        } else {
            weak_match(candidate, etag)
        }
    })
}

/// Strong comparison: neither tag weak, opaque values equal
fn strong_match(a: &str, b: &str) -> bool {
    !a.starts_with("W/") && !b.starts_with("W/") && a == b
}

/// Weak comparison: opaque values equal ignoring the `W/` prefix
fn weak_match(a: &str, b: &str) -> bool {
    a.trim_start_matches("W/") == b.trim_start_matches("W/")
}

/// Format a timestamp as an IMF-fixdate HTTP-date
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP-date formats into unix seconds
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    [IMF_FIXDATE, RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.and_utc().timestamp())
}

/// Unix seconds of a file timestamp; pre-epoch times clamp to 0
pub fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
