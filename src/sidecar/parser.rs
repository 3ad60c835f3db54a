//! Sidecar format parsing and encoding
//!
//! A sidecar is a flat sequence of records:
//!
//! ```text
//! X-Custom        <- header name
//! 2               <- value count N
//! first           <- N value lines
//! second
//! ```
//!
//! Lines end with `\n` or `\r\n`. End of input between records ends parsing.

use super::error::SidecarError;
use super::{HeaderSet, IgnoreSet};
use std::fmt::Write;

/// Parse sidecar text, skipping records whose name is in `ignore`
pub fn parse(input: &str, ignore: &IgnoreSet) -> Result<HeaderSet, SidecarError> {
    let mut lines = split_lines(input).enumerate();
    let mut headers = HeaderSet::new();

    while let Some((_, name)) = lines.next() {
        let Some((index, count_str)) = lines.next() else {
            return Err(SidecarError::Truncated {
                name: name.to_string(),
            });
        };

        let count = parse_count(count_str).ok_or_else(|| SidecarError::InvalidCount {
            name: name.to_string(),
            line: index + 1,
            value: count_str.to_string(),
        })?;

        // Ignored records are consumed so the next record stays aligned
        let skip = ignore.contains(name);
        for _ in 0..count {
            let Some((_, value)) = lines.next() else {
                return Err(SidecarError::Truncated {
                    name: name.to_string(),
                });
            };
            if !skip {
                headers.append(name, value);
            }
        }
    }

    Ok(headers)
}

/// Encode a header set in sidecar format
pub fn encode(headers: &HeaderSet) -> String {
    let mut out = String::new();
    for (name, values) in headers.iter() {
        let _ = writeln!(out, "{name}");
        let _ = writeln!(out, "{}", values.len());
        for value in values {
            let _ = writeln!(out, "{value}");
        }
    }
    out
}

/// Split on `\n`, dropping an optional `\r` before it. A final line without a
/// terminator is kept; a trailing terminator does not produce an empty line.
fn split_lines(input: &str) -> impl Iterator<Item = &str> {
    input
        .split_terminator('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Decimal digits only: no sign, no surrounding whitespace
fn parse_count(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
