//! Access log lines
//!
//! `logging.access_log_format` names one of the fixed layouts (`combined`,
//! `common`, `json`) or is a pattern with nginx-style `$variables`.

use chrono::Local;
use hyper::header::{HeaderName, REFERER, USER_AGENT};
use hyper::{Request, Version};
use serde_json::json;
use std::net::SocketAddr;

const TIME_LOCAL: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request, as written to the access log
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP, without the port
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    /// Path as requested, still percent-encoded
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    /// Body bytes announced for the response; zero for HEAD
    pub body_bytes: u64,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

/// Layout selected by `logging.access_log_format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat<'a> {
    Combined,
    Common,
    Json,
    Pattern(&'a str),
}

impl<'a> LogFormat<'a> {
    pub fn parse(name: &'a str) -> Self {
        match name {
            "combined" => Self::Combined,
            "common" => Self::Common,
            "json" => Self::Json,
            pattern => Self::Pattern(pattern),
        }
    }
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Capture the request line and client headers of `req`
    pub fn from_request<B>(req: &Request<B>, remote_addr: SocketAddr) -> Self {
        let header = |name: HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        let mut entry = Self::new(
            remote_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_label(req.version()).to_string();
        entry.referer = header(REFERER);
        entry.user_agent = header(USER_AGENT);
        entry
    }

    pub fn format(&self, format: &str) -> String {
        match LogFormat::parse(format) {
            LogFormat::Common => self.clf_prefix(),
            LogFormat::Combined => format!(
                "{} \"{}\" \"{}\"",
                self.clf_prefix(),
                dash(self.referer.as_deref()),
                dash(self.user_agent.as_deref()),
            ),
            LogFormat::Json => self.to_json(),
            LogFormat::Pattern(pattern) => self.expand(pattern),
        }
    }

    /// Path plus `?query` when there is one
    fn request_uri(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{query}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri(),
            self.http_version
        )
    }

    fn request_secs(&self) -> String {
        format!(
            "{}.{:03}",
            self.request_time_us / 1_000_000,
            (self.request_time_us % 1_000_000) / 1_000
        )
    }

    /// `host - - [time] "request" status bytes`, shared by both CLF layouts
    fn clf_prefix(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(TIME_LOCAL),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn to_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Value of one `$name` pattern variable
    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time.format(TIME_LOCAL).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request" => self.request_line(),
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "uri" => self.path.clone(),
            "args" => self.query.clone().unwrap_or_default(),
            "server_protocol" => format!("HTTP/{}", self.http_version),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "http_referer" => dash(self.referer.as_deref()).to_string(),
            "http_user_agent" => dash(self.user_agent.as_deref()).to_string(),
            "request_time" => self.request_secs(),
            _ => return None,
        };
        Some(value)
    }

    /// Expand `$name` variables in one pass
    ///
    /// A name is the longest run of `[A-Za-z0-9_]` after `$`. Unknown names
    /// are kept as written, and substituted values are never expanded again.
    fn expand(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 64);
        let mut rest = pattern;
        while let Some(at) = rest.find('$') {
            out.push_str(&rest[..at]);
            let after = &rest[at + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..len];
            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[len..];
        }
        out.push_str(rest);
        out
    }
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// A ranged download of the quarterly report
    fn report_download() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "203.0.113.9".to_string(),
            "GET".to_string(),
            "/assets/report/q3.pdf".to_string(),
        );
        entry.time = Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        entry.query = Some("dl=1".to_string());
        entry.status = 206;
        entry.body_bytes = 65536;
        entry.referer = Some("https://intranet.test/assets/report/".to_string());
        entry.user_agent = Some("curl/8.5.0".to_string());
        entry.request_time_us = 2_345_678;
        entry
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!(LogFormat::parse("combined"), LogFormat::Combined);
        assert_eq!(LogFormat::parse("common"), LogFormat::Common);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("$status"), LogFormat::Pattern("$status"));
    }

    #[test]
    fn test_common_and_combined_share_request_part() {
        let entry = report_download();
        let stamp = entry.time.format(TIME_LOCAL).to_string();
        let common = entry.format("common");
        assert_eq!(
            common,
            format!(
                "203.0.113.9 - - [{stamp}] \"GET /assets/report/q3.pdf?dl=1 HTTP/1.1\" 206 65536"
            )
        );

        let combined = entry.format("combined");
        assert!(combined.starts_with(&common));
        assert!(combined.ends_with(" \"https://intranet.test/assets/report/\" \"curl/8.5.0\""));
    }

    #[test]
    fn test_combined_dashes_missing_headers() {
        let mut entry = report_download();
        entry.referer = None;
        entry.user_agent = None;
        assert!(entry.format("combined").ends_with(" \"-\" \"-\""));
    }

    #[test]
    fn test_json_is_parseable() {
        let mut entry = report_download();
        entry.user_agent = Some("agent \"quoted\"".to_string());
        entry.referer = None;
        let value: serde_json::Value = serde_json::from_str(&entry.format("json")).unwrap();
        assert_eq!(value["status"], 206);
        assert_eq!(value["query"], "dl=1");
        assert_eq!(value["body_bytes"], 65536);
        assert_eq!(value["user_agent"], "agent \"quoted\"");
        assert!(value["referer"].is_null());
    }

    #[test]
    fn test_pattern_variables() {
        let entry = report_download();
        let cases = [
            ("$request_time", "2.345"),
            ("$request", "GET /assets/report/q3.pdf?dl=1 HTTP/1.1"),
            ("$request_uri|$uri|$args", "/assets/report/q3.pdf?dl=1|/assets/report/q3.pdf|dl=1"),
            ("$status:$body_bytes_sent", "206:65536"),
            ("[$server_protocol]", "[HTTP/1.1]"),
            ("$remote_addr $http_user_agent", "203.0.113.9 curl/8.5.0"),
        ];
        for (pattern, expected) in cases {
            assert_eq!(entry.format(pattern), expected, "pattern {pattern:?}");
        }
    }

    #[test]
    fn test_pattern_keeps_unknown_and_literal_dollars() {
        let entry = report_download();
        assert_eq!(entry.format("$nope $status $"), "$nope 206 $");
        assert_eq!(entry.format("cost: $5"), "cost: $5");
    }

    #[test]
    fn test_substituted_values_are_not_expanded() {
        let mut entry = report_download();
        entry.user_agent = Some("bot/$status".to_string());
        assert_eq!(entry.format("$http_user_agent $status"), "bot/$status 206");
    }

    #[test]
    fn test_from_request() {
        let req = Request::builder()
            .method("HEAD")
            .version(Version::HTTP_10)
            .uri("/assets/report/?lang=en")
            .header("Referer", "https://intranet.test/")
            .body(())
            .unwrap();
        let entry = AccessLogEntry::from_request(&req, "198.51.100.4:52110".parse().unwrap());
        assert_eq!(entry.remote_addr, "198.51.100.4");
        assert_eq!(entry.method, "HEAD");
        assert_eq!(entry.path, "/assets/report/");
        assert_eq!(entry.query.as_deref(), Some("lang=en"));
        assert_eq!(entry.http_version, "1.0");
        assert_eq!(entry.referer.as_deref(), Some("https://intranet.test/"));
        assert!(entry.user_agent.is_none());
    }
}
