// Configuration types module
// Defines all configuration-related data structures

use crate::sidecar::DEFAULT_IGNORED_HEADERS;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub pause: PauseConfig,
    #[serde(default)]
    pub sidecar: SidecarConfig,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Minimum level: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: "gated-static".to_string(),
            enable_cors: false,
        }
    }
}

/// Pause gate configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PauseConfig {
    /// Seconds after startup before content is released (0 = released)
    #[serde(default)]
    pub seconds: u64,
}

/// Header sidecar configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SidecarConfig {
    /// Read `<file>.header` sidecars
    #[serde(default = "default_sidecar_enabled")]
    pub enabled: bool,
    /// Header names never taken from a sidecar
    #[serde(default = "default_ignore_headers")]
    pub ignore_headers: Vec<String>,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            enabled: default_sidecar_enabled(),
            ignore_headers: default_ignore_headers(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_sidecar_enabled() -> bool {
    true
}

fn default_ignore_headers() -> Vec<String> {
    DEFAULT_IGNORED_HEADERS
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// One configured route
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// URL prefix (dir) or exact URL (file)
    pub prefix: String,
    #[serde(rename = "type")]
    pub kind: RouteKind,
    /// Filesystem directory or file
    pub path: String,
}

/// Route kinds
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Dir,
    File,
}
