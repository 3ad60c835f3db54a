// Configuration module entry point
// Loads configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::routing::RouteTable;
use crate::sidecar::IgnoreSet;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PauseConfig, PerformanceConfig, RouteConfig, RouteKind,
    ServerConfig, SidecarConfig,
};

/// Default configuration file (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `GATED_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "GATED";

/// Directory mounted at `/` when no route is configured
pub const DEFAULT_ROOT: &str = "public";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Missing files fall back to defaults and environment overrides
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "gated-static")?
            .set_default("http.enable_cors", false)?
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        if config.routes.is_empty() {
            config.routes.push(RouteConfig {
                prefix: "/".to_string(),
                kind: RouteKind::Dir,
                path: DEFAULT_ROOT.to_string(),
            });
        }
        Ok(config)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Build the route table from the configured routes
    pub fn route_table(&self) -> RouteTable {
        let mut table = RouteTable::new();
        for route in &self.routes {
            match route.kind {
                RouteKind::Dir => {
                    table.mount_static(&route.prefix, &route.path);
                }
                RouteKind::File => table.mount_file(&route.prefix, &route.path),
            }
        }
        table
    }

    /// Header names excluded from sidecar injection
    pub fn ignore_set(&self) -> IgnoreSet {
        IgnoreSet::new(&self.sidecar.ignore_headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{RoutePattern, RouteTarget};
    use std::path::PathBuf;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from("/nonexistent/gated-static-config").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pause.seconds, 0);
        assert!(config.sidecar.enabled);
        assert!(config.ignore_set().contains("content-length"));
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].path, DEFAULT_ROOT);
        assert_eq!(
            config.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse().unwrap()
        );
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gated.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "0.0.0.0"
port = 9090

[pause]
seconds = 120

[sidecar]
ignore_headers = ["Content-Length"]

[[routes]]
prefix = "/assets"
type = "dir"
path = "/srv/assets"

[[routes]]
prefix = "/report.pdf"
type = "file"
path = "/srv/report.pdf"
"#,
        )
        .unwrap();

        let base = path.with_extension("");
        let config = Config::load_from(base.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.pause.seconds, 120);
        assert_eq!(config.ignore_set().len(), 1);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[1].kind, RouteKind::File);

        let table = config.route_table();
        assert_eq!(table.entries().len(), 3);
        assert_eq!(
            table.entries()[0].pattern,
            RoutePattern::Exact("/assets".to_string())
        );
        assert_eq!(
            table.entries()[2].target,
            RouteTarget::File {
                path: PathBuf::from("/srv/report.pdf")
            }
        );
    }
}
