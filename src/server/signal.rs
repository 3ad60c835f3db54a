// Signal handling module (nginx-style)
//
// Supported signals:
// - SIGHUP:  Reload configuration and re-arm the pause gate
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGUSR1: Reopen log files

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::config::{AppState, Config};
use crate::logger;

/// Signal handler state
pub struct SignalHandler {
    /// Shutdown signal (SIGTERM, SIGINT)
    pub shutdown: Arc<Notify>,
    /// Whether shutdown has been requested
    pub shutdown_requested: Arc<AtomicBool>,
    /// Configuration re-read on SIGHUP
    config_path: String,
}

impl SignalHandler {
    pub fn new(config_path: impl Into<String>) -> Self {
        Self {
            shutdown: Arc::new(Notify::new()),
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            config_path: config_path.into(),
        }
    }

    /// Wake every waiter on the shutdown signal
    pub fn request_shutdown(&self, reason: &str) {
        logger::log_shutdown(reason);
        self.shutdown_requested.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    /// Re-read the configuration file and apply it to `state`
    pub fn reload(&self, state: &AppState) {
        match Config::load_from(&self.config_path) {
            Ok(config) => {
                state.reload(&config);
                logger::log_gate_armed(config.pause.seconds, state.gate.release_at());
            }
            Err(e) => logger::log_error(&format!(
                "Failed to reload configuration '{}': {e}",
                self.config_path
            )),
        }
    }

    pub fn reopen_logs() {
        match logger::reopen() {
            Ok(()) => logger::log_info("[SIGNAL] Log files reopened"),
            Err(e) => logger::log_error(&format!("Failed to reopen log files: {e}")),
        }
    }
}

/// Start signal handlers (Unix only)
///
/// | Signal  | Action              | Nginx Equivalent  |
/// |---------|---------------------|-------------------|
/// | SIGHUP  | Reload config       | `nginx -s reload` |
/// | SIGTERM | Graceful stop       | `nginx -s stop`   |
/// | SIGINT  | Graceful stop       | Ctrl+C            |
/// | SIGUSR1 | Reopen logs         | `nginx -s reopen` |
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>, state: Arc<AppState>) {
    tokio::spawn(async move {
        let (mut sighup, mut sigterm, mut sigint, mut sigusr1) = match register_signals() {
            Ok(signals) => signals,
            Err(e) => {
                logger::log_error(&format!("Failed to register signal handlers: {e}"));
                return;
            }
        };

        logger::log_debug(&format!(
            "[SIGNAL] Handlers registered for HUP, TERM, INT, USR1 (pid {})",
            std::process::id()
        ));

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    logger::log_info("[SIGNAL] SIGHUP received, reloading configuration");
                    handler.reload(&state);
                }
                _ = sigterm.recv() => {
                    handler.request_shutdown("SIGTERM received");
                    break;
                }
                _ = sigint.recv() => {
                    handler.request_shutdown("SIGINT received");
                    break;
                }
                _ = sigusr1.recv() => {
                    SignalHandler::reopen_logs();
                }
            }
        }
    });
}

#[cfg(unix)]
type UnixSignals = (
    tokio::signal::unix::Signal,
    tokio::signal::unix::Signal,
    tokio::signal::unix::Signal,
    tokio::signal::unix::Signal,
);

/// HUP, TERM, INT and USR1 streams
#[cfg(unix)]
fn register_signals() -> std::io::Result<UnixSignals> {
    use tokio::signal::unix::{signal, SignalKind};

    Ok((
        signal(SignalKind::hangup())?,
        signal(SignalKind::terminate())?,
        signal(SignalKind::interrupt())?,
        signal(SignalKind::user_defined1())?,
    ))
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>, _state: Arc<AppState>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            handler.request_shutdown("Ctrl+C received");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_shutdown_wakes_waiters() {
        let handler = SignalHandler::new("/nonexistent/config");
        let shutdown = Arc::clone(&handler.shutdown);
        let waiter = tokio::spawn(async move { shutdown.notified().await });
        tokio::task::yield_now().await;

        // The spawned waiter may not be registered yet; retry until it wakes
        for _ in 0..100 {
            handler.request_shutdown("test");
            if waiter.is_finished() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(handler.shutdown_requested.load(Ordering::SeqCst));
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_reload_rearms_gate_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gated.toml");
        std::fs::write(&path, "[pause]\nseconds = 300\n").unwrap();
        let base = path.with_extension("");

        let state = AppState::new(&Config::default());
        assert!(state.gate.is_released());

        let handler = SignalHandler::new(base.to_str().unwrap());
        handler.reload(&state);
        assert!(!state.gate.is_released());
    }
}
