// Application state module
// Shared, read-mostly state handed to every request

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::types::Config;
use crate::gate::PauseGate;
use crate::handler::SidecarSource;
use crate::routing::RouteTable;
use crate::sidecar::IgnoreSet;

/// Application state
pub struct AppState {
    pub config: Config,
    pub routes: RouteTable,
    pub ignore: IgnoreSet,

    /// Release gate, armed at startup and on reload
    pub gate: Arc<PauseGate>,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    /// Build state from configuration, arming the gate when a pause is configured
    pub fn new(config: &Config) -> Self {
        let gate = PauseGate::new();
        if config.pause.seconds > 0 {
            gate.arm(config.pause.seconds);
        }
        Self::with_gate(config, Arc::new(gate))
    }

    /// Build state around an existing gate
    pub fn with_gate(config: &Config, gate: Arc<PauseGate>) -> Self {
        Self {
            config: config.clone(),
            routes: config.route_table(),
            ignore: config.ignore_set(),
            gate,
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }

    /// Where served files take their extra headers from
    pub const fn sidecar_source(&self) -> SidecarSource {
        if self.config.sidecar.enabled {
            SidecarSource::Adjacent
        } else {
            SidecarSource::Disabled
        }
    }

    /// Re-apply the reloadable parts of a new configuration
    pub fn reload(&self, new_config: &Config) {
        self.gate.arm(new_config.pause.seconds);
        self.cached_access_log
            .store(new_config.logging.access_log, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaused_by_default() {
        let state = AppState::new(&Config::default());
        assert!(state.gate.is_released());
        assert!(matches!(state.sidecar_source(), SidecarSource::Adjacent));
    }

    #[test]
    fn test_configured_pause_arms_gate() {
        let mut config = Config::default();
        config.pause.seconds = 600;
        let state = AppState::new(&config);
        assert!(!state.gate.is_released());
    }

    #[test]
    fn test_reload_rearms_gate() {
        let state = AppState::new(&Config::default());
        let mut config = Config::default();
        config.pause.seconds = 600;
        config.logging.access_log = false;

        state.reload(&config);
        assert!(!state.gate.is_released());
        assert!(!state.cached_access_log.load(Ordering::Relaxed));

        state.reload(&Config::default());
        assert!(state.gate.is_released());
    }
}
