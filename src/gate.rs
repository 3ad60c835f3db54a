//! Pause gate
//!
//! Holds back served content until a configured release instant. The gate is
//! created once at startup, shared through `AppState`, and consulted exactly
//! once per request before any response header is produced.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Release timestamp of a gate that was never armed
const ALWAYS_RELEASED: i64 = 0;

/// Single-writer, many-reader release timestamp (unix seconds)
#[derive(Debug)]
pub struct PauseGate {
    release_at: AtomicI64,
}

impl PauseGate {
    /// Create an open gate
    pub const fn new() -> Self {
        Self {
            release_at: AtomicI64::new(ALWAYS_RELEASED),
        }
    }

    /// Create a gate armed `seconds_from_now` seconds in the future
    pub fn armed(seconds_from_now: u64) -> Self {
        let gate = Self::new();
        gate.arm(seconds_from_now);
        gate
    }

    /// Release content `seconds_from_now` seconds from now. Last call wins.
    pub fn arm(&self, seconds_from_now: u64) {
        let offset = i64::try_from(seconds_from_now).unwrap_or(i64::MAX);
        self.arm_at(now_unix().saturating_add(offset));
    }

    /// Release content at an absolute unix timestamp; 0 opens the gate
    pub fn arm_at(&self, release_at: i64) {
        self.release_at.store(release_at, Ordering::SeqCst);
    }

    /// Current release timestamp (0 when never armed)
    pub fn release_at(&self) -> i64 {
        self.release_at.load(Ordering::SeqCst)
    }

    /// Whether content may be served right now
    pub fn is_released(&self) -> bool {
        self.is_released_at(now_unix())
    }

    /// Whether content may be served at `now` (unix seconds)
    pub fn is_released_at(&self, now: i64) -> bool {
        self.retry_after(now).is_none()
    }

    /// Seconds left until release, `None` once released.
    ///
    /// Reads the timestamp once, so a concurrent re-arm is observed either
    /// entirely or not at all.
    pub fn retry_after(&self, now: i64) -> Option<u64> {
        let release_at = self.release_at();
        if release_at == ALWAYS_RELEASED || now >= release_at {
            return None;
        }
        u64::try_from(release_at - now).ok()
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time in unix seconds
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
