use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use super::utils::lock_or_recover;
use crate::types::Key;

/// Default user base delay, in seconds
pub const DEFAULT_BASE_DELAY: f64 = 0.1;

/// Mutable state shared between the control thread and the input callback.
///
/// Written by start/stop/set_base_delay, read from the OS input thread, so
/// every field is atomic or locked.
#[derive(Debug)]
pub struct EngineState {
    enabled: AtomicBool,
    /// f64 seconds stored as bits
    base_delay: AtomicU64,
    last_key: Mutex<Option<Key>>,
    /// Injection failed; events pass through until the next start
    degraded: AtomicBool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            base_delay: AtomicU64::new(DEFAULT_BASE_DELAY.to_bits()),
            last_key: Mutex::new(None),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Base delay in seconds
    pub fn base_delay(&self) -> f64 {
        f64::from_bits(self.base_delay.load(Ordering::Acquire))
    }

    pub(crate) fn set_base_delay(&self, seconds: f64) {
        self.base_delay.store(seconds.to_bits(), Ordering::Release);
    }

    pub fn last_key(&self) -> Option<Key> {
        *lock_or_recover(&self.last_key, "Last key")
    }

    /// Record the most recently scrambled key
    pub(crate) fn set_last_key(&self, key: Option<Key>) {
        *lock_or_recover(&self.last_key, "Last key") = key;
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Returns true if this call switched the state into degraded mode
    pub(crate) fn mark_degraded(&self) -> bool {
        !self.degraded.swap(true, Ordering::AcqRel)
    }

    /// Clear per-session tracking before a fresh start
    pub(crate) fn reset_session(&self) {
        *lock_or_recover(&self.last_key, "Last key") = None;
        self.degraded.store(false, Ordering::Release);
    }
}
