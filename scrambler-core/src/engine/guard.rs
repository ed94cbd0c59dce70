use log::{debug, warn};

use super::platform::MonitorHandle;

/// Owns an installed monitor and removes it when dropped.
///
/// Removal failures are logged and swallowed; the handle is gone either way
/// so a later start never reuses a stale one.
pub(crate) struct MonitorGuard {
    handle: Option<Box<dyn MonitorHandle>>,
}

impl MonitorGuard {
    pub(crate) fn new(handle: Box<dyn MonitorHandle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Remove the monitor now
    pub(crate) fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(handle) = self.handle.take() {
            match handle.remove() {
                Ok(()) => debug!("Keyboard monitor removed"),
                Err(e) => warn!("Error removing keyboard monitor: {}", e),
            }
        }
    }
}

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        self.remove();
    }
}
