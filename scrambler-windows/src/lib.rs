//! Windows backend for the keystroke scrambler
//!
//! Supplies the global keyboard monitor (a `WH_KEYBOARD_LL` hook on its own
//! message-loop thread) and the key injector (`SendInput`). The replay
//! dispatcher comes from `scrambler-core`.

pub mod translate;

#[cfg(windows)]
mod injector;
#[cfg(windows)]
mod keyboard_hook;

#[cfg(windows)]
pub use injector::WindowsKeyInjector;
#[cfg(windows)]
pub use keyboard_hook::{WindowsHookHandle, WindowsKeyMonitor, HOOK_THREAD_NAME};

#[cfg(windows)]
use std::sync::Arc;

#[cfg(windows)]
use scrambler_core::{Dispatcher, Platform};

/// Platform wiring the hook and `SendInput` to the given dispatcher
#[cfg(windows)]
pub fn platform(dispatcher: Arc<dyn Dispatcher>) -> Platform {
    Platform::new(
        Arc::new(WindowsKeyMonitor::new()),
        Arc::new(WindowsKeyInjector::new()),
        dispatcher,
    )
}
