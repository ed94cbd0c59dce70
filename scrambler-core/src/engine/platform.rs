//! Seams between the engine and the host OS
//!
//! The engine needs three capabilities from the platform: a process-wide
//! key-down listener that can swallow events, a way to inject a key-down
//! back into the input stream, and an event-dispatch thread that runs
//! one-shot timers. Each is a trait so backends and tests can supply their
//! own.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{HookDecision, KeyEvent};
use crate::Result;

/// Callback invoked by the monitor for every key-down, on the OS input thread
pub type KeyEventHandler = Arc<dyn Fn(&KeyEvent) -> HookDecision + Send + Sync>;

/// Work handed to the dispatch thread
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Identifier of a scheduled one-shot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Installs the global key-down listener
pub trait KeyMonitor: Send + Sync {
    /// Register `handler` for every key-down in the system.
    ///
    /// Permission problems must be reported as `Error::PermissionDenied`.
    /// On error nothing may remain installed.
    fn install(&self, handler: KeyEventHandler) -> Result<Box<dyn MonitorHandle>>;
}

/// An installed listener; removing it stops event delivery
pub trait MonitorHandle: Send {
    fn remove(self: Box<Self>) -> Result<()>;
}

/// Re-emits a key-down with the payload of a captured event
pub trait KeyInjector: Send + Sync {
    fn inject(&self, event: &KeyEvent) -> Result<()>;
}

/// Event-dispatch thread with one-shot timers
pub trait Dispatcher: Send + Sync {
    /// Run `task` on the dispatch thread once `delay` has elapsed.
    /// Must not block the caller.
    fn schedule(&self, delay: Duration, task: Task) -> Result<TimerId>;

    /// Cancel a timer that has not fired yet; unknown ids are ignored
    fn cancel(&self, id: TimerId);
}

/// The capabilities an engine runs on
#[derive(Clone)]
pub struct Platform {
    pub monitor: Arc<dyn KeyMonitor>,
    pub injector: Arc<dyn KeyInjector>,
    pub dispatcher: Arc<dyn Dispatcher>,
}

impl Platform {
    pub fn new(
        monitor: Arc<dyn KeyMonitor>,
        injector: Arc<dyn KeyInjector>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            monitor,
            injector,
            dispatcher,
        }
    }
}
