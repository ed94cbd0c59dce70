//! Scrambler engine - keystroke interception and rescheduling
//!
//! This module owns the start/stop lifecycle, the per-event decision of
//! whether to swallow a key, and the replay of swallowed keys after a
//! sampled delay.

mod delay;
mod engine;
mod guard;
mod input;
mod output;
mod pending;
pub mod platform;
mod run_loop;
mod state;
mod utils;

pub use delay::{scale_delay, DelayModel, FLAT_VARIABILITY, REFERENCE_BASE_DELAY};
pub use engine::{preview_delay, Scrambler};
pub use input::{KeyEvent, ModifierState};
pub use output::HookDecision;
pub use platform::{
    Dispatcher, KeyEventHandler, KeyInjector, KeyMonitor, MonitorHandle, Platform, Task, TimerId,
};
pub use run_loop::{RunLoop, DISPATCH_THREAD_NAME};
pub use state::{EngineState, DEFAULT_BASE_DELAY};

// Re-export error types
pub use crate::error::{Error, Result};
