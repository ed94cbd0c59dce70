pub mod types;
pub mod error;
pub mod patterns;
pub mod engine;

pub use types::*;

// Re-export commonly used types
pub use error::{Error, Result};
pub use patterns::{TransitionAnalysis, TypingPatternMap};
pub use engine::{
    DelayModel, Dispatcher, HookDecision, KeyEvent, KeyInjector, KeyMonitor, ModifierState,
    MonitorHandle, Platform, RunLoop, Scrambler, TimerId,
};
