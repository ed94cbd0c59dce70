//! What the engine tells the OS to do with a captured event

/// Verdict returned to the global monitor for one key-down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Deliver the original event unchanged
    PassThrough,
    /// Swallow the original event; a replay has been scheduled
    Suppress,
}

impl HookDecision {
    pub fn is_suppressed(self) -> bool {
        self == HookDecision::Suppress
    }
}
