use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use log::{debug, error, info, warn};

use super::delay::{scale_delay, DelayModel};
use super::guard::MonitorGuard;
use super::pending::{PendingReplays, ReplayTicket};
use super::platform::{Dispatcher, KeyEventHandler, KeyInjector, KeyMonitor, Platform};
use super::utils::{lock_or_recover, read_or_recover, write_or_recover};
use super::{EngineState, HookDecision, KeyEvent};
use crate::patterns::TypingPatternMap;
use crate::types::Key;
use crate::{Error, Result};

/// The keystroke scrambler engine.
///
/// While active, every character-producing key-down is swallowed and
/// replayed after a delay drawn from the typing pattern model. Each key is
/// delayed independently, so fast consecutive keys may replay out of order.
pub struct Scrambler {
    shared: Arc<Shared>,
    monitor: Arc<dyn KeyMonitor>,
    /// Installed monitor; `Some` exactly while active
    guard: Mutex<Option<MonitorGuard>>,
}

/// State reachable from the input callback and from replay tasks
struct Shared {
    state: EngineState,
    patterns: TypingPatternMap,
    model: DelayModel,
    injector: Arc<dyn KeyInjector>,
    dispatcher: Arc<dyn Dispatcher>,
    pending: PendingReplays,
    /// Held shared while scheduling or injecting, exclusively by `stop`
    /// while it cancels, so nothing is in flight once `stop` returns
    session: RwLock<()>,
}

impl Scrambler {
    /// Create an idle engine using the key-pair aware delay model
    pub fn new(platform: Platform) -> Self {
        Self::with_delay_model(platform, DelayModel::default())
    }

    /// Create an idle engine with the given delay model
    pub fn with_delay_model(platform: Platform, model: DelayModel) -> Self {
        let Platform {
            monitor,
            injector,
            dispatcher,
        } = platform;

        Self {
            shared: Arc::new(Shared {
                state: EngineState::new(),
                patterns: TypingPatternMap::new(),
                model,
                injector,
                dispatcher,
                pending: PendingReplays::new(),
                session: RwLock::new(()),
            }),
            monitor,
            guard: Mutex::new(None),
        }
    }

    /// Install the global monitor and begin scrambling.
    ///
    /// Does nothing if already active. On failure the engine stays idle with
    /// no monitor installed.
    pub fn start(&self) -> Result<()> {
        let mut guard = lock_or_recover(&self.guard, "Monitor guard");
        if guard.is_some() {
            debug!("Scrambler already running");
            return Ok(());
        }

        let shared = Arc::downgrade(&self.shared);
        let handler: KeyEventHandler = Arc::new(move |event: &KeyEvent| match shared.upgrade() {
            Some(shared) => shared.handle_event(event),
            None => HookDecision::PassThrough,
        });

        let handle = self.monitor.install(handler).map_err(|e| {
            self.shared.state.set_enabled(false);
            error!("Failed to install keyboard monitor: {}", e);
            Error::EngineStart(Box::new(e))
        })?;

        *guard = Some(MonitorGuard::new(handle));
        self.shared.state.reset_session();
        self.shared.state.set_enabled(true);
        info!("Scrambler started ({} delay model)", self.shared.model);
        Ok(())
    }

    /// Stop scrambling and remove the monitor. Always succeeds.
    ///
    /// Replays that have not fired yet are cancelled and will not inject.
    /// A replay already injecting finishes before this returns.
    pub fn stop(&self) {
        self.shared.state.set_enabled(false);

        {
            let _session = write_or_recover(&self.shared.session, "Session");
            let cancelled = self.shared.cancel_pending();
            if cancelled > 0 {
                debug!("Cancelled {} pending replays", cancelled);
            }
        }

        let guard = lock_or_recover(&self.guard, "Monitor guard").take();
        if let Some(guard) = guard {
            guard.release();
            info!("Scrambler stopped");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.state.is_enabled()
    }

    /// True after an injection failure; keys pass through until restarted
    pub fn is_degraded(&self) -> bool {
        self.shared.state.is_degraded()
    }

    /// Base delay in seconds
    pub fn base_delay(&self) -> f64 {
        self.shared.state.base_delay()
    }

    /// Set the base delay in seconds; applies from the next key.
    ///
    /// Rejects non-positive and non-finite values, keeping the previous one.
    pub fn set_base_delay(&self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "Base delay must be a positive number of seconds, got {}",
                seconds
            )));
        }
        self.shared.state.set_base_delay(seconds);
        debug!("Base delay set to {:.3}s", seconds);
        Ok(())
    }

    pub fn delay_model(&self) -> DelayModel {
        self.shared.model
    }

    pub fn patterns(&self) -> &TypingPatternMap {
        &self.shared.patterns
    }

    /// Replays scheduled but not yet run
    pub fn pending_replays(&self) -> usize {
        self.shared.pending.len()
    }

    /// Decide what happens to one key-down; this is the monitor callback
    pub fn handle_event(&self, event: &KeyEvent) -> HookDecision {
        self.shared.handle_event(event)
    }
}

impl Drop for Scrambler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn handle_event(self: &Arc<Self>, event: &KeyEvent) -> HookDecision {
        if !self.state.is_enabled() || event.injected || self.state.is_degraded() {
            return HookDecision::PassThrough;
        }

        let result = catch_unwind(AssertUnwindSafe(|| self.schedule_replay(event)));
        match result {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                warn!("Error handling key event, passing it through: {}", e);
                HookDecision::PassThrough
            }
            Err(e) => {
                error!("Panic while handling key event, passing it through: {:?}", e);
                HookDecision::PassThrough
            }
        }
    }

    /// Sample a delay and hand the replay to the dispatcher.
    /// Returns `Suppress` only once the replay is safely scheduled.
    fn schedule_replay(self: &Arc<Self>, event: &KeyEvent) -> Result<HookDecision> {
        if event.text().is_none() {
            return Ok(HookDecision::PassThrough);
        }

        let key = event.key();
        let sample = self
            .model
            .sample(&self.patterns, self.state.last_key(), key, &mut rand::thread_rng());
        let delay = scale_delay(sample, self.state.base_delay())?;

        let _session = read_or_recover(&self.session, "Session");
        // `stop` may have disabled us since the first check; past this point
        // it waits for the ticket to be attached before draining
        if !self.state.is_enabled() {
            return Ok(HookDecision::PassThrough);
        }

        let ticket = self.pending.reserve();
        let task = Self::replay_task(Arc::downgrade(self), ticket, event.clone());
        // An abandoned ticket never injects, even if its timer got armed
        let scheduled = catch_unwind(AssertUnwindSafe(|| self.dispatcher.schedule(delay, task)))
            .unwrap_or_else(|_| Err(Error::Dispatch("Dispatcher panicked while scheduling".into())));
        match scheduled {
            Ok(timer) => {
                self.pending.attach(ticket, timer);
                // Keys that ended up passing through do not count as previous
                self.state.set_last_key(key);
                debug!("Replay scheduled in {:?} ({} chars)", delay, event.characters.len());
                Ok(HookDecision::Suppress)
            }
            Err(e) => {
                self.pending.abandon(ticket);
                Err(e)
            }
        }
    }

    fn replay_task(shared: Weak<Shared>, ticket: ReplayTicket, event: KeyEvent) -> Box<dyn FnOnce() + Send> {
        Box::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.replay(ticket, &event);
            }
        })
    }

    /// Runs on the dispatch thread when a replay timer fires
    fn replay(&self, ticket: ReplayTicket, event: &KeyEvent) {
        let _session = read_or_recover(&self.session, "Session");
        if !self.pending.complete(ticket) || !self.state.is_enabled() {
            debug!("Dropping cancelled replay");
            return;
        }

        if let Err(e) = self.injector.inject(event) {
            error!("Failed to inject replayed key: {}", e);
            if self.state.mark_degraded() {
                warn!("Key injection is failing; passing keys through until restarted");
            }
        }
    }

    fn cancel_pending(&self) -> usize {
        let timers = self.pending.drain();
        for timer in &timers {
            self.dispatcher.cancel(*timer);
        }
        timers.len()
    }
}

/// Delay the engine would apply right now to a key following `previous`,
/// useful for previews; does not touch engine state
pub fn preview_delay(
    patterns: &TypingPatternMap,
    model: DelayModel,
    base_delay: f64,
    previous: Option<Key>,
    current: Option<Key>,
) -> Result<Duration> {
    let sample = model.sample(patterns, previous, current, &mut rand::thread_rng());
    scale_delay(sample, base_delay)
}
