//! Test doubles for the platform seams

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scrambler_core::engine::{KeyEventHandler, Task};
use scrambler_core::{
    DelayModel, Dispatcher, Error, HookDecision, KeyEvent, KeyInjector, KeyMonitor, MonitorHandle,
    Platform, Result, Scrambler, TimerId,
};

/// Global monitor that records its handler instead of hooking the OS
#[derive(Default)]
pub struct FakeMonitor {
    handler: Arc<Mutex<Option<KeyEventHandler>>>,
    installs: AtomicUsize,
    removals: Arc<AtomicUsize>,
    failure: Mutex<Option<fn() -> Error>>,
    removal_failure: Arc<AtomicBool>,
}

impl FakeMonitor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following install fail with the produced error
    pub fn fail_with(&self, make_error: fn() -> Error) {
        *self.failure.lock().unwrap() = Some(make_error);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Make removal report an error (the handler is still detached)
    pub fn fail_removal(&self) {
        self.removal_failure.store(true, Ordering::SeqCst);
    }

    /// Simulate the OS delivering a key-down.
    /// With no monitor installed the OS delivers the key itself.
    pub fn press(&self, event: &KeyEvent) -> HookDecision {
        let handler = self.handler.lock().unwrap().clone();
        match handler {
            Some(handler) => handler(event),
            None => HookDecision::PassThrough,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.handler.lock().unwrap().is_some()
    }

    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    pub fn removals(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

impl KeyMonitor for FakeMonitor {
    fn install(&self, handler: KeyEventHandler) -> Result<Box<dyn MonitorHandle>> {
        if let Some(make_error) = *self.failure.lock().unwrap() {
            return Err(make_error());
        }

        let mut slot = self.handler.lock().unwrap();
        if slot.is_some() {
            return Err(Error::Monitor("a monitor is already installed".into()));
        }
        *slot = Some(handler);
        self.installs.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(FakeHandle {
            slot: self.handler.clone(),
            removals: self.removals.clone(),
            fail: self.removal_failure.clone(),
        }))
    }
}

struct FakeHandle {
    slot: Arc<Mutex<Option<KeyEventHandler>>>,
    removals: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl MonitorHandle for FakeHandle {
    fn remove(self: Box<Self>) -> Result<()> {
        *self.slot.lock().unwrap() = None;
        self.removals.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Monitor("unregister failed".into()));
        }
        Ok(())
    }
}

/// Injector that records every replayed event
#[derive(Default)]
pub struct RecordingInjector {
    injected: Mutex<Vec<KeyEvent>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingInjector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn injected(&self) -> Vec<KeyEvent> {
        self.injected.lock().unwrap().clone()
    }

    pub fn injected_text(&self) -> Vec<String> {
        self.injected().into_iter().map(|e| e.characters).collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl KeyInjector for RecordingInjector {
    fn inject(&self, event: &KeyEvent) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Injection("synthetic events blocked".into()));
        }
        self.injected.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFault {
    None,
    Error,
    Panic,
}

/// Dispatcher whose timers only fire when the test says so
pub struct ManualDispatcher {
    timers: Mutex<BTreeMap<TimerId, (Duration, Task)>>,
    next_id: AtomicU64,
    cancelled: Mutex<Vec<TimerId>>,
    honour_cancel: AtomicBool,
    fault: Mutex<ScheduleFault>,
}

impl Default for ManualDispatcher {
    fn default() -> Self {
        Self {
            timers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            cancelled: Mutex::new(Vec::new()),
            honour_cancel: AtomicBool::new(true),
            fault: Mutex::new(ScheduleFault::None),
        }
    }
}

impl ManualDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Keep cancelled timers armed, like a platform whose cancel lost a race
    pub fn ignore_cancel(&self) {
        self.honour_cancel.store(false, Ordering::SeqCst);
    }

    pub fn set_fault(&self, fault: ScheduleFault) {
        *self.fault.lock().unwrap() = fault;
    }

    pub fn pending(&self) -> usize {
        self.timers.lock().unwrap().len()
    }

    /// Delays of the armed timers, in scheduling order
    pub fn delays(&self) -> Vec<Duration> {
        self.timers.lock().unwrap().values().map(|(delay, _)| *delay).collect()
    }

    pub fn cancelled(&self) -> Vec<TimerId> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Fire every armed timer, shortest delay first
    pub fn fire_all(&self) -> usize {
        let mut due: Vec<(TimerId, (Duration, Task))> =
            std::mem::take(&mut *self.timers.lock().unwrap()).into_iter().collect();
        due.sort_by_key(|(id, (delay, _))| (*delay, *id));
        let count = due.len();
        for (_, (_, task)) in due {
            task();
        }
        count
    }
}

impl Dispatcher for ManualDispatcher {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TimerId> {
        match *self.fault.lock().unwrap() {
            ScheduleFault::None => {}
            ScheduleFault::Error => return Err(Error::Dispatch("event loop unavailable".into())),
            ScheduleFault::Panic => panic!("timer queue corrupted"),
        }
        let id = TimerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.timers.lock().unwrap().insert(id, (delay, task));
        Ok(id)
    }

    fn cancel(&self, id: TimerId) {
        self.cancelled.lock().unwrap().push(id);
        if self.honour_cancel.load(Ordering::SeqCst) {
            self.timers.lock().unwrap().remove(&id);
        }
    }
}

/// An engine wired to fakes, plus a record of what reached the focused app
pub struct Harness {
    pub monitor: Arc<FakeMonitor>,
    pub injector: Arc<RecordingInjector>,
    pub dispatcher: Arc<ManualDispatcher>,
    pub scrambler: Scrambler,
    delivered: Vec<String>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_model(DelayModel::PairAware)
    }

    pub fn with_model(model: DelayModel) -> Self {
        let monitor = FakeMonitor::new();
        let injector = RecordingInjector::new();
        let dispatcher = ManualDispatcher::new();
        let platform = Platform::new(monitor.clone(), injector.clone(), dispatcher.clone());
        Self {
            scrambler: Scrambler::with_delay_model(platform, model),
            monitor,
            injector,
            dispatcher,
            delivered: Vec::new(),
        }
    }

    pub fn started() -> Self {
        let harness = Self::new();
        harness.scrambler.start().unwrap();
        harness
    }

    /// Press a key; a passed-through key reaches the app immediately
    pub fn press(&mut self, event: KeyEvent) -> HookDecision {
        let decision = self.monitor.press(&event);
        if decision == HookDecision::PassThrough {
            self.delivered.push(event.characters);
        }
        decision
    }

    pub fn type_str(&mut self, text: &str) -> Vec<HookDecision> {
        text.chars().map(|ch| self.press(KeyEvent::from_char(ch))).collect()
    }

    /// Keys delivered without delay, in press order
    pub fn passed_through(&self) -> &[String] {
        &self.delivered
    }

    /// Everything the focused app received: pass-throughs then replays
    pub fn received(&self) -> Vec<String> {
        let mut all = self.delivered.clone();
        all.extend(self.injector.injected_text());
        all
    }
}

/// Sorted copy, for comparing what arrived regardless of order
pub fn sorted(mut items: Vec<String>) -> Vec<String> {
    items.sort();
    items
}

pub fn chars(text: &str) -> Vec<String> {
    text.chars().map(|c| c.to_string()).collect()
}

pub fn secs(delay: Duration) -> f64 {
    delay.as_secs_f64()
}

/// Range check with a little slack for f64 → Duration rounding
pub fn assert_within(value: f64, low: f64, high: f64) {
    const SLACK: f64 = 1e-9;
    assert!(
        value >= low - SLACK && value <= high + SLACK,
        "{} outside [{}, {}]",
        value,
        low,
        high
    );
}
