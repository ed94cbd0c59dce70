//! Tests for stopping with replays still in flight

mod common;
use common::*;

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use scrambler_core::engine::Task;
use scrambler_core::{
    Dispatcher, HookDecision, KeyEvent, KeyInjector, Platform, Result, RunLoop, Scrambler, TimerId,
};

/// Injector that announces each call, then takes a while like a busy SendInput
struct SlowInjector {
    entered: Mutex<mpsc::Sender<()>>,
    landed: Mutex<Vec<Instant>>,
}

impl KeyInjector for SlowInjector {
    fn inject(&self, _event: &KeyEvent) -> Result<()> {
        let _ = self.entered.lock().unwrap().send(());
        thread::sleep(Duration::from_millis(100));
        self.landed.lock().unwrap().push(Instant::now());
        Ok(())
    }
}

/// Dispatcher that holds every schedule call until the test releases it
struct GatedDispatcher {
    inner: Arc<ManualDispatcher>,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Dispatcher for GatedDispatcher {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TimerId> {
        let _ = self.entered.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        self.inner.schedule(delay, task)
    }

    fn cancel(&self, id: TimerId) {
        self.inner.cancel(id);
    }
}

#[test]
fn test_stop_cancels_pending_replays() {
    let mut harness = Harness::started();
    harness.type_str("abc");
    assert_eq!(harness.scrambler.pending_replays(), 3);

    harness.scrambler.stop();
    assert_eq!(harness.dispatcher.cancelled().len(), 3);
    assert_eq!(harness.dispatcher.pending(), 0);
    assert_eq!(harness.scrambler.pending_replays(), 0);

    harness.dispatcher.fire_all();
    assert!(harness.injector.injected().is_empty());
}

#[test]
fn test_stale_timers_do_not_inject() {
    let mut harness = Harness::started();
    harness.dispatcher.ignore_cancel();
    harness.type_str("abc");

    harness.scrambler.stop();
    assert_eq!(harness.dispatcher.fire_all(), 3);
    assert!(harness.injector.injected().is_empty());
}

#[test]
fn test_stale_timers_do_not_inject_after_restart() {
    let mut harness = Harness::started();
    harness.dispatcher.ignore_cancel();
    harness.type_str("ab");
    harness.scrambler.stop();

    harness.scrambler.start().unwrap();
    assert_eq!(harness.press(KeyEvent::from_char('c')), HookDecision::Suppress);
    harness.dispatcher.fire_all();
    assert_eq!(harness.injector.injected_text(), chars("c"));
}

#[test]
fn test_run_loop_replays_on_dispatch_thread() {
    let monitor = FakeMonitor::new();
    let injector = RecordingInjector::new();
    let run_loop = Arc::new(RunLoop::spawn().unwrap());
    let scrambler = Scrambler::new(Platform::new(monitor.clone(), injector.clone(), run_loop.clone()));
    scrambler.start().unwrap();

    for ch in "hey".chars() {
        assert_eq!(monitor.press(&KeyEvent::from_char(ch)), HookDecision::Suppress);
    }

    let mut waited = Duration::ZERO;
    while injector.injected().len() < 3 && waited < Duration::from_secs(2) {
        thread::sleep(Duration::from_millis(10));
        waited += Duration::from_millis(10);
    }
    assert_eq!(sorted(injector.injected_text()), chars("ehy"));

    scrambler.stop();
    run_loop.shutdown();
}

#[test]
fn test_run_loop_stop_before_fire() {
    let monitor = FakeMonitor::new();
    let injector = RecordingInjector::new();
    let run_loop = Arc::new(RunLoop::spawn().unwrap());
    let scrambler = Scrambler::new(Platform::new(monitor.clone(), injector.clone(), run_loop.clone()));
    scrambler.set_base_delay(0.2).unwrap();
    scrambler.start().unwrap();

    for ch in "abc".chars() {
        monitor.press(&KeyEvent::from_char(ch));
    }
    scrambler.stop();

    thread::sleep(Duration::from_millis(400));
    assert!(injector.injected().is_empty());
}

#[test]
fn test_stop_waits_for_replay_in_progress() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let injector = Arc::new(SlowInjector {
        entered: Mutex::new(entered_tx),
        landed: Mutex::new(Vec::new()),
    });
    let monitor = FakeMonitor::new();
    let run_loop = Arc::new(RunLoop::spawn().unwrap());
    let scrambler = Scrambler::new(Platform::new(monitor.clone(), injector.clone(), run_loop.clone()));
    scrambler.start().unwrap();

    assert_eq!(monitor.press(&KeyEvent::from_char('a')), HookDecision::Suppress);
    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

    scrambler.stop();
    let stopped = Instant::now();

    let landed = injector.landed.lock().unwrap().clone();
    assert_eq!(landed.len(), 1);
    assert!(landed[0] <= stopped, "replay landed after stop returned");

    run_loop.shutdown();
}

#[test]
fn test_key_scheduled_during_stop_is_cancelled() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let manual = ManualDispatcher::new();
    manual.ignore_cancel();
    let dispatcher = Arc::new(GatedDispatcher {
        inner: manual.clone(),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let monitor = FakeMonitor::new();
    let injector = RecordingInjector::new();
    let scrambler = Arc::new(Scrambler::new(Platform::new(
        monitor.clone(),
        injector.clone(),
        dispatcher,
    )));
    scrambler.start().unwrap();

    // The key passes the enabled check, then stalls inside schedule
    let pressing = {
        let monitor = monitor.clone();
        thread::spawn(move || monitor.press(&KeyEvent::from_char('a')))
    };
    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

    let stopping = {
        let scrambler = scrambler.clone();
        thread::spawn(move || scrambler.stop())
    };
    thread::sleep(Duration::from_millis(50));
    release_tx.send(()).unwrap();

    pressing.join().unwrap();
    stopping.join().unwrap();
    assert_eq!(scrambler.pending_replays(), 0);

    // A fresh session must not pick up the stale replay
    scrambler.start().unwrap();
    manual.fire_all();
    assert!(injector.injected().is_empty());
}
