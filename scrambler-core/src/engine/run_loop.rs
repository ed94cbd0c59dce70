//! Event-dispatch thread for replay timers
//!
//! The input callback must never block, so it only pushes a command onto an
//! unbounded channel. A dedicated thread runs a single-threaded tokio runtime
//! that turns each command into a sleeping task and runs the work on that
//! thread when the timer fires.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error};
use tokio::sync::mpsc;
use tokio::task::JoinHandle as TaskHandle;

use super::platform::{Dispatcher, Task, TimerId};
use super::utils::lock_or_recover;
use crate::{Error, Result};

pub const DISPATCH_THREAD_NAME: &str = "scrambler-dispatch";

enum Command {
    Schedule {
        id: TimerId,
        delay: Duration,
        task: Task,
    },
    Cancel(TimerId),
    Shutdown,
}

/// Dispatcher backed by a dedicated thread
pub struct RunLoop {
    commands: mpsc::UnboundedSender<Command>,
    next_id: AtomicU64,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl RunLoop {
    /// Start the dispatch thread
    pub fn spawn() -> Result<Self> {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();

        let thread = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                runtime.block_on(run(receiver));
                debug!("Dispatch thread exiting");
            })
            .map_err(|e| Error::Dispatch(format!("Failed to spawn dispatch thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(message)) => {
                let _ = thread.join();
                return Err(Error::Dispatch(format!("Failed to build dispatch runtime: {}", message)));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(Error::Dispatch("Dispatch thread exited during startup".into()));
            }
        }

        Ok(Self {
            commands,
            next_id: AtomicU64::new(1),
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Abort every pending timer and stop the thread
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
        let handle = lock_or_recover(&self.thread, "Dispatch thread").take();
        if let Some(handle) = handle {
            // Joining ourselves would deadlock
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("Dispatch thread panicked");
            }
        }
    }
}

impl Dispatcher for RunLoop {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TimerId> {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.commands
            .send(Command::Schedule { id, delay, task })
            .map_err(|_| Error::Dispatch("Run loop has shut down".into()))?;
        Ok(id)
    }

    fn cancel(&self, id: TimerId) {
        let _ = self.commands.send(Command::Cancel(id));
    }
}

impl Drop for RunLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run(mut commands: mpsc::UnboundedReceiver<Command>) {
    let (fired_tx, mut fired_rx) = mpsc::unbounded_channel::<TimerId>();
    let mut timers: HashMap<TimerId, TaskHandle<()>> = HashMap::new();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Schedule { id, delay, task }) => {
                    let fired = fired_tx.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Err(e) = catch_unwind(AssertUnwindSafe(task)) {
                            error!("Scheduled task {} panicked: {:?}", id, e);
                        }
                        let _ = fired.send(id);
                    });
                    timers.insert(id, handle);
                }
                Some(Command::Cancel(id)) => {
                    if let Some(handle) = timers.remove(&id) {
                        handle.abort();
                    }
                }
                Some(Command::Shutdown) | None => break,
            },
            Some(id) = fired_rx.recv() => {
                timers.remove(&id);
            }
        }
    }

    for (_, handle) in timers.drain() {
        handle.abort();
    }
}
