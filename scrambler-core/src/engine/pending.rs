use std::collections::HashMap;
use std::sync::Mutex;

use super::platform::TimerId;
use super::utils::lock_or_recover;

/// Handle for one replay that has been requested but not yet run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ReplayTicket(u64);

/// Bookkeeping for in-flight replays.
///
/// A ticket is reserved before its timer is scheduled, so a timer that fires
/// immediately still finds its entry. Cancelling drains every ticket; a replay
/// whose ticket is gone must not inject.
#[derive(Debug, Default)]
pub(crate) struct PendingReplays {
    inner: Mutex<PendingInner>,
}

#[derive(Debug, Default)]
struct PendingInner {
    next_ticket: u64,
    timers: HashMap<ReplayTicket, Option<TimerId>>,
}

impl PendingReplays {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reserve(&self) -> ReplayTicket {
        let mut inner = lock_or_recover(&self.inner, "Pending replays");
        inner.next_ticket += 1;
        let ticket = ReplayTicket(inner.next_ticket);
        inner.timers.insert(ticket, None);
        ticket
    }

    /// Attach the dispatcher's timer to a reserved ticket.
    /// Does nothing if the replay already ran or was cancelled.
    pub(crate) fn attach(&self, ticket: ReplayTicket, timer: TimerId) {
        let mut inner = lock_or_recover(&self.inner, "Pending replays");
        if let Some(slot) = inner.timers.get_mut(&ticket) {
            *slot = Some(timer);
        }
    }

    /// Forget a ticket whose timer could not be scheduled
    pub(crate) fn abandon(&self, ticket: ReplayTicket) {
        lock_or_recover(&self.inner, "Pending replays").timers.remove(&ticket);
    }

    /// Claim a ticket for execution; false if it was cancelled
    pub(crate) fn complete(&self, ticket: ReplayTicket) -> bool {
        lock_or_recover(&self.inner, "Pending replays")
            .timers
            .remove(&ticket)
            .is_some()
    }

    /// Drop every outstanding ticket, returning the timers to cancel
    pub(crate) fn drain(&self) -> Vec<TimerId> {
        lock_or_recover(&self.inner, "Pending replays")
            .timers
            .drain()
            .filter_map(|(_, timer)| timer)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        lock_or_recover(&self.inner, "Pending replays").timers.len()
    }
}
