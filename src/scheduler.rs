//! Timer scheduling for the single-threaded event loop.
//!
//! Components never read a clock. They ask a [`Scheduler`] to fire a [`Timer`]
//! after a delay and keep the returned [`TimerHandle`] if they may need to cancel
//! it. [`TimerQueue`] is a virtual-clock implementation: the runtime advances it
//! from a real tokio clock, tests advance it by hand.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Identifies one scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// The callback a timer fires into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Next boss state poll
    Poll,
    /// Next location cycle tick
    CycleTick,
    /// Location warp cooldown elapsed
    CooldownElapsed,
    /// Party assembled long enough, time to `p warp`
    RunWarpDue,
    /// Party warped long enough, time to `p disband`
    RunDisbandDue,
    /// Resume cycling after the Protector died
    ProtectorResume,
    /// Stop holding position for an imminent Broodmother
    BroodHoldExpired,
}

pub trait Scheduler {
    /// Arm `timer` to fire once after `delay`.
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle;

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Cancel whatever handle `slot` holds and leave it empty.
    fn cancel_slot(&mut self, slot: &mut Option<TimerHandle>) {
        if let Some(handle) = slot.take() {
            self.cancel(handle);
        }
    }
}

/// Deterministic timer queue over a virtual clock.
///
/// Timers with the same deadline fire in scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), Timer>,
    deadlines: HashMap<u64, Duration>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the queue was created
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Deadline of the earliest pending timer
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to its deadline.
    ///
    /// Callers pop one timer at a time so timers armed by a fired callback are
    /// still considered within the same advance.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, Timer)> {
        let (&(deadline, id), _) = self.pending.iter().next()?;
        if deadline > until {
            return None;
        }
        let timer = self.pending.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(deadline);
        Some((TimerHandle(id), timer))
    }

    /// Move the clock forward without firing anything. Never moves it backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Number of pending timers of the given kind
    pub fn count(&self, timer: Timer) -> usize {
        self.pending.values().filter(|t| **t == timer).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time left until the given timer fires
    pub fn remaining(&self, handle: TimerHandle) -> Option<Duration> {
        self.deadlines
            .get(&handle.0)
            .map(|deadline| deadline.saturating_sub(self.now))
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let deadline = self.now + delay;
        self.pending.insert((deadline, id), timer);
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => self.pending.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }
}
