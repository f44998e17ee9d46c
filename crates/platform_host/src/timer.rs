//! Timer facility contract and a virtual-clock adapter.

use std::{cell::RefCell, rc::Rc, time::Duration};

/// Host service that fires tokens after a delay.
///
/// Tokens identify what the runtime should do when the timer fires; scheduling a token that
/// is already pending replaces the earlier entry.
pub trait TimerService<T> {
    /// Schedules `token` to fire once after `delay`.
    fn schedule(&self, token: T, delay: Duration);

    /// Cancels a pending `token`. Cancelling an unknown token is a no-op.
    fn cancel(&self, token: &T);
}

#[derive(Debug)]
struct PendingTimer<T> {
    due: Duration,
    seq: u64,
    token: T,
}

#[derive(Debug)]
struct ManualClock<T> {
    now: Duration,
    next_seq: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> Default for ManualClock<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: Vec::new(),
        }
    }
}

#[derive(Debug)]
/// Timer service driven by explicit [`ManualTimerService::advance`] calls.
///
/// Clones share the same clock.
pub struct ManualTimerService<T> {
    inner: Rc<RefCell<ManualClock<T>>>,
}

impl<T> Clone for ManualTimerService<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for ManualTimerService<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ManualClock::default())),
        }
    }
}

impl<T: Clone + PartialEq> ManualTimerService<T> {
    /// Current virtual time since the clock was created.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Pending tokens ordered by due time.
    pub fn pending(&self) -> Vec<T> {
        let inner = self.inner.borrow();
        let mut entries = inner.pending.iter().collect::<Vec<_>>();
        entries.sort_by_key(|entry| (entry.due, entry.seq));
        entries.into_iter().map(|entry| entry.token.clone()).collect()
    }

    /// Returns whether `token` is currently scheduled.
    pub fn is_pending(&self, token: &T) -> bool {
        self.inner
            .borrow()
            .pending
            .iter()
            .any(|entry| &entry.token == token)
    }

    /// Moves the clock forward by `by` and returns every token that became due, earliest first.
    pub fn advance(&self, by: Duration) -> Vec<T> {
        let mut inner = self.inner.borrow_mut();
        inner.now += by;
        let now = inner.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            inner.pending.drain(..).partition(|entry| entry.due <= now);
        inner.pending = pending;
        due.sort_by_key(|entry| (entry.due, entry.seq));
        due.into_iter().map(|entry| entry.token).collect()
    }
}

impl<T: Clone + PartialEq> TimerService<T> for ManualTimerService<T> {
    fn schedule(&self, token: T, delay: Duration) {
        let mut inner = self.inner.borrow_mut();
        inner.pending.retain(|entry| entry.token != token);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due = inner.now + delay;
        inner.pending.push(PendingTimer { due, seq, token });
    }

    fn cancel(&self, token: &T) {
        self.inner
            .borrow_mut()
            .pending
            .retain(|entry| &entry.token != token);
    }
}
