//! Deferred effects on a virtual millisecond clock.
//!
//! Every widget owns one `Schedule`. Banner timeouts and post-win navigation
//! are queued here and only fire when the owner advances its clock, so a
//! widget that is torn down (or simply dropped) takes its pending effects
//! with it.

/// Handle returned by [`Schedule::schedule`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct Pending<E> {
    handle: TaskHandle,
    due_ms: u64,
    effect: E,
}

#[derive(Debug, Clone)]
pub struct Schedule<E> {
    now_ms: u64,
    next_id: u64,
    pending: Vec<Pending<E>>,
}

impl<E> Default for Schedule<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Schedule<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Queue `effect` to fire once `delay_ms` have elapsed from now.
    pub fn schedule(&mut self, delay_ms: u64, effect: E) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            due_ms: self.now_ms.saturating_add(delay_ms),
            effect,
        });
        handle
    }

    /// Drop a pending effect. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|task| task.handle != handle);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|task| task.handle == handle)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Milliseconds until the next effect is due, if any.
    #[must_use]
    pub fn next_due_in(&self) -> Option<u64> {
        self.pending
            .iter()
            .map(|task| task.due_ms.saturating_sub(self.now_ms))
            .min()
    }

    /// Move the clock forward and return every effect that came due, ordered
    /// by due time, then by scheduling order.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<E> {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
        let now = self.now_ms;
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|task| task.due_ms <= now);
        self.pending = waiting;
        due.sort_by_key(|task| (task.due_ms, task.handle.0));
        due.into_iter().map(|task| task.effect).collect()
    }

    /// Advance only as far as the next due batch, drawing from `budget_ms`.
    ///
    /// Owners loop on this so effects that schedule follow-ups (the intro
    /// ticker) see the clock exactly where their own batch fired. Returns
    /// `None` once nothing else falls inside the budget; the clock is then
    /// moved to the end of the budget.
    pub fn step(&mut self, budget_ms: &mut u64) -> Option<Vec<E>> {
        match self.next_due_in() {
            Some(wait) if wait <= *budget_ms => {
                *budget_ms -= wait;
                Some(self.advance(wait))
            }
            _ => {
                self.now_ms = self.now_ms.saturating_add(*budget_ms);
                *budget_ms = 0;
                None
            }
        }
    }
}
