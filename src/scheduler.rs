//! Deferred one-shot callback queue driven by accumulated simulation time
//!
//! Generic over a context type `C`: the game schedules work against its owned
//! session record, tests use whatever fits. Each callback also receives the
//! scheduler itself so it may re-schedule, enqueue new work, or clear the
//! queue — `tick` removes an entry before invoking it and re-reads the head
//! after every call, so re-entrant mutation is safe.

/// A pending callback
struct Task<C> {
    when: f32,
    run: Box<dyn FnOnce(&mut C, &mut Scheduler<C>)>,
}

/// Time-ordered queue of deferred one-shot callbacks
pub struct Scheduler<C> {
    paused: bool,
    accum: f32,
    queue: Vec<Task<C>>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            paused: true,
            accum: 0.0,
            queue: Vec::new(),
        }
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `run` to fire once accumulated time reaches now + `in_seconds`.
    ///
    /// Callbacks referencing an entity must re-check liveness when they fire;
    /// a destroyed target is a silent no-op, not an error.
    pub fn schedule(&mut self, in_seconds: f32, run: impl FnOnce(&mut C, &mut Scheduler<C>) + 'static) {
        let when = self.accum + in_seconds;
        // Upper bound keeps equal-deadline callbacks in insertion order
        let at = self.queue.partition_point(|task| task.when <= when);
        self.queue.insert(
            at,
            Task {
                when,
                run: Box::new(run),
            },
        );
    }

    /// Freeze or resume time accumulation; the queue is left untouched
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Drop all pending callbacks; the time accumulator is unchanged
    pub fn reset(&mut self) {
        self.queue.clear();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Advance time and fire every due callback in non-decreasing deadline
    /// order. No-op while paused.
    pub fn tick(&mut self, delta_seconds: f32, ctx: &mut C) {
        if self.paused {
            return;
        }
        self.accum += delta_seconds;
        loop {
            let due = self
                .queue
                .first()
                .is_some_and(|task| task.when <= self.accum);
            if !due {
                break;
            }
            let task = self.queue.remove(0);
            (task.run)(ctx, self);
        }
    }
}
