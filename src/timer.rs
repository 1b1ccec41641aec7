use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::session::TimerHandle;

/// Source of the current time. Injected so countdowns can be driven
/// deterministically in tests.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Clone, Copy, Debug)]
struct Armed {
    handle: TimerHandle,
    next_due: Instant,
}

/// Repeating timer that fires once per `period` for the countdown it is
/// armed with. It does not run on its own; the event loop polls it.
#[derive(Debug)]
pub struct IntervalTimer<C: Clock> {
    clock: C,
    period: Duration,
    armed: Option<Armed>,
}

impl<C: Clock> IntervalTimer<C> {
    pub fn new(clock: C, period: Duration) -> Self {
        Self {
            clock,
            period,
            armed: None,
        }
    }

    /// Starts firing for `handle`, replacing whatever was armed before.
    pub fn arm(&mut self, handle: TimerHandle) {
        self.armed = Some(Armed {
            handle,
            next_due: self.clock.now() + self.period,
        });
    }

    /// Stops the timer. Safe to call when nothing is armed; returns whether
    /// a countdown was actually cancelled.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.armed.map(|a| a.handle)
    }

    /// Time left until the next firing, if armed.
    pub fn until_next(&self) -> Option<Duration> {
        self.armed
            .map(|a| a.next_due.saturating_duration_since(self.clock.now()))
    }

    /// Returns one entry per period that has elapsed since the last poll.
    /// A loop that stalled for several periods catches up in one call.
    pub fn poll(&mut self) -> Vec<TimerHandle> {
        let now = self.clock.now();
        let mut fired = Vec::new();
        if let Some(armed) = self.armed.as_mut() {
            while armed.next_due <= now {
                fired.push(armed.handle);
                armed.next_due += self.period;
            }
        }
        fired
    }
}
