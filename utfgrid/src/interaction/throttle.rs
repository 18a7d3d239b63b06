//! Pointer-move throttling.
//!
//! At most one move is let through per interval. The first move after a
//! quiet period passes immediately; moves arriving inside the interval are
//! coalesced and the latest one is released when the interval ends
//! (trailing edge). Time is passed in by the caller, so the throttle never
//! spawns timers; the host polls it at [`MoveThrottle::deadline`].

use std::time::{Duration, Instant};

/// Leading + trailing edge throttle over values of type `T`.
#[derive(Debug)]
pub struct MoveThrottle<T> {
    interval: Duration,
    last_fired: Option<Instant>,
    pending: Option<T>,
}

impl<T> MoveThrottle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offers a value. Returns it if it may be processed now; otherwise it
    /// replaces any earlier pending value.
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        match self.last_fired {
            Some(fired) if now < fired + self.interval => {
                self.pending = Some(value);
                None
            }
            _ => {
                self.last_fired = Some(now);
                self.pending = None;
                Some(value)
            }
        }
    }

    /// Releases the pending value once its interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.deadline()?;
        if now < due {
            return None;
        }
        self.last_fired = Some(now);
        self.pending.take()
    }

    /// When the pending value becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        Some(self.last_fired.map_or_else(Instant::now, |fired| fired + self.interval))
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops any pending value and forgets the last firing time.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.last_fired = None;
    }
}
