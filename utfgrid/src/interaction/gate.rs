//! Pointer suspension around box-zoom gestures.
//!
//! While the user drags a zoom box, pointer input is ignored. When the
//! gesture ends, input resumes only after a short delay so the mouse-up
//! that finished the drag is not reported as a click.

use std::time::{Duration, Instant};

/// Default delay before pointer input resumes.
pub const DEFAULT_RESUME_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Open,
    Suspended,
    Resuming(Instant),
}

/// Gate that suspends pointer handling during box zoom.
#[derive(Debug, Clone)]
pub struct BoxZoomGate {
    delay: Duration,
    state: GateState,
}

impl Default for BoxZoomGate {
    fn default() -> Self {
        Self::new(DEFAULT_RESUME_DELAY)
    }
}

impl BoxZoomGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: GateState::Open,
        }
    }

    /// Box zoom started.
    pub fn suspend(&mut self) {
        self.state = GateState::Suspended;
    }

    /// Box zoom ended at `now`; input resumes after the delay.
    pub fn resume_after(&mut self, now: Instant) {
        if self.state == GateState::Suspended {
            self.state = GateState::Resuming(now + self.delay);
        }
    }

    /// Whether pointer input should be handled at `now`.
    pub fn is_open(&mut self, now: Instant) -> bool {
        match self.state {
            GateState::Open => true,
            GateState::Suspended => false,
            GateState::Resuming(at) if now >= at => {
                self.state = GateState::Open;
                true
            }
            GateState::Resuming(_) => false,
        }
    }

    /// When a pending resumption happens.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            GateState::Resuming(at) => Some(at),
            _ => None,
        }
    }

    /// Opens immediately.
    pub fn reset(&mut self) {
        self.state = GateState::Open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_by_default() {
        let mut gate = BoxZoomGate::default();
        assert!(gate.is_open(Instant::now()));
        assert!(gate.deadline().is_none());
    }

    #[test]
    fn test_suspend_and_resume_after_delay() {
        let mut gate = BoxZoomGate::default();
        let start = Instant::now();

        gate.suspend();
        assert!(!gate.is_open(start));

        gate.resume_after(start);
        assert_eq!(gate.deadline(), Some(start + DEFAULT_RESUME_DELAY));
        assert!(!gate.is_open(start + Duration::from_millis(99)));
        assert!(gate.is_open(start + DEFAULT_RESUME_DELAY));
        assert!(gate.deadline().is_none());
    }

    #[test]
    fn test_resume_without_suspend_is_noop() {
        let mut gate = BoxZoomGate::default();
        let now = Instant::now();
        gate.resume_after(now);
        assert!(gate.is_open(now));
    }

    #[test]
    fn test_reset() {
        let mut gate = BoxZoomGate::default();
        gate.suspend();
        gate.reset();
        assert!(gate.is_open(Instant::now()));
    }
}
