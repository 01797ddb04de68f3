// src/exam/timer.rs

use std::time::{Duration, Instant};

/// Identifies one arming of a [`TimerSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

/// A single cancel-and-reschedule timer.
///
/// Arming replaces (and so invalidates) whatever was armed before; only the
/// current handle can ever fire. The slot does not sleep; its owner polls it.
#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<(TimerHandle, Instant)>,
    next_id: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, now: Instant, after: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.armed = Some((handle, now + after));
        handle
    }

    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.armed.take().map(|(handle, _)| handle)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|(_, deadline)| deadline)
    }

    /// Fires (and disarms) the slot if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<TimerHandle> {
        match self.armed {
            Some((handle, deadline)) if now >= deadline => {
                self.armed = None;
                Some(handle)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let start = Instant::now();
        let mut slot = TimerSlot::new();
        let handle = slot.arm(start, Duration::from_secs(5));

        assert_eq!(slot.poll(start + Duration::from_secs(4)), None);
        assert_eq!(slot.poll(start + Duration::from_secs(5)), Some(handle));
        assert_eq!(slot.poll(start + Duration::from_secs(6)), None);
        assert!(slot.deadline().is_none());
    }

    #[test]
    fn test_rearm_invalidates_previous() {
        let start = Instant::now();
        let mut slot = TimerSlot::new();
        let stale = slot.arm(start, Duration::from_secs(5));
        let fresh = slot.arm(start + Duration::from_secs(3), Duration::from_secs(5));

        assert_ne!(stale, fresh);
        assert_eq!(slot.deadline(), Some(start + Duration::from_secs(8)));
        // The stale deadline passing does not fire anything.
        assert_eq!(slot.poll(start + Duration::from_secs(5)), None);
        assert_eq!(slot.poll(start + Duration::from_secs(8)), Some(fresh));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut slot = TimerSlot::new();
        let handle = slot.arm(start, Duration::from_secs(1));
        assert_eq!(slot.cancel(), Some(handle));
        assert_eq!(slot.cancel(), None);
        assert_eq!(slot.poll(start + Duration::from_secs(2)), None);
    }
}
