use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Send-slot gate shared by every thread using one client
///
/// Each send claims the next free slot; slots are `spacing` apart, so a pool
/// of workers sends no faster than a single thread would. A rate-limit
/// cooldown pushes the next slot out for everybody.
#[derive(Debug, Default)]
pub struct Pacer {
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the first free slot at or after `now`, returning the wait until it
    pub fn reserve(&self, now: Instant, spacing: Duration) -> Duration {
        let mut next = self.slot();
        let start = next.map_or(now, |slot| slot.max(now));
        *next = Some(start + spacing);
        start - now
    }

    /// Wait until the next free slot, without claiming it
    pub fn remaining(&self, now: Instant) -> Duration {
        self.slot()
            .map_or(Duration::ZERO, |slot| slot.saturating_duration_since(now))
    }

    /// Keep every sender out until `until`
    pub fn hold_until(&self, until: Instant) {
        let mut next = self.slot();
        *next = Some(next.map_or(until, |slot| slot.max(until)));
    }

    fn slot(&self) -> MutexGuard<'_, Option<Instant>> {
        self.next_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
