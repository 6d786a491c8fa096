use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::stage::UnitTicket;

/// Unique identifier for a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer with metadata
#[derive(Debug, Clone)]
struct Timer {
    ticket: UnitTicket,
    reason: String,
    fire_at: Instant,
}

/// One-shot timers that complete script units.
///
/// Time is always passed in, so the owner decides which clock drives it.
#[derive(Debug)]
pub struct TimerManager {
    timers: HashMap<TimerId, Timer>,
    next_id: u64,
}

impl TimerManager {
    pub fn new() -> Self {
        Self {
            timers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Schedule the completion of `ticket` after `delay`
    pub fn schedule(
        &mut self,
        now: Instant,
        delay: Duration,
        ticket: UnitTicket,
        reason: impl Into<String>,
    ) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let timer = Timer {
            ticket,
            reason: reason.into(),
            fire_at: now + delay,
        };

        self.timers.insert(id, timer);
        id
    }

    /// Cancel a timer
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn tick(&mut self, now: Instant) -> Vec<(TimerId, UnitTicket, String)> {
        let mut due: Vec<(Instant, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, timer)| now >= timer.fire_at)
            .map(|(id, timer)| (timer.fire_at, *id))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id)| {
                self.timers
                    .remove(&id)
                    .map(|timer| (id, timer.ticket, timer.reason))
            })
            .collect()
    }

    /// Get the number of active timers
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|timer| timer.fire_at).min()
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}
