//! Interaction journal: a bounded record of state transitions.
//!
//! Every pickup, drop, draw, throw and recall transition is logged through
//! `tracing` and buffered as an [`InteractionEvent`] until a caller drains
//! it.  The buffer holds at most [`DEFAULT_CAPACITY`] events unless built
//! with [`Journal::with_capacity`]; once full, the oldest event is evicted
//! for each new one.  Hosts that want every event must drain at least that
//! often.  The journal never influences behaviour.

use std::collections::VecDeque;

use chrono::Utc;
use tether_types::{InteractionEvent, InteractionPayload};
use tracing::{info, warn};
use uuid::Uuid;

/// Events kept between drains by [`Journal::new`].
pub const DEFAULT_CAPACITY: usize = 4096;

#[derive(Debug)]
pub struct Journal {
    tick: u64,
    capacity: usize,
    evicted: u64,
    events: VecDeque<InteractionEvent>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A journal keeping at most `capacity` undrained events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tick: 0,
            capacity: capacity.max(1),
            evicted: 0,
            events: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events lost to eviction since the journal was created.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Tick number stamped onto subsequently recorded events.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn record(&mut self, source: &str, payload: InteractionPayload) {
        info!(tick = self.tick, source, ?payload, "interaction");
        if self.events.len() == self.capacity {
            if self.evicted == 0 {
                warn!(capacity = self.capacity, "journal full, evicting oldest events");
            }
            self.events.pop_front();
            self.evicted += 1;
        }
        self.events.push_back(InteractionEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            tick: self.tick,
            source: source.to_string(),
            payload,
        });
    }

    /// Events recorded since the last drain, oldest first.
    pub fn pending(&self) -> &VecDeque<InteractionEvent> {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<InteractionEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_types::ObjectId;

    #[test]
    fn records_are_stamped_and_drained_in_order() {
        let mut journal = Journal::new();
        let object = ObjectId::new();

        journal.set_tick(3);
        journal.record("test", InteractionPayload::DrawBackStarted { object });
        journal.set_tick(5);
        journal.record("test", InteractionPayload::ReadyToThrow { object });

        assert_eq!(journal.pending().len(), 2);
        let events = journal.drain();
        assert_eq!(events[0].tick, 3);
        assert_eq!(events[1].tick, 5);
        assert_eq!(events[1].payload, InteractionPayload::ReadyToThrow { object });
        assert_ne!(events[0].id, events[1].id);
        assert!(journal.pending().is_empty());
    }

    #[test]
    fn full_journal_evicts_the_oldest_events() {
        let mut journal = Journal::with_capacity(3);
        let object = ObjectId::new();
        for tick in 0..5 {
            journal.set_tick(tick);
            journal.record("test", InteractionPayload::DrawBackStarted { object });
        }

        assert_eq!(journal.capacity(), 3);
        assert_eq!(journal.evicted(), 2);
        let ticks: Vec<u64> = journal.drain().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![2, 3, 4]);

        journal.record("test", InteractionPayload::DrawBackStarted { object });
        assert_eq!(journal.pending().len(), 1);
        assert_eq!(journal.evicted(), 2);
    }

    #[test]
    fn zero_capacity_keeps_the_latest_event() {
        let mut journal = Journal::with_capacity(0);
        let object = ObjectId::new();
        journal.record("test", InteractionPayload::DrawBackStarted { object });
        journal.record("test", InteractionPayload::ReadyToThrow { object });
        assert_eq!(journal.pending().len(), 1);
        assert_eq!(
            journal.pending()[0].payload,
            InteractionPayload::ReadyToThrow { object }
        );
    }
}
