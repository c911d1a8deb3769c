//! Append-only world event log with bounded retention.
//!
//! Entries are never modified after they are appended. Once the log holds
//! `capacity` entries, each new entry evicts the oldest.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use urbanium_types::{WorldEvent, WorldEventKind};

/// Bounded, append-only log of [`WorldEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: VecDeque<WorldEvent>,
    capacity: usize,
    total_recorded: u64,
}

impl EventLog {
    /// An empty log retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total_recorded: 0,
        }
    }

    /// Append one event, evicting the oldest entry when full.
    pub fn push(&mut self, event: WorldEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
        self.total_recorded = self.total_recorded.saturating_add(1);
    }

    /// Append events in order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = WorldEvent>) {
        for event in events {
            self.push(event);
        }
    }

    /// Retained events recorded at `tick`.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&WorldEvent> {
        self.entries.iter().filter(|e| e.tick == tick).collect()
    }

    /// Retained events of `kind`, oldest first.
    pub fn events_of_kind(&self, kind: WorldEventKind) -> Vec<&WorldEvent> {
        self.entries.iter().filter(|e| e.kind == kind).collect()
    }

    /// The `n` most recent events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&WorldEvent> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).collect()
    }

    /// All retained events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &WorldEvent> {
        self.entries.iter()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no events are retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events ever appended, including evicted ones.
    pub const fn total_recorded(&self) -> u64 {
        self.total_recorded
    }
}
