//! World event log entries.

use serde::{Deserialize, Serialize};

use crate::enums::WorldEventKind;

/// One entry in the append-only world event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldEvent {
    /// Tick the event happened on.
    pub tick: u64,
    /// What kind of event it was.
    pub kind: WorldEventKind,
    /// Human-readable description.
    pub description: String,
}
