//! Sync message envelopes exchanged between a simulation and its viewers.
//!
//! Two flavours: a [`WorldSnapshot`] carries every live entity's state
//! for the chosen subset (sent once when a viewer joins), and a
//! [`WorldDelta`] carries only the entities that changed plus the ids
//! removed that tick. Transport and framing belong to the host — these
//! types only define what crosses the boundary.

use serde::{Deserialize, Serialize};

use homestead_ecs::Entity;

use crate::wire::EntityRecord;

/// Full-world state for a joining viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// The world this snapshot describes.
    pub world: String,
    /// The simulation tick it was taken at.
    pub tick: u64,
    /// One record per live entity.
    pub records: Vec<EntityRecord>,
}

/// Incremental per-tick state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldDelta {
    /// The world this delta belongs to.
    pub world: String,
    /// The simulation tick it was produced at.
    pub tick: u64,
    /// Records for entities whose replicated state changed this tick.
    pub records: Vec<EntityRecord>,
    /// Entities removed this tick; viewers despawn their mirrors.
    pub removed: Vec<Entity>,
}

/// A routable sync payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncMessage {
    /// Full-world join state.
    Snapshot(WorldSnapshot),
    /// Incremental tick state.
    Delta(WorldDelta),
}

impl SyncMessage {
    /// The world id this message is routed by.
    #[must_use]
    pub fn world(&self) -> &str {
        match self {
            SyncMessage::Snapshot(s) => &s.world,
            SyncMessage::Delta(d) => &d.world,
        }
    }

    /// The tick this message was produced at.
    #[must_use]
    pub fn tick(&self) -> u64 {
        match self {
            SyncMessage::Snapshot(s) => s.tick,
            SyncMessage::Delta(d) => d.tick,
        }
    }
}
