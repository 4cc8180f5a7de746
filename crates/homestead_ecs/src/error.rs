//! Core error types.
//!
//! Two families: capacity exhaustion (`WorldFull`), which a caller can
//! recover from (e.g. by rejecting a join), and integration errors
//! (unknown world/component, occupied slot, ...), which indicate a bug at
//! the call site and are not retryable. Every mutating operation is a
//! single atomic in-memory step, so an error never leaves a world in a
//! partially-updated state.

use crate::entity::Entity;

/// Errors surfaced by the core engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EcsError {
    /// Every slot in the world is occupied.
    #[error("world is full ({capacity} entities)")]
    WorldFull {
        /// The world's fixed entity capacity.
        capacity: usize,
    },

    /// No world with this id is registered.
    #[error("unknown world `{0}`")]
    UnknownWorld(String),

    /// A world with this id already exists.
    #[error("world `{0}` already exists")]
    WorldExists(String),

    /// The component is not registered in the target world.
    #[error("component `{0}` is not registered in this world")]
    UnknownComponent(String),

    /// The component is already registered in the target world.
    #[error("component `{0}` is already registered in this world")]
    ComponentExists(String),

    /// The component schema has no field with this name.
    #[error("component `{component}` has no field `{field}`")]
    UnknownField {
        /// The component name.
        component: String,
        /// The missing field name.
        field: String,
    },

    /// The entity id does not refer to a live entity.
    #[error("entity {0} is not alive")]
    NoSuchEntity(Entity),

    /// A reserved-id allocation collided with a live entity.
    #[error("slot {0} is already occupied")]
    SlotOccupied(Entity),

    /// The entity id lies outside the world's slot range.
    #[error("entity {entity} is out of range (capacity {capacity})")]
    OutOfRange {
        /// The offending entity id.
        entity: Entity,
        /// The world's fixed entity capacity.
        capacity: usize,
    },

    /// A value's shape does not match the field it is written to.
    #[error("field `{component}.{field}` expects width {expected}, got {got}")]
    WidthMismatch {
        /// The component name.
        component: String,
        /// The field name.
        field: String,
        /// The field's declared width (1 for scalars).
        expected: usize,
        /// The width of the rejected value.
        got: usize,
    },
}
