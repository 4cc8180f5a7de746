//! Replication-layer error types.

use homestead_ecs::EcsError;

/// Errors that can occur while building, encoding, or applying sync
/// payloads.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A core engine operation failed (unknown component, occupied slot,
    /// width mismatch, ...).
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Failed to encode a payload to MessagePack.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a payload from MessagePack.
    #[error("failed to decode payload: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// A record does not start with the `_entity` marker triple.
    #[error("record is missing its entity marker triple")]
    MissingMarker,

    /// The entity marker carries something that is not a valid entity id.
    #[error("record carries an invalid entity id: {0}")]
    BadEntityId(f64),
}
