//! MessagePack codec helpers.
//!
//! Thin wrappers around `rmp-serde` for encoding and decoding sync
//! payloads. Everything that crosses the replication boundary goes
//! through these two functions.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`SyncError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SyncError> {
    rmp_serde::to_vec(value).map_err(SyncError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`SyncError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, SyncError> {
    rmp_serde::from_slice(bytes).map_err(SyncError::Decode)
}
