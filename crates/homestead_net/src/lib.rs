//! # homestead_net
//!
//! World replication for the homestead engine: turning a component
//! subset of chosen entities into flat wire records and merging such
//! records into another world. The actual transport — sockets, channels,
//! whatever the host wires up — lives outside this crate.
//!
//! This crate provides:
//!
//! - [`wire`] — the `(component, field, value)` triple record shape.
//! - [`serializer`] — subset serialisers and full-entity dumps.
//! - [`deserializer`] — the trusting merge that builds viewer mirrors.
//! - [`messages`] — snapshot/delta envelopes.
//! - [`codec`] — MessagePack encode/decode helpers.
//! - [`error`] — replication-layer error types.

pub mod codec;
pub mod deserializer;
pub mod error;
pub mod messages;
pub mod serializer;
pub mod wire;

pub use codec::{decode, encode};
pub use deserializer::Deserializer;
pub use error::SyncError;
pub use messages::{SyncMessage, WorldDelta, WorldSnapshot};
pub use serializer::{Serializer, serialize_entity};
pub use wire::{ENTITY_MARKER, EntityRecord, Triple};
