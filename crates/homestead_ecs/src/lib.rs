//! # homestead_ecs
//!
//! The engine's dense-array entity/component substrate. All dynamic
//! game-world state — players, buildings, resources, tiles, items —
//! lives in per-field numeric columns allocated at full world capacity,
//! indexed directly by entity id.
//!
//! This crate provides:
//!
//! - [`Entity`] / [`Stamp`] — slot handles plus never-reused identity
//!   tokens, so id reuse stays observable.
//! - [`ComponentSchema`] / [`ComponentStore`] — runtime component
//!   definitions and their per-world column storage.
//! - [`World`] / [`Registry`] — isolated simulation namespaces and the
//!   explicit, host-owned table of them.
//! - [`Query`] / [`Term`] — cached structural filters with optional
//!   change detection.
//! - [`EnterTracker`] / [`ExitTracker`] — per-tick membership deltas.
//! - [`EntityDump`] — debug introspection for logging collaborators.

pub mod component;
pub mod entity;
pub mod error;
pub mod inspect;
pub mod query;
pub mod registry;
pub mod tracker;
pub mod world;

pub use component::{
    Column, ComponentSchema, ComponentStore, FieldKind, FieldSchema, ScalarType, Value,
};
pub use entity::{Entity, SlotTable, Stamp};
pub use error::EcsError;
pub use inspect::{ComponentDump, EntityDump};
pub use query::{Query, Term};
pub use registry::{DEFAULT_CAPACITY, Registry};
pub use tracker::{EnterTracker, ExitTracker};
pub use world::World;
