//! The world registry — an explicit, host-owned table of worlds.
//!
//! A [`Registry`] is a plain value, not a process global: the host
//! constructs one at startup and passes it (or holds it in one place).
//! Tests, and a viewer process mirroring an authoritative simulation,
//! simply construct their own.

use std::collections::HashMap;

use tracing::debug;

use crate::error::EcsError;
use crate::world::World;

/// Default per-world entity capacity.
pub const DEFAULT_CAPACITY: usize = 3000;

/// A table of independent [`World`]s, keyed by an opaque string id —
/// in practice a game-session or lobby identifier.
#[derive(Debug)]
pub struct Registry {
    capacity: usize,
    worlds: HashMap<String, World>,
}

impl Registry {
    /// Create a registry whose worlds hold [`DEFAULT_CAPACITY`] entities.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a registry with a chosen per-world entity capacity.
    /// The cap is hard: allocation past it fails, it does not grow.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            worlds: HashMap::new(),
        }
    }

    /// The per-world entity capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create a world.
    ///
    /// # Errors
    ///
    /// [`EcsError::WorldExists`] on a duplicate id.
    pub fn create_world(&mut self, id: impl Into<String>) -> Result<&mut World, EcsError> {
        let id = id.into();
        if self.worlds.contains_key(&id) {
            return Err(EcsError::WorldExists(id));
        }
        debug!(world = %id, capacity = self.capacity, "world created");
        let world = World::new(id.clone(), self.capacity);
        Ok(self.worlds.entry(id).or_insert(world))
    }

    /// Look up a world.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownWorld`] if no world has this id.
    pub fn world(&self, id: &str) -> Result<&World, EcsError> {
        self.worlds
            .get(id)
            .ok_or_else(|| EcsError::UnknownWorld(id.to_string()))
    }

    /// Look up a world mutably.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownWorld`] if no world has this id.
    pub fn world_mut(&mut self, id: &str) -> Result<&mut World, EcsError> {
        self.worlds
            .get_mut(id)
            .ok_or_else(|| EcsError::UnknownWorld(id.to_string()))
    }

    /// Remove a world, dropping its entire store.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownWorld`] if no world has this id.
    pub fn remove_world(&mut self, id: &str) -> Result<World, EcsError> {
        let world = self
            .worlds
            .remove(id)
            .ok_or_else(|| EcsError::UnknownWorld(id.to_string()))?;
        debug!(world = %id, "world removed");
        Ok(world)
    }

    /// Whether a world with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.worlds.contains_key(id)
    }

    /// Ids of all worlds, in no particular order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.worlds.keys().map(String::as_str).collect()
    }

    /// The number of worlds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    /// Whether the registry holds no worlds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
