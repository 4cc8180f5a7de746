//! One simulation's isolated state: slot table, component stores, query cache.
//!
//! A [`World`] owns everything mutable about one running simulation. Worlds
//! share nothing (registering the same [`ComponentSchema`] in two worlds
//! builds two independent stores), so a host is free to tick different
//! worlds on different tasks.
//!
//! Structural mutations (entity create/remove, component attach/detach)
//! clear the cached query results synchronously, so a query can never
//! observe a stale structure. Field writes do not touch the cache: they
//! change values, not which entities match.

use std::collections::HashMap;

use crate::component::{ComponentSchema, ComponentStore, Value};
use crate::entity::{Entity, SlotTable, Stamp};
use crate::error::EcsError;

/// An isolated entity/component namespace.
#[derive(Debug)]
pub struct World {
    name: String,
    slots: SlotTable,
    stores: Vec<ComponentStore>,
    index: HashMap<String, usize>,
    cache: HashMap<u64, Vec<Entity>>,
}

impl World {
    pub(crate) fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            slots: SlotTable::new(capacity),
            stores: Vec::new(),
            index: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// The world's id.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fixed entity capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// The number of live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.live()
    }

    // ── Component registration ──────────────────────────────────────────

    /// Register a component, building this world's storage for it.
    ///
    /// # Errors
    ///
    /// [`EcsError::ComponentExists`] on duplicate registration.
    pub fn register_component(&mut self, schema: &ComponentSchema) -> Result<(), EcsError> {
        if self.index.contains_key(&schema.name) {
            return Err(EcsError::ComponentExists(schema.name.clone()));
        }
        let store = ComponentStore::new(schema, self.capacity());
        self.index.insert(schema.name.clone(), self.stores.len());
        self.stores.push(store);
        Ok(())
    }

    /// Register several components in order.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate; earlier registrations stick.
    pub fn register_components(&mut self, schemas: &[ComponentSchema]) -> Result<(), EcsError> {
        for schema in schemas {
            self.register_component(schema)?;
        }
        Ok(())
    }

    /// Whether a component name is registered here.
    #[must_use]
    pub fn is_registered(&self, component: &str) -> bool {
        self.index.contains_key(component)
    }

    /// Component names in registration order.
    #[must_use]
    pub fn component_names(&self) -> Vec<&str> {
        self.stores.iter().map(ComponentStore::name).collect()
    }

    /// Iterate stores in registration order.
    pub fn stores(&self) -> impl Iterator<Item = &ComponentStore> {
        self.stores.iter()
    }

    /// Look up a component's store.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownComponent`] if it is not registered.
    pub fn store(&self, component: &str) -> Result<&ComponentStore, EcsError> {
        self.index
            .get(component)
            .map(|&i| &self.stores[i])
            .ok_or_else(|| EcsError::UnknownComponent(component.to_string()))
    }

    fn store_index(&self, component: &str) -> Result<usize, EcsError> {
        self.index
            .get(component)
            .copied()
            .ok_or_else(|| EcsError::UnknownComponent(component.to_string()))
    }

    // ── Entity lifecycle ────────────────────────────────────────────────

    /// Create an entity in the lowest free slot.
    ///
    /// # Errors
    ///
    /// [`EcsError::WorldFull`] at capacity. Callers admitting external
    /// clients should treat this as "reject the join", not a crash.
    pub fn spawn(&mut self) -> Result<Entity, EcsError> {
        let entity = self.slots.allocate()?;
        self.cache.clear();
        Ok(entity)
    }

    /// Create an entity at a caller-chosen id, e.g. one assigned by an
    /// authoritative peer that local speculative ids must not collide with.
    ///
    /// # Errors
    ///
    /// [`EcsError::SlotOccupied`] / [`EcsError::OutOfRange`].
    pub fn spawn_at(&mut self, entity: Entity) -> Result<Entity, EcsError> {
        let entity = self.slots.allocate_at(entity)?;
        self.cache.clear();
        Ok(entity)
    }

    /// Remove an entity, zeroing every registered component's fields for
    /// its slot, attached or not, so the slot's next occupant starts
    /// from all-zero state.
    ///
    /// # Errors
    ///
    /// [`EcsError::NoSuchEntity`] if it is not alive.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.slots.free(entity)?;
        for store in &mut self.stores {
            store.reset_slot(entity.index());
        }
        self.cache.clear();
        Ok(())
    }

    /// Remove every entity.
    pub fn clear_entities(&mut self) {
        let live: Vec<Entity> = self.slots.iter_live().collect();
        for entity in live {
            // Slots we just listed are live; free cannot fail.
            let _ = self.slots.free(entity);
            for store in &mut self.stores {
                store.reset_slot(entity.index());
            }
        }
        self.cache.clear();
    }

    /// Whether the entity is alive.
    #[must_use]
    pub fn alive(&self, entity: Entity) -> bool {
        self.slots.contains(entity)
    }

    /// The identity stamp of a live entity.
    #[must_use]
    pub fn stamp(&self, entity: Entity) -> Option<Stamp> {
        self.slots.stamp(entity)
    }

    /// Live entities in ascending id order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.slots.iter_live().collect()
    }

    // ── Component attachment ────────────────────────────────────────────

    /// Attach a component to an entity.
    ///
    /// Attachment only edits the membership list — field values are left
    /// as they are, which for a fresh slot means zero.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownComponent`] / [`EcsError::NoSuchEntity`].
    pub fn attach(&mut self, entity: Entity, component: &str) -> Result<(), EcsError> {
        let store = self.store_index(component)?;
        if self.slots.attach(entity, store)? {
            self.cache.clear();
        }
        Ok(())
    }

    /// Detach a component from an entity, zeroing its fields.
    ///
    /// Detaching a component that was never attached is a no-op.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownComponent`] / [`EcsError::NoSuchEntity`].
    pub fn detach(&mut self, entity: Entity, component: &str) -> Result<(), EcsError> {
        let store = self.store_index(component)?;
        if self.slots.detach(entity, store)? {
            self.stores[store].reset_slot(entity.index());
            self.cache.clear();
        }
        Ok(())
    }

    /// Membership test. Dead entities have nothing attached.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownComponent`] if the component is not registered.
    pub fn has(&self, entity: Entity, component: &str) -> Result<bool, EcsError> {
        let store = self.store_index(component)?;
        Ok(self.slots.has(entity, store))
    }

    /// Components attached to a live entity, in attach order.
    ///
    /// # Errors
    ///
    /// [`EcsError::NoSuchEntity`] if it is not alive.
    pub fn attached(&self, entity: Entity) -> Result<Vec<&str>, EcsError> {
        let indices = self
            .slots
            .attached(entity)
            .ok_or(EcsError::NoSuchEntity(entity))?;
        Ok(indices.iter().map(|&i| self.stores[i].name()).collect())
    }

    // ── Field access ────────────────────────────────────────────────────
    //
    // Columns are valid for every slot in range, so reads never require
    // the component to be attached or the entity to be alive: a removed
    // entity's fields read back as zero.

    /// Read a scalar field.
    ///
    /// # Errors
    ///
    /// Unknown component/field, or the id is out of range.
    pub fn get(&self, entity: Entity, component: &str, field: &str) -> Result<f64, EcsError> {
        self.check_range(entity)?;
        Ok(self.store(component)?.column(field)?.get(entity.index()))
    }

    /// Write a scalar field.
    ///
    /// # Errors
    ///
    /// Unknown component/field, or the id is out of range.
    pub fn set(
        &mut self,
        entity: Entity,
        component: &str,
        field: &str,
        value: f64,
    ) -> Result<(), EcsError> {
        self.check_range(entity)?;
        let store = self.store_index(component)?;
        self.stores[store]
            .column_mut(field)?
            .set(entity.index(), value);
        Ok(())
    }

    /// Read one element of an array field.
    ///
    /// # Errors
    ///
    /// Unknown component/field, or the id is out of range.
    pub fn get_at(
        &self,
        entity: Entity,
        component: &str,
        field: &str,
        element: usize,
    ) -> Result<f64, EcsError> {
        self.check_range(entity)?;
        Ok(self
            .store(component)?
            .column(field)?
            .get_at(entity.index(), element))
    }

    /// Write one element of an array field.
    ///
    /// # Errors
    ///
    /// Unknown component/field, or the id is out of range.
    pub fn set_at(
        &mut self,
        entity: Entity,
        component: &str,
        field: &str,
        element: usize,
        value: f64,
    ) -> Result<(), EcsError> {
        self.check_range(entity)?;
        let store = self.store_index(component)?;
        self.stores[store]
            .column_mut(field)?
            .set_at(entity.index(), element, value);
        Ok(())
    }

    /// Read a whole field as a [`Value`].
    ///
    /// # Errors
    ///
    /// Unknown component/field, or the id is out of range.
    pub fn value(&self, entity: Entity, component: &str, field: &str) -> Result<Value, EcsError> {
        self.check_range(entity)?;
        Ok(self.store(component)?.column(field)?.value(entity.index()))
    }

    /// Write a whole field from a [`Value`], checking its shape.
    ///
    /// # Errors
    ///
    /// Unknown component/field, out-of-range id, or
    /// [`EcsError::WidthMismatch`].
    pub fn apply_value(
        &mut self,
        entity: Entity,
        component: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), EcsError> {
        self.check_range(entity)?;
        let store = self.store_index(component)?;
        let name = self.stores[store].name().to_string();
        self.stores[store]
            .column_mut(field)?
            .apply(entity.index(), value, &name)
    }

    fn check_range(&self, entity: Entity) -> Result<(), EcsError> {
        if entity.index() >= self.capacity() {
            return Err(EcsError::OutOfRange {
                entity,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    // ── Query cache ─────────────────────────────────────────────────────

    /// Drop all cached query results. Structural mutations call this
    /// internally; replication merges call it once after a batch.
    pub fn invalidate_queries(&mut self) {
        self.cache.clear();
    }

    pub(crate) fn cache_get(&self, key: u64) -> Option<&[Entity]> {
        self.cache.get(&key).map(Vec::as_slice)
    }

    pub(crate) fn cache_put(&mut self, key: u64, result: Vec<Entity>) {
        self.cache.insert(key, result);
    }

    pub(crate) fn slot_table(&self) -> &SlotTable {
        &self.slots
    }
}
