//! Building wire records from world state.
//!
//! Serialisation walks the world's stores in registration order, never
//! the caller's subset order, so a given world produces bytes in a
//! stable order regardless of how the subset list was written. An entity
//! contributes triples only for components it actually has attached.

use homestead_ecs::{Entity, World};

use crate::error::SyncError;
use crate::wire::EntityRecord;

/// Serialise one entity's full attached state, in registration order.
///
/// # Errors
///
/// [`homestead_ecs::EcsError::NoSuchEntity`] (via [`SyncError::Ecs`]) if
/// the entity is not alive.
pub fn serialize_entity(world: &World, entity: Entity) -> Result<EntityRecord, SyncError> {
    let attached = world.attached(entity)?;
    let mut record = EntityRecord::new(entity);
    for store in world.stores() {
        if !attached.contains(&store.name()) {
            continue;
        }
        for column in store.columns() {
            record.push(store.name(), column.name(), column.value(entity.index()));
        }
    }
    Ok(record)
}

/// A reusable serialiser restricted to a component subset.
///
/// Built once per sync flavour (a narrow movement payload, a full
/// building dump) and applied per tick to whatever entities need
/// shipping.
#[derive(Debug, Clone)]
pub struct Serializer {
    components: Vec<String>,
}

impl Serializer {
    /// Restrict serialisation to the named components.
    #[must_use]
    pub fn new(components: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// The component subset, as given.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Serialise the chosen entities. Entities lacking a subset component
    /// simply contribute no triples for it.
    ///
    /// # Errors
    ///
    /// Fails if a subset component is not registered in `world`, or an
    /// entity is not alive.
    pub fn serialize(
        &self,
        world: &World,
        entities: &[Entity],
    ) -> Result<Vec<EntityRecord>, SyncError> {
        for component in &self.components {
            world.store(component)?;
        }
        let mut records = Vec::with_capacity(entities.len());
        for &entity in entities {
            let attached = world.attached(entity)?;
            let mut record = EntityRecord::new(entity);
            for store in world.stores() {
                let name = store.name();
                if !self.components.iter().any(|c| c == name) {
                    continue;
                }
                if !attached.contains(&name) {
                    continue;
                }
                for column in store.columns() {
                    record.push(name, column.name(), column.value(entity.index()));
                }
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Serialise every live entity: the full-world snapshot sent to a
    /// joining viewer.
    ///
    /// # Errors
    ///
    /// Fails if a subset component is not registered in `world`.
    pub fn serialize_world(&self, world: &World) -> Result<Vec<EntityRecord>, SyncError> {
        self.serialize(world, &world.entities())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_ecs::{ComponentSchema, Registry, ScalarType, Value};

    fn movement_world(registry: &mut Registry) -> &mut World {
        let world = registry.create_world("w").unwrap();
        world
            .register_components(&[
                ComponentSchema::new("position")
                    .scalar("x", ScalarType::F64)
                    .scalar("y", ScalarType::F64),
                ComponentSchema::new("velocity")
                    .scalar("x", ScalarType::F64)
                    .scalar("y", ScalarType::F64),
                // A membership-only tag: attached, but contributes no triples.
                ComponentSchema::new("player"),
                ComponentSchema::new("inventory").array("slots", ScalarType::U16, 3),
            ])
            .unwrap();
        world
    }

    #[test]
    fn test_movement_subset_payload() {
        let mut registry = Registry::with_capacity(8);
        let world = movement_world(&mut registry);

        let e = world.spawn().unwrap();
        for component in ["position", "velocity", "player", "inventory"] {
            world.attach(e, component).unwrap();
        }
        world.set(e, "position", "x", 10.0).unwrap();
        world.set(e, "position", "y", 20.0).unwrap();
        world.set(e, "velocity", "x", 2.0).unwrap();
        world.set(e, "inventory", "slots", 7.0).unwrap();

        let serializer = Serializer::new(["player", "velocity", "position"]);
        let records = serializer.serialize(world, &[e]).unwrap();
        assert_eq!(records.len(), 1);

        let triples: Vec<(String, String, Value)> = records[0]
            .fields()
            .map(|t| (t.component.clone(), t.field.clone(), t.value.clone()))
            .collect();
        // Registration order, nothing from the field-less tag, and
        // nothing from components outside the subset (inventory stays
        // home).
        assert_eq!(
            triples,
            vec![
                ("position".into(), "x".into(), Value::Scalar(10.0)),
                ("position".into(), "y".into(), Value::Scalar(20.0)),
                ("velocity".into(), "x".into(), Value::Scalar(2.0)),
                ("velocity".into(), "y".into(), Value::Scalar(0.0)),
            ]
        );
    }

    #[test]
    fn test_unattached_subset_component_contributes_nothing() {
        let mut registry = Registry::with_capacity(8);
        let world = movement_world(&mut registry);
        let e = world.spawn().unwrap();
        world.attach(e, "position").unwrap();

        let serializer = Serializer::new(["position", "velocity"]);
        let records = serializer.serialize(world, &[e]).unwrap();
        assert!(records[0].fields().all(|t| t.component == "position"));
    }

    #[test]
    fn test_serialize_entity_full_dump() {
        let mut registry = Registry::with_capacity(8);
        let world = movement_world(&mut registry);
        let e = world.spawn().unwrap();
        world.attach(e, "inventory").unwrap();
        world.set_at(e, "inventory", "slots", 1, 9.0).unwrap();

        let record = serialize_entity(world, e).unwrap();
        let fields: Vec<_> = record.fields().collect();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, Value::Array(vec![0.0, 9.0, 0.0]));
    }

    #[test]
    fn test_unknown_subset_component_fails() {
        let mut registry = Registry::with_capacity(8);
        let world = movement_world(&mut registry);
        let serializer = Serializer::new(["ghost"]);
        assert!(serializer.serialize_world(world).is_err());
    }

    #[test]
    fn test_serialize_world_covers_all_live_entities() {
        let mut registry = Registry::with_capacity(8);
        let world = movement_world(&mut registry);
        for _ in 0..3 {
            let e = world.spawn().unwrap();
            world.attach(e, "position").unwrap();
        }
        let serializer = Serializer::new(["position"]);
        assert_eq!(serializer.serialize_world(world).unwrap().len(), 3);
    }
}
