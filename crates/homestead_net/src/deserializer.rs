//! Applying wire records to a world.
//!
//! The deserialiser trusts its input: a record for an id with no local
//! entity creates that entity on the spot, which is what lets a viewer
//! build its mirror world incrementally from whatever subset payloads
//! arrive. Only validated, authoritative senders should feed this path —
//! transport authentication is the host's job, not this layer's.

use homestead_ecs::{Entity, World};

use crate::error::SyncError;
use crate::wire::EntityRecord;

/// A reusable deserialiser restricted to a component subset.
#[derive(Debug, Clone)]
pub struct Deserializer {
    components: Vec<String>,
}

impl Deserializer {
    /// Restrict application to the named components; triples outside the
    /// subset are ignored.
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

    /// Merge records into `world`, returning the entities touched.
    ///
    /// Missing entities are created at their wire id; subset components
    /// are attached as their triples arrive; array fields must match the
    /// local field's declared width. The query cache is invalidated once
    /// at the end, whether or not any structural change happened.
    ///
    /// # Errors
    ///
    /// Malformed records, unregistered subset components, occupied/out-of
    /// range ids, and width mismatches all fail the merge; records before
    /// the failing one remain applied.
    pub fn apply(
        &self,
        world: &mut World,
        records: &[EntityRecord],
    ) -> Result<Vec<Entity>, SyncError> {
        let mut touched = Vec::with_capacity(records.len());
        for record in records {
            let entity = record.entity()?;
            if !world.alive(entity) {
                world.spawn_at(entity)?;
            }
            for triple in record.fields() {
                if !self.components.iter().any(|c| c == &triple.component) {
                    continue;
                }
                if !world.has(entity, &triple.component)? {
                    world.attach(entity, &triple.component)?;
                }
                world.apply_value(entity, &triple.component, &triple.field, &triple.value)?;
            }
            touched.push(entity);
        }
        world.invalidate_queries();
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::Serializer;
    use crate::wire::Triple;
    use homestead_ecs::{ComponentSchema, Query, Registry, ScalarType, Value};

    fn schemas() -> Vec<ComponentSchema> {
        vec![
            ComponentSchema::new("position")
                .scalar("x", ScalarType::F64)
                .scalar("y", ScalarType::F64),
            ComponentSchema::new("inventory").array("slots", ScalarType::U16, 3),
        ]
    }

    #[test]
    fn test_roundtrip_between_worlds() {
        let mut source_registry = Registry::with_capacity(16);
        let source = source_registry.create_world("authoritative").unwrap();
        source.register_components(&schemas()).unwrap();

        let e = source.spawn().unwrap();
        source.attach(e, "position").unwrap();
        source.attach(e, "inventory").unwrap();
        source.set(e, "position", "x", 10.0).unwrap();
        source.set(e, "position", "y", 20.0).unwrap();
        source.set_at(e, "inventory", "slots", 2, 5.0).unwrap();

        let records = Serializer::new(["position", "inventory"])
            .serialize(source, &[e])
            .unwrap();

        let mut viewer_registry = Registry::with_capacity(16);
        let viewer = viewer_registry.create_world("viewer").unwrap();
        viewer.register_components(&schemas()).unwrap();

        let touched = Deserializer::new(["position", "inventory"])
            .apply(viewer, &records)
            .unwrap();
        assert_eq!(touched, vec![e]);
        assert_eq!(viewer.get(e, "position", "x").unwrap(), 10.0);
        assert_eq!(viewer.get(e, "position", "y").unwrap(), 20.0);
        assert_eq!(
            viewer.value(e, "inventory", "slots").unwrap(),
            Value::Array(vec![0.0, 0.0, 5.0])
        );
    }

    #[test]
    fn test_missing_entity_is_created_and_queryable() {
        let mut registry = Registry::with_capacity(64);
        let world = registry.create_world("viewer").unwrap();
        world.register_components(&schemas()).unwrap();

        let mut record = EntityRecord::new(Entity(42));
        record.push("position", "x", Value::Scalar(3.0));

        Deserializer::new(["position"])
            .apply(world, &[record])
            .unwrap();

        assert!(world.alive(Entity(42)));
        assert_eq!(world.get(Entity(42), "position", "x").unwrap(), 3.0);

        let mut q = Query::new(vec![]).with("position");
        assert_eq!(q.run(world).unwrap(), vec![Entity(42)]);
    }

    #[test]
    fn test_triples_outside_subset_are_ignored() {
        let mut registry = Registry::with_capacity(16);
        let world = registry.create_world("viewer").unwrap();
        world.register_components(&schemas()).unwrap();

        let mut record = EntityRecord::new(Entity(0));
        record.push("position", "x", Value::Scalar(3.0));
        record.push("inventory", "slots", Value::Array(vec![1.0, 2.0, 3.0]));

        Deserializer::new(["position"]).apply(world, &[record]).unwrap();
        assert!(!world.has(Entity(0), "inventory").unwrap());
        assert_eq!(
            world.value(Entity(0), "inventory", "slots").unwrap(),
            Value::Array(vec![0.0; 3])
        );
    }

    #[test]
    fn test_width_mismatch_fails_merge() {
        let mut registry = Registry::with_capacity(16);
        let world = registry.create_world("viewer").unwrap();
        world.register_components(&schemas()).unwrap();

        let mut record = EntityRecord::new(Entity(0));
        record.push("inventory", "slots", Value::Array(vec![1.0, 2.0]));

        let err = Deserializer::new(["inventory"])
            .apply(world, &[record])
            .unwrap_err();
        assert!(matches!(err, SyncError::Ecs(_)));
    }

    #[test]
    fn test_cache_invalidated_even_without_structural_change() {
        let mut registry = Registry::with_capacity(16);
        let world = registry.create_world("viewer").unwrap();
        world.register_components(&schemas()).unwrap();
        let e = world.spawn().unwrap();
        world.attach(e, "position").unwrap();

        // Prime the cache.
        let mut q = Query::new(vec![]).with("position");
        q.run(world).unwrap();

        // Value-only merge for an existing, already-attached component.
        let mut record = EntityRecord::new(e);
        record.push("position", "x", Value::Scalar(9.0));
        Deserializer::new(["position"]).apply(world, &[record]).unwrap();

        assert_eq!(q.run(world).unwrap(), vec![e]);
        assert_eq!(world.get(e, "position", "x").unwrap(), 9.0);
    }

    #[test]
    fn test_malformed_record_fails() {
        let mut registry = Registry::with_capacity(16);
        let world = registry.create_world("viewer").unwrap();
        world.register_components(&schemas()).unwrap();

        let record = EntityRecord {
            triples: vec![Triple {
                component: "position".to_string(),
                field: "x".to_string(),
                value: Value::Scalar(1.0),
            }],
        };
        assert!(matches!(
            Deserializer::new(["position"]).apply(world, &[record]),
            Err(SyncError::MissingMarker)
        ));
    }
}
