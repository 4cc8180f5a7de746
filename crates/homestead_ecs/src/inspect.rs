//! Debug introspection: a readable dump of one entity's state.
//!
//! Logging and tooling collaborators get a structured snapshot of an
//! entity's attached components and current field values, with a
//! `Display` impl so it drops straight into a log line.

use crate::component::Value;
use crate::entity::{Entity, Stamp};
use crate::error::EcsError;
use crate::world::World;

/// A snapshot of one component's fields for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDump {
    /// The component name.
    pub name: String,
    /// `(field, value)` pairs in declaration order.
    pub fields: Vec<(String, Value)>,
}

/// A snapshot of one live entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDump {
    /// The entity id.
    pub entity: Entity,
    /// The entity's identity stamp.
    pub stamp: Stamp,
    /// Attached components in attach order.
    pub components: Vec<ComponentDump>,
}

impl std::fmt::Display for EntityDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.entity, self.stamp)?;
        for component in &self.components {
            write!(f, " {}{{", component.name)?;
            for (i, (field, value)) in component.fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{field}: {value}")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

impl World {
    /// Dump a live entity's attached components and field values.
    ///
    /// # Errors
    ///
    /// [`EcsError::NoSuchEntity`] if the entity is not alive.
    pub fn inspect(&self, entity: Entity) -> Result<EntityDump, EcsError> {
        let stamp = self.stamp(entity).ok_or(EcsError::NoSuchEntity(entity))?;
        let mut components = Vec::new();
        for name in self.attached(entity)? {
            let store = self.store(name)?;
            let fields = store
                .columns()
                .map(|c| (c.name().to_string(), c.value(entity.index())))
                .collect();
            components.push(ComponentDump {
                name: name.to_string(),
                fields,
            });
        }
        Ok(EntityDump {
            entity,
            stamp,
            components,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentSchema, ScalarType};
    use crate::registry::Registry;

    #[test]
    fn test_inspect_lists_attached_values() {
        let mut registry = Registry::with_capacity(8);
        let world = registry.create_world("w").unwrap();
        world
            .register_components(&[
                ComponentSchema::new("position")
                    .scalar("x", ScalarType::F64)
                    .scalar("y", ScalarType::F64),
                ComponentSchema::new("tile").array("variants", ScalarType::U8, 2),
            ])
            .unwrap();

        let e = world.spawn().unwrap();
        world.attach(e, "position").unwrap();
        world.set(e, "position", "x", 4.0).unwrap();

        let dump = world.inspect(e).unwrap();
        assert_eq!(dump.entity, e);
        assert_eq!(dump.components.len(), 1);
        assert_eq!(dump.components[0].name, "position");
        assert_eq!(
            dump.components[0].fields,
            vec![
                ("x".to_string(), Value::Scalar(4.0)),
                ("y".to_string(), Value::Scalar(0.0)),
            ]
        );
        // Readable one-liner for logs.
        assert_eq!(
            dump.to_string(),
            format!("{} [{}] position{{x: 4, y: 0}}", e, dump.stamp)
        );
    }

    #[test]
    fn test_inspect_dead_entity_fails() {
        let mut registry = Registry::with_capacity(8);
        let world = registry.create_world("w").unwrap();
        assert_eq!(
            world.inspect(Entity(0)).err(),
            Some(EcsError::NoSuchEntity(Entity(0)))
        );
    }
}
