//! The wire shape of replicated entity state.
//!
//! One entity serialises to an ordered list of
//! `(component, field, value)` triples, prefixed by a synthetic
//! `("_entity", "_entity", id)` marker triple. Triples are name-keyed on
//! purpose: payloads stay self-describing and trivially debuggable, and
//! the schema never has to be negotiated out of band. The id rides as an
//! `f64` scalar, which is lossless for `u32` slot indices.

use serde::{Deserialize, Serialize};

use homestead_ecs::{Entity, Value};

use crate::error::SyncError;

/// Component and field name of the synthetic id triple.
pub const ENTITY_MARKER: &str = "_entity";

/// One `(component, field, value)` wire triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    /// The component name, or [`ENTITY_MARKER`].
    pub component: String,
    /// The field name, or [`ENTITY_MARKER`].
    pub field: String,
    /// The field value.
    pub value: Value,
}

/// All triples for one entity, marker first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// The triples, starting with the entity marker.
    pub triples: Vec<Triple>,
}

impl EntityRecord {
    /// Start a record for `entity` with its marker triple.
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self {
            triples: vec![Triple {
                component: ENTITY_MARKER.to_string(),
                field: ENTITY_MARKER.to_string(),
                value: Value::Scalar(entity.index() as f64),
            }],
        }
    }

    /// Append a field triple.
    pub fn push(&mut self, component: &str, field: &str, value: Value) {
        self.triples.push(Triple {
            component: component.to_string(),
            field: field.to_string(),
            value,
        });
    }

    /// Extract the entity id from the marker triple.
    ///
    /// # Errors
    ///
    /// [`SyncError::MissingMarker`] if the first triple is not the
    /// marker, [`SyncError::BadEntityId`] if its value is not a
    /// non-negative integral scalar in `u32` range.
    pub fn entity(&self) -> Result<Entity, SyncError> {
        let marker = self
            .triples
            .first()
            .filter(|t| t.component == ENTITY_MARKER && t.field == ENTITY_MARKER)
            .ok_or(SyncError::MissingMarker)?;
        let raw = match marker.value {
            Value::Scalar(v) => v,
            Value::Array(_) => return Err(SyncError::MissingMarker),
        };
        if !raw.is_finite() || raw.fract() != 0.0 || raw < 0.0 || raw > f64::from(u32::MAX) {
            return Err(SyncError::BadEntityId(raw));
        }
        Ok(Entity(raw as u32))
    }

    /// Iterate the data triples, skipping the marker.
    pub fn fields(&self) -> impl Iterator<Item = &Triple> {
        self.triples
            .iter()
            .filter(|t| t.component != ENTITY_MARKER)
    }
}
