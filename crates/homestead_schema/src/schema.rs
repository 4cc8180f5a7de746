/// Resolved schema registry — collects parsed component definitions into
/// a validated, declaration-ordered set the runtime registers worlds from.
use std::collections::HashMap;

use thiserror::Error;

use homestead_ecs::{ComponentSchema, ScalarType};

use crate::ast::{ComponentDef, TypeExpr};
use crate::parser::{ParseError, Parser};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("duplicate component: {0}")]
    DuplicateComponent(String),
    #[error("duplicate field `{field}` in component `{component}`")]
    DuplicateField { component: String, field: String },
    #[error("unknown type `{ty}` for field `{component}.{field}`")]
    UnknownType {
        component: String,
        field: String,
        ty: String,
    },
    #[error("zero-length array for field `{component}.{field}`")]
    ZeroLengthArray { component: String, field: String },
}

/// A validated set of component definitions.
///
/// Declaration order is preserved — it becomes registration order in
/// every world compiled from this set, and therefore the order fields
/// appear in on the wire.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    components: Vec<ComponentDef>,
    index: HashMap<String, usize>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a source string and merge its definitions.
    pub fn load_source(&mut self, source: &str) -> Result<(), SchemaError> {
        let file = Parser::parse(source)?;
        for component in file.components {
            if self.index.contains_key(&component.name) {
                return Err(SchemaError::DuplicateComponent(component.name));
            }
            self.index
                .insert(component.name.clone(), self.components.len());
            self.components.push(component);
        }
        Ok(())
    }

    /// Get a component definition by name.
    pub fn get(&self, name: &str) -> Option<&ComponentDef> {
        self.index.get(name).map(|&i| &self.components[i])
    }

    /// Component names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }

    /// Names of membership-only tag components (no fields).
    pub fn tag_names(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|c| c.is_tag())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Compile every definition into a runtime [`ComponentSchema`],
    /// validating field types along the way.
    pub fn compile(&self) -> Result<Vec<ComponentSchema>, SchemaError> {
        let mut out = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let mut schema = ComponentSchema::new(component.name.as_str());
            let mut seen: Vec<&str> = Vec::with_capacity(component.fields.len());
            for field in &component.fields {
                if seen.contains(&field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        component: component.name.clone(),
                        field: field.name.clone(),
                    });
                }
                seen.push(&field.name);
                schema = match &field.ty {
                    TypeExpr::Scalar(ty) => {
                        let ty = self.scalar(&component.name, &field.name, ty)?;
                        schema.scalar(field.name.as_str(), ty)
                    }
                    TypeExpr::Array(ty, len) => {
                        let ty = self.scalar(&component.name, &field.name, ty)?;
                        if *len == 0 {
                            return Err(SchemaError::ZeroLengthArray {
                                component: component.name.clone(),
                                field: field.name.clone(),
                            });
                        }
                        schema.array(field.name.as_str(), ty, *len)
                    }
                };
            }
            out.push(schema);
        }
        Ok(out)
    }

    fn scalar(&self, component: &str, field: &str, ty: &str) -> Result<ScalarType, SchemaError> {
        ScalarType::parse(ty).ok_or_else(|| SchemaError::UnknownType {
            component: component.to_string(),
            field: field.to_string(),
            ty: ty.to_string(),
        })
    }

    /// Serialise the schema to a JSON description for clients.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "components": self.components.iter().map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "is_tag": c.is_tag(),
                    "fields": c.fields.iter().map(|f| {
                        serde_json::json!({
                            "name": f.name,
                            "type": match &f.ty {
                                TypeExpr::Scalar(ty) => ty.clone(),
                                TypeExpr::Array(ty, len) => format!("[{ty}; {len}]"),
                            },
                        })
                    }).collect::<Vec<_>>(),
                })
            }).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_ecs::{FieldKind, Registry};

    const SOURCE: &str = r"
        component position {
            x: f64,
            y: f64,
        }

        component tile {
            kind: u16,
            variants: [u8; 4],
        }

        component dead {}
    ";

    #[test]
    fn test_load_and_compile() {
        let mut set = SchemaSet::new();
        set.load_source(SOURCE).unwrap();

        assert_eq!(set.names(), vec!["position", "tile", "dead"]);
        assert_eq!(set.tag_names(), vec!["dead"]);

        let schemas = set.compile().unwrap();
        assert_eq!(schemas.len(), 3);
        assert_eq!(
            schemas[1].field("variants").unwrap().kind,
            FieldKind::Array {
                ty: ScalarType::U8,
                len: 4
            }
        );
    }

    #[test]
    fn test_compiled_schemas_register_cleanly() {
        let mut set = SchemaSet::new();
        set.load_source(SOURCE).unwrap();
        let schemas = set.compile().unwrap();

        let mut registry = Registry::with_capacity(8);
        let world = registry.create_world("w").unwrap();
        world.register_components(&schemas).unwrap();
        assert_eq!(world.component_names(), vec!["position", "tile", "dead"]);
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let mut set = SchemaSet::new();
        set.load_source("component a { x: f32 }").unwrap();
        assert!(matches!(
            set.load_source("component a { y: f32 }"),
            Err(SchemaError::DuplicateComponent(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut set = SchemaSet::new();
        set.load_source("component a { x: u64 }").unwrap();
        assert!(matches!(
            set.compile(),
            Err(SchemaError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut set = SchemaSet::new();
        set.load_source("component a { x: f32, x: f32 }").unwrap();
        assert!(matches!(
            set.compile(),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_zero_length_array_rejected() {
        let mut set = SchemaSet::new();
        set.load_source("component a { x: [u8; 0] }").unwrap();
        assert!(matches!(
            set.compile(),
            Err(SchemaError::ZeroLengthArray { .. })
        ));
    }

    #[test]
    fn test_json_description() {
        let mut set = SchemaSet::new();
        set.load_source(SOURCE).unwrap();
        let json = set.to_json();
        assert_eq!(json["components"][1]["fields"][1]["type"], "[u8; 4]");
        assert_eq!(json["components"][2]["is_tag"], true);
    }
}
