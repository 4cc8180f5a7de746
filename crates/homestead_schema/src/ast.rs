/// Abstract syntax tree for component schema files.
use serde::{Deserialize, Serialize};

/// A parsed schema source: component definitions in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    pub components: Vec<ComponentDef>,
}

/// One `component name { ... }` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl ComponentDef {
    /// An empty component is a membership-only tag.
    pub fn is_tag(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One `name: type` entry within a component block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
}

/// A field type expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// A scalar primitive: u8, i8, u16, i16, u32, i32, f32, f64.
    Scalar(String),
    /// `[ty; len]` — a fixed-length array of one scalar primitive.
    Array(String, usize),
}
