//! Component schemas and their dense column storage.
//!
//! A component is a named bundle of numeric fields. Each field is backed
//! by one typed column allocated at full world capacity up front
//! (`capacity × width` elements for fixed-length array fields), giving
//! O(1) indexed access with no indirection table and no existence checks:
//! a slot whose entity lacks the component simply reads back zero.
//!
//! Field values cross API boundaries as `f64` — every storable scalar
//! type is exactly representable in an `f64`, so conversion is lossless.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EcsError;

/// The primitive numeric types a field can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl ScalarType {
    /// The lower-case type name used by the schema DSL and diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ScalarType::U8 => "u8",
            ScalarType::I8 => "i8",
            ScalarType::U16 => "u16",
            ScalarType::I16 => "i16",
            ScalarType::U32 => "u32",
            ScalarType::I32 => "i32",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }

    /// Parse a type name, the inverse of [`ScalarType::name`].
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "u8" => Some(ScalarType::U8),
            "i8" => Some(ScalarType::I8),
            "u16" => Some(ScalarType::U16),
            "i16" => Some(ScalarType::I16),
            "u32" => Some(ScalarType::U32),
            "i32" => Some(ScalarType::I32),
            "f32" => Some(ScalarType::F32),
            "f64" => Some(ScalarType::F64),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The shape of one field: a single scalar, or a small fixed-length array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// One scalar per entity.
    Scalar(ScalarType),
    /// `len` scalars per entity, stored flattened.
    Array {
        /// Element type.
        ty: ScalarType,
        /// Fixed element count.
        len: usize,
    },
}

impl FieldKind {
    /// Elements stored per entity (1 for scalars).
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            FieldKind::Scalar(_) => 1,
            FieldKind::Array { len, .. } => len,
        }
    }

    /// The element type.
    #[must_use]
    pub const fn scalar_type(self) -> ScalarType {
        match self {
            FieldKind::Scalar(ty) | FieldKind::Array { ty, .. } => ty,
        }
    }
}

/// One named field within a component schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// The field name (e.g. `"x"`).
    pub name: String,
    /// The field's storage shape.
    pub kind: FieldKind,
}

/// A component definition: a name plus an ordered field list.
///
/// Schemas are plain values shared between worlds; registering one in a
/// world builds that world's private storage, so worlds never share
/// component state.
///
/// # Examples
///
/// ```rust
/// use homestead_ecs::{ComponentSchema, ScalarType};
///
/// let position = ComponentSchema::new("position")
///     .scalar("x", ScalarType::F64)
///     .scalar("y", ScalarType::F64);
/// let tile = ComponentSchema::new("tile")
///     .scalar("kind", ScalarType::U16)
///     .array("variants", ScalarType::U8, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    /// The component name (e.g. `"position"`).
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldSchema>,
}

impl ComponentSchema {
    /// Start a schema with the given component name and no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a scalar field.
    #[must_use]
    pub fn scalar(mut self, name: impl Into<String>, ty: ScalarType) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            kind: FieldKind::Scalar(ty),
        });
        self
    }

    /// Append a fixed-length array field.
    #[must_use]
    pub fn array(mut self, name: impl Into<String>, ty: ScalarType, len: usize) -> Self {
        self.fields.push(FieldSchema {
            name: name.into(),
            kind: FieldKind::Array { ty, len },
        });
        self
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A field value as it crosses API and wire boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A scalar field's value.
    Scalar(f64),
    /// An array field's elements.
    Array(Vec<f64>),
}

impl Value {
    /// Elements carried (1 for scalars).
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Array(items) => items.len(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(v) => write!(f, "{v}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Typed backing storage, `capacity × width` elements, zero-initialised.
#[derive(Debug, Clone)]
enum ColumnData {
    U8(Box<[u8]>),
    I8(Box<[i8]>),
    U16(Box<[u16]>),
    I16(Box<[i16]>),
    U32(Box<[u32]>),
    I32(Box<[i32]>),
    F32(Box<[f32]>),
    F64(Box<[f64]>),
}

macro_rules! on_column {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            ColumnData::U8($arr) => $body,
            ColumnData::I8($arr) => $body,
            ColumnData::U16($arr) => $body,
            ColumnData::I16($arr) => $body,
            ColumnData::U32($arr) => $body,
            ColumnData::I32($arr) => $body,
            ColumnData::F32($arr) => $body,
            ColumnData::F64($arr) => $body,
        }
    };
}

impl ColumnData {
    fn new(ty: ScalarType, len: usize) -> Self {
        match ty {
            ScalarType::U8 => ColumnData::U8(vec![0; len].into_boxed_slice()),
            ScalarType::I8 => ColumnData::I8(vec![0; len].into_boxed_slice()),
            ScalarType::U16 => ColumnData::U16(vec![0; len].into_boxed_slice()),
            ScalarType::I16 => ColumnData::I16(vec![0; len].into_boxed_slice()),
            ScalarType::U32 => ColumnData::U32(vec![0; len].into_boxed_slice()),
            ScalarType::I32 => ColumnData::I32(vec![0; len].into_boxed_slice()),
            ScalarType::F32 => ColumnData::F32(vec![0.0; len].into_boxed_slice()),
            ScalarType::F64 => ColumnData::F64(vec![0.0; len].into_boxed_slice()),
        }
    }

    fn get(&self, index: usize) -> f64 {
        on_column!(self, arr => arr[index] as f64)
    }

    fn set(&mut self, index: usize, value: f64) {
        on_column!(self, arr => arr[index] = value as _);
    }

    fn zero_span(&mut self, start: usize, width: usize) {
        for i in start..start + width {
            self.set(i, 0.0);
        }
    }
}

/// Dense storage for one field of one component in one world.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    kind: FieldKind,
    data: ColumnData,
}

impl Column {
    fn new(field: &FieldSchema, capacity: usize) -> Self {
        Self {
            name: field.name.clone(),
            kind: field.kind,
            data: ColumnData::new(field.kind.scalar_type(), capacity * field.kind.width()),
        }
    }

    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's storage shape.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Elements stored per entity.
    #[must_use]
    pub fn width(&self) -> usize {
        self.kind.width()
    }

    /// Read a scalar field (or an array field's first element).
    #[must_use]
    pub fn get(&self, slot: usize) -> f64 {
        self.data.get(slot * self.width())
    }

    /// Write a scalar field. Integer columns truncate toward zero and
    /// saturate at the type's bounds, as `as` casts do.
    pub fn set(&mut self, slot: usize, value: f64) {
        self.data.set(slot * self.width(), value);
    }

    /// Read one element of an array field.
    #[must_use]
    pub fn get_at(&self, slot: usize, element: usize) -> f64 {
        debug_assert!(element < self.width());
        self.data.get(slot * self.width() + element)
    }

    /// Write one element of an array field.
    pub fn set_at(&mut self, slot: usize, element: usize, value: f64) {
        debug_assert!(element < self.width());
        self.data.set(slot * self.width() + element, value);
    }

    /// Read the whole field as a [`Value`].
    #[must_use]
    pub fn value(&self, slot: usize) -> Value {
        match self.kind {
            FieldKind::Scalar(_) => Value::Scalar(self.get(slot)),
            FieldKind::Array { len, .. } => {
                Value::Array((0..len).map(|i| self.get_at(slot, i)).collect())
            }
        }
    }

    /// Write the whole field from a [`Value`], checking its shape.
    ///
    /// # Errors
    ///
    /// [`EcsError::WidthMismatch`] if a scalar is written to an array
    /// field (or vice versa), or an array value's length differs from the
    /// field's declared length. `component` is only used to label the
    /// error.
    pub fn apply(&mut self, slot: usize, value: &Value, component: &str) -> Result<(), EcsError> {
        match (self.kind, value) {
            (FieldKind::Scalar(_), Value::Scalar(v)) => {
                self.set(slot, *v);
                Ok(())
            }
            (FieldKind::Array { len, .. }, Value::Array(items)) if items.len() == len => {
                for (i, v) in items.iter().enumerate() {
                    self.set_at(slot, i, *v);
                }
                Ok(())
            }
            _ => Err(EcsError::WidthMismatch {
                component: component.to_string(),
                field: self.name.clone(),
                expected: self.width(),
                got: value.width(),
            }),
        }
    }

    /// Zero this field for one slot.
    pub fn reset(&mut self, slot: usize) {
        self.data.zero_span(slot * self.width(), self.width());
    }
}

/// One world's storage for one component: a column per field.
#[derive(Debug, Clone)]
pub struct ComponentStore {
    schema: ComponentSchema,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl ComponentStore {
    /// Build storage for `schema` sized to `capacity` slots.
    #[must_use]
    pub fn new(schema: &ComponentSchema, capacity: usize) -> Self {
        let columns: Vec<Column> = schema
            .fields
            .iter()
            .map(|f| Column::new(f, capacity))
            .collect();
        let index = schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self {
            schema: schema.clone(),
            columns,
            index,
        }
    }

    /// The component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// The schema this store was built from.
    #[must_use]
    pub fn schema(&self) -> &ComponentSchema {
        &self.schema
    }

    /// Look up a field's column.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownField`] if the schema has no such field.
    pub fn column(&self, field: &str) -> Result<&Column, EcsError> {
        self.index
            .get(field)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| EcsError::UnknownField {
                component: self.schema.name.clone(),
                field: field.to_string(),
            })
    }

    /// Look up a field's column mutably.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownField`] if the schema has no such field.
    pub fn column_mut(&mut self, field: &str) -> Result<&mut Column, EcsError> {
        match self.index.get(field) {
            Some(&i) => Ok(&mut self.columns[i]),
            None => Err(EcsError::UnknownField {
                component: self.schema.name.clone(),
                field: field.to_string(),
            }),
        }
    }

    /// Iterate columns in field declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Zero every field of this component for one slot.
    pub fn reset_slot(&mut self, slot: usize) {
        for column in &mut self.columns {
            column.reset(slot);
        }
    }

    /// All field values for one slot, flattened in declaration order.
    /// Used for change-detection snapshots.
    #[must_use]
    pub fn snapshot(&self, slot: usize) -> Vec<f64> {
        let mut out = Vec::new();
        for column in &self.columns {
            for i in 0..column.width() {
                out.push(column.get_at(slot, i));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_schema() -> ComponentSchema {
        ComponentSchema::new("tile")
            .scalar("kind", ScalarType::U16)
            .array("variants", ScalarType::U8, 4)
    }

    #[test]
    fn test_new_store_reads_zero_everywhere() {
        let store = ComponentStore::new(&tile_schema(), 16);
        for slot in 0..16 {
            assert_eq!(store.column("kind").unwrap().get(slot), 0.0);
            assert_eq!(
                store.column("variants").unwrap().value(slot),
                Value::Array(vec![0.0; 4])
            );
        }
    }

    #[test]
    fn test_scalar_get_set() {
        let mut store = ComponentStore::new(&tile_schema(), 8);
        store.column_mut("kind").unwrap().set(3, 7.0);
        assert_eq!(store.column("kind").unwrap().get(3), 7.0);
        // Neighbours untouched.
        assert_eq!(store.column("kind").unwrap().get(2), 0.0);
        assert_eq!(store.column("kind").unwrap().get(4), 0.0);
    }

    #[test]
    fn test_array_elements_are_per_slot() {
        let mut store = ComponentStore::new(&tile_schema(), 8);
        let col = store.column_mut("variants").unwrap();
        col.set_at(1, 0, 9.0);
        col.set_at(1, 3, 2.0);
        col.set_at(2, 0, 5.0);
        let col = store.column("variants").unwrap();
        assert_eq!(col.value(1), Value::Array(vec![9.0, 0.0, 0.0, 2.0]));
        assert_eq!(col.value(2), Value::Array(vec![5.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_integer_columns_truncate() {
        let mut store = ComponentStore::new(&tile_schema(), 4);
        store.column_mut("kind").unwrap().set(0, 3.9);
        assert_eq!(store.column("kind").unwrap().get(0), 3.0);
    }

    #[test]
    fn test_apply_width_mismatch() {
        let mut store = ComponentStore::new(&tile_schema(), 4);
        let err = store
            .column_mut("variants")
            .unwrap()
            .apply(0, &Value::Array(vec![1.0, 2.0]), "tile")
            .unwrap_err();
        assert_eq!(
            err,
            EcsError::WidthMismatch {
                component: "tile".to_string(),
                field: "variants".to_string(),
                expected: 4,
                got: 2,
            }
        );
    }

    #[test]
    fn test_reset_slot_zeroes_all_fields() {
        let mut store = ComponentStore::new(&tile_schema(), 4);
        store.column_mut("kind").unwrap().set(1, 3.0);
        store.column_mut("variants").unwrap().set_at(1, 2, 8.0);
        store.reset_slot(1);
        assert_eq!(store.snapshot(1), vec![0.0; 5]);
    }

    #[test]
    fn test_unknown_field() {
        let store = ComponentStore::new(&tile_schema(), 4);
        assert!(matches!(
            store.column("nope"),
            Err(EcsError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_scalar_type_parse_roundtrip() {
        for ty in [
            ScalarType::U8,
            ScalarType::I8,
            ScalarType::U16,
            ScalarType::I16,
            ScalarType::U32,
            ScalarType::I32,
            ScalarType::F32,
            ScalarType::F64,
        ] {
            assert_eq!(ScalarType::parse(ty.name()), Some(ty));
        }
        assert_eq!(ScalarType::parse("u64"), None);
    }
}
