//! Record layouts and validation.

use std::collections::HashSet;

use wire::{RangeError, Ranged, MAX_RANGED_F32_BYTES, MAX_RANGED_F64_BYTES};

use crate::error::{SchemaError, SchemaResult};
use crate::{FieldDef, FieldId, FieldKind};

/// An ordered set of fields making up one replicated record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    pub fields: Vec<FieldDef>,
}

impl Layout {
    /// Creates a layout from fields after validation.
    pub fn new(fields: Vec<FieldDef>) -> SchemaResult<Self> {
        let layout = Self { fields };
        layout.validate()?;
        Ok(layout)
    }

    /// Creates a layout builder.
    #[must_use]
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder { fields: Vec::new() }
    }

    /// Looks up a field by id.
    #[must_use]
    pub fn field(&self, id: FieldId) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates layout invariants.
    pub fn validate(&self) -> SchemaResult<()> {
        let mut field_ids = HashSet::new();
        for field in &self.fields {
            if !field_ids.insert(field.id) {
                return Err(SchemaError::DuplicateFieldId { field: field.id });
            }
            validate_field(field)?;
        }
        Ok(())
    }
}

/// Builder for `Layout`.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    fields: Vec<FieldDef>,
}

impl LayoutBuilder {
    /// Adds a field definition.
    #[must_use]
    pub fn field(mut self, id: FieldId, kind: FieldKind) -> Self {
        self.fields.push(FieldDef::new(id, kind));
        self
    }

    /// Builds the layout after validation.
    pub fn build(self) -> SchemaResult<Layout> {
        Layout::new(self.fields)
    }
}

fn validate_field(field: &FieldDef) -> SchemaResult<()> {
    let checked = match field.kind {
        FieldKind::RangedF32 { min, max, bytes } => Ranged::checked(
            f64::from(min),
            f64::from(max),
            bytes,
            MAX_RANGED_F32_BYTES,
        ),
        FieldKind::RangedF64 { min, max, bytes } => {
            Ranged::checked(min, max, bytes, MAX_RANGED_F64_BYTES)
        }
        _ => return Ok(()),
    };
    match checked {
        Ok(_) => Ok(()),
        Err(RangeError::InvalidByteBudget { bytes, max }) => Err(SchemaError::InvalidByteBudget {
            field: field.id,
            bytes,
            max,
        }),
        Err(RangeError::EmptyRange { min, max } | RangeError::ValueOutOfRange { min, max, .. }) => {
            Err(SchemaError::InvalidRange {
                field: field.id,
                min,
                max,
            })
        }
    }
}
