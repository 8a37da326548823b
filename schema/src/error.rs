//! Layout validation errors.

use thiserror::Error;

use crate::FieldId;

/// Result type for layout operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building or validating a layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Duplicate field ID within a layout.
    #[error("duplicate field id {field}")]
    DuplicateFieldId { field: FieldId },

    /// A ranged field has an unusable byte budget.
    #[error("field {field}: byte budget {bytes} outside [1, {max}]")]
    InvalidByteBudget { field: FieldId, bytes: u8, max: u8 },

    /// A ranged field has an empty or non-finite range.
    #[error("field {field}: invalid range [{min}, {max}]")]
    InvalidRange { field: FieldId, min: f64, max: f64 },
}
