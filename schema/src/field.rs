//! Field shapes and definitions.

use crate::FieldId;

/// Element shape of a list field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ElemKind {
    /// Boolean (1 bit).
    Bool,
    /// Raw byte.
    U8,
    /// Variable-length unsigned integer.
    #[cfg_attr(feature = "serde", serde(rename = "var_uint"))]
    VarUInt,
    /// Variable-length signed integer (zig-zag encoded).
    #[cfg_attr(feature = "serde", serde(rename = "var_sint"))]
    VarSInt,
    /// Packed `f32`.
    F32,
    /// Packed `f64`.
    F64,
    /// Length-prefixed UTF-8 string.
    Str,
}

/// The encoding of a replicated field.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldKind {
    /// Boolean (1 bit).
    Bool,

    /// Raw byte.
    U8,

    /// Variable-length unsigned integer.
    #[cfg_attr(feature = "serde", serde(rename = "var_uint"))]
    VarUInt,

    /// Variable-length signed integer (zig-zag encoded).
    #[cfg_attr(feature = "serde", serde(rename = "var_sint"))]
    VarSInt,

    /// `f32` as a byte-swapped varint.
    F32,

    /// `f64` as a byte-swapped varint.
    F64,

    /// `f32` as 4 raw little-endian bytes.
    F32Fixed,

    /// `f64` as 8 raw little-endian bytes.
    F64Fixed,

    /// `f32` quantized over `[min, max]` into `bytes` bytes (1..=4).
    RangedF32 { min: f32, max: f32, bytes: u8 },

    /// `f64` quantized over `[min, max]` into `bytes` bytes (1..=8).
    RangedF64 { min: f64, max: f64, bytes: u8 },

    /// Length-prefixed UTF-8 string.
    Str,

    /// Length-prefixed byte array.
    Bytes,

    /// Length-prefixed list of scalar elements.
    List(ElemKind),
}

impl FieldKind {
    /// Creates a quantized `f32` field kind.
    #[must_use]
    pub const fn ranged_f32(min: f32, max: f32, bytes: u8) -> Self {
        Self::RangedF32 { min, max, bytes }
    }

    /// Creates a quantized `f64` field kind.
    #[must_use]
    pub const fn ranged_f64(min: f64, max: f64, bytes: u8) -> Self {
        Self::RangedF64 { min, max, bytes }
    }

    /// Creates a list field kind.
    #[must_use]
    pub const fn list(elem: ElemKind) -> Self {
        Self::List(elem)
    }

    /// Short human-readable name of the shape.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::VarUInt => "var_uint",
            Self::VarSInt => "var_sint",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::F32Fixed => "f32_fixed",
            Self::F64Fixed => "f64_fixed",
            Self::RangedF32 { .. } => "ranged_f32",
            Self::RangedF64 { .. } => "ranged_f64",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::List(_) => "list",
        }
    }
}

impl From<ElemKind> for FieldKind {
    fn from(elem: ElemKind) -> Self {
        match elem {
            ElemKind::Bool => Self::Bool,
            ElemKind::U8 => Self::U8,
            ElemKind::VarUInt => Self::VarUInt,
            ElemKind::VarSInt => Self::VarSInt,
            ElemKind::F32 => Self::F32,
            ElemKind::F64 => Self::F64,
            ElemKind::Str => Self::Str,
        }
    }
}

/// Field definition within a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDef {
    pub id: FieldId,
    pub kind: FieldKind,
}

impl FieldDef {
    #[must_use]
    pub const fn new(id: FieldId, kind: FieldKind) -> Self {
        Self { id, kind }
    }
}
