//! Layout-driven record encoding over a closed set of value shapes.

use bitstream::{BitBuffer, BitCounter, BitRead, BitReader, BitWrite};
use schema::{FieldKind, Layout};
use wire::{
    read_byte_array, read_f32_fixed, read_f32_packed, read_f64_fixed, read_f64_packed, read_len,
    read_ranged_f32, read_ranged_f64, read_string, read_varint, read_varint_signed,
    write_byte_array, write_f32_fixed, write_f32_packed, write_f64_fixed, write_f64_packed,
    write_len, write_ranged_f32, write_ranged_f64, write_str, write_varint, write_varint_signed,
};

use crate::error::{CodecError, CodecResult};

/// A single field value. Each variant serves one or more [`FieldKind`]s.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldValue {
    Bool(bool),
    U8(u8),
    VarUInt(u64),
    VarSInt(i64),
    /// Serves `F32`, `F32Fixed` and `RangedF32`.
    F32(f32),
    /// Serves `F64`, `F64Fixed` and `RangedF64`.
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Short human-readable name of the variant.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::VarUInt(_) => "var_uint",
            Self::VarSInt(_) => "var_sint",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
        }
    }
}

/// Writes `value` with the encoding `kind` prescribes.
pub fn write_value(kind: FieldKind, value: &FieldValue, w: &mut dyn BitWrite) -> CodecResult<()> {
    match (kind, value) {
        (FieldKind::Bool, FieldValue::Bool(v)) => w.write_bit(*v)?,
        (FieldKind::U8, FieldValue::U8(v)) => w.write_byte(*v)?,
        (FieldKind::VarUInt, FieldValue::VarUInt(v)) => write_varint(w, *v)?,
        (FieldKind::VarSInt, FieldValue::VarSInt(v)) => write_varint_signed(w, *v)?,
        (FieldKind::F32, FieldValue::F32(v)) => write_f32_packed(w, *v)?,
        (FieldKind::F64, FieldValue::F64(v)) => write_f64_packed(w, *v)?,
        (FieldKind::F32Fixed, FieldValue::F32(v)) => write_f32_fixed(w, *v)?,
        (FieldKind::F64Fixed, FieldValue::F64(v)) => write_f64_fixed(w, *v)?,
        (FieldKind::RangedF32 { min, max, bytes }, FieldValue::F32(v)) => {
            write_ranged_f32(w, *v, min, max, bytes)?;
        }
        (FieldKind::RangedF64 { min, max, bytes }, FieldValue::F64(v)) => {
            write_ranged_f64(w, *v, min, max, bytes)?;
        }
        (FieldKind::Str, FieldValue::Str(v)) => write_str(w, v)?,
        (FieldKind::Bytes, FieldValue::Bytes(v)) => write_byte_array(w, v)?,
        (FieldKind::List(elem), FieldValue::List(items)) => {
            let elem_kind = FieldKind::from(elem);
            // Check every element before writing the length.
            if let Some(bad) = items.iter().find(|item| !fits(elem_kind, item)) {
                return Err(mismatch(elem_kind, bad));
            }
            write_len(w, items.len())?;
            for item in items {
                write_value(elem_kind, item, w)?;
            }
        }
        (kind, value) => return Err(mismatch(kind, value)),
    }
    Ok(())
}

/// Reads a value encoded with `kind`.
pub fn read_value(kind: FieldKind, r: &mut dyn BitRead) -> CodecResult<FieldValue> {
    let value = match kind {
        FieldKind::Bool => FieldValue::Bool(r.read_bit()?),
        FieldKind::U8 => FieldValue::U8(r.read_byte()?),
        FieldKind::VarUInt => FieldValue::VarUInt(read_varint(r)?),
        FieldKind::VarSInt => FieldValue::VarSInt(read_varint_signed(r)?),
        FieldKind::F32 => FieldValue::F32(read_f32_packed(r)?),
        FieldKind::F64 => FieldValue::F64(read_f64_packed(r)?),
        FieldKind::F32Fixed => FieldValue::F32(read_f32_fixed(r)?),
        FieldKind::F64Fixed => FieldValue::F64(read_f64_fixed(r)?),
        FieldKind::RangedF32 { min, max, bytes } => {
            FieldValue::F32(read_ranged_f32(r, min, max, bytes)?)
        }
        FieldKind::RangedF64 { min, max, bytes } => {
            FieldValue::F64(read_ranged_f64(r, min, max, bytes)?)
        }
        FieldKind::Str => FieldValue::Str(read_string(r)?),
        FieldKind::Bytes => FieldValue::Bytes(read_byte_array(r)?),
        FieldKind::List(elem) => {
            let elem_kind = FieldKind::from(elem);
            let len = read_len(r)?;
            let items = (0..len)
                .map(|_| read_value(elem_kind, r))
                .collect::<CodecResult<Vec<_>>>()?;
            FieldValue::List(items)
        }
    };
    Ok(value)
}

/// Writes one value per layout field, in layout order.
///
/// Every field is checked and the record sized before the first bit is
/// written, so a failing record leaves `w` untouched.
pub fn write_record(
    layout: &Layout,
    values: &[FieldValue],
    w: &mut dyn BitWrite,
) -> CodecResult<()> {
    if values.len() != layout.len() {
        return Err(CodecError::FieldCountMismatch {
            expected: layout.len(),
            found: values.len(),
        });
    }
    let mut counter = BitCounter::new();
    write_fields(layout, values, &mut counter)?;
    w.reserve_bits(counter.bits())?;
    write_fields(layout, values, w)
}

fn write_fields(layout: &Layout, values: &[FieldValue], w: &mut dyn BitWrite) -> CodecResult<()> {
    for (field, value) in layout.fields.iter().zip(values) {
        write_value(field.kind, value, w).map_err(|err| err.in_field(field.id))?;
    }
    Ok(())
}

/// Reads one value per layout field, in layout order.
pub fn read_record(layout: &Layout, r: &mut dyn BitRead) -> CodecResult<Vec<FieldValue>> {
    layout
        .fields
        .iter()
        .map(|field| read_value(field.kind, r).map_err(|err| err.in_field(field.id)))
        .collect()
}

/// Encodes a record into a fresh byte vector.
pub fn encode_record(layout: &Layout, values: &[FieldValue]) -> CodecResult<Vec<u8>> {
    let mut buffer = BitBuffer::new();
    write_record(layout, values, &mut buffer)?;
    Ok(buffer.into_bytes())
}

/// Decodes a record from the start of `bytes`.
pub fn decode_record(layout: &Layout, bytes: &[u8]) -> CodecResult<Vec<FieldValue>> {
    read_record(layout, &mut BitReader::new(bytes))
}

fn fits(kind: FieldKind, value: &FieldValue) -> bool {
    matches!(
        (kind, value),
        (FieldKind::Bool, FieldValue::Bool(_))
            | (FieldKind::U8, FieldValue::U8(_))
            | (FieldKind::VarUInt, FieldValue::VarUInt(_))
            | (FieldKind::VarSInt, FieldValue::VarSInt(_))
            | (FieldKind::F32, FieldValue::F32(_))
            | (FieldKind::F64, FieldValue::F64(_))
            | (FieldKind::Str, FieldValue::Str(_))
    )
}

fn mismatch(kind: FieldKind, value: &FieldValue) -> CodecError {
    CodecError::TypeMismatch {
        expected: kind.name(),
        found: value.name(),
    }
}
