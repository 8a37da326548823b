//! Introspection and debugging tools for netvar encodings.
//!
//! - Encode and decode single varints, with their byte layout
//! - Decode a record against a JSON layout into structured output
//! - Print the fingerprint of a layout
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see what the encoder produced.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use bitstream::{BitRead, BitReader};
use codec::{read_value, FieldValue};
use schema::{FieldKind, Layout};
use serde::Serialize;

/// One decoded field with its position in the stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedField {
    pub id: u16,
    pub kind: FieldKind,
    pub value: FieldValue,
    pub bit_offset: usize,
    pub bit_len: usize,
}

/// Result of decoding one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeReport {
    pub layout_hash: u64,
    pub fields: Vec<DecodedField>,
    pub bits_used: usize,
    pub trailing_bits: usize,
}

/// Parses a layout from JSON and validates it.
pub fn parse_layout(json: &str) -> Result<Layout> {
    let layout: Layout = serde_json::from_str(json).context("parse layout json")?;
    layout.validate().context("layout validation failed")?;
    Ok(layout)
}

/// Parses hex text, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("invalid hex byte {:?}", &digits[i..i + 2]))
        })
        .collect()
}

#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Encodes `value` as a varint.
#[must_use]
pub fn varint_bytes(value: u64) -> Vec<u8> {
    let (bytes, len) = wire::encode_varint(value);
    bytes[..len].to_vec()
}

/// Decodes one varint from the start of `bytes`. Returns the value and the
/// number of bytes consumed.
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut reader = BitReader::new(bytes);
    let value = wire::read_varint(&mut reader).context("decode varint")?;
    Ok((value, reader.bit_position() / 8))
}

/// Decodes one record laid out by `layout` from the start of `bytes`.
pub fn decode_report(layout: &Layout, bytes: &[u8]) -> Result<DecodeReport> {
    let mut reader = BitReader::new(bytes);
    let mut fields = Vec::with_capacity(layout.len());
    for field in &layout.fields {
        let start = reader.bit_position();
        let value = read_value(field.kind, &mut reader)
            .with_context(|| format!("decode field {}", field.id))?;
        fields.push(DecodedField {
            id: field.id,
            kind: field.kind,
            value,
            bit_offset: start,
            bit_len: reader.bit_position() - start,
        });
    }
    log::debug!("decoded {} fields from {} bytes", fields.len(), bytes.len());
    Ok(DecodeReport {
        layout_hash: schema::layout_hash(layout),
        fields,
        bits_used: reader.bit_position(),
        trailing_bits: reader.bits_remaining(),
    })
}

/// Renders a report as an aligned text table.
#[must_use]
pub fn format_report(report: &DecodeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "layout_hash: 0x{:016x}", report.layout_hash);
    let _ = writeln!(
        out,
        "bits: {} used, {} trailing",
        report.bits_used, report.trailing_bits
    );
    for field in &report.fields {
        let _ = writeln!(
            out,
            "  field {:>5} {:<10} @{:<6} {:>5} bits  {}",
            field.id,
            field.kind.name(),
            field.bit_offset,
            field.bit_len,
            format_value(&field.value)
        );
    }
    out
}

fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Bool(v) => v.to_string(),
        FieldValue::U8(v) => v.to_string(),
        FieldValue::VarUInt(v) => v.to_string(),
        FieldValue::VarSInt(v) => v.to_string(),
        FieldValue::F32(v) => v.to_string(),
        FieldValue::F64(v) => v.to_string(),
        FieldValue::Str(v) => format!("{v:?}"),
        FieldValue::Bytes(v) => format!("[{}]", to_hex(v)),
        FieldValue::List(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(", "))
        }
    }
}
