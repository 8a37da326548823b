//! Deterministic layout hashing.

use blake3::Hasher;

use crate::{ElemKind, FieldKind, Layout};

/// Computes a deterministic hash peers compare before exchanging records.
#[must_use]
pub fn layout_hash(layout: &Layout) -> u64 {
    let mut hasher = Hasher::new();
    write_u32(&mut hasher, layout.fields.len() as u32);

    for field in &layout.fields {
        write_u16(&mut hasher, field.id);
        write_kind(&mut hasher, field.kind);
    }

    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

fn write_kind(hasher: &mut Hasher, kind: FieldKind) {
    match kind {
        FieldKind::Bool => write_u8(hasher, 0),
        FieldKind::U8 => write_u8(hasher, 1),
        FieldKind::VarUInt => write_u8(hasher, 2),
        FieldKind::VarSInt => write_u8(hasher, 3),
        FieldKind::F32 => write_u8(hasher, 4),
        FieldKind::F64 => write_u8(hasher, 5),
        FieldKind::F32Fixed => write_u8(hasher, 6),
        FieldKind::F64Fixed => write_u8(hasher, 7),
        FieldKind::RangedF32 { min, max, bytes } => {
            write_u8(hasher, 8);
            hasher.update(&min.to_bits().to_le_bytes());
            hasher.update(&max.to_bits().to_le_bytes());
            write_u8(hasher, bytes);
        }
        FieldKind::RangedF64 { min, max, bytes } => {
            write_u8(hasher, 9);
            hasher.update(&min.to_bits().to_le_bytes());
            hasher.update(&max.to_bits().to_le_bytes());
            write_u8(hasher, bytes);
        }
        FieldKind::Str => write_u8(hasher, 10),
        FieldKind::Bytes => write_u8(hasher, 11),
        FieldKind::List(elem) => {
            write_u8(hasher, 12);
            write_elem(hasher, elem);
        }
    }
}

fn write_elem(hasher: &mut Hasher, elem: ElemKind) {
    let tag = match elem {
        ElemKind::Bool => 0,
        ElemKind::U8 => 1,
        ElemKind::VarUInt => 2,
        ElemKind::VarSInt => 3,
        ElemKind::F32 => 4,
        ElemKind::F64 => 5,
        ElemKind::Str => 6,
    };
    write_u8(hasher, tag);
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u16(hasher: &mut Hasher, value: u16) {
    hasher.update(&value.to_le_bytes());
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Layout {
        Layout::builder()
            .field(1, FieldKind::Bool)
            .field(2, FieldKind::VarSInt)
            .field(3, FieldKind::ranged_f32(-500.0, 500.0, 2))
            .field(4, FieldKind::list(ElemKind::Str))
            .build()
            .unwrap()
    }

    #[test]
    fn layout_hash_is_stable() {
        assert_eq!(layout_hash(&sample()), layout_hash(&sample()));
    }

    #[test]
    fn layout_hash_changes_with_field_order() {
        let a = Layout::builder()
            .field(1, FieldKind::Bool)
            .field(2, FieldKind::U8)
            .build()
            .unwrap();
        let b = Layout::builder()
            .field(2, FieldKind::U8)
            .field(1, FieldKind::Bool)
            .build()
            .unwrap();
        assert_ne!(layout_hash(&a), layout_hash(&b));
    }

    #[test]
    fn layout_hash_changes_with_range_parameters() {
        let a = Layout::builder()
            .field(1, FieldKind::ranged_f32(0.0, 1.0, 2))
            .build()
            .unwrap();
        let b = Layout::builder()
            .field(1, FieldKind::ranged_f32(0.0, 1.0, 3))
            .build()
            .unwrap();
        let c = Layout::builder()
            .field(1, FieldKind::ranged_f32(0.0, 2.0, 2))
            .build()
            .unwrap();
        assert_ne!(layout_hash(&a), layout_hash(&b));
        assert_ne!(layout_hash(&a), layout_hash(&c));
    }

    #[test]
    fn layout_hash_distinguishes_list_elements() {
        let a = Layout::builder()
            .field(1, FieldKind::list(ElemKind::U8))
            .build()
            .unwrap();
        let b = Layout::builder().field(1, FieldKind::Bytes).build().unwrap();
        assert_ne!(layout_hash(&a), layout_hash(&b));
    }
}
