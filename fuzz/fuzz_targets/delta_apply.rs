#![no_main]

use std::collections::{BTreeMap, BTreeSet};

use codec::{apply_delta, decode_record};
use libfuzzer_sys::fuzz_target;
use schema::{ElemKind, FieldKind, Layout};

fuzz_target!(|data: &[u8]| {
    let mut list: Vec<u32> = (0..16).collect();
    let before = list.clone();
    if apply_delta(&mut list, data).is_err() {
        assert_eq!(list, before);
    }

    let mut array = [0i16; 8];
    let _ = apply_delta(&mut array, data);

    let mut set: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
    let _ = apply_delta(&mut set, data);

    let mut map: BTreeMap<u8, Vec<bool>> = BTreeMap::new();
    let _ = apply_delta(&mut map, data);

    if let Ok(layout) = Layout::builder()
        .field(1, FieldKind::VarSInt)
        .field(2, FieldKind::ranged_f32(-1.0, 1.0, 2))
        .field(3, FieldKind::list(ElemKind::Str))
        .field(4, FieldKind::Bytes)
        .build()
    {
        let _ = decode_record(&layout, data);
    }
});
