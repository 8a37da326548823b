#![no_main]

use bitstream::{BitRead, BitReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitReader::new(data);
    let mut idx = 0usize;

    // Input bytes pick a bounded sequence of reads.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 6;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_bit();
            }
            1 => {
                let bits = (data[idx - 1] % 64).saturating_add(1);
                let _ = reader.read_bits(bits);
            }
            2 => {
                let _ = reader.skip_pad_bits();
            }
            3 => {
                let _ = wire::read_varint(&mut reader);
            }
            4 => {
                let _ = wire::read_varint_signed(&mut reader);
            }
            _ => {
                let _ = wire::read_string(&mut reader);
            }
        }
    }
});
