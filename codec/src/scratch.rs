//! Reusable scratch storage for delta encoding.

use bitvec::prelude::{BitVec, Lsb0};

/// Change mask storage reused across sequence delta encodes.
///
/// Holding one of these per replicated value keeps steady-state sequence
/// encoding free of per-message mask allocations.
#[derive(Debug, Default, Clone)]
pub struct DeltaScratch {
    mask: BitVec<u8, Lsb0>,
}

impl DeltaScratch {
    /// Creates a new scratch buffer with no pre-allocated capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mask bits that fit without reallocating.
    #[must_use]
    pub fn mask_capacity(&self) -> usize {
        self.mask.capacity()
    }

    /// Lends out a cleared mask of `len` bits.
    ///
    /// Nested encodes that run while the mask is lent see an empty scratch.
    pub(crate) fn take_mask(&mut self, len: usize) -> BitVec<u8, Lsb0> {
        let mut mask = std::mem::take(&mut self.mask);
        mask.clear();
        mask.resize(len, false);
        mask
    }

    pub(crate) fn restore_mask(&mut self, mask: BitVec<u8, Lsb0>) {
        if mask.capacity() >= self.mask.capacity() {
            self.mask = mask;
        }
    }
}
