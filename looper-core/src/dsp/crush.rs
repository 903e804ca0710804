//! Bit-depth reduction.

use crate::constants::{FULL_RESOLUTION, SAMPLE_MAX};

/// Mask keeping the top `bits` bits of a 12-bit code.
///
/// `bits` is clamped to `1..=12`.
#[inline]
pub const fn resolution_mask(bits: u8) -> u16 {
    let bits = if bits < 1 {
        1
    } else if bits > FULL_RESOLUTION {
        FULL_RESOLUTION
    } else {
        bits
    };
    let discarded = FULL_RESOLUTION - bits;
    SAMPLE_MAX & !((1u16 << discarded) - 1)
}

/// Apply a resolution mask to an output code.
#[inline(always)]
pub fn crush(code: u16, mask: u16) -> u16 {
    code & mask
}
