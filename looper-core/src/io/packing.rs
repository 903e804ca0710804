//! Two 12-bit samples per three bytes.

use crate::constants::SAMPLE_MAX;

/// Bytes per packed record.
pub const PACKED_BYTES: usize = 3;

/// Pack two 12-bit samples. Bits above bit 11 are discarded.
#[inline(always)]
pub fn pack(a: u16, b: u16) -> [u8; PACKED_BYTES] {
    let a = a & SAMPLE_MAX;
    let b = b & SAMPLE_MAX;
    [
        (a >> 4) as u8,
        (((a & 0x000F) << 4) | (b >> 8)) as u8,
        b as u8,
    ]
}

/// Unpack a record produced by [`pack`].
#[inline(always)]
pub fn unpack(bytes: [u8; PACKED_BYTES]) -> (u16, u16) {
    let a = ((bytes[0] as u16) << 4) | ((bytes[1] as u16) >> 4);
    let b = (((bytes[1] as u16) & 0x000F) << 8) | bytes[2] as u16;
    (a, b)
}
