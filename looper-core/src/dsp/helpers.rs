//! Conversions between converter codes and the signed mixing domain.

use super::intrinsics::{ssat, usat};
use crate::constants::MIDSCALE;

/// Unsigned 12-bit converter code to signed, centred on zero.
#[inline(always)]
pub fn to_signed(code: u16) -> i32 {
    code as i32 - MIDSCALE as i32
}

/// Signed value back to a converter code, saturating at both rails.
#[inline(always)]
pub fn to_code(value: i32) -> u16 {
    usat::<12>(value + MIDSCALE as i32) as u16
}

/// Clamp a mix to the signed 12-bit range `-2048..=2047`.
#[inline(always)]
pub fn clamp_mix(mix: i32) -> i32 {
    ssat::<12>(mix)
}
