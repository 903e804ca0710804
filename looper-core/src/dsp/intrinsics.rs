//! Saturating clamps backed by the Cortex-M `SSAT`/`USAT` instructions.
//!
//! With the DSP extension (Teensy 4.x) each clamp is one instruction; the
//! host build uses plain comparisons so tests see identical results.

/// Clamp to a signed `BITS`-bit range (`SSAT`).
#[inline(always)]
pub fn ssat<const BITS: u32>(val: i32) -> i32 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        // SAFETY: register-only instruction, no memory access.
        unsafe {
            core::arch::asm!("ssat {0}, #{1}, {2}", out(reg) out, const BITS, in(reg) val);
        }
        out
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        let limit = 1i32 << (BITS - 1);
        val.clamp(-limit, limit - 1)
    }
}

/// Clamp to the unsigned range `0..2^BITS` (`USAT`).
#[inline(always)]
pub fn usat<const BITS: u32>(val: i32) -> u32 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: u32;
        // SAFETY: register-only instruction, no memory access.
        unsafe {
            core::arch::asm!("usat {0}, #{1}, {2}", out(reg) out, const BITS, in(reg) val);
        }
        out
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        val.clamp(0, (1i32 << BITS) - 1) as u32
    }
}

/// Filter accumulators are held to 16 bits.
#[inline(always)]
pub fn saturate16(val: i32) -> i32 {
    ssat::<16>(val)
}
