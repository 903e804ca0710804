//! Two-pole resonant state-variable filter in Q8 fixed point.
//!
//! Per sample:
//!
//! ```text
//! high  = in - buf0
//! band  = buf0 - buf1
//! buf0 += cutoff * (high + feedback * band)
//! buf1 += cutoff * (buf0 - buf1)
//! low   = buf1
//! ```
//!
//! with every product shifted right by 8.

use super::intrinsics::saturate16;

/// Resonance used when none is configured (Q8).
pub const DEFAULT_RESONANCE: u8 = 180;

/// Cutoff and feedback for one stage, both Q8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coefficients {
    pub cutoff: i32,
    pub feedback: i32,
}

impl Coefficients {
    /// Derive the feedback term from the cutoff and a fixed resonance.
    ///
    /// `feedback = q + q * (255 - cutoff) / 256`, so the resonance peak
    /// stays put as the cutoff moves.
    pub const fn new(cutoff: u8, resonance: u8) -> Self {
        let q = resonance as i32;
        Coefficients {
            cutoff: cutoff as i32,
            feedback: q + ((q * (255 - cutoff as i32)) >> 8),
        }
    }

    /// Fully open low-pass.
    pub const OPEN: Coefficients = Coefficients::new(255, DEFAULT_RESONANCE);

    /// High-pass that passes everything.
    pub const CLOSED: Coefficients = Coefficients::new(0, DEFAULT_RESONANCE);
}

/// Stage outputs for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outputs {
    pub low: i32,
    pub high: i32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StateVariableFilter {
    buf0: i32,
    buf1: i32,
}

impl StateVariableFilter {
    pub const fn new() -> Self {
        StateVariableFilter { buf0: 0, buf1: 0 }
    }

    #[inline]
    pub fn process(&mut self, input: i32, c: Coefficients) -> Outputs {
        let high = input - self.buf0;
        let band = self.buf0 - self.buf1;
        let feedback = (c.feedback * band) >> 8;
        // Accumulators are kept to 16 bits so high resonance cannot run away.
        self.buf0 = saturate16(self.buf0 + ((c.cutoff * (high + feedback)) >> 8));
        self.buf1 = saturate16(self.buf1 + ((c.cutoff * (self.buf0 - self.buf1)) >> 8));
        Outputs { low: self.buf1, high }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(filter: &mut StateVariableFilter, input: i32, c: Coefficients, n: usize) -> Outputs {
        let mut out = filter.process(input, c);
        for _ in 1..n {
            out = filter.process(input, c);
        }
        out
    }

    #[test]
    fn feedback_grows_as_cutoff_falls() {
        let open = Coefficients::new(255, 200);
        let low = Coefficients::new(10, 200);
        assert_eq!(open.feedback, 200);
        assert!(low.feedback > open.feedback);
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut f = StateVariableFilter::new();
        let out = settle(&mut f, 1000, Coefficients::new(128, DEFAULT_RESONANCE), 2000);
        assert!((out.low - 1000).abs() <= 4, "low = {}", out.low);
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut f = StateVariableFilter::new();
        let out = settle(&mut f, 1000, Coefficients::new(128, DEFAULT_RESONANCE), 2000);
        assert!(out.high.abs() <= 4, "high = {}", out.high);
    }

    #[test]
    fn closed_stage_is_transparent_on_high_output() {
        let mut f = StateVariableFilter::new();
        for &x in &[0, 500, -2048, 2047, 13] {
            assert_eq!(f.process(x, Coefficients::CLOSED).high, x);
        }
    }

    #[test]
    fn lowpass_attenuates_nyquist() {
        let mut f = StateVariableFilter::new();
        let c = Coefficients::new(20, DEFAULT_RESONANCE);
        let mut peak = 0;
        for i in 0..4000 {
            let x = if i % 2 == 0 { 2000 } else { -2000 };
            let out = f.process(x, c);
            if i > 2000 {
                peak = peak.max(out.low.abs());
            }
        }
        assert!(peak < 400, "peak = {}", peak);
    }
}
