//! The fixed output chain: low-pass, high-pass, re-centre, bit-crush.
//!
//! ```text
//! mix ──► SVF (low) ──► SVF (high) ──► +2048 ──► & mask ──► code
//!  │                                     ▲
//!  └──────────── bypass ─────────────────┘   (no mask)
//! ```

use super::crush::{crush, resolution_mask};
use super::helpers::to_code;
use super::svf::{Coefficients, StateVariableFilter};

/// One tick's view of the control-rate filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSettings {
    pub bypass: bool,
    pub low_pass: Coefficients,
    pub high_pass: Coefficients,
    pub mask: u16,
}

impl ChainSettings {
    /// Open filters, full resolution.
    pub const fn transparent() -> Self {
        ChainSettings {
            bypass: false,
            low_pass: Coefficients::OPEN,
            high_pass: Coefficients::CLOSED,
            mask: resolution_mask(12),
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self::transparent()
    }
}

/// Filter state owned by the audio interrupt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterChain {
    low: StateVariableFilter,
    high: StateVariableFilter,
}

impl FilterChain {
    pub const fn new() -> Self {
        FilterChain {
            low: StateVariableFilter::new(),
            high: StateVariableFilter::new(),
        }
    }

    /// Filter one signed mix and return the output code.
    #[inline]
    pub fn process(&mut self, mix: i32, settings: &ChainSettings) -> u16 {
        if settings.bypass {
            return to_code(mix);
        }
        let low = self.low.process(mix, settings.low_pass).low;
        let high = self.high.process(low, settings.high_pass).high;
        crush(to_code(high), settings.mask)
    }
}
