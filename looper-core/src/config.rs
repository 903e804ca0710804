//! Control-rate policy knobs.
//!
//! Hardware-fixed values live in [`constants`](crate::constants); this struct
//! holds the timing and threshold choices a build may want to tune.

use crate::dsp::svf::DEFAULT_RESONANCE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LooperConfig {
    /// Minimum gap between the end of one recording and the start of the next.
    pub debounce_ms: u32,
    /// Minimum recording length before a select release is honoured.
    pub min_record_ms: u32,
    /// Free bytes a slot needs before a recording may start.
    pub min_free_space: i32,
    /// Filter resonance (Q8) shared by both stages.
    pub resonance: u8,
    /// Raw button debounce window.
    pub button_debounce_ms: u32,
    /// Hold time separating a latching tap from a momentary hold.
    pub hold_ms: u32,
}

impl LooperConfig {
    pub const fn new() -> Self {
        LooperConfig {
            debounce_ms: 20,
            min_record_ms: 20,
            min_free_space: 384,
            resonance: DEFAULT_RESONANCE,
            button_debounce_ms: 5,
            hold_ms: 400,
        }
    }
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self::new()
    }
}
