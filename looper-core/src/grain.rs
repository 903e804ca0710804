//! Grain-delay and buffer-freeze sub-looping.
//!
//! Both modifiers replay a window of `samples_per_grain` consecutive packed
//! records starting at the grain cursor's address. When the window is used
//! up the cursor moves on:
//!
//! - grain-delay: the start advances by the grain window along the
//!   playback step and wraps inside the recorded region;
//! - freeze: the start returns to the anchor captured when freeze was armed.
//!
//! With `stretch > 1` the replayed window is longer than the distance the
//! start advances, so consecutive grains overlap and the slot is traversed
//! more slowly than it plays.

use crate::mode::Modifier;
use crate::slot::{Bounds, Chip};

/// Packed transactions per grain.
///
/// `stretch * grain_size * playback_hz / record_hz`, at least 1.
pub fn samples_per_grain(grain_size: u16, stretch: u8, playback_hz: u32, record_hz: u32) -> u32 {
    let record_hz = record_hz.max(1) as u64;
    let n = stretch as u64 * grain_size as u64 * playback_hz as u64 / record_hz;
    n.clamp(1, u32::MAX as u64) as u32
}

/// Sub-loop position, independent of the main playback cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrainCursor {
    pub address: i32,
    pub chip: Chip,
    /// Packed transactions played in the current grain.
    pub samples_played: u32,
}

impl GrainCursor {
    pub const fn new() -> Self {
        GrainCursor {
            address: 0,
            chip: Chip::A,
            samples_played: 0,
        }
    }

    /// Place the grain at `address` and restart its counter.
    pub fn seed(&mut self, address: i32, chip: Chip) {
        self.address = address;
        self.chip = chip;
        self.samples_played = 0;
    }

    /// Record to read for the current transaction of the grain.
    #[inline]
    pub fn read_address(&self, bounds: &Bounds) -> i32 {
        bounds.wrap(self.address + self.samples_played as i32 * bounds.step)
    }

    /// Count one transaction; move the grain start when the window is used up.
    ///
    /// Returns `true` when a new grain begins.
    #[inline]
    pub fn complete_transaction(
        &mut self,
        bounds: &Bounds,
        modifier: Modifier,
        samples_per_grain: u32,
        window: u32,
    ) -> bool {
        self.samples_played += 1;
        if self.samples_played < samples_per_grain {
            return false;
        }
        self.samples_played = 0;
        self.address = match modifier {
            Modifier::Freeze { anchor } => anchor,
            _ => bounds.wrap(self.address + window as i32 * bounds.step.signum()),
        };
        true
    }
}

impl Default for GrainCursor {
    fn default() -> Self {
        Self::new()
    }
}
