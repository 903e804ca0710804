//! Potentiometer readings to engineering units.
//!
//! The six pots are read as raw 12-bit ADC codes and mapped once per
//! control tick. The rate pot is exponential so each quarter of its travel
//! covers one octave; the others are linear or stepped.

use crate::constants::{FULL_RESOLUTION, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, SAMPLE_MAX};

/// Grain window range in packed transactions.
pub const MIN_GRAIN_SIZE: u16 = 16;
pub const MAX_GRAIN_SIZE: u16 = 1024;

/// Largest grain stretch factor.
pub const MAX_STRETCH: u8 = 8;

/// Linear map of `raw` in `0..=raw_max` onto `lo..=hi`, rounded.
pub fn map_linear(raw: u16, raw_max: u16, lo: u32, hi: u32) -> u32 {
    if raw_max == 0 || hi <= lo {
        return lo;
    }
    let raw = raw.min(raw_max) as u32;
    let raw_max = raw_max as u32;
    lo + (raw * (hi - lo) + raw_max / 2) / raw_max
}

/// Quantize `raw` in `0..=raw_max` into one of `steps` equal bands.
pub fn map_stepped(raw: u16, raw_max: u16, steps: u32) -> u32 {
    if steps == 0 {
        return 0;
    }
    let raw = raw.min(raw_max) as u32;
    (raw * steps / (raw_max as u32 + 1)).min(steps - 1)
}

/// Exponential map of `raw` onto `lo..=hi`.
fn map_exponential(raw: u16, raw_max: u16, lo: u32, hi: u32) -> u32 {
    if raw_max == 0 || hi <= lo {
        return lo;
    }
    let x = raw.min(raw_max) as f32 / raw_max as f32;
    let ratio = hi as f32 / lo as f32;
    let value = lo as f32 * libm::powf(ratio, x) + 0.5;
    (value as u32).clamp(lo, hi)
}

/// Raw pot codes in panel order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PotReadings {
    pub rate: u16,
    pub resolution: u16,
    pub low_cutoff: u16,
    pub high_cutoff: u16,
    pub grain_size: u16,
    pub stretch: u16,
}

impl PotReadings {
    pub const fn from_array(raw: [u16; 6]) -> Self {
        PotReadings {
            rate: raw[0],
            resolution: raw[1],
            low_cutoff: raw[2],
            high_cutoff: raw[3],
            grain_size: raw[4],
            stretch: raw[5],
        }
    }
}

/// Control-rate parameters in engineering units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParamInputs {
    /// Passthrough and recording rate, or playback rate relative to the
    /// slot's recording rate.
    pub rate_hz: u32,
    pub resolution_bits: u8,
    /// Low-pass stage cutoff (Q8).
    pub low_cutoff: u8,
    /// High-pass stage cutoff (Q8).
    pub high_cutoff: u8,
    /// Grain window in packed transactions.
    pub grain_size: u16,
    pub stretch: u8,
}

impl ParamInputs {
    pub fn from_pots(pots: &PotReadings) -> Self {
        let max = SAMPLE_MAX;
        ParamInputs {
            rate_hz: map_exponential(pots.rate, max, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE),
            resolution_bits: map_stepped(pots.resolution, max, FULL_RESOLUTION as u32) as u8 + 1,
            low_cutoff: map_linear(pots.low_cutoff, max, 0, 255) as u8,
            high_cutoff: map_linear(pots.high_cutoff, max, 0, 255) as u8,
            grain_size: map_linear(
                pots.grain_size,
                max,
                MIN_GRAIN_SIZE as u32,
                MAX_GRAIN_SIZE as u32,
            ) as u16,
            stretch: map_stepped(pots.stretch, max, MAX_STRETCH as u32) as u8 + 1,
        }
    }
}

impl Default for ParamInputs {
    /// Nominal rate, full resolution, filters open, shortest unstretched grain.
    fn default() -> Self {
        ParamInputs {
            rate_hz: crate::constants::NOMINAL_SAMPLE_RATE,
            resolution_bits: FULL_RESOLUTION,
            low_cutoff: 255,
            high_cutoff: 0,
            grain_size: MIN_GRAIN_SIZE,
            stretch: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_hits_endpoints() {
        assert_eq!(map_linear(0, 4095, 16, 1024), 16);
        assert_eq!(map_linear(4095, 4095, 16, 1024), 1024);
        assert_eq!(map_linear(5000, 4095, 0, 255), 255);
        assert_eq!(map_linear(10, 0, 7, 9), 7);
    }

    #[test]
    fn stepped_bands_are_even() {
        assert_eq!(map_stepped(0, 4095, 12), 0);
        assert_eq!(map_stepped(341, 4095, 12), 0);
        assert_eq!(map_stepped(342, 4095, 12), 1);
        assert_eq!(map_stepped(4095, 4095, 12), 11);
        assert_eq!(map_stepped(100, 4095, 0), 0);
    }

    #[test]
    fn rate_is_exponential_across_range() {
        let at = |raw| ParamInputs::from_pots(&PotReadings { rate: raw, ..Default::default() }).rate_hz;
        assert_eq!(at(0), MIN_SAMPLE_RATE);
        assert_eq!(at(4095), MAX_SAMPLE_RATE);
        let mid = at(2048);
        assert!((7_900..=8_100).contains(&mid), "mid = {}", mid);
    }

    #[test]
    fn pots_map_into_valid_ranges() {
        for raw in (0..=4095u16).step_by(97) {
            let p = ParamInputs::from_pots(&PotReadings::from_array([raw; 6]));
            assert!((MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&p.rate_hz));
            assert!((1..=12).contains(&p.resolution_bits));
            assert!((MIN_GRAIN_SIZE..=MAX_GRAIN_SIZE).contains(&p.grain_size));
            assert!((1..=MAX_STRETCH).contains(&p.stretch));
        }
    }

    #[test]
    fn resolution_is_monotonic() {
        let mut last = 0;
        for raw in 0..=4095u16 {
            let bits = ParamInputs::from_pots(&PotReadings { resolution: raw, ..Default::default() })
                .resolution_bits;
            assert!(bits >= last);
            last = bits;
        }
        assert_eq!(last, 12);
    }
}
