//! Collaborator interfaces and drivers for the looper's peripherals.
//!
//! The real-time core only talks to hardware through the traits defined
//! here, so it can run against in-memory fakes on the host.
//!
//! ## Components
//!
//! | Item | Role |
//! |------|------|
//! | [`AnalogFrontEnd`] | 12-bit input sample / output emit, once per tick |
//! | [`PackedStorage`] | One packed 3-byte record (two samples) per call |
//! | [`BoundaryStore`] | Byte-addressable non-volatile store for slot boundaries |
//! | [`SampleClock`] | Re-programs the sample-rate timer |
//! | [`StorageBank`] | Chip A and chip B addressed by [`Chip`](crate::slot::Chip) |
//! | [`Sram23lc512`] | SPI SRAM implementing [`PackedStorage`] (feature `sram`) |
//! | [`Eeprom24x`] | I2C EEPROM implementing [`BoundaryStore`] (feature `eeprom`) |
//! | [`Mcp4921`] | SPI 12-bit DAC for the output half of the front end (feature `dac`) |
//! | [`MemoryStorage`] / [`MemoryBoundaryStore`] | RAM-backed fakes |
//!
//! ## Packed record layout
//!
//! Two 12-bit samples `a`, `b` share three bytes:
//!
//! ```text
//! byte 0: a[11:4]
//! byte 1: a[3:0] b[11:8]
//! byte 2: b[7:0]
//! ```

pub mod packing;
pub mod memory;
pub mod bank;

#[cfg(feature = "sram")]
pub mod sram;

#[cfg(feature = "eeprom")]
pub mod eeprom;

#[cfg(feature = "dac")]
pub mod dac;

pub use bank::StorageBank;
pub use memory::{MemoryBoundaryStore, MemoryStorage};

#[cfg(feature = "sram")]
pub use sram::Sram23lc512;

#[cfg(feature = "eeprom")]
pub use eeprom::Eeprom24x;

#[cfg(feature = "dac")]
pub use dac::Mcp4921;

/// Analog input and output of the pedal, both unsigned 12-bit.
pub trait AnalogFrontEnd {
    /// Convert and return one input sample (`0..=4095`).
    fn sample_input(&mut self) -> u16;

    /// Emit one output sample (`0..=4095`). Returns `false` if the
    /// converter did not take it.
    fn emit_output(&mut self, sample: u16) -> bool;
}

/// A storage device addressed in bytes that moves one packed record per call.
///
/// A packed record occupies the three bytes starting at `address`.
pub trait PackedStorage {
    /// Error type of the underlying bus.
    type Error;

    /// Write samples `a` and `b` as one packed record.
    fn write_packed(&mut self, address: u16, a: u16, b: u16) -> Result<(), Self::Error>;

    /// Read one packed record back as `(a, b)`.
    fn read_packed(&mut self, address: u16) -> Result<(u16, u16), Self::Error>;
}

/// Byte-addressable non-volatile store.
pub trait BoundaryStore {
    /// Error type of the underlying bus.
    type Error;

    fn read_byte(&mut self, offset: u16) -> Result<u8, Self::Error>;

    fn write_byte(&mut self, offset: u16, value: u8) -> Result<(), Self::Error>;
}

/// The hardware timer that paces the audio interrupt.
pub trait SampleClock {
    /// Re-program the interrupt frequency in Hz.
    fn set_sample_rate(&mut self, hz: u32);
}

#[cfg(test)]
mod integration_tests;
