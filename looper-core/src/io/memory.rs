//! RAM-backed implementations of the storage collaborators.
//!
//! Used for host-side simulation and tests; they behave like the real
//! devices, including the address wrap of the SRAM's sequential mode.

use core::convert::Infallible;

use super::packing::{pack, unpack, PACKED_BYTES};
use super::{BoundaryStore, PackedStorage};
use crate::constants::DEVICE_SPAN;

/// A 64 KiB packed sample store held in RAM.
pub struct MemoryStorage {
    bytes: [u8; DEVICE_SPAN as usize],
    writes: u32,
    reads: u32,
}

impl MemoryStorage {
    pub const fn new() -> Self {
        MemoryStorage {
            bytes: [0; DEVICE_SPAN as usize],
            writes: 0,
            reads: 0,
        }
    }

    /// Raw byte at `offset`.
    pub fn byte(&self, offset: u16) -> u8 {
        self.bytes[offset as usize]
    }

    /// Number of packed writes issued so far.
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    /// Number of packed reads issued so far.
    pub fn read_count(&self) -> u32 {
        self.reads
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl PackedStorage for MemoryStorage {
    type Error = Infallible;

    fn write_packed(&mut self, address: u16, a: u16, b: u16) -> Result<(), Self::Error> {
        for (i, byte) in pack(a, b).into_iter().enumerate() {
            self.bytes[address.wrapping_add(i as u16) as usize] = byte;
        }
        self.writes = self.writes.wrapping_add(1);
        Ok(())
    }

    fn read_packed(&mut self, address: u16) -> Result<(u16, u16), Self::Error> {
        let mut raw = [0u8; PACKED_BYTES];
        for (i, byte) in raw.iter_mut().enumerate() {
            *byte = self.bytes[address.wrapping_add(i as u16) as usize];
        }
        self.reads = self.reads.wrapping_add(1);
        Ok(unpack(raw))
    }
}

/// Non-volatile store fake. Starts erased (`0xFF`), like a fresh EEPROM.
pub struct MemoryBoundaryStore<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> MemoryBoundaryStore<N> {
    pub const fn new() -> Self {
        MemoryBoundaryStore { bytes: [0xFF; N] }
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> Default for MemoryBoundaryStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BoundaryStore for MemoryBoundaryStore<N> {
    type Error = Infallible;

    fn read_byte(&mut self, offset: u16) -> Result<u8, Self::Error> {
        Ok(self.bytes[offset as usize % N])
    }

    fn write_byte(&mut self, offset: u16, value: u8) -> Result<(), Self::Error> {
        self.bytes[offset as usize % N] = value;
        Ok(())
    }
}
