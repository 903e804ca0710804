//! The two sample devices, addressed by [`Chip`].

use super::PackedStorage;
use crate::slot::Chip;

/// Chip A and chip B behind one interface.
///
/// The devices may be different types (e.g. two SPI devices with distinct
/// chip-select pins). Bus errors are reported as `None`/`false` so the
/// audio interrupt can count them without being generic over two error
/// types.
pub struct StorageBank<A, B> {
    a: A,
    b: B,
}

impl<A: PackedStorage, B: PackedStorage> StorageBank<A, B> {
    pub const fn new(a: A, b: B) -> Self {
        StorageBank { a, b }
    }

    /// Write one packed record. Returns `false` on a bus error.
    #[inline]
    pub fn write_packed(&mut self, chip: Chip, address: u16, first: u16, second: u16) -> bool {
        match chip {
            Chip::A => self.a.write_packed(address, first, second).is_ok(),
            Chip::B => self.b.write_packed(address, first, second).is_ok(),
        }
    }

    /// Read one packed record, or `None` on a bus error.
    #[inline]
    pub fn read_packed(&mut self, chip: Chip, address: u16) -> Option<(u16, u16)> {
        match chip {
            Chip::A => self.a.read_packed(address).ok(),
            Chip::B => self.b.read_packed(address).ok(),
        }
    }

    pub fn devices(&self) -> (&A, &B) {
        (&self.a, &self.b)
    }

    pub fn devices_mut(&mut self) -> (&mut A, &mut B) {
        (&mut self.a, &mut self.b)
    }
}
