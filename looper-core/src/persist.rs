//! Slot boundaries in non-volatile storage.
//!
//! Each slot owns three bytes holding its end address big-endian:
//!
//! ```text
//! offset  0..3   slot 0
//! offset  3..6   slot 1
//! offset  6..9   slot 2
//! offset  9..12  slot 3
//! ```
//!
//! An erased record (`0xFFFFFF`), a record equal to the slot's origin, or
//! one that is not a stride-aligned address inside the device loads as
//! "not recorded".

use crate::constants::{BOUNDARY_BYTES, DEVICE_SPAN, ERASED_BOUNDARY, PACKED_STRIDE, SLOT_COUNT};
use crate::io::BoundaryStore;
use crate::slot::{Orientation, SlotId};

/// Byte offset of a slot's record.
#[inline(always)]
pub const fn boundary_offset(slot: SlotId) -> u16 {
    slot.index() as u16 * BOUNDARY_BYTES
}

/// Interpret a stored 24-bit value for `slot`.
pub fn decode_boundary(slot: SlotId, raw: u32) -> Option<i32> {
    if raw == ERASED_BOUNDARY {
        return None;
    }
    let end = raw as i32;
    let orientation = slot.orientation();
    let origin = orientation.origin();
    if end == origin || end >= DEVICE_SPAN {
        return None;
    }
    let aligned = match orientation {
        Orientation::Ascending => end % PACKED_STRIDE == 0,
        Orientation::Descending => (origin - end) % PACKED_STRIDE == 0,
    };
    aligned.then_some(end)
}

fn read_raw<B: BoundaryStore>(store: &mut B, slot: SlotId) -> Result<u32, B::Error> {
    let base = boundary_offset(slot);
    let mut raw = 0u32;
    for i in 0..BOUNDARY_BYTES {
        raw = (raw << 8) | store.read_byte(base + i)? as u32;
    }
    Ok(raw)
}

/// Read all four boundaries.
pub fn load_boundaries<B: BoundaryStore>(store: &mut B) -> Result<[Option<i32>; SLOT_COUNT], B::Error> {
    let mut out = [None; SLOT_COUNT];
    for slot in SlotId::ALL {
        let raw = read_raw(store, slot)?;
        out[slot.index()] = decode_boundary(slot, raw);
        if out[slot.index()].is_none() && raw != ERASED_BOUNDARY {
            debug!("slot {} boundary {:x} ignored", slot.index(), raw);
        }
    }
    Ok(out)
}

/// Store `end_address` for `slot`, skipping bytes that already match.
pub fn save_boundary<B: BoundaryStore>(store: &mut B, slot: SlotId, end_address: i32) -> Result<(), B::Error> {
    let base = boundary_offset(slot);
    let value = (end_address as u32) & ERASED_BOUNDARY;
    let bytes = value.to_be_bytes();
    for (i, &byte) in bytes[1..].iter().enumerate() {
        let offset = base + i as u16;
        if store.read_byte(offset)? != byte {
            store.write_byte(offset, byte)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBoundaryStore;

    fn slot(i: u8) -> SlotId {
        SlotId::new(i).unwrap()
    }

    /// Counts writes on top of the RAM fake.
    struct CountingStore {
        inner: MemoryBoundaryStore<16>,
        writes: usize,
    }

    impl BoundaryStore for CountingStore {
        type Error = core::convert::Infallible;

        fn read_byte(&mut self, offset: u16) -> Result<u8, Self::Error> {
            self.inner.read_byte(offset)
        }

        fn write_byte(&mut self, offset: u16, value: u8) -> Result<(), Self::Error> {
            self.writes += 1;
            self.inner.write_byte(offset, value)
        }
    }

    #[test]
    fn erased_store_loads_nothing() {
        let mut store = MemoryBoundaryStore::<16>::new();
        assert_eq!(load_boundaries(&mut store).unwrap(), [None; 4]);
    }

    #[test]
    fn save_then_load() {
        let mut store = MemoryBoundaryStore::<16>::new();
        save_boundary(&mut store, slot(0), 300).unwrap();
        save_boundary(&mut store, slot(3), 65535 - 600).unwrap();
        assert_eq!(&store.as_bytes()[0..3], &[0x00, 0x01, 0x2C]);
        assert_eq!(
            load_boundaries(&mut store).unwrap(),
            [Some(300), None, None, Some(64935)]
        );
    }

    #[test]
    fn origin_and_misaligned_values_are_rejected() {
        assert_eq!(decode_boundary(slot(0), 0), None);
        assert_eq!(decode_boundary(slot(1), 65535), None);
        assert_eq!(decode_boundary(slot(0), 301), None);
        assert_eq!(decode_boundary(slot(1), 65534), None);
        assert_eq!(decode_boundary(slot(2), 70_000), None);
        assert_eq!(decode_boundary(slot(1), 0), Some(0));
        assert_eq!(decode_boundary(slot(2), 65535), Some(65535));
    }

    #[test]
    fn unchanged_bytes_are_not_rewritten() {
        let mut store = CountingStore {
            inner: MemoryBoundaryStore::new(),
            writes: 0,
        };
        save_boundary(&mut store, slot(2), 0x000102).unwrap();
        assert_eq!(store.writes, 3);
        save_boundary(&mut store, slot(2), 0x000105).unwrap();
        assert_eq!(store.writes, 4);
        save_boundary(&mut store, slot(2), 0x000105).unwrap();
        assert_eq!(store.writes, 4);
    }
}
