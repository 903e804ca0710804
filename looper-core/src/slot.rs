//! Storage addressing: four sample slots on two SRAM devices.
//!
//! Each device is shared by an ascending slot, which grows up from byte 0,
//! and a descending slot, which grows down from byte 65535. The two can
//! never overlap: each one's recording limit is its partner's boundary.
//!
//! ```text
//!  chip A   0 ──► slot 0 ... free ...  slot 1 ◄── 65535
//!  chip B   0 ──► slot 2 ... free ...  slot 3 ◄── 65535
//! ```
//!
//! Addresses are *logical*: a multiple of [`PACKED_STRIDE`] away from the
//! slot's origin. A descending record at logical address `a` occupies
//! bytes `a-2..=a`; see [`physical_address`].

use crate::constants::{DEVICE_SPAN, DEVICE_TOP, NOMINAL_SAMPLE_RATE, PACKED_STRIDE, SLOT_COUNT};

/// One of the two physical storage devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Chip {
    A,
    B,
}

impl Chip {
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Chip::A => 0,
            Chip::B => 1,
        }
    }
}

/// Growth direction of a slot inside its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    Ascending,
    Descending,
}

impl Orientation {
    /// `+1` for ascending, `-1` for descending.
    #[inline(always)]
    pub const fn sign(self) -> i32 {
        match self {
            Orientation::Ascending => 1,
            Orientation::Descending => -1,
        }
    }

    /// Logical address of the first record.
    #[inline(always)]
    pub const fn origin(self) -> i32 {
        match self {
            Orientation::Ascending => 0,
            Orientation::Descending => DEVICE_TOP,
        }
    }
}

/// Global playback direction, recomputed from the reverse gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// `+3` forward, `-3` reverse.
    #[inline(always)]
    pub const fn stride(self) -> i32 {
        match self {
            Direction::Forward => PACKED_STRIDE,
            Direction::Reverse => -PACKED_STRIDE,
        }
    }
}

/// Slot index `0..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(u8);

impl SlotId {
    pub const ALL: [SlotId; SLOT_COUNT] = [SlotId(0), SlotId(1), SlotId(2), SlotId(3)];

    pub const fn new(index: u8) -> Option<SlotId> {
        if (index as usize) < SLOT_COUNT {
            Some(SlotId(index))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn chip(self) -> Chip {
        if self.0 < 2 {
            Chip::A
        } else {
            Chip::B
        }
    }

    pub const fn orientation(self) -> Orientation {
        if self.0 % 2 == 0 {
            Orientation::Ascending
        } else {
            Orientation::Descending
        }
    }

    /// The slot sharing this slot's device.
    pub const fn partner(self) -> SlotId {
        SlotId(self.0 ^ 1)
    }
}

/// Map a logical record address to the first byte the device must touch.
#[inline(always)]
pub fn physical_address(orientation: Orientation, logical: i32) -> u16 {
    let first = match orientation {
        Orientation::Ascending => logical,
        Orientation::Descending => logical - (PACKED_STRIDE - 1),
    };
    first.rem_euclid(DEVICE_SPAN) as u16
}

/// One recordable region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSlot {
    pub recorded: bool,
    /// Next logical address past the last record written.
    pub end_address: i32,
    /// Sample rate the slot was recorded at.
    pub record_rate_hz: u32,
}

/// Traversal of a recorded slot for one direction.
///
/// `start` is the first record played and `reset` the last one before the
/// cursor re-seeds to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub chip: Chip,
    pub orientation: Orientation,
    pub start: i32,
    pub reset: i32,
    /// Signed address step per packed transaction.
    pub step: i32,
}

impl Bounds {
    #[inline(always)]
    fn low(&self) -> i32 {
        self.start.min(self.reset)
    }

    #[inline(always)]
    fn high(&self) -> i32 {
        self.start.max(self.reset)
    }

    /// Whether `address` is a record of this region.
    pub fn contains(&self, address: i32) -> bool {
        address >= self.low() && address <= self.high()
    }

    /// Number of packed records in the region.
    pub fn records(&self) -> i32 {
        (self.high() - self.low()) / PACKED_STRIDE + 1
    }

    /// Step the cursor once, re-seeding to `start` after `reset`.
    #[inline]
    pub fn advance(&self, cursor: i32) -> i32 {
        let next = cursor + self.step;
        if cursor == self.reset || !self.contains(next) {
            self.start
        } else {
            next
        }
    }

    /// Fold any stride-aligned address back into the region.
    #[inline]
    pub fn wrap(&self, address: i32) -> i32 {
        let low = self.low();
        let span = self.records() * PACKED_STRIDE;
        low + (address - low).rem_euclid(span)
    }

    /// First byte on the device for a logical address in this region.
    #[inline(always)]
    pub fn physical(&self, address: i32) -> u16 {
        physical_address(self.orientation, address)
    }
}

/// The four slot records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTable {
    slots: [SampleSlot; SLOT_COUNT],
}

impl SlotTable {
    pub const fn new() -> Self {
        const EMPTY: SampleSlot = SampleSlot {
            recorded: false,
            end_address: 0,
            record_rate_hz: NOMINAL_SAMPLE_RATE,
        };
        let mut slots = [EMPTY; SLOT_COUNT];
        // Descending slots start out with their boundary at their origin.
        slots[1].end_address = DEVICE_TOP;
        slots[3].end_address = DEVICE_TOP;
        SlotTable { slots }
    }

    pub fn get(&self, id: SlotId) -> &SampleSlot {
        &self.slots[id.index()]
    }

    /// Record the boundary of a finished recording.
    ///
    /// Returns `false` and leaves the slot untouched if nothing was written.
    pub fn commit(&mut self, id: SlotId, end_address: i32, record_rate_hz: u32) -> bool {
        if end_address == id.orientation().origin() {
            return false;
        }
        let slot = &mut self.slots[id.index()];
        slot.end_address = end_address;
        slot.recorded = true;
        slot.record_rate_hz = record_rate_hz;
        true
    }

    /// Seed a slot from a persisted boundary at start-up.
    pub fn restore(&mut self, id: SlotId, end_address: i32) {
        self.commit(id, end_address, NOMINAL_SAMPLE_RATE);
    }

    /// Byte limit a recording into `id` must not cross.
    ///
    /// Exclusive upper limit for ascending slots, inclusive lower limit for
    /// descending ones.
    pub fn write_limit(&self, id: SlotId) -> i32 {
        let partner = self.get(id.partner());
        match id.orientation() {
            Orientation::Ascending if partner.recorded => partner.end_address + 1,
            Orientation::Ascending => DEVICE_SPAN,
            Orientation::Descending if partner.recorded => partner.end_address,
            Orientation::Descending => 0,
        }
    }

    /// Bytes available to a new recording into `id`.
    pub fn free_space(&self, id: SlotId) -> i32 {
        match id.orientation() {
            Orientation::Ascending => self.write_limit(id),
            Orientation::Descending => DEVICE_SPAN - self.write_limit(id),
        }
    }

    /// Playback traversal for a recorded slot, or `None` if it holds nothing.
    pub fn bounds(&self, id: SlotId, direction: Direction) -> Option<Bounds> {
        let slot = self.get(id);
        if !slot.recorded {
            return None;
        }
        let orientation = id.orientation();
        let origin = orientation.origin();
        // Last record written: one stride back from the boundary, toward the origin.
        let last = slot.end_address - orientation.sign() * PACKED_STRIDE;
        let step = direction.stride() * orientation.sign();
        let (start, reset) = match direction {
            Direction::Forward => (origin, last),
            Direction::Reverse => (last, origin),
        };
        Some(Bounds {
            chip: id.chip(),
            orientation,
            start,
            reset,
            step,
        })
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Write position of an in-progress recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCursor {
    pub slot: SlotId,
    pub address: i32,
    limit: i32,
}

impl RecordCursor {
    /// Seed at the slot's origin with the limit taken from the partner slot.
    pub fn new(slot: SlotId, slots: &SlotTable) -> Self {
        RecordCursor {
            slot,
            address: slot.orientation().origin(),
            limit: slots.write_limit(slot),
        }
    }

    #[inline(always)]
    pub fn chip(&self) -> Chip {
        self.slot.chip()
    }

    #[inline(always)]
    pub fn physical(&self) -> u16 {
        physical_address(self.slot.orientation(), self.address)
    }

    /// Move past the record just written.
    ///
    /// Returns `true` when the next record would cross the limit.
    #[inline]
    pub fn advance(&mut self) -> bool {
        let orientation = self.slot.orientation();
        self.address += orientation.sign() * PACKED_STRIDE;
        match orientation {
            Orientation::Ascending => self.address + PACKED_STRIDE > self.limit,
            Orientation::Descending => self.address - (PACKED_STRIDE - 1) < self.limit,
        }
    }
}
