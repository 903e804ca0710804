//! State shared between the control loop and the audio interrupt.
//!
//! Two representations, chosen by width:
//!
//! - [`Params`]: single-word parameters in atomic cells. The control loop
//!   stores, the interrupt loads; no lock is needed. Filter coefficients
//!   are packed into one `u32` so cutoff and feedback always change
//!   together.
//! - [`Transport`]: everything multi-word (mode, slot table, cursors,
//!   bounds) behind one [`critical_section::Mutex`]. The control loop
//!   takes the critical section for each read-modify-write; the interrupt
//!   holds it for the whole tick, so it never observes a torn update.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use critical_section::Mutex;

use crate::dsp::{ChainSettings, Coefficients};
use crate::grain::GrainCursor;
use crate::mode::{Mode, Modifier};
use crate::slot::{Bounds, Chip, Direction, RecordCursor, SlotTable};

/// Main playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    pub address: i32,
    pub chip: Chip,
    pub direction: Direction,
}

impl PlaybackCursor {
    pub const fn new() -> Self {
        PlaybackCursor {
            address: 0,
            chip: Chip::A,
            direction: Direction::Forward,
        }
    }
}

/// Multi-word state guarded by the critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transport {
    pub mode: Mode,
    pub slots: SlotTable,
    pub direction: Direction,
    /// Traversal of the slot being played, recomputed every control tick.
    pub bounds: Option<Bounds>,
    pub playback: PlaybackCursor,
    pub grain: GrainCursor,
    pub record: Option<RecordCursor>,
    pub modifier: Modifier,
}

impl Transport {
    pub const fn new() -> Self {
        Transport {
            mode: Mode::Off,
            slots: SlotTable::new(),
            direction: Direction::Forward,
            bounds: None,
            playback: PlaybackCursor::new(),
            grain: GrainCursor::new(),
            record: None,
            modifier: Modifier::None,
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[inline(always)]
fn pack_coefficients(c: Coefficients) -> u32 {
    ((c.cutoff as u32) << 16) | (c.feedback as u32 & 0xFFFF)
}

#[inline(always)]
fn unpack_coefficients(word: u32) -> Coefficients {
    Coefficients {
        cutoff: (word >> 16) as i32,
        feedback: (word & 0xFFFF) as i32,
    }
}

/// Single-word parameters written by the control loop.
pub struct Params {
    bypass: AtomicBool,
    low_pass: AtomicU32,
    high_pass: AtomicU32,
    mask: AtomicU16,
    /// Packed transactions per grain.
    samples_per_grain: AtomicU32,
    /// Address units the grain start moves per grain.
    grain_window: AtomicU32,
    /// Failed storage transactions seen by the interrupt (wrapping).
    storage_faults: AtomicU32,
    /// Output samples the front end failed to emit (wrapping).
    output_faults: AtomicU32,
}

impl Params {
    pub const fn new() -> Self {
        let t = ChainSettings::transparent();
        Params {
            bypass: AtomicBool::new(false),
            low_pass: AtomicU32::new(((t.low_pass.cutoff as u32) << 16) | t.low_pass.feedback as u32),
            high_pass: AtomicU32::new(((t.high_pass.cutoff as u32) << 16) | t.high_pass.feedback as u32),
            mask: AtomicU16::new(t.mask),
            samples_per_grain: AtomicU32::new(1),
            grain_window: AtomicU32::new(0),
            storage_faults: AtomicU32::new(0),
            output_faults: AtomicU32::new(0),
        }
    }

    pub fn set_chain(&self, settings: &ChainSettings) {
        self.bypass.store(settings.bypass, Ordering::Relaxed);
        self.low_pass.store(pack_coefficients(settings.low_pass), Ordering::Relaxed);
        self.high_pass.store(pack_coefficients(settings.high_pass), Ordering::Relaxed);
        self.mask.store(settings.mask, Ordering::Relaxed);
    }

    pub fn chain(&self) -> ChainSettings {
        ChainSettings {
            bypass: self.bypass.load(Ordering::Relaxed),
            low_pass: unpack_coefficients(self.low_pass.load(Ordering::Relaxed)),
            high_pass: unpack_coefficients(self.high_pass.load(Ordering::Relaxed)),
            mask: self.mask.load(Ordering::Relaxed),
        }
    }

    pub fn set_grain(&self, samples_per_grain: u32, window: u32) {
        self.samples_per_grain.store(samples_per_grain.max(1), Ordering::Relaxed);
        self.grain_window.store(window, Ordering::Relaxed);
    }

    pub fn samples_per_grain(&self) -> u32 {
        self.samples_per_grain.load(Ordering::Relaxed)
    }

    pub fn grain_window(&self) -> u32 {
        self.grain_window.load(Ordering::Relaxed)
    }

    pub fn record_storage_fault(&self) {
        self.storage_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn storage_faults(&self) -> u32 {
        self.storage_faults.load(Ordering::Relaxed)
    }

    pub fn record_output_fault(&self) {
        self.output_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn output_faults(&self) -> u32 {
        self.output_faults.load(Ordering::Relaxed)
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything both execution contexts touch.
///
/// Intended to live in a `static`:
///
/// ```ignore
/// static SHARED: Shared = Shared::new();
/// ```
pub struct Shared {
    pub params: Params,
    transport: Mutex<RefCell<Transport>>,
}

impl Shared {
    pub const fn new() -> Self {
        Shared {
            params: Params::new(),
            transport: Mutex::new(RefCell::new(Transport::new())),
        }
    }

    /// Run `f` on the transport inside a critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut Transport) -> R) -> R {
        critical_section::with(|cs| f(&mut self.transport.borrow_ref_mut(cs)))
    }

    /// Copy of the current transport state.
    pub fn snapshot(&self) -> Transport {
        self.with(|t| *t)
    }

    pub fn mode(&self) -> Mode {
        self.with(|t| t.mode)
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}
