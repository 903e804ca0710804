//! Transport modes and the control-rate transitions between them.
//!
//! ```text
//!            record + one select            select released (≥ min length)
//!   OFF ──► PASSTHROUGH ───────────────► RECORD ─────────────────────────┐
//!                │  ▲                      │ storage exhausted (interrupt)│
//!                │  │                      ▼                              │
//!                │  └──── record released ── RECORD_DONE                  │
//!                │  ▲                                                     │
//!                │  └─────────────────────────────────────────────────────┘
//!                │ select of recorded slot        select released
//!                └──────────────────────► PLAYBACK ──────────► PASSTHROUGH
//! ```
//!
//! Only RECORD → RECORD_DONE happens in the interrupt (see
//! [`AudioEngine`](crate::engine::AudioEngine)); every other edge is taken
//! here, once per control tick, inside the transport critical section.

use crate::config::LooperConfig;
use crate::gesture::GestureInputs;
use crate::shared::Transport;
use crate::slot::{RecordCursor, SlotId};

/// Transport mode. Slot-bearing variants carry the slot they act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Off,
    Passthrough,
    Record(SlotId),
    /// Storage filled up; writes stopped until the record gesture releases.
    RecordDone(SlotId),
    Playback(SlotId),
}

impl Mode {
    /// The slot this mode acts on, if any.
    pub fn slot(self) -> Option<SlotId> {
        match self {
            Mode::Record(s) | Mode::RecordDone(s) | Mode::Playback(s) => Some(s),
            Mode::Off | Mode::Passthrough => None,
        }
    }
}

/// Sub-loop modifier applied during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modifier {
    None,
    GrainDelay,
    /// Replays the window at `anchor`, captured when freeze was armed.
    Freeze { anchor: i32 },
}

impl Modifier {
    pub fn is_active(self) -> bool {
        !matches!(self, Modifier::None)
    }
}

/// Result of a control-initiated transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeEvent {
    RecordStarted(SlotId),
    /// Boundary fixed and slot marked recorded; needs persisting.
    RecordCommitted { slot: SlotId, end_address: i32 },
    /// Recording ended without a single packed record.
    RecordDiscarded(SlotId),
    PlaybackStarted(SlotId),
    PlaybackStopped(SlotId),
}

/// Control-side timing needed to arbitrate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeMachine {
    record_started_ms: u32,
    record_ended_ms: Option<u32>,
    record_rate_hz: u32,
}

impl ModeMachine {
    pub const fn new() -> Self {
        ModeMachine {
            record_started_ms: 0,
            record_ended_ms: None,
            record_rate_hz: crate::constants::NOMINAL_SAMPLE_RATE,
        }
    }

    /// Rate locked in when the current or last recording started.
    pub fn record_rate_hz(&self) -> u32 {
        self.record_rate_hz
    }

    /// Evaluate one control tick.
    ///
    /// `rate_hz` is the live rate parameter; it becomes the slot's recording
    /// rate when a recording starts.
    pub fn step(
        &mut self,
        now_ms: u32,
        gestures: &GestureInputs,
        rate_hz: u32,
        config: &LooperConfig,
        t: &mut Transport,
    ) -> Option<ModeEvent> {
        match t.mode {
            Mode::Off | Mode::Passthrough => {
                let event = self
                    .try_start_recording(now_ms, gestures, rate_hz, config, t)
                    .or_else(|| Self::try_start_playback(gestures, t));
                if event.is_none() {
                    t.mode = Mode::Passthrough;
                }
                event
            }
            Mode::Record(slot) => {
                let held_ms = now_ms.wrapping_sub(self.record_started_ms);
                if !gestures.select[slot.index()] && held_ms >= config.min_record_ms {
                    Some(self.commit(now_ms, slot, t))
                } else {
                    None
                }
            }
            Mode::RecordDone(slot) => {
                if !gestures.record {
                    Some(self.commit(now_ms, slot, t))
                } else {
                    None
                }
            }
            Mode::Playback(slot) => {
                if !gestures.select[slot.index()] {
                    t.mode = Mode::Passthrough;
                    t.modifier = Modifier::None;
                    Some(ModeEvent::PlaybackStopped(slot))
                } else {
                    None
                }
            }
        }
    }

    fn try_start_recording(
        &mut self,
        now_ms: u32,
        gestures: &GestureInputs,
        rate_hz: u32,
        config: &LooperConfig,
        t: &mut Transport,
    ) -> Option<ModeEvent> {
        if !gestures.record {
            return None;
        }
        let slot = gestures.single_select()?;
        if let Some(ended) = self.record_ended_ms {
            if now_ms.wrapping_sub(ended) < config.debounce_ms {
                return None;
            }
        }
        if t.slots.free_space(slot) < config.min_free_space {
            return None;
        }
        t.record = Some(RecordCursor::new(slot, &t.slots));
        t.modifier = Modifier::None;
        t.mode = Mode::Record(slot);
        self.record_started_ms = now_ms;
        self.record_rate_hz = rate_hz;
        Some(ModeEvent::RecordStarted(slot))
    }

    fn try_start_playback(gestures: &GestureInputs, t: &mut Transport) -> Option<ModeEvent> {
        if gestures.record {
            return None;
        }
        let slot = SlotId::ALL
            .into_iter()
            .find(|s| gestures.select[s.index()] && t.slots.get(*s).recorded)?;
        let bounds = t.slots.bounds(slot, t.direction)?;
        t.bounds = Some(bounds);
        t.playback.address = bounds.start;
        t.playback.chip = bounds.chip;
        t.playback.direction = t.direction;
        t.grain.seed(bounds.start, bounds.chip);
        t.modifier = Modifier::None;
        t.mode = Mode::Playback(slot);
        Some(ModeEvent::PlaybackStarted(slot))
    }

    fn commit(&mut self, now_ms: u32, slot: SlotId, t: &mut Transport) -> ModeEvent {
        let end_address = t
            .record
            .take()
            .map(|cursor| cursor.address)
            .unwrap_or(slot.orientation().origin());
        t.mode = Mode::Passthrough;
        self.record_ended_ms = Some(now_ms);
        if t.slots.commit(slot, end_address, self.record_rate_hz) {
            ModeEvent::RecordCommitted { slot, end_address }
        } else {
            ModeEvent::RecordDiscarded(slot)
        }
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}
