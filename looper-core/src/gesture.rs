//! Button gesture classification.
//!
//! One [`GestureClassifier`] type covers every physical input; what differs
//! per button is its [`GestureKind`] and timing. [`GestureBank`] wires the
//! pedal's buttons and the reverse+grain chord into a [`GestureInputs`]
//! snapshot for the control tick.

use crate::config::LooperConfig;
use crate::constants::SLOT_COUNT;
use crate::slot::SlotId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GestureKind {
    /// Active while held.
    Momentary,
    /// A tap toggles a latch; a hold longer than the threshold inverts the
    /// latch until release.
    Latching,
    /// Every press toggles.
    Toggle,
}

/// Debounce plus tap/hold classification for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureClassifier {
    kind: GestureKind,
    debounce_ms: u32,
    hold_ms: u32,
    raw: bool,
    raw_since: u32,
    pressed: bool,
    pressed_since: u32,
    latched: bool,
    cancelled: bool,
}

impl GestureClassifier {
    pub const fn new(kind: GestureKind, debounce_ms: u32, hold_ms: u32) -> Self {
        GestureClassifier {
            kind,
            debounce_ms,
            hold_ms,
            raw: false,
            raw_since: 0,
            pressed: false,
            pressed_since: 0,
            latched: false,
            cancelled: false,
        }
    }

    /// Feed the raw level and return the classified state.
    pub fn update(&mut self, now_ms: u32, raw: bool) -> bool {
        if raw != self.raw {
            self.raw = raw;
            self.raw_since = now_ms;
        }
        if self.raw != self.pressed && now_ms.wrapping_sub(self.raw_since) >= self.debounce_ms {
            self.pressed = self.raw;
            if self.pressed {
                self.pressed_since = now_ms;
                self.cancelled = false;
                if self.kind == GestureKind::Toggle {
                    self.latched = !self.latched;
                }
            } else if self.kind == GestureKind::Latching
                && !self.cancelled
                && now_ms.wrapping_sub(self.pressed_since) < self.hold_ms
            {
                self.latched = !self.latched;
            }
        }
        self.state(now_ms)
    }

    pub fn state(&self, now_ms: u32) -> bool {
        match self.kind {
            GestureKind::Momentary => self.pressed,
            GestureKind::Latching => {
                let holding = self.pressed
                    && !self.cancelled
                    && now_ms.wrapping_sub(self.pressed_since) >= self.hold_ms;
                self.latched != holding
            }
            GestureKind::Toggle => self.latched,
        }
    }

    /// Debounced level of the input.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Ignore the current press: its release will not toggle and a long
    /// hold will not act momentarily.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}

/// Raw button levels, `true` = pressed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawButtons {
    pub record: bool,
    pub select: [bool; SLOT_COUNT],
    pub reverse: bool,
    pub grain: bool,
}

/// Classified gestures consumed by one control tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureInputs {
    pub record: bool,
    pub select: [bool; SLOT_COUNT],
    pub reverse: bool,
    pub grain: bool,
    pub filter_bypass: bool,
}

impl GestureInputs {
    pub const fn idle() -> Self {
        GestureInputs {
            record: false,
            select: [false; SLOT_COUNT],
            reverse: false,
            grain: false,
            filter_bypass: false,
        }
    }

    /// The selected slot if exactly one select is asserted.
    pub fn single_select(&self) -> Option<SlotId> {
        let mut found = None;
        for id in SlotId::ALL {
            if self.select[id.index()] {
                if found.is_some() {
                    return None;
                }
                found = Some(id);
            }
        }
        found
    }
}

impl Default for GestureInputs {
    fn default() -> Self {
        Self::idle()
    }
}

/// Classifiers for every input of the pedal.
pub struct GestureBank {
    record: GestureClassifier,
    select: [GestureClassifier; SLOT_COUNT],
    reverse: GestureClassifier,
    grain: GestureClassifier,
    /// Reverse + grain pressed together toggles filter bypass.
    chord: GestureClassifier,
}

impl GestureBank {
    pub const fn new(config: &LooperConfig) -> Self {
        let d = config.button_debounce_ms;
        let h = config.hold_ms;
        GestureBank {
            record: GestureClassifier::new(GestureKind::Momentary, d, h),
            select: [GestureClassifier::new(GestureKind::Momentary, d, h); SLOT_COUNT],
            reverse: GestureClassifier::new(GestureKind::Latching, d, h),
            grain: GestureClassifier::new(GestureKind::Latching, d, h),
            chord: GestureClassifier::new(GestureKind::Toggle, d, h),
        }
    }

    pub fn update(&mut self, now_ms: u32, raw: &RawButtons) -> GestureInputs {
        let mut select = [false; SLOT_COUNT];
        for (state, (classifier, &level)) in select
            .iter_mut()
            .zip(self.select.iter_mut().zip(raw.select.iter()))
        {
            *state = classifier.update(now_ms, level);
        }
        let record = self.record.update(now_ms, raw.record);
        let reverse = self.reverse.update(now_ms, raw.reverse);
        let grain = self.grain.update(now_ms, raw.grain);

        // Members are cancelled after their own update so a press seen on
        // this same tick cannot clear the cancel.
        let was_chorded = self.chord.is_pressed();
        let filter_bypass = self.chord.update(now_ms, raw.reverse && raw.grain);
        if self.chord.is_pressed() && !was_chorded {
            self.reverse.cancel();
            self.grain.cancel();
        }

        GestureInputs {
            record,
            select,
            reverse,
            grain,
            filter_bypass,
        }
    }
}
