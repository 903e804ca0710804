//! The sample-rate routine.
//!
//! [`AudioEngine::tick`] runs once per timer period, holding the transport
//! critical section for its whole body. Per tick, in order:
//!
//! 1. emit the output staged by the previous tick (not in RECORD_DONE),
//! 2. sample the input (PASSTHROUGH and RECORD; PLAYBACK samples after its
//!    storage read),
//! 3. RECORD: buffer on the even phase, write the packed pair on the odd
//!    phase and check capacity,
//! 4. PLAYBACK: read a packed pair on the even phase, reuse its second
//!    sample on the odd phase, mix with the input and clamp,
//! 5. filter the mix into the next staged output,
//! 6. toggle the phase.
//!
//! While grain-delay or freeze is engaged, PLAYBACK reads from the grain
//! cursor and stages the raw stored sample, skipping mix, clamp and filter.
//!
//! Nothing here can fail: storage errors substitute silence (reads) or are
//! dropped (writes), and both are counted in
//! [`Params::storage_faults`](crate::shared::Params::storage_faults).
//! Samples the front end refuses are counted in
//! [`Params::output_faults`](crate::shared::Params::output_faults).

use crate::constants::MIDSCALE;
use crate::dsp::helpers::{clamp_mix, to_signed};
use crate::dsp::{ChainSettings, FilterChain};
use crate::io::{AnalogFrontEnd, PackedStorage, StorageBank};
use crate::mode::Mode;
use crate::shared::{Params, Shared, Transport};
use crate::slot::SlotId;

/// Which half of a packed pair the current tick handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Even,
    Odd,
}

impl Phase {
    #[inline(always)]
    fn toggled(self) -> Phase {
        match self {
            Phase::Even => Phase::Odd,
            Phase::Odd => Phase::Even,
        }
    }
}

/// What a tick did, for the caller's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    Continue,
    /// A raw grain/freeze sample was staged instead of the filtered mix.
    Substituted,
    /// Storage filled up; the mode is now RECORD_DONE.
    RecordingTerminated,
}

/// Interrupt-owned state.
pub struct AudioEngine {
    chain: FilterChain,
    phase: Phase,
    /// Output emitted at the start of the next tick.
    staged: u16,
    /// First sample of a pair being recorded.
    pending: u16,
    /// Second sample of the last pair read.
    held: u16,
    last_mode: Mode,
}

/// Per-tick copy of the atomic parameters.
struct TickParams {
    chain: ChainSettings,
    samples_per_grain: u32,
    grain_window: u32,
}

impl AudioEngine {
    pub const fn new() -> Self {
        AudioEngine {
            chain: FilterChain::new(),
            phase: Phase::Even,
            staged: MIDSCALE,
            pending: MIDSCALE,
            held: MIDSCALE,
            last_mode: Mode::Off,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Output that the next tick will emit.
    pub fn staged(&self) -> u16 {
        self.staged
    }

    /// Run one sample period.
    pub fn tick<F, A, B>(&mut self, shared: &Shared, front: &mut F, bank: &mut StorageBank<A, B>) -> TickOutcome
    where
        F: AnalogFrontEnd,
        A: PackedStorage,
        B: PackedStorage,
    {
        let params = &shared.params;
        let p = TickParams {
            chain: params.chain(),
            samples_per_grain: params.samples_per_grain(),
            grain_window: params.grain_window(),
        };
        shared.with(|t| self.run(t, &p, params, front, bank))
    }

    fn run<F, A, B>(
        &mut self,
        t: &mut Transport,
        p: &TickParams,
        params: &Params,
        front: &mut F,
        bank: &mut StorageBank<A, B>,
    ) -> TickOutcome
    where
        F: AnalogFrontEnd,
        A: PackedStorage,
        B: PackedStorage,
    {
        if t.mode != self.last_mode {
            self.phase = Phase::Even;
            self.last_mode = t.mode;
        }

        if !matches!(t.mode, Mode::RecordDone(_)) && !front.emit_output(self.staged) {
            params.record_output_fault();
        }

        let outcome = match t.mode {
            Mode::Off => {
                self.staged = MIDSCALE;
                TickOutcome::Continue
            }
            Mode::Passthrough => {
                let input = front.sample_input();
                self.staged = self.chain.process(to_signed(input), &p.chain);
                TickOutcome::Continue
            }
            Mode::Record(slot) => {
                let input = front.sample_input();
                let outcome = self.record(t, slot, input, params, bank);
                self.staged = self.chain.process(to_signed(input), &p.chain);
                outcome
            }
            Mode::RecordDone(_) => TickOutcome::Continue,
            Mode::Playback(_) => self.playback(t, p, params, front, bank),
        };

        self.last_mode = t.mode;
        self.phase = self.phase.toggled();
        outcome
    }

    fn record<A: PackedStorage, B: PackedStorage>(
        &mut self,
        t: &mut Transport,
        slot: SlotId,
        input: u16,
        params: &Params,
        bank: &mut StorageBank<A, B>,
    ) -> TickOutcome {
        if self.phase == Phase::Even {
            self.pending = input;
            return TickOutcome::Continue;
        }
        let Some(cursor) = t.record.as_mut() else {
            return TickOutcome::Continue;
        };
        if !bank.write_packed(cursor.chip(), cursor.physical(), self.pending, input) {
            params.record_storage_fault();
        }
        if cursor.advance() {
            t.mode = Mode::RecordDone(slot);
            TickOutcome::RecordingTerminated
        } else {
            TickOutcome::Continue
        }
    }

    fn playback<F, A, B>(
        &mut self,
        t: &mut Transport,
        p: &TickParams,
        params: &Params,
        front: &mut F,
        bank: &mut StorageBank<A, B>,
    ) -> TickOutcome
    where
        F: AnalogFrontEnd,
        A: PackedStorage,
        B: PackedStorage,
    {
        let Some(bounds) = t.bounds else {
            let input = front.sample_input();
            self.staged = self.chain.process(to_signed(input), &p.chain);
            return TickOutcome::Continue;
        };
        let substituting = t.modifier.is_active();

        let stored = match self.phase {
            Phase::Even => {
                let address = if substituting {
                    t.grain.read_address(&bounds)
                } else {
                    t.playback.address
                };
                let (first, second) = match bank.read_packed(bounds.chip, bounds.physical(address)) {
                    Some(pair) => pair,
                    None => {
                        params.record_storage_fault();
                        (MIDSCALE, MIDSCALE)
                    }
                };
                self.held = second;
                if substituting {
                    t.grain
                        .complete_transaction(&bounds, t.modifier, p.samples_per_grain, p.grain_window);
                } else {
                    t.playback.address = bounds.advance(t.playback.address);
                }
                first
            }
            Phase::Odd => self.held,
        };

        if substituting {
            self.staged = stored;
            return TickOutcome::Substituted;
        }
        let input = front.sample_input();
        let mix = clamp_mix(to_signed(stored) + to_signed(input));
        self.staged = self.chain.process(mix, &p.chain);
        TickOutcome::Continue
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}
