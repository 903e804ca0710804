//! The control-rate step.
//!
//! [`Controller::tick`] runs from the firmware's idle loop as fast as the
//! buttons and pots are polled. Each tick:
//!
//! 1. publishes filter coefficients and the bit-crush mask,
//! 2. inside one critical section, applies the reverse gesture to the
//!    direction and bounds, advances the [`ModeMachine`] and arms or
//!    disarms the grain/freeze modifier,
//! 3. publishes grain length and window,
//! 4. re-programs the sample clock when the target rate changed,
//! 5. persists the boundary of a freshly committed recording.

use crate::config::LooperConfig;
use crate::constants::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, NOMINAL_SAMPLE_RATE, PACKED_STRIDE};
use crate::dsp::{resolution_mask, ChainSettings, Coefficients};
use crate::gesture::GestureInputs;
use crate::grain::samples_per_grain;
use crate::io::{BoundaryStore, SampleClock};
use crate::mode::{Mode, ModeEvent, ModeMachine, Modifier};
use crate::params::ParamInputs;
use crate::persist;
use crate::shared::{Shared, Transport};
use crate::slot::{Direction, Orientation, SlotId};

/// Playback clock rate for a slot recorded at `record_hz`.
///
/// The rate parameter is relative to the nominal rate, so a slot plays at
/// its original pitch when the pot sits at 16 kHz.
pub fn playback_rate(rate_hz: u32, record_hz: u32) -> u32 {
    let hz = rate_hz as u64 * record_hz as u64 / NOMINAL_SAMPLE_RATE as u64;
    (hz as u32).clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE)
}

fn chain_settings(gestures: &GestureInputs, params: &ParamInputs, resonance: u8) -> ChainSettings {
    ChainSettings {
        bypass: gestures.filter_bypass,
        low_pass: Coefficients::new(params.low_cutoff, resonance),
        high_pass: Coefficients::new(params.high_cutoff, resonance),
        mask: resolution_mask(params.resolution_bits),
    }
}

/// Grain-delay wins over freeze; freeze needs record held without reverse.
fn select_modifier(gestures: &GestureInputs, t: &Transport) -> Modifier {
    if gestures.grain {
        Modifier::GrainDelay
    } else if gestures.record && !gestures.reverse {
        match t.modifier {
            Modifier::Freeze { anchor } => Modifier::Freeze { anchor },
            _ => Modifier::Freeze {
                anchor: t.playback.address,
            },
        }
    } else {
        Modifier::None
    }
}

/// Apply direction and modifier for the current mode.
fn update_playback(gestures: &GestureInputs, t: &mut Transport) {
    let Mode::Playback(slot) = t.mode else {
        t.modifier = Modifier::None;
        return;
    };
    t.bounds = t.slots.bounds(slot, t.direction);
    t.playback.direction = t.direction;

    let next = select_modifier(gestures, t);
    let armed = match (t.modifier, next) {
        (Modifier::GrainDelay, Modifier::GrainDelay) => false,
        (Modifier::Freeze { .. }, Modifier::Freeze { .. }) => false,
        (_, next) => next.is_active(),
    };
    if armed {
        let start = match next {
            Modifier::Freeze { anchor } => anchor,
            _ => t.playback.address,
        };
        t.grain.seed(start, t.playback.chip);
    }
    t.modifier = next;
}

/// Owns the control-side state and drives one tick at a time.
pub struct Controller {
    config: LooperConfig,
    machine: ModeMachine,
    /// Rate last handed to the sample clock.
    clock_hz: Option<u32>,
    faults_seen: u32,
    output_faults_seen: u32,
}

impl Controller {
    pub const fn new(config: LooperConfig) -> Self {
        Controller {
            config,
            machine: ModeMachine::new(),
            clock_hz: None,
            faults_seen: 0,
            output_faults_seen: 0,
        }
    }

    pub fn config(&self) -> &LooperConfig {
        &self.config
    }

    /// Rate the sample clock currently runs at, once programmed.
    pub fn clock_hz(&self) -> Option<u32> {
        self.clock_hz
    }

    /// Load the persisted slot boundaries. Returns the number of slots
    /// restored.
    ///
    /// A descending boundary that overlaps its restored ascending partner
    /// is dropped.
    pub fn boot<B: BoundaryStore>(&mut self, shared: &Shared, store: &mut B) -> Result<usize, B::Error> {
        let ends = persist::load_boundaries(store)?;
        let restored = shared.with(|t| {
            let mut restored = 0;
            for slot in SlotId::ALL {
                let Some(end) = ends[slot.index()] else {
                    continue;
                };
                if slot.orientation() == Orientation::Descending {
                    let partner = t.slots.get(slot.partner());
                    if partner.recorded && partner.end_address > end + 1 {
                        warn!("slot {} overlaps slot {}, dropped", slot.index(), slot.partner().index());
                        continue;
                    }
                }
                t.slots.restore(slot, end);
                restored += 1;
            }
            restored
        });
        info!("restored {} slots", restored);
        Ok(restored)
    }

    /// One control-rate step. See the module docs for the order of work.
    pub fn tick<C: SampleClock, B: BoundaryStore>(
        &mut self,
        now_ms: u32,
        gestures: &GestureInputs,
        params: &ParamInputs,
        shared: &Shared,
        clock: &mut C,
        store: &mut B,
    ) -> Result<Option<ModeEvent>, B::Error> {
        shared
            .params
            .set_chain(&chain_settings(gestures, params, self.config.resonance));

        let machine = &mut self.machine;
        let config = &self.config;
        let (event, mode, slot_rate) = shared.with(|t| {
            t.direction = if gestures.reverse {
                Direction::Reverse
            } else {
                Direction::Forward
            };
            let event = machine.step(now_ms, gestures, params.rate_hz, config, t);
            update_playback(gestures, t);
            let slot_rate = t.mode.slot().map(|s| t.slots.get(s).record_rate_hz);
            (event, t.mode, slot_rate)
        });

        let target_hz = match mode {
            Mode::Off | Mode::Passthrough => params.rate_hz,
            Mode::Record(_) | Mode::RecordDone(_) => self.machine.record_rate_hz(),
            Mode::Playback(_) => playback_rate(params.rate_hz, slot_rate.unwrap_or(NOMINAL_SAMPLE_RATE)),
        };

        let record_hz = slot_rate.unwrap_or(NOMINAL_SAMPLE_RATE);
        shared.params.set_grain(
            samples_per_grain(params.grain_size, params.stretch, target_hz, record_hz),
            params.grain_size as u32 * PACKED_STRIDE as u32,
        );

        if self.clock_hz != Some(target_hz) {
            clock.set_sample_rate(target_hz);
            self.clock_hz = Some(target_hz);
        }

        let faults = shared.params.storage_faults();
        if faults != self.faults_seen {
            warn!("storage faults: {}", faults);
            self.faults_seen = faults;
        }
        let output_faults = shared.params.output_faults();
        if output_faults != self.output_faults_seen {
            warn!("output faults: {}", output_faults);
            self.output_faults_seen = output_faults;
        }

        match event {
            Some(ModeEvent::RecordCommitted { slot, end_address }) => {
                info!("slot {} recorded, end {}", slot.index(), end_address);
                persist::save_boundary(store, slot, end_address)?;
            }
            Some(ModeEvent::RecordDiscarded(slot)) => {
                warn!("slot {} recording discarded", slot.index());
            }
            Some(other) => debug!("{}", other),
            None => {}
        }
        Ok(event)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(LooperConfig::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBoundaryStore;
    use crate::params::MIN_GRAIN_SIZE;

    #[derive(Default)]
    struct RecordingClock {
        rates: [u32; 8],
        count: usize,
    }

    impl SampleClock for RecordingClock {
        fn set_sample_rate(&mut self, hz: u32) {
            self.rates[self.count % 8] = hz;
            self.count += 1;
        }
    }

    fn slot(i: u8) -> SlotId {
        SlotId::new(i).unwrap()
    }

    fn select(i: usize) -> GestureInputs {
        let mut g = GestureInputs::idle();
        g.select[i] = true;
        g
    }

    struct Rig {
        controller: Controller,
        shared: Shared,
        clock: RecordingClock,
        store: MemoryBoundaryStore<16>,
        params: ParamInputs,
    }

    impl Rig {
        fn new() -> Self {
            Rig {
                controller: Controller::default(),
                shared: Shared::new(),
                clock: RecordingClock::default(),
                store: MemoryBoundaryStore::new(),
                params: ParamInputs::default(),
            }
        }

        fn tick(&mut self, now_ms: u32, gestures: &GestureInputs) -> Option<ModeEvent> {
            self.controller
                .tick(now_ms, gestures, &self.params, &self.shared, &mut self.clock, &mut self.store)
                .unwrap()
        }
    }

    #[test]
    fn playback_rate_tracks_recording_rate() {
        assert_eq!(playback_rate(16_000, 16_000), 16_000);
        assert_eq!(playback_rate(16_000, 8_000), 8_000);
        assert_eq!(playback_rate(32_000, 8_000), 16_000);
        assert_eq!(playback_rate(32_000, 32_000), MAX_SAMPLE_RATE);
        assert_eq!(playback_rate(2_000, 2_000), MIN_SAMPLE_RATE);
    }

    #[test]
    fn first_tick_programs_clock_and_enters_passthrough() {
        let mut rig = Rig::new();
        assert_eq!(rig.tick(0, &GestureInputs::idle()), None);
        assert_eq!(rig.shared.mode(), Mode::Passthrough);
        assert_eq!(rig.clock.count, 1);
        assert_eq!(rig.clock.rates[0], 16_000);

        // Unchanged rate is not re-programmed.
        rig.tick(1, &GestureInputs::idle());
        assert_eq!(rig.clock.count, 1);
    }

    #[test]
    fn chain_settings_follow_params_and_bypass() {
        let mut rig = Rig::new();
        rig.params.resolution_bits = 4;
        rig.params.low_cutoff = 90;
        let mut g = GestureInputs::idle();
        g.filter_bypass = true;
        rig.tick(0, &g);
        let chain = rig.shared.params.chain();
        assert!(chain.bypass);
        assert_eq!(chain.mask, resolution_mask(4));
        assert_eq!(chain.low_pass, Coefficients::new(90, rig.controller.config().resonance));
    }

    #[test]
    fn commit_is_persisted() {
        let mut rig = Rig::new();
        let mut rec = select(0);
        rec.record = true;
        assert_eq!(rig.tick(0, &rec), Some(ModeEvent::RecordStarted(slot(0))));
        rig.shared.with(|t| t.record.as_mut().unwrap().address = 600);

        assert_eq!(
            rig.tick(40, &GestureInputs::idle()),
            Some(ModeEvent::RecordCommitted { slot: slot(0), end_address: 600 })
        );
        assert_eq!(&rig.store.as_bytes()[0..3], &[0x00, 0x02, 0x58]);
    }

    #[test]
    fn recording_locks_the_clock_rate() {
        let mut rig = Rig::new();
        rig.params.rate_hz = 8_000;
        let mut rec = select(0);
        rec.record = true;
        rig.tick(0, &rec);
        assert_eq!(rig.controller.clock_hz(), Some(8_000));

        rig.params.rate_hz = 24_000;
        rig.tick(5, &rec);
        assert_eq!(rig.controller.clock_hz(), Some(8_000));
    }

    #[test]
    fn reverse_flips_bounds_during_playback() {
        let mut rig = Rig::new();
        rig.shared.with(|t| {
            t.slots.commit(slot(1), 65535 - 30, 16_000);
        });
        rig.tick(0, &select(1));
        assert_eq!(rig.shared.mode(), Mode::Playback(slot(1)));
        let b = rig.shared.snapshot().bounds.unwrap();
        assert_eq!((b.start, b.reset, b.step), (65535, 65508, -3));

        let mut rev = select(1);
        rev.reverse = true;
        rig.tick(1, &rev);
        let t = rig.shared.snapshot();
        let b = t.bounds.unwrap();
        assert_eq!((b.start, b.reset, b.step), (65508, 65535, 3));
        assert_eq!(t.playback.direction, Direction::Reverse);
    }

    #[test]
    fn grain_and_freeze_arming() {
        let mut rig = Rig::new();
        rig.params.grain_size = MIN_GRAIN_SIZE;
        rig.params.stretch = 2;
        rig.shared.with(|t| {
            t.slots.commit(slot(0), 3000, 16_000);
        });
        rig.tick(0, &select(0));
        rig.shared.with(|t| t.playback.address = 300);

        let mut grain = select(0);
        grain.grain = true;
        rig.tick(1, &grain);
        let t = rig.shared.snapshot();
        assert_eq!(t.modifier, Modifier::GrainDelay);
        assert_eq!(t.grain.address, 300);
        assert_eq!(rig.shared.params.samples_per_grain(), 32);
        assert_eq!(rig.shared.params.grain_window(), 48);

        // Record held without reverse: freeze anchored at the playback cursor.
        rig.shared.with(|t| t.playback.address = 600);
        let mut freeze = select(0);
        freeze.record = true;
        rig.tick(2, &freeze);
        assert_eq!(rig.shared.snapshot().modifier, Modifier::Freeze { anchor: 600 });

        // Anchor is kept while freeze stays engaged.
        rig.shared.with(|t| t.playback.address = 900);
        rig.tick(3, &freeze);
        let t = rig.shared.snapshot();
        assert_eq!(t.modifier, Modifier::Freeze { anchor: 600 });
        assert_eq!(t.grain.address, 600);

        // Reverse suppresses freeze.
        freeze.reverse = true;
        rig.tick(4, &freeze);
        assert_eq!(rig.shared.snapshot().modifier, Modifier::None);
    }

    #[test]
    fn boot_restores_persisted_slots() {
        let mut store = MemoryBoundaryStore::<16>::new();
        persist::save_boundary(&mut store, slot(0), 300).unwrap();
        persist::save_boundary(&mut store, slot(3), 65535 - 90).unwrap();
        let shared = Shared::new();
        let mut controller = Controller::default();
        assert_eq!(controller.boot(&shared, &mut store).unwrap(), 2);
        let t = shared.snapshot();
        assert!(t.slots.get(slot(0)).recorded);
        assert!(!t.slots.get(slot(1)).recorded);
        assert_eq!(t.slots.get(slot(3)).end_address, 65445);
        assert_eq!(t.slots.get(slot(3)).record_rate_hz, NOMINAL_SAMPLE_RATE);
        assert_eq!(t.mode, Mode::Off);
    }

    #[test]
    fn boot_drops_overlapping_partner() {
        let mut store = MemoryBoundaryStore::<16>::new();
        persist::save_boundary(&mut store, slot(0), 3000).unwrap();
        persist::save_boundary(&mut store, slot(1), 65535 - 65034).unwrap();
        let shared = Shared::new();
        let mut controller = Controller::default();
        assert_eq!(controller.boot(&shared, &mut store).unwrap(), 1);
        assert!(!shared.snapshot().slots.get(slot(1)).recorded);
    }
}
