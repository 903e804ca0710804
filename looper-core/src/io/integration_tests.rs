//! Integration tests exercising the whole looper in software.
//!
//! The control step and the audio routine run against RAM-backed storage
//! and a scripted analog front end, interleaved the way the firmware
//! interleaves them:
//!
//! ```text
//! Controller::tick (1 ms) ─► 16 × AudioEngine::tick ─► Controller::tick ─► ...
//! ```

#[cfg(test)]
mod tests {
    use crate::config::LooperConfig;
    use crate::constants::{MIDSCALE, SAMPLE_MAX};
    use crate::control::Controller;
    use crate::engine::{AudioEngine, TickOutcome};
    use crate::gesture::{GestureBank, GestureInputs, RawButtons};
    use crate::io::{AnalogFrontEnd, MemoryBoundaryStore, MemoryStorage, SampleClock, StorageBank};
    use crate::mode::{Mode, ModeEvent, Modifier};
    use crate::params::ParamInputs;
    use crate::shared::Shared;
    use crate::slot::{Direction, SlotId};

    const TICKS_PER_MS: usize = 16;

    /// Input is a 12-bit ramp while `ramping`, silence otherwise.
    struct RampFrontEnd {
        next: u16,
        ramping: bool,
        emitted: usize,
    }

    impl AnalogFrontEnd for RampFrontEnd {
        fn sample_input(&mut self) -> u16 {
            if !self.ramping {
                return MIDSCALE;
            }
            let v = self.next;
            self.next = (self.next + 1) & SAMPLE_MAX;
            v
        }

        fn emit_output(&mut self, _sample: u16) -> bool {
            self.emitted += 1;
            true
        }
    }

    struct Clock {
        hz: u32,
    }

    impl SampleClock for Clock {
        fn set_sample_rate(&mut self, hz: u32) {
            self.hz = hz;
        }
    }

    struct Rig {
        shared: Shared,
        controller: Controller,
        engine: AudioEngine,
        front: RampFrontEnd,
        bank: StorageBank<MemoryStorage, MemoryStorage>,
        clock: Clock,
        store: MemoryBoundaryStore<16>,
        params: ParamInputs,
        now: u32,
    }

    fn slot(i: u8) -> SlotId {
        SlotId::new(i).unwrap()
    }

    fn gestures(record: bool, select: Option<usize>) -> GestureInputs {
        let mut g = GestureInputs::idle();
        g.record = record;
        if let Some(i) = select {
            g.select[i] = true;
        }
        g.filter_bypass = true;
        g
    }

    fn ramp(first: u16, k: u16) -> u16 {
        (first + k) & SAMPLE_MAX
    }

    impl Rig {
        fn new() -> Self {
            let mut rig = Rig {
                shared: Shared::new(),
                controller: Controller::default(),
                engine: AudioEngine::new(),
                front: RampFrontEnd {
                    next: 100,
                    ramping: true,
                    emitted: 0,
                },
                bank: StorageBank::new(MemoryStorage::new(), MemoryStorage::new()),
                clock: Clock { hz: 0 },
                store: MemoryBoundaryStore::new(),
                params: ParamInputs::default(),
                now: 0,
            };
            assert_eq!(rig.control(&gestures(false, None)), None);
            assert_eq!(rig.shared.mode(), Mode::Passthrough);
            rig.audio(TICKS_PER_MS);
            rig
        }

        fn control(&mut self, g: &GestureInputs) -> Option<ModeEvent> {
            let event = self
                .controller
                .tick(self.now, g, &self.params, &self.shared, &mut self.clock, &mut self.store)
                .unwrap();
            self.now += 1;
            event
        }

        fn audio(&mut self, ticks: usize) -> TickOutcome {
            let mut last = TickOutcome::Continue;
            for _ in 0..ticks {
                last = self.engine.tick(&self.shared, &mut self.front, &mut self.bank);
            }
            last
        }

        fn staged<const N: usize>(&mut self) -> [u16; N] {
            let mut out = [0u16; N];
            for o in out.iter_mut() {
                self.audio(1);
                *o = self.engine.staged();
            }
            out
        }

        /// Hold record + select for `ms` control ticks, then release both.
        /// Returns the first recorded sample and the committed end.
        fn record(&mut self, index: usize, ms: usize) -> (u16, i32) {
            let id = slot(index as u8);
            let held = gestures(true, Some(index));
            assert_eq!(self.control(&held), Some(ModeEvent::RecordStarted(id)));
            let first = self.front.next;
            for _ in 0..ms {
                self.audio(TICKS_PER_MS);
                assert_eq!(self.control(&held), None);
            }
            self.audio(TICKS_PER_MS);
            match self.control(&gestures(false, None)) {
                Some(ModeEvent::RecordCommitted { slot, end_address }) => {
                    assert_eq!(slot, id);
                    (first, end_address)
                }
                other => panic!("expected commit, got {:?}", other),
            }
        }
    }

    #[test]
    fn record_then_play_slot_zero() {
        let mut rig = Rig::new();
        let (first, end) = rig.record(0, 24);

        // 25 ms at 16 ticks per ms, two samples per record.
        assert_eq!(end, 600);
        assert_eq!(rig.bank.devices().0.write_count() as i32 * 3, end);
        assert_eq!(rig.bank.devices().1.write_count(), 0);
        let t = rig.shared.snapshot();
        assert!(t.slots.get(slot(0)).recorded);
        assert_eq!(t.slots.get(slot(0)).end_address, 600);
        assert_eq!(&rig.store.as_bytes()[0..3], &[0x00, 0x02, 0x58]);

        rig.front.ramping = false;
        rig.audio(TICKS_PER_MS);
        assert_eq!(
            rig.control(&gestures(false, Some(0))),
            Some(ModeEvent::PlaybackStarted(slot(0)))
        );
        assert_eq!(rig.shared.snapshot().playback.address, 0);

        let out: [u16; 8] = rig.staged();
        for (k, &o) in out.iter().enumerate() {
            assert_eq!(o, ramp(first, k as u16));
        }
        assert_eq!(rig.shared.snapshot().playback.address, 12);

        // Finish the traversal: the cursor re-seeds to the start.
        rig.audio(400 - 8);
        assert_eq!(rig.shared.snapshot().playback.address, 0);
        assert_eq!(rig.bank.devices().0.read_count(), 200);
        let out: [u16; 2] = rig.staged();
        assert_eq!(out, [ramp(first, 0), ramp(first, 1)]);

        assert_eq!(
            rig.control(&gestures(false, None)),
            Some(ModeEvent::PlaybackStopped(slot(0)))
        );
    }

    #[test]
    fn reverse_playback_of_descending_slot() {
        let mut rig = Rig::new();
        let (first, end) = rig.record(1, 24);
        assert_eq!(end, 65535 - 600);

        rig.front.ramping = false;
        let mut g = gestures(false, Some(1));
        g.reverse = true;
        assert_eq!(rig.control(&g), Some(ModeEvent::PlaybackStarted(slot(1))));
        let t = rig.shared.snapshot();
        let b = t.bounds.unwrap();
        assert_eq!((b.start, b.reset, b.step), (end + 3, 65535, 3));
        assert_eq!(t.playback.direction, Direction::Reverse);

        // Records come back last first; each pair keeps its order.
        let out: [u16; 4] = rig.staged();
        assert_eq!(
            out,
            [ramp(first, 398), ramp(first, 399), ramp(first, 396), ramp(first, 397)]
        );

        // Dropping reverse mid-playback keeps the cursor and turns around.
        let before = rig.shared.snapshot().playback.address;
        rig.control(&gestures(false, Some(1)));
        rig.audio(2);
        assert_eq!(rig.shared.snapshot().playback.address, before - 3);
    }

    #[test]
    fn grain_engagement_moves_independently_of_playback() {
        let mut rig = Rig::new();
        rig.params.grain_size = 16;
        rig.params.stretch = 1;
        let (first, _) = rig.record(2, 24);

        rig.front.ramping = false;
        rig.control(&gestures(false, Some(2)));
        rig.audio(2);
        assert_eq!(rig.shared.snapshot().playback.address, 3);

        let mut g = gestures(false, Some(2));
        g.grain = true;
        rig.control(&g);
        assert_eq!(rig.shared.params.samples_per_grain(), 16);
        assert_eq!(rig.shared.params.grain_window(), 48);

        let out: [u16; 2] = rig.staged();
        assert_eq!(out, [ramp(first, 2), ramp(first, 3)]);
        assert_eq!(rig.audio(30), TickOutcome::Substituted);
        let t = rig.shared.snapshot();
        assert_eq!(t.modifier, Modifier::GrainDelay);
        assert_eq!(t.grain.address, 3 + 48);
        assert_eq!(t.playback.address, 3);

        rig.audio(32);
        assert_eq!(rig.shared.snapshot().grain.address, 3 + 96);

        rig.control(&gestures(false, Some(2)));
        assert_eq!(rig.shared.snapshot().modifier, Modifier::None);
        assert_eq!(rig.audio(2), TickOutcome::Continue);
        assert_eq!(rig.shared.snapshot().playback.address, 6);
    }

    #[test]
    fn freeze_replays_one_window() {
        let mut rig = Rig::new();
        rig.params.grain_size = 16;
        rig.params.stretch = 1;
        let (first, _) = rig.record(0, 24);

        rig.front.ramping = false;
        rig.control(&gestures(false, Some(0)));
        rig.audio(20);
        let anchor = rig.shared.snapshot().playback.address;
        assert_eq!(anchor, 30);

        rig.control(&gestures(true, Some(0)));
        assert_eq!(rig.shared.snapshot().modifier, Modifier::Freeze { anchor });
        let a: [u16; 32] = rig.staged();
        let b: [u16; 32] = rig.staged();
        assert_eq!(a, b);
        assert_eq!(a[0], ramp(first, 20));
        assert_eq!(rig.shared.snapshot().mode, Mode::Playback(slot(0)));
    }

    #[test]
    fn capacity_ends_in_record_done() {
        let mut rig = Rig::new();
        rig.shared.with(|t| {
            t.slots.commit(slot(1), 600, 16_000);
        });
        let held = gestures(true, Some(0));
        assert_eq!(rig.control(&held), Some(ModeEvent::RecordStarted(slot(0))));

        let mut ticks = 0;
        while rig.audio(1) != TickOutcome::RecordingTerminated {
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(ticks + 1, 400);
        assert_eq!(rig.shared.mode(), Mode::RecordDone(slot(0)));

        let emitted = rig.front.emitted;
        rig.audio(TICKS_PER_MS);
        assert_eq!(rig.front.emitted, emitted);
        assert_eq!(rig.bank.devices().0.write_count(), 200);

        // Select release alone does not leave RECORD_DONE.
        assert_eq!(rig.control(&gestures(true, None)), None);
        assert_eq!(
            rig.control(&gestures(false, None)),
            Some(ModeEvent::RecordCommitted { slot: slot(0), end_address: 600 })
        );
        assert_eq!(rig.shared.mode(), Mode::Passthrough);
    }

    #[test]
    fn boundaries_survive_reboot() {
        let mut rig = Rig::new();
        let (first, end) = rig.record(3, 24);

        rig.shared = Shared::new();
        rig.controller = Controller::default();
        rig.engine = AudioEngine::new();
        assert_eq!(rig.controller.boot(&rig.shared, &mut rig.store).unwrap(), 1);
        assert_eq!(rig.shared.snapshot().slots.get(slot(3)).end_address, end);

        rig.front.ramping = false;
        rig.control(&gestures(false, None));
        assert_eq!(
            rig.control(&gestures(false, Some(3))),
            Some(ModeEvent::PlaybackStarted(slot(3)))
        );
        let out: [u16; 4] = rig.staged();
        assert_eq!(out, [ramp(first, 0), ramp(first, 1), ramp(first, 2), ramp(first, 3)]);
    }

    #[test]
    fn playback_rate_follows_pot_and_recording_rate() {
        let mut rig = Rig::new();
        rig.params.rate_hz = 8_000;
        rig.control(&gestures(false, None));
        assert_eq!(rig.clock.hz, 8_000);
        rig.record(0, 24);
        assert_eq!(rig.shared.snapshot().slots.get(slot(0)).record_rate_hz, 8_000);

        rig.params.rate_hz = 32_000;
        rig.control(&gestures(false, Some(0)));
        assert_eq!(rig.clock.hz, 16_000);
    }

    #[test]
    fn raw_buttons_drive_the_looper() {
        let config = LooperConfig::new();
        let mut bank = GestureBank::new(&config);
        let mut rig = Rig::new();

        let mut raw = RawButtons {
            reverse: true,
            grain: true,
            ..RawButtons::default()
        };
        // Chord held past debounce toggles bypass.
        for _ in 0..6 {
            let g = bank.update(rig.now, &raw);
            rig.control(&g);
        }
        assert!(rig.shared.params.chain().bypass);

        raw = RawButtons {
            record: true,
            select: [true, false, false, false],
            ..RawButtons::default()
        };
        let mut started = false;
        for _ in 0..10 {
            let g = bank.update(rig.now, &raw);
            if rig.control(&g) == Some(ModeEvent::RecordStarted(slot(0))) {
                started = true;
            }
            rig.audio(TICKS_PER_MS);
        }
        assert!(started);
        assert_eq!(rig.shared.mode(), Mode::Record(slot(0)));
        assert_eq!(rig.shared.snapshot().direction, Direction::Forward);
    }
}
