//! Looper pedal firmware.
//!
//! Four-slot 12-bit looper on a Teensy 4.1 with two 23LC512 SRAMs, an
//! MCP4921 DAC and a 24LC EEPROM for the slot boundaries.
//!
//! ```text
//!   PIT ch0 (sample rate) ──► AudioEngine::tick
//!        ADC2 (p24) ─► input          output ─► MCP4921
//!        SRAM A / SRAM B on LPSPI4
//!
//!   idle, every 1 ms (PIT ch1, polled)
//!        buttons + pots ─► GestureBank / ParamInputs ─► Controller::tick
//!        EEPROM on LPI2C1, sample clock = PIT ch0
//! ```
//!
//! Pins:
//!   p2:  record        p3-p6: select 0-3   p7: reverse   p8: grain
//!   p9:  SRAM A CS     p36: SRAM B CS      p37: DAC CS
//!   p11: SDO  p12: SDI  p13: SCK           p18: SDA  p19: SCL
//!   p14-p17, p20, p21: rate, resolution, low cut, high cut, grain size, stretch
//!   p24: audio input

#![no_std]
#![no_main]

use defmt_rtt as _;
use teensy4_panic as _;

/// Spin-loop delay for the SPI devices and the EEPROM write cycle.
struct AsmDelay;

impl embedded_hal::delay::DelayNs for AsmDelay {
    fn delay_ns(&mut self, ns: u32) {
        // 600 MHz core: 1 ns ≈ 0.6 cycles, rounded up.
        let cycles = (ns as u64 * 6 + 9) / 10;
        cortex_m::asm::delay(cycles as u32);
    }
}

#[rtic::app(device = teensy4_bsp, peripherals = true)]
mod app {
    use super::AsmDelay;
    use bsp::board;
    use bsp::hal;
    use bsp::pins::t41::{P14, P15, P16, P17, P2, P20, P21, P24, P3, P36, P37, P4, P5, P6, P7, P8, P9};
    use teensy4_bsp as bsp;

    use core::cell::RefCell;

    use embedded_hal_bus::spi::RefCellDevice;
    use hal::adc::{Adc, AnalogInput};
    use hal::gpio::{Input, Output};
    use hal::iomuxc;
    use hal::pit::Pit;

    use looper_core::gesture::{GestureBank, RawButtons};
    use looper_core::io::{AnalogFrontEnd, Eeprom24x, Mcp4921, SampleClock, Sram23lc512, StorageBank};
    use looper_core::params::{ParamInputs, PotReadings};
    use looper_core::{AudioEngine, Controller, LooperConfig, Shared as LooperShared};

    /// State shared by the control loop and the sample interrupt.
    static STATE: LooperShared = LooperShared::new();

    const SPI_HZ: u32 = 16_000_000;
    const CONTROL_PERIOD_MS: u32 = 1;

    type Spi = board::Lpspi4;
    type SpiDev<P> = RefCellDevice<'static, Spi, Output<P>, AsmDelay>;
    type Storage = StorageBank<Sram23lc512<SpiDev<P9>>, Sram23lc512<SpiDev<P36>>>;
    type Eeprom = Eeprom24x<board::Lpi2c1, AsmDelay>;

    /// ADC2 input and the DAC.
    pub struct FrontEnd {
        adc: Adc<2>,
        input: AnalogInput<P24, 2>,
        dac: Mcp4921<SpiDev<P37>>,
    }

    impl AnalogFrontEnd for FrontEnd {
        fn sample_input(&mut self) -> u16 {
            self.adc.read_blocking(&mut self.input)
        }

        fn emit_output(&mut self, sample: u16) -> bool {
            self.dac.write(sample).is_ok()
        }
    }

    /// Active-low buttons with pull-ups.
    pub struct Buttons {
        record: Input<P2>,
        select: (Input<P3>, Input<P4>, Input<P5>, Input<P6>),
        reverse: Input<P7>,
        grain: Input<P8>,
    }

    impl Buttons {
        fn read(&self) -> RawButtons {
            RawButtons {
                record: !self.record.is_set(),
                select: [
                    !self.select.0.is_set(),
                    !self.select.1.is_set(),
                    !self.select.2.is_set(),
                    !self.select.3.is_set(),
                ],
                reverse: !self.reverse.is_set(),
                grain: !self.grain.is_set(),
            }
        }
    }

    pub struct Pots {
        adc: Adc<1>,
        rate: AnalogInput<P14, 1>,
        resolution: AnalogInput<P15, 1>,
        low_cutoff: AnalogInput<P16, 1>,
        high_cutoff: AnalogInput<P17, 1>,
        grain_size: AnalogInput<P20, 1>,
        stretch: AnalogInput<P21, 1>,
    }

    impl Pots {
        fn read(&mut self) -> PotReadings {
            PotReadings {
                rate: self.adc.read_blocking(&mut self.rate),
                resolution: self.adc.read_blocking(&mut self.resolution),
                low_cutoff: self.adc.read_blocking(&mut self.low_cutoff),
                high_cutoff: self.adc.read_blocking(&mut self.high_cutoff),
                grain_size: self.adc.read_blocking(&mut self.grain_size),
                stretch: self.adc.read_blocking(&mut self.stretch),
            }
        }
    }

    /// Drives PIT channel 0 through the RTIC lock.
    struct PitClock<M>(M);

    impl<M: rtic::Mutex<T = Pit<0>>> SampleClock for PitClock<M> {
        fn set_sample_rate(&mut self, hz: u32) {
            let ticks = board::PERCLK_FREQUENCY / hz.max(1);
            self.0.lock(|pit| {
                pit.disable();
                pit.set_load_timer_value(ticks.saturating_sub(1));
                pit.enable();
            });
        }
    }

    // ── RTIC resources ───────────────────────────────────────────────

    #[local]
    struct Local {
        engine: AudioEngine,
        front: FrontEnd,
        storage: Storage,
        eeprom: Eeprom,
        controller: Controller,
        gestures: GestureBank,
        buttons: Buttons,
        pots: Pots,
        control_timer: Pit<1>,
    }

    #[shared]
    struct Shared {
        sample_timer: Pit<0>,
    }

    fn pulled_up<P: iomuxc::gpio::Pin>(mut pin: P) -> P {
        iomuxc::configure(
            &mut pin,
            iomuxc::Config::zero().set_pull_keeper(Some(iomuxc::PullKeeper::Pullup100k)),
        );
        pin
    }

    // ── Init ─────────────────────────────────────────────────────────

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        let board::Resources {
            pit: (mut sample_timer, mut control_timer, _, _),
            mut gpio2,
            mut gpio4,
            pins,
            lpi2c1,
            lpspi4,
            mut adc1,
            mut adc2,
            ..
        } = board::t41(cx.device);

        defmt::info!("looper firmware starting");

        // ── SPI bus: two SRAMs and the DAC ──────────────────────────
        let spi = board::lpspi(
            lpspi4,
            board::LpspiPins {
                pcs0: pins.p10,
                sck: pins.p13,
                sdo: pins.p11,
                sdi: pins.p12,
            },
            SPI_HZ,
        );
        let bus: &'static RefCell<Spi> =
            cortex_m::singleton!(: RefCell<Spi> = RefCell::new(spi)).expect("SPI bus");

        let cs_a = gpio2.output(pins.p9);
        let cs_b = gpio2.output(pins.p36);
        let cs_dac = gpio2.output(pins.p37);

        let mut sram_a = Sram23lc512::new(RefCellDevice::new(bus, cs_a, AsmDelay).expect("SRAM A CS"));
        let mut sram_b = Sram23lc512::new(RefCellDevice::new(bus, cs_b, AsmDelay).expect("SRAM B CS"));
        if sram_a.init().is_err() || sram_b.init().is_err() {
            defmt::warn!("SRAM mode register write failed");
        }
        let dac = Mcp4921::new(RefCellDevice::new(bus, cs_dac, AsmDelay).expect("DAC CS"));

        // ── EEPROM and persisted boundaries ─────────────────────────
        let i2c = board::lpi2c(lpi2c1, pins.p19, pins.p18, board::Lpi2cClockSpeed::KHz400);
        let mut eeprom = Eeprom24x::new(i2c, AsmDelay);
        let mut controller = Controller::new(LooperConfig::new());
        if controller.boot(&STATE, &mut eeprom).is_err() {
            defmt::warn!("EEPROM unavailable, starting with empty slots");
        }

        // ── Analog inputs ───────────────────────────────────────────
        adc1.set_resolution(hal::adc::ResolutionBits::Res12);
        adc2.set_resolution(hal::adc::ResolutionBits::Res12);
        let front = FrontEnd {
            adc: adc2,
            input: AnalogInput::new(pins.p24),
            dac,
        };
        let pots = Pots {
            adc: adc1,
            rate: AnalogInput::new(pins.p14),
            resolution: AnalogInput::new(pins.p15),
            low_cutoff: AnalogInput::new(pins.p16),
            high_cutoff: AnalogInput::new(pins.p17),
            grain_size: AnalogInput::new(pins.p20),
            stretch: AnalogInput::new(pins.p21),
        };

        let buttons = Buttons {
            record: gpio4.input(pulled_up(pins.p2)),
            select: (
                gpio4.input(pulled_up(pins.p3)),
                gpio4.input(pulled_up(pins.p4)),
                gpio4.input(pulled_up(pins.p5)),
                gpio2.input(pulled_up(pins.p6)),
            ),
            reverse: gpio2.input(pulled_up(pins.p7)),
            grain: gpio2.input(pulled_up(pins.p8)),
        };

        // ── Timers ──────────────────────────────────────────────────
        let nominal = looper_core::constants::NOMINAL_SAMPLE_RATE;
        sample_timer.set_load_timer_value(board::PERCLK_FREQUENCY / nominal - 1);
        sample_timer.set_interrupt_enable(true);
        sample_timer.enable();

        control_timer.set_load_timer_value(board::PERCLK_FREQUENCY / 1000 * CONTROL_PERIOD_MS - 1);
        control_timer.set_interrupt_enable(false);
        control_timer.enable();

        let gestures = GestureBank::new(controller.config());

        (
            Shared { sample_timer },
            Local {
                engine: AudioEngine::new(),
                front,
                storage: StorageBank::new(sram_a, sram_b),
                eeprom,
                controller,
                gestures,
                buttons,
                pots,
                control_timer,
            },
        )
    }

    // ── Control loop ─────────────────────────────────────────────────

    #[idle(local = [eeprom, controller, gestures, buttons, pots, control_timer], shared = [sample_timer])]
    fn idle(cx: idle::Context) -> ! {
        let idle::LocalResources {
            eeprom,
            controller,
            gestures,
            buttons,
            pots,
            control_timer,
            ..
        } = cx.local;
        let mut clock = PitClock(cx.shared.sample_timer);
        let mut now_ms: u32 = 0;

        loop {
            if !control_timer.is_elapsed() {
                continue;
            }
            control_timer.clear_elapsed();
            now_ms = now_ms.wrapping_add(CONTROL_PERIOD_MS);

            let inputs = gestures.update(now_ms, &buttons.read());
            let params = ParamInputs::from_pots(&pots.read());
            match controller.tick(now_ms, &inputs, &params, &STATE, &mut clock, eeprom) {
                Ok(Some(event)) => defmt::info!("{}", event),
                Ok(None) => {}
                Err(_) => defmt::warn!("boundary write failed"),
            }
        }
    }

    // ── Sample interrupt ─────────────────────────────────────────────

    #[task(binds = PIT, local = [engine, front, storage], shared = [sample_timer], priority = 2)]
    fn audio(mut cx: audio::Context) {
        cx.shared.sample_timer.lock(|pit| pit.clear_elapsed());
        let audio::LocalResources {
            engine,
            front,
            storage,
            ..
        } = cx.local;
        engine.tick(&STATE, front, storage);
    }
}
