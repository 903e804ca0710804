//! # looper-core
//!
//! A `no_std`, zero-allocation core for a four-slot audio looper/sampler
//! pedal: 12-bit audio recorded into two external SPI SRAMs, played back
//! forward or reverse through a resonant filter pair and a bit-crusher,
//! with grain-delay and buffer-freeze sub-looping.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Storage | [`slot`] | Four slots on two devices, bounds, record cursor |
//! | DSP | [`dsp`] | State-variable filters, clamp, bit-crush |
//! | Sub-loop | [`grain`] | Grain-delay and freeze cursor |
//! | State | [`mode`] / [`shared`] | Mode machine; state shared with the interrupt |
//! | Input | [`gesture`] / [`params`] | Button gestures, pot mapping |
//! | Control | [`control`] | Control-rate step, persistence, sample clock |
//! | Real time | [`engine`] | Per-sample interrupt routine |
//! | I/O | [`io`] / [`persist`] | Peripheral traits, drivers, boundary store |
//!
//! ## Execution model
//!
//! ```ignore
//! static SHARED: Shared = Shared::new();
//!
//! // Timer interrupt, once per sample:
//! engine.tick(&SHARED, &mut front_end, &mut storage);
//!
//! // Idle loop, as fast as inputs are polled:
//! let gestures = bank.update(now_ms, &buttons);
//! let params = ParamInputs::from_pots(&pots);
//! controller.tick(now_ms, &gestures, &params, &SHARED, &mut clock, &mut eeprom)?;
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `sram` | yes | 23LC512 SPI SRAM driver (requires `embedded-hal`) |
//! | `eeprom` | yes | 24LC I2C EEPROM driver (requires `embedded-hal`) |
//! | `dac` | yes | MCP4921 SPI DAC driver (requires `embedded-hal`) |
//! | `defmt` | no | Logging through `defmt` |
//!
//! ## Audio parameters
//!
//! - **Sample format:** unsigned 12-bit, midscale 2048 ([`constants::MIDSCALE`])
//! - **Sample rate:** 2–32 kHz, nominal 16 kHz ([`constants::NOMINAL_SAMPLE_RATE`])
//! - **Storage:** two samples per 3-byte record, 64 KiB per device

#![no_std]

#[macro_use]
mod fmt;

pub mod constants;
pub mod config;
pub mod slot;
pub mod io;
pub mod dsp;
pub mod grain;
pub mod mode;
pub mod shared;
pub mod gesture;
pub mod params;
pub mod persist;
pub mod control;
pub mod engine;

pub use config::LooperConfig;
pub use control::Controller;
pub use engine::{AudioEngine, TickOutcome};
pub use shared::Shared;
