//! Microchip MCP4921 12-bit SPI DAC.
//!
//! The i.MX RT1062 has no on-chip DAC, so the output half of the analog
//! front end is this part on its own chip-select.

use embedded_hal::spi::SpiDevice;

use crate::constants::SAMPLE_MAX;

/// Config nibble: unbuffered VREF, 1x gain, output active.
const CONFIG_BITS: u16 = 0x3000;

pub struct Mcp4921<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Mcp4921<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Latch a 12-bit code onto the output.
    pub fn write(&mut self, code: u16) -> Result<(), SPI::Error> {
        let word = CONFIG_BITS | (code & SAMPLE_MAX);
        self.spi.write(&word.to_be_bytes())
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}
