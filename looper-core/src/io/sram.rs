//! Microchip 23LC512 SPI SRAM driver.
//!
//! 64 KiB, 16-bit addressing. The driver puts the part in sequential mode
//! so one transaction moves a whole packed record, and the address counter
//! wraps from `0xFFFF` to `0x0000` like the fake in [`super::memory`].
//!
//! # Example
//!
//! ```ignore
//! let mut chip_a = Sram23lc512::new(spi_device_a);
//! chip_a.init()?;
//! chip_a.write_packed(0, 2048, 2048)?;
//! ```

use embedded_hal::spi::{Operation, SpiDevice};

use super::packing::{pack, unpack, PACKED_BYTES};
use super::PackedStorage;

/// Instruction: read data from memory array.
const CMD_READ: u8 = 0x03;
/// Instruction: write data to memory array.
const CMD_WRITE: u8 = 0x02;
/// Instruction: write mode register.
const CMD_WRMR: u8 = 0x01;
/// Instruction: read mode register.
const CMD_RDMR: u8 = 0x05;

/// Mode register value for sequential operation.
pub const MODE_SEQUENTIAL: u8 = 0x40;

/// 23LC512 SRAM on a dedicated chip-select.
pub struct Sram23lc512<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Sram23lc512<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Select sequential mode. Call once after power-up.
    pub fn init(&mut self) -> Result<(), SPI::Error> {
        self.spi.write(&[CMD_WRMR, MODE_SEQUENTIAL])
    }

    /// Read back the mode register.
    pub fn mode(&mut self) -> Result<u8, SPI::Error> {
        let mut mode = [0u8; 1];
        self.spi.transaction(&mut [
            Operation::Write(&[CMD_RDMR]),
            Operation::Read(&mut mode),
        ])?;
        Ok(mode[0])
    }

    /// Release the SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> PackedStorage for Sram23lc512<SPI> {
    type Error = SPI::Error;

    fn write_packed(&mut self, address: u16, a: u16, b: u16) -> Result<(), Self::Error> {
        let [b0, b1, b2] = pack(a, b);
        let [hi, lo] = address.to_be_bytes();
        self.spi.write(&[CMD_WRITE, hi, lo, b0, b1, b2])
    }

    fn read_packed(&mut self, address: u16) -> Result<(u16, u16), Self::Error> {
        let [hi, lo] = address.to_be_bytes();
        let mut raw = [0u8; PACKED_BYTES];
        self.spi.transaction(&mut [
            Operation::Write(&[CMD_READ, hi, lo]),
            Operation::Read(&mut raw),
        ])?;
        Ok(unpack(raw))
    }
}
