//! 24-series I2C EEPROM driver (24LC32 .. 24LC512).
//!
//! Holds the persisted slot boundaries. Writes are byte-wise and each one is
//! followed by the part's self-timed write cycle, so callers should only
//! write from the control loop, never from the audio interrupt.
//!
//! The driver is generic over any [`embedded_hal::i2c::I2c`] and
//! [`embedded_hal::delay::DelayNs`] implementation.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::BoundaryStore;

/// Default 7-bit address (A2..A0 tied low).
pub const DEFAULT_ADDRESS: u8 = 0x50;

/// Worst-case self-timed write cycle in milliseconds.
pub const WRITE_CYCLE_MS: u32 = 5;

/// 24-series EEPROM with two-byte word addressing.
pub struct Eeprom24x<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> Eeprom24x<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a driver at [`DEFAULT_ADDRESS`].
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::new_with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn new_with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self { i2c, delay, address }
    }

    /// Release the bus and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> BoundaryStore for Eeprom24x<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn read_byte(&mut self, offset: u16) -> Result<u8, Self::Error> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &offset.to_be_bytes(), &mut value)?;
        Ok(value[0])
    }

    fn write_byte(&mut self, offset: u16, value: u8) -> Result<(), Self::Error> {
        let [hi, lo] = offset.to_be_bytes();
        self.i2c.write(self.address, &[hi, lo, value])?;
        self.delay.delay_ms(WRITE_CYCLE_MS);
        Ok(())
    }
}
