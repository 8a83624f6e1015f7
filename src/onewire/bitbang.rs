//! Bit-banged 1-Wire master on an open-drain GPIO
//!
//! The pin must be configured open drain with an external pull-up: driving
//! it high releases the line. Each time slot runs inside a critical section
//! so an interrupt cannot stretch the sample window.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::OneWire;
use crate::error::{Error, Result};

// Reset and presence detection
const RESET_LOW_US: u32 = 480;
const PRESENCE_WAIT_US: u32 = 70;
const PRESENCE_RELEASE_US: u32 = 410;

// Write slots
const WRITE_1_LOW_US: u32 = 6;
const WRITE_1_HIGH_US: u32 = 64;
const WRITE_0_LOW_US: u32 = 60;
const WRITE_0_HIGH_US: u32 = 10;

// Read slot (init, sample, recovery)
const READ_INIT_LOW_US: u32 = 6;
const READ_SAMPLE_US: u32 = 9;
const READ_RECOVERY_US: u32 = 55;

/// 1-Wire master driving a single GPIO
pub struct BitBangWire<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> BitBangWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Create a master on an open-drain pin
    #[must_use]
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Give back the pin and delay
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn set_low(&mut self) -> Result<()> {
        self.pin.set_low().map_err(|_| Error::Bus)
    }

    fn set_high(&mut self) -> Result<()> {
        self.pin.set_high().map_err(|_| Error::Bus)
    }
}

impl<P, D> OneWire for BitBangWire<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn reset(&mut self) -> Result<bool> {
        // A released line must read high; low here means a short to ground
        if !self.pin.is_high().map_err(|_| Error::Bus)? {
            warn!("1-Wire line held low before reset");
            return Err(Error::Bus);
        }

        self.set_low()?;
        self.delay.delay_us(RESET_LOW_US);

        let present = critical_section::with(|_| {
            self.set_high()?;
            self.delay.delay_us(PRESENCE_WAIT_US);
            // Devices pull the line low to signal presence
            self.pin.is_low().map_err(|_| Error::Bus)
        })?;

        self.delay.delay_us(PRESENCE_RELEASE_US);
        Ok(present)
    }

    fn write_bit(&mut self, bit: bool) -> Result<()> {
        let (low_us, high_us) = if bit {
            (WRITE_1_LOW_US, WRITE_1_HIGH_US)
        } else {
            (WRITE_0_LOW_US, WRITE_0_HIGH_US)
        };

        critical_section::with(|_| {
            self.set_low()?;
            self.delay.delay_us(low_us);
            self.set_high()
        })?;

        self.delay.delay_us(high_us);
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool> {
        let bit = critical_section::with(|_| {
            self.set_low()?;
            self.delay.delay_us(READ_INIT_LOW_US);
            self.set_high()?;
            self.delay.delay_us(READ_SAMPLE_US);
            self.pin.is_high().map_err(|_| Error::Bus)
        })?;

        self.delay.delay_us(READ_RECOVERY_US);
        Ok(bit)
    }
}
