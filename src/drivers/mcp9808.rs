//! `MCP9808` I2C Temperature Sensor Driver
//!
//! Reached through a [`RegisterBus`] (a `DS28E17` bridge in practice).
//! Registers are 16 bits, most significant byte first. The part free-runs,
//! so there is no conversion command.

use super::ds28e17::RegisterBus;
use crate::error::Result;
use crate::types::Decicelsius;

/// `MCP9808` register addresses
pub mod reg {
    /// Configuration
    pub const CONFIG: u8 = 0x01;
    /// Alert upper boundary
    pub const UPPER_TEMP: u8 = 0x02;
    /// Alert lower boundary
    pub const LOWER_TEMP: u8 = 0x03;
    /// Critical temperature
    pub const CRIT_TEMP: u8 = 0x04;
    /// Ambient temperature
    pub const AMBIENT_TEMP: u8 = 0x05;
    /// Manufacturer ID
    pub const MANUF_ID: u8 = 0x06;
    /// Device ID and revision
    pub const DEVICE_ID: u8 = 0x07;
}

/// Expected manufacturer ID
pub const MANUFACTURER_ID: u16 = 0x0054;

/// Expected device ID (upper byte) with revision 0
pub const DEVICE_ID: u16 = 0x0400;

/// Ambient register magnitude field (12 bits, 1/16 °C per LSB)
const AMBIENT_MAGNITUDE_MASK: u16 = 0x0FFF;

/// Ambient register sign bit
const AMBIENT_SIGN: u16 = 0x1000;

/// 256.0 °C in decicelsius, subtracted when the sign bit is set
const AMBIENT_SIGN_OFFSET: i32 = 2560;

/// `MCP9808` behind a register bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mcp9808 {
    address: u8,
}

impl Mcp9808 {
    /// Driver for the part at 7-bit `address`
    #[must_use]
    pub const fn new(address: u8) -> Self {
        Self { address }
    }

    fn read_u16<B: RegisterBus>(&self, bus: &mut B, reg: u8) -> Result<u16> {
        let mut raw = [0u8; 2];
        bus.read_register(self.address, reg, &mut raw)?;
        Ok(u16::from_be_bytes(raw))
    }

    /// Check manufacturer and device ID
    ///
    /// A failed read counts as "not an `MCP9808`": an absent or broken part
    /// and a different part give the same answer.
    pub fn probe<B: RegisterBus>(&self, bus: &mut B) -> bool {
        let Ok(manufacturer) = self.read_u16(bus, reg::MANUF_ID) else {
            return false;
        };
        let Ok(device) = self.read_u16(bus, reg::DEVICE_ID) else {
            return false;
        };
        manufacturer == MANUFACTURER_ID && device == DEVICE_ID
    }

    /// Read the ambient temperature
    ///
    /// # Errors
    ///
    /// Any transfer error from the register bus.
    pub fn read_decicelsius<B: RegisterBus>(&self, bus: &mut B) -> Result<Decicelsius> {
        let raw = self.read_u16(bus, reg::AMBIENT_TEMP)?;
        Ok(decode_ambient(raw))
    }
}

/// Convert the ambient register to decicelsius
///
/// Bits 0..12 hold the magnitude in 1/16 °C; bit 12 is the sign and is
/// applied by subtracting 256.0 °C. Alert flag bits 13..16 are ignored.
#[must_use]
pub fn decode_ambient(raw: u16) -> Decicelsius {
    let mut decicelsius = i32::from(raw & AMBIENT_MAGNITUDE_MASK) * 10 / 16;
    if raw & AMBIENT_SIGN != 0 {
        decicelsius -= AMBIENT_SIGN_OFFSET;
    }
    // Range is -2560..=2559
    #[allow(clippy::cast_possible_truncation)]
    Decicelsius::from_tenths(decicelsius as i16)
}
