//! `DS18B20` Digital Thermometer Driver
//!
//! Direct-bus temperature sensor. Conversion is started with Convert T and
//! the result is read from the 9-byte scratchpad, which carries its own CRC8.
//! Several sensors share the bus, so every command is preceded by Match ROM.

use crate::crc::crc8;
use crate::error::{Error, Result};
use crate::onewire::OneWire;
use crate::types::{Decicelsius, DeviceId};

/// `DS18B20` function commands
mod cmd {
    pub const CONVERT_T: u8 = 0x44;
    pub const READ_SCRATCHPAD: u8 = 0xBE;
}

/// Scratchpad length including the CRC byte
pub const SCRATCHPAD_SIZE: usize = 9;

/// Lowest temperature the part is specified for (-55.0 °C)
pub const MIN_DECICELSIUS: i16 = -550;

/// Highest temperature the part is specified for (+125.0 °C)
pub const MAX_DECICELSIUS: i16 = 1250;

/// Start a temperature conversion on one sensor
///
/// The result is ready after the conversion time; the caller waits.
///
/// # Errors
///
/// [`Error::Bus`] when the sensor cannot be selected or written.
pub fn start_conversion<W: OneWire>(wire: &mut W, id: &DeviceId) -> Result<()> {
    wire.select(id)?;
    wire.write(&[cmd::CONVERT_T])
}

/// Read the scratchpad and verify its CRC8
///
/// # Errors
///
/// [`Error::Bus`] on transfer failure, [`Error::Checksum`] on a corrupt frame.
pub fn read_scratchpad<W: OneWire>(wire: &mut W, id: &DeviceId) -> Result<[u8; SCRATCHPAD_SIZE]> {
    let mut scratchpad = [0u8; SCRATCHPAD_SIZE];
    wire.select(id)?;
    wire.write(&[cmd::READ_SCRATCHPAD])?;
    wire.read(&mut scratchpad)?;

    if crc8(&scratchpad) != 0 {
        return Err(Error::Checksum);
    }
    Ok(scratchpad)
}

/// Read the last converted temperature
///
/// # Errors
///
/// Transfer and checksum errors from [`read_scratchpad`], and
/// [`Error::OutOfRange`] when the value lies outside -55.0..=125.0 °C.
pub fn read_decicelsius<W: OneWire>(wire: &mut W, id: &DeviceId) -> Result<Decicelsius> {
    let scratchpad = read_scratchpad(wire, id)?;
    decode_scratchpad(&scratchpad)
}

/// Decode the temperature register of a verified scratchpad
///
/// # Errors
///
/// [`Error::OutOfRange`] outside the specified envelope.
pub fn decode_scratchpad(scratchpad: &[u8; SCRATCHPAD_SIZE]) -> Result<Decicelsius> {
    raw_to_decicelsius(u16::from_le_bytes([scratchpad[0], scratchpad[1]]))
}

/// Convert a raw two's complement reading (1/16 °C per LSB) to decicelsius
///
/// 0.0625 is computed as 640/1024. Positive values round half up through
/// the +512 addend; negative values truncate toward zero.
///
/// # Errors
///
/// [`Error::OutOfRange`] outside -55.0..=125.0 °C. Values are never clamped.
pub fn raw_to_decicelsius(raw: u16) -> Result<Decicelsius> {
    let negative = raw & 0x8000 != 0;
    let magnitude = if negative {
        (raw ^ 0xFFFF).wrapping_add(1)
    } else {
        raw
    };

    let mut fraction = i32::from(magnitude & 0x000F) * 640;
    if !negative {
        fraction += 512;
    }
    let mut decicelsius = i32::from(magnitude >> 4) * 10 + fraction / 1024;
    if negative {
        decicelsius = -decicelsius;
    }

    if decicelsius < i32::from(MIN_DECICELSIUS) || decicelsius > i32::from(MAX_DECICELSIUS) {
        return Err(Error::OutOfRange);
    }
    i16::try_from(decicelsius)
        .map(Decicelsius::from_tenths)
        .map_err(|_| Error::OutOfRange)
}
