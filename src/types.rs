//! Shared types used across the sensor node
//!
//! This module defines the identifiers and fixed-point readings that flow
//! between the transport, the decoders and the dispatcher.

use core::fmt;

use crate::crc::crc8;

/// 1-Wire ROM code length in bytes
pub const ROM_CODE_SIZE: usize = 8;

/// 1-Wire family code (first byte of a ROM code)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FamilyCode(u8);

impl FamilyCode {
    /// DS18B20 programmable resolution thermometer
    pub const DS18B20: Self = Self(0x28);

    /// DS28E17 1-Wire-to-I2C master bridge
    pub const DS28E17: Self = Self(0x19);

    /// Wrap a raw family byte
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Raw family byte
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FamilyCode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// 64-bit ROM code naming one device on the bus
///
/// Layout: `[family][serial x6][crc8]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId([u8; ROM_CODE_SIZE]);

impl DeviceId {
    /// Wrap a ROM code as read from the bus
    #[must_use]
    pub const fn new(rom: [u8; ROM_CODE_SIZE]) -> Self {
        Self(rom)
    }

    /// Build a ROM code from family and serial, computing the trailing CRC
    #[must_use]
    pub fn from_parts(family: FamilyCode, serial: [u8; 6]) -> Self {
        let mut rom = [0u8; ROM_CODE_SIZE];
        rom[0] = family.code();
        rom[1..7].copy_from_slice(&serial);
        rom[7] = crc8(&rom[..7]);
        Self(rom)
    }

    /// Family code (byte 0)
    #[must_use]
    pub const fn family(&self) -> FamilyCode {
        FamilyCode(self.0[0])
    }

    /// Raw ROM bytes in bus order
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ROM_CODE_SIZE] {
        &self.0
    }

    /// Check the trailing CRC8
    #[must_use]
    pub fn is_crc_valid(&self) -> bool {
        crc8(&self.0) == 0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId(")?;
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        write!(f, ")")
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DeviceId {
    fn format(&self, f: defmt::Formatter) {
        let r = &self.0;
        defmt::write!(
            f,
            "{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            r[0],
            r[1],
            r[2],
            r[3],
            r[4],
            r[5],
            r[6],
            r[7]
        );
    }
}

/// Runtime classification of a discovered device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SensorKind {
    /// Family code not handled by this node
    #[default]
    Unknown,
    /// DS18B20 directly on the 1-Wire bus
    Ds18b20,
    /// MCP9808 behind a DS28E17 bridge
    Mcp9808,
    /// VEML7700 behind a DS28E17 bridge
    Veml7700,
}

impl SensorKind {
    /// Part name used in reports
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Ds18b20 => "DS18B20",
            Self::Mcp9808 => "MCP9808",
            Self::Veml7700 => "VEML7700",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SensorKind {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name());
    }
}

/// Temperature in tenths of a degree Celsius (10 == 1.0 °C)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decicelsius(i16);

impl Decicelsius {
    /// Create from raw tenths of a degree
    #[must_use]
    pub const fn from_tenths(tenths: i16) -> Self {
        Self(tenths)
    }

    /// Raw tenths of a degree
    #[must_use]
    pub const fn tenths(self) -> i16 {
        self.0
    }

    /// Whole degrees, truncated toward zero
    #[must_use]
    pub const fn whole(self) -> i16 {
        self.0 / 10
    }

    /// Fractional digit (0-9) of the magnitude
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn fraction(self) -> u8 {
        (self.0.unsigned_abs() % 10) as u8
    }
}

impl fmt::Display for Decicelsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sign is written separately so -0.5 keeps its minus
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}.{}", self.whole().unsigned_abs(), self.fraction())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Decicelsius {
    fn format(&self, f: defmt::Formatter) {
        let sign = if self.0 < 0 { "-" } else { "" };
        defmt::write!(
            f,
            "{}{}.{} C",
            sign,
            self.whole().unsigned_abs(),
            self.fraction()
        );
    }
}

/// Illuminance in tenths of a lux (10 == 1.0 lx)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decilux(u32);

impl Decilux {
    /// Create from raw tenths of a lux
    #[must_use]
    pub const fn from_tenths(tenths: u32) -> Self {
        Self(tenths)
    }

    /// Raw tenths of a lux
    #[must_use]
    pub const fn tenths(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Decilux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Decilux {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}.{}lx", self.0 / 10, self.0 % 10);
    }
}

/// A decoded physical reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reading {
    /// Temperature in decicelsius
    Temperature(Decicelsius),
    /// Illuminance in decilux
    Illuminance(Decilux),
}

#[cfg(feature = "embedded")]
impl defmt::Format for Reading {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Temperature(t) => defmt::write!(f, "{}", t),
            Self::Illuminance(l) => defmt::write!(f, "{}", l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    fn display(value: impl fmt::Display) -> heapless::String<16> {
        let mut out = heapless::String::new();
        write!(out, "{value}").unwrap();
        out
    }

    #[test]
    fn decicelsius_parts() {
        let t = Decicelsius::from_tenths(235);
        assert_eq!((t.whole(), t.fraction()), (23, 5));

        let t = Decicelsius::from_tenths(-101);
        assert_eq!((t.whole(), t.fraction()), (-10, 1));
        assert_eq!(t.tenths(), -101);
    }

    #[test]
    fn decicelsius_below_one_degree_keeps_sign() {
        let t = Decicelsius::from_tenths(-5);
        assert_eq!((t.whole(), t.fraction()), (0, 5));
        assert_eq!(display(t).as_str(), "-0.5");
        assert_eq!(display(Decicelsius::from_tenths(5)).as_str(), "0.5");
    }

    #[test]
    fn decicelsius_extremes() {
        assert_eq!(display(Decicelsius::from_tenths(i16::MIN)).as_str(), "-3276.8");
        assert_eq!(display(Decicelsius::from_tenths(i16::MAX)).as_str(), "3276.7");
    }

    #[test]
    fn device_id_crc() {
        let id = DeviceId::from_parts(FamilyCode::DS18B20, [1, 2, 3, 4, 5, 6]);
        assert!(id.is_crc_valid());
        assert_eq!(id.family(), FamilyCode::DS18B20);

        let mut rom = *id.as_bytes();
        rom[3] ^= 0x80;
        assert!(!DeviceId::new(rom).is_crc_valid());
    }
}
