//! `VEML7700` Ambient Light Sensor Driver
//!
//! Reached through a [`RegisterBus`]. Registers are 16 bits, least
//! significant byte first. Gain and integration time are written once by
//! [`Veml7700::init`]; the lux scale used by [`Veml7700::read_decilux`] is
//! derived from the same [`Veml7700Config`], so both must agree.

use super::ds28e17::RegisterBus;
use crate::error::Result;
use crate::types::Decilux;

/// `VEML7700` register addresses
pub mod reg {
    /// ALS configuration
    pub const ALS_CONF_0: u8 = 0x00;
    /// ALS high-resolution output
    pub const ALS: u8 = 0x04;
}

/// Resolution at gain x2 and 800 ms, in 1/10000 lx per count
const BASE_FACTOR: u32 = 36;

/// Divisor bringing `raw * factor` to decilux
const SCALE_DIVISOR: u32 = 1000;

/// ALS gain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Gain {
    /// x2
    X2,
    /// x1
    #[default]
    X1,
    /// x1/4
    Quarter,
    /// x1/8
    Eighth,
}

impl Gain {
    /// `ALS_GAIN` field, already shifted into place
    #[must_use]
    #[allow(clippy::identity_op)]
    pub const fn bits(self) -> u16 {
        match self {
            Self::X1 => 0 << 11,
            Self::X2 => 1 << 11,
            Self::Eighth => 2 << 11,
            Self::Quarter => 3 << 11,
        }
    }

    /// Resolution multiplier relative to x2
    #[must_use]
    pub const fn factor(self) -> u32 {
        match self {
            Self::X2 => 1,
            Self::X1 => 2,
            Self::Quarter => 8,
            Self::Eighth => 16,
        }
    }
}

/// ALS integration time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IntegrationTime {
    /// 25 ms
    Ms25,
    /// 50 ms
    Ms50,
    /// 100 ms
    #[default]
    Ms100,
    /// 200 ms
    Ms200,
    /// 400 ms
    Ms400,
    /// 800 ms
    Ms800,
}

impl IntegrationTime {
    /// `ALS_IT` field, already shifted into place
    #[must_use]
    #[allow(clippy::identity_op)]
    pub const fn bits(self) -> u16 {
        match self {
            Self::Ms800 => 3 << 6,
            Self::Ms400 => 2 << 6,
            Self::Ms200 => 1 << 6,
            Self::Ms100 => 0 << 6,
            Self::Ms50 => 8 << 6,
            Self::Ms25 => 12 << 6,
        }
    }

    /// Resolution multiplier relative to 800 ms
    #[must_use]
    pub const fn factor(self) -> u32 {
        match self {
            Self::Ms800 => 1,
            Self::Ms400 => 2,
            Self::Ms200 => 4,
            Self::Ms100 => 8,
            Self::Ms50 => 16,
            Self::Ms25 => 32,
        }
    }
}

/// Gain and integration time pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Veml7700Config {
    /// ALS gain
    pub gain: Gain,
    /// ALS integration time
    pub integration_time: IntegrationTime,
}

impl Veml7700Config {
    /// Combine a gain and an integration time
    #[must_use]
    pub const fn new(gain: Gain, integration_time: IntegrationTime) -> Self {
        Self {
            gain,
            integration_time,
        }
    }

    /// `ALS_CONF_0` value: power on, interrupts off, persistence 1
    #[must_use]
    pub const fn conf_register(self) -> u16 {
        self.gain.bits() | self.integration_time.bits()
    }

    /// Lux scale numerator, `BASE_FACTOR * gain * integration time`
    #[must_use]
    pub const fn scale_factor(self) -> u32 {
        BASE_FACTOR * self.gain.factor() * self.integration_time.factor()
    }

    /// Scale a raw ALS count to decilux (truncating)
    #[must_use]
    pub fn scale(self, raw: u16) -> Decilux {
        Decilux::from_tenths(u32::from(raw) * self.scale_factor() / SCALE_DIVISOR)
    }
}

impl Default for Veml7700Config {
    fn default() -> Self {
        Self::new(Gain::default(), IntegrationTime::default())
    }
}

/// `VEML7700` behind a register bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Veml7700 {
    address: u8,
    config: Veml7700Config,
}

impl Veml7700 {
    /// Driver for the part at 7-bit `address` using `config`
    #[must_use]
    pub const fn new(address: u8, config: Veml7700Config) -> Self {
        Self { address, config }
    }

    /// Write gain and integration time, powering the ALS on
    ///
    /// # Errors
    ///
    /// Any transfer error from the register bus.
    pub fn init<B: RegisterBus>(&self, bus: &mut B) -> Result<()> {
        let conf = self.config.conf_register().to_le_bytes();
        bus.write_register(self.address, reg::ALS_CONF_0, &conf)
    }

    /// Read the ALS output as decilux
    ///
    /// # Errors
    ///
    /// Any transfer error from the register bus.
    pub fn read_decilux<B: RegisterBus>(&self, bus: &mut B) -> Result<Decilux> {
        let mut raw = [0u8; 2];
        bus.read_register(self.address, reg::ALS, &mut raw)?;
        Ok(self.config.scale(u16::from_le_bytes(raw)))
    }
}
