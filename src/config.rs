//! System configuration and hardware constants
//!
//! Compile-time settings for the sensor node. Bus timings, device addresses
//! and the measurement schedule are centralized here; [`NodeConfig`] carries
//! the subset that discovery and the measurement cycle consume at runtime.

use crate::drivers::ds28e17::I2cSpeed;
use crate::drivers::veml7700::{Gain, IntegrationTime, Veml7700Config};

/// Maximum number of devices tracked by the registry
pub const MAX_SENSORS: usize = 8;

/// Delay between Convert T and reading results, in milliseconds
///
/// Must exceed the DS18B20 worst-case conversion time (750 ms at 12 bits).
pub const SETTLE_INTERVAL_MS: u32 = 1000;

/// DS18B20 worst-case conversion time at 12-bit resolution
pub const DS18B20_CONVERSION_MS: u32 = 750;

const _: () = assert!(SETTLE_INTERVAL_MS > DS18B20_CONVERSION_MS);

/// Secondary I2C bus clock selected on every DS28E17
pub const BRIDGE_SPEED: I2cSpeed = I2cSpeed::Khz400;

/// Busy flag samples taken after the initial transfer wait
pub const BRIDGE_BUSY_CHECKS: u16 = 100;

/// Largest payload carried by a single bridge transaction
pub const BRIDGE_MAX_PAYLOAD: usize = 16;

/// MCP9808 I2C address (A2..A0 strapped low)
pub const MCP9808_I2C_ADDR: u8 = 0x18;

/// VEML7700 I2C address (fixed)
pub const VEML7700_I2C_ADDR: u8 = 0x10;

/// VEML7700 gain selected at build time
pub const VEML7700_GAIN: Gain = Gain::X1;

/// VEML7700 integration time selected at build time
pub const VEML7700_INTEGRATION_TIME: IntegrationTime = IntegrationTime::Ms100;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// 1-Wire data line (open drain, 4.7k pull-up to 3V3)
    pub const ONEWIRE_DATA: &str = "PA8";
}

/// Runtime view of the node configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    /// Secondary bus speed written to each bridge during discovery
    pub bridge_speed: I2cSpeed,
    /// Gain and integration time for every VEML7700
    pub veml7700: Veml7700Config,
    settle_interval_ms: u32,
}

impl NodeConfig {
    /// Configuration built from the compile-time constants
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bridge_speed: BRIDGE_SPEED,
            veml7700: Veml7700Config::new(VEML7700_GAIN, VEML7700_INTEGRATION_TIME),
            settle_interval_ms: SETTLE_INTERVAL_MS,
        }
    }

    /// Replace the settle delay after Convert T
    ///
    /// Returns `None` unless `ms` exceeds [`DS18B20_CONVERSION_MS`], so a
    /// cycle never reads a thermometer that is still converting.
    #[must_use]
    pub const fn with_settle_interval_ms(self, ms: u32) -> Option<Self> {
        if ms <= DS18B20_CONVERSION_MS {
            return None;
        }
        Some(Self {
            settle_interval_ms: ms,
            ..self
        })
    }

    /// Settle delay after Convert T, in milliseconds
    #[must_use]
    pub const fn settle_interval_ms(&self) -> u32 {
        self.settle_interval_ms
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::new()
    }
}
