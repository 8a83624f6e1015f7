//! 1-Wire Sensor Node Firmware Library
//!
//! This library provides the core functionality for an STM32G474-based
//! environmental sensor node. A single 1-Wire bus carries `DS18B20`
//! thermometers and `DS28E17` 1-Wire-to-I2C bridges; each bridge fronts one
//! I2C sensor (`MCP9808` temperature or `VEML7700` ambient light).
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                        │
//! │  Discovery  │  Measurement cycle  │  Reporting              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     DECODER LAYER                           │
//! │  DS18B20  │  MCP9808  │  VEML7700                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  BRIDGE / TRANSPORT LAYER                   │
//! │  DS28E17 register bus  │  1-Wire (reset, bits, ROM search)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     PIN / DELAY HAL                         │
//! │           embedded-hal 1.0 (open-drain pin, DelayNs)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Blocking, single-threaded**: every transaction runs to completion
//! - **Type-driven design**: fixed-point readings, tagged device variants
//! - **No allocation**: fixed-capacity `heapless` containers
//! - **Functional core, imperative shell**: decoders are pure functions
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod log;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// System configuration and constants
pub mod config;

/// Checksums used on the wire
pub mod crc;

/// Device Drivers
///
/// Bridge protocol and sensor decoders.
pub mod drivers;

/// Error type shared by every layer
pub mod error;

/// Discovery, classification and the measurement cycle
pub mod node;

/// 1-Wire Transport
///
/// Bus primitives, ROM search and the bit-banged pin driver.
pub mod onewire;

/// Report line formatting and sinks
pub mod report;

/// Shared types used across modules
pub mod types;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::error::{Error, Result};
    pub use crate::node::{SensorNode, SensorRegistry};
    pub use crate::onewire::{BitBangWire, Bus, OneWire};
    pub use crate::report::{LogReporter, Report};
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::delay::DelayNs;
    pub use embedded_hal::digital::{InputPin, OutputPin};

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Delay, Duration, Timer};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
