//! Peripheral Drivers
//!
//! Drivers for the devices found on the 1-Wire bus: the `DS18B20` sits on
//! the bus directly, the `MCP9808` and `VEML7700` hang off a `DS28E17`
//! bridge and are reached through its [`RegisterBus`](ds28e17::RegisterBus).

pub mod ds18b20;
pub mod ds28e17;
pub mod mcp9808;
pub mod veml7700;
