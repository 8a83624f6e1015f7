//! Discovery and Dispatch
//!
//! Runs the sensor node: one discovery pass that classifies every device on
//! the bus, then a measurement cycle repeated forever.
//!
//! ```text
//!   Discovering ──(registry built)──▶ SteadyState ──┐
//!                                        ▲          │ Convert T, settle,
//!                                        └──────────┘ read every device
//! ```
//!
//! The registry is an owned value handed to each routine by reference.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::config::{NodeConfig, MAX_SENSORS, MCP9808_I2C_ADDR, VEML7700_I2C_ADDR};
use crate::drivers::ds18b20;
use crate::drivers::ds28e17::{Ds28e17, I2cSpeed};
use crate::drivers::mcp9808::Mcp9808;
use crate::drivers::veml7700::Veml7700;
use crate::error::Result;
use crate::onewire::{Bus, OneWire};
use crate::report::{Outcome, Report};
use crate::types::{DeviceId, FamilyCode, Reading, SensorKind};

/// Families searched during discovery, in registry order
pub const SEARCH_FAMILIES: [FamilyCode; 2] = [FamilyCode::DS18B20, FamilyCode::DS28E17];

/// Decoder selected for a device, with the data that decoder needs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    /// Not handled; reported without a read
    Unknown,
    /// `DS18B20` on the 1-Wire bus
    Ds18b20,
    /// `MCP9808` behind a bridge running at `speed`
    Mcp9808 {
        /// Bridge I2C speed
        speed: I2cSpeed,
        /// Sensor driver
        sensor: Mcp9808,
    },
    /// `VEML7700` behind a bridge running at `speed`
    Veml7700 {
        /// Bridge I2C speed
        speed: I2cSpeed,
        /// Sensor driver
        sensor: Veml7700,
    },
}

impl Device {
    /// Classification tag
    #[must_use]
    pub const fn kind(&self) -> SensorKind {
        match self {
            Self::Unknown => SensorKind::Unknown,
            Self::Ds18b20 => SensorKind::Ds18b20,
            Self::Mcp9808 { .. } => SensorKind::Mcp9808,
            Self::Veml7700 { .. } => SensorKind::Veml7700,
        }
    }
}

/// A registered device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sensor {
    id: DeviceId,
    device: Device,
}

impl Sensor {
    /// Pair a ROM code with its decoder
    #[must_use]
    pub const fn new(id: DeviceId, device: Device) -> Self {
        Self { id, device }
    }

    /// ROM code (of the bridge, for bridged sensors)
    #[must_use]
    pub const fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Selected decoder
    #[must_use]
    pub const fn device(&self) -> &Device {
        &self.device
    }

    /// Classification tag
    #[must_use]
    pub const fn kind(&self) -> SensorKind {
        self.device.kind()
    }
}

/// Fixed-capacity, ordered table of classified devices
///
/// Filled once by [`discover`]; entries are never reclassified.
#[derive(Clone, Debug, Default)]
pub struct SensorRegistry {
    sensors: Vec<Sensor, MAX_SENSORS>,
}

impl SensorRegistry {
    /// Empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sensors: Vec::new(),
        }
    }

    /// Append a device, handing it back when the table is full
    ///
    /// # Errors
    ///
    /// Returns the rejected sensor when all `MAX_SENSORS` slots are used.
    pub fn push(&mut self, sensor: Sensor) -> core::result::Result<(), Sensor> {
        self.sensors.push(sensor)
    }

    /// Registered devices in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Sensor> + '_ {
        self.sensors.iter()
    }

    /// Device at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Sensor> {
        self.sensors.get(index)
    }

    /// Number of registered devices
    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// True when nothing was discovered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Number of devices of one kind
    #[must_use]
    pub fn count(&self, kind: SensorKind) -> usize {
        self.sensors.iter().filter(|s| s.kind() == kind).count()
    }
}

/// Result of the discovery pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoverySummary {
    /// Devices found directly on the bus (`DS18B20`)
    pub direct: usize,
    /// Bridges found (`DS28E17`)
    pub bridged: usize,
    /// Registry capacity
    pub capacity: usize,
}

/// Enumerate every device of each family in `families`
///
/// Returns the ROM codes in family order and the count per family. A family
/// whose search fails contributes no devices; the failure is logged.
pub fn search_devices<W: OneWire, const F: usize>(
    wire: &mut W,
    families: &[FamilyCode; F],
) -> (Vec<DeviceId, MAX_SENSORS>, [usize; F]) {
    let mut ids = Vec::new();
    let mut counts = [0; F];

    for (family, count) in families.iter().zip(counts.iter_mut()) {
        let start = ids.len();
        match wire.search_family(*family, &mut ids) {
            Ok(found) => *count = found,
            Err(e) => {
                error!("search for family {} failed: {}", family, e);
                ids.truncate(start);
            }
        }
    }

    (ids, counts)
}

/// Decide which sensor sits behind a bridge
///
/// The `MCP9808` answers an ID probe; the `VEML7700` has no reliable ID, so
/// anything that does not probe as an `MCP9808` is taken to be one.
pub fn classify_bridge<W, D>(bus: &mut Bus<W, D>, id: DeviceId, config: &NodeConfig) -> Device
where
    W: OneWire,
    D: DelayNs,
{
    let mut bridge = Ds28e17::new(bus, id, config.bridge_speed);
    if let Err(e) = bridge.configure() {
        warn!("DS28E17 {}: speed configuration failed: {}", id, e);
    }

    let mcp9808 = Mcp9808::new(MCP9808_I2C_ADDR);
    if mcp9808.probe(&mut bridge) {
        return Device::Mcp9808 {
            speed: config.bridge_speed,
            sensor: mcp9808,
        };
    }

    let veml7700 = Veml7700::new(VEML7700_I2C_ADDR, config.veml7700);
    if let Err(e) = veml7700.init(&mut bridge) {
        warn!("VEML7700 behind {}: init failed: {}", id, e);
    }
    Device::Veml7700 {
        speed: config.bridge_speed,
        sensor: veml7700,
    }
}

/// Classify one discovered device by family code, probing bridges
pub fn classify<W, D>(bus: &mut Bus<W, D>, id: DeviceId, config: &NodeConfig) -> Device
where
    W: OneWire,
    D: DelayNs,
{
    match id.family() {
        FamilyCode::DS18B20 => Device::Ds18b20,
        FamilyCode::DS28E17 => classify_bridge(bus, id, config),
        _ => Device::Unknown,
    }
}

/// Discovery pass: search the bus and fill `registry`
pub fn discover<W, D>(
    bus: &mut Bus<W, D>,
    registry: &mut SensorRegistry,
    config: &NodeConfig,
) -> DiscoverySummary
where
    W: OneWire,
    D: DelayNs,
{
    let (ids, counts) = search_devices(&mut bus.wire, &SEARCH_FAMILIES);

    for id in ids {
        let device = classify(bus, id, config);
        debug!("{} classified as {}", id, device.kind());
        if registry.push(Sensor::new(id, device)).is_err() {
            warn!("registry full, dropping {}", id);
        }
    }

    let summary = DiscoverySummary {
        direct: counts[0],
        bridged: counts[1],
        capacity: MAX_SENSORS,
    };
    info!(
        "Found {} native and {} bridged sensors of {} total",
        summary.direct,
        summary.bridged,
        summary.capacity
    );
    summary
}

/// Send Convert T to every `DS18B20`
///
/// Bridges never receive it. Failures are reported per device and do not
/// stop the pass. Returns the number of conversions started.
pub fn start_conversions<W, D, R>(
    bus: &mut Bus<W, D>,
    registry: &SensorRegistry,
    reporter: &mut R,
) -> usize
where
    W: OneWire,
    D: DelayNs,
    R: Report,
{
    let mut started = 0;
    for (index, sensor) in registry.iter().enumerate() {
        if sensor.device != Device::Ds18b20 {
            continue;
        }
        match ds18b20::start_conversion(&mut bus.wire, &sensor.id) {
            Ok(()) => started += 1,
            Err(e) => reporter.conversion_failed(index, e),
        }
    }
    started
}

/// Read one device through the decoder its classification selected
pub fn read_sensor<W, D>(bus: &mut Bus<W, D>, sensor: &Sensor) -> Outcome
where
    W: OneWire,
    D: DelayNs,
{
    let result: Result<Reading> = match sensor.device {
        Device::Unknown => return Outcome::Unknown,
        Device::Ds18b20 => {
            ds18b20::read_decicelsius(&mut bus.wire, &sensor.id).map(Reading::Temperature)
        }
        Device::Mcp9808 { speed, sensor: mcp9808 } => {
            let mut bridge = Ds28e17::new(bus, sensor.id, speed);
            mcp9808
                .read_decicelsius(&mut bridge)
                .map(Reading::Temperature)
        }
        Device::Veml7700 { speed, sensor: veml7700 } => {
            let mut bridge = Ds28e17::new(bus, sensor.id, speed);
            veml7700
                .read_decilux(&mut bridge)
                .map(Reading::Illuminance)
        }
    };
    result.into()
}

/// Read every registered device and report each outcome
pub fn read_all<W, D, R>(bus: &mut Bus<W, D>, registry: &SensorRegistry, reporter: &mut R)
where
    W: OneWire,
    D: DelayNs,
    R: Report,
{
    for (index, sensor) in registry.iter().enumerate() {
        let outcome = read_sensor(bus, sensor);
        reporter.reading(index, sensor.kind(), outcome);
    }
    reporter.end_cycle();
}

/// One measurement cycle: Convert T, settle, read everything
pub fn run_cycle<W, D, R>(
    bus: &mut Bus<W, D>,
    registry: &SensorRegistry,
    config: &NodeConfig,
    reporter: &mut R,
) where
    W: OneWire,
    D: DelayNs,
    R: Report,
{
    let started = start_conversions(bus, registry, reporter);
    trace!("{} conversions started", started);
    bus.delay.delay_ms(config.settle_interval_ms());
    read_all(bus, registry, reporter);
}

/// Node lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Discovery has not run yet
    Discovering,
    /// Registry is built; measuring forever
    SteadyState,
}

/// The sensor node: configuration, registry and lifecycle state
pub struct SensorNode {
    config: NodeConfig,
    registry: SensorRegistry,
    state: NodeState,
}

impl SensorNode {
    /// Node waiting for its discovery pass
    #[must_use]
    pub const fn new(config: NodeConfig) -> Self {
        Self {
            config,
            registry: SensorRegistry::new(),
            state: NodeState::Discovering,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> NodeState {
        self.state
    }

    /// Classified devices
    #[must_use]
    pub const fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Advance the state machine by one step
    ///
    /// The first call runs discovery; every later call runs one cycle.
    pub fn step<W, D, R>(&mut self, bus: &mut Bus<W, D>, reporter: &mut R)
    where
        W: OneWire,
        D: DelayNs,
        R: Report,
    {
        match self.state {
            NodeState::Discovering => {
                discover(bus, &mut self.registry, &self.config);
                self.state = NodeState::SteadyState;
            }
            NodeState::SteadyState => {
                run_cycle(bus, &self.registry, &self.config, reporter);
            }
        }
    }

    /// Discover, then measure forever
    pub fn run<W, D, R>(&mut self, bus: &mut Bus<W, D>, reporter: &mut R) -> !
    where
        W: OneWire,
        D: DelayNs,
        R: Report,
    {
        loop {
            self.step(bus, reporter);
        }
    }
}
