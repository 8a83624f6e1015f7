//! Simulated 1-Wire bus shared by the integration tests
//!
//! `SimBus` works at the byte level: it overrides selection, byte transfers
//! and the family search of `OneWire`, and models DS18B20 thermometers and
//! DS28E17 bridges with one I2C target each.

#![allow(dead_code)]

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use heapless::Vec as HVec;

use ow_sensor_node::crc::{crc16_arc, crc8, CRC16_ARC_INIT};
use ow_sensor_node::error::{Error, Result};
use ow_sensor_node::onewire::OneWire;
use ow_sensor_node::report::{Outcome, Report};
use ow_sensor_node::types::{DeviceId, FamilyCode, SensorKind};

// ============================================================================
// Devices
// ============================================================================

/// I2C device behind a simulated bridge
#[derive(Clone, Debug)]
pub enum Target {
    /// MCP9808 at 0x18
    Mcp9808 {
        ambient: u16,
        manufacturer: u16,
        device: u16,
    },
    /// VEML7700 at 0x10; `conf` records the last configuration write
    Veml7700 { als: u16, conf: Option<u16> },
    /// Nothing answers
    Absent,
}

impl Target {
    pub fn mcp9808(ambient: u16) -> Self {
        Self::Mcp9808 {
            ambient,
            manufacturer: 0x0054,
            device: 0x0400,
        }
    }

    pub fn veml7700(als: u16) -> Self {
        Self::Veml7700 { als, conf: None }
    }

    const fn address(&self) -> Option<u8> {
        match self {
            Self::Mcp9808 { .. } => Some(0x18),
            Self::Veml7700 { .. } => Some(0x10),
            Self::Absent => None,
        }
    }

    fn read(&self, reg: u8, count: usize) -> Vec<u8> {
        let word = match (self, reg) {
            (Self::Mcp9808 { ambient, .. }, 0x05) => ambient.to_be_bytes(),
            (Self::Mcp9808 { manufacturer, .. }, 0x06) => manufacturer.to_be_bytes(),
            (Self::Mcp9808 { device, .. }, 0x07) => device.to_be_bytes(),
            (Self::Veml7700 { als, .. }, 0x04) => als.to_le_bytes(),
            _ => [0, 0],
        };
        word.iter().copied().cycle().take(count).collect()
    }

    fn write(&mut self, reg: u8, payload: &[u8]) {
        if let (Self::Veml7700 { conf, .. }, 0x00, [lo, hi]) = (self, reg, payload) {
            *conf = Some(u16::from_le_bytes([*lo, *hi]));
        }
    }
}

#[derive(Clone, Debug)]
pub enum SimDevice {
    Ds18b20 {
        id: DeviceId,
        scratchpad: [u8; 9],
    },
    Bridge {
        id: DeviceId,
        target: Target,
        speed_code: u8,
        busy: VecDeque<bool>,
        always_busy: bool,
        status_override: Option<[u8; 2]>,
    },
}

impl SimDevice {
    pub fn ds18b20(serial: u8, raw: u16) -> Self {
        Self::Ds18b20 {
            id: ds18b20_id(serial),
            scratchpad: scratchpad(raw),
        }
    }

    pub fn bridge(serial: u8, target: Target) -> Self {
        Self::Bridge {
            id: bridge_id(serial),
            target,
            speed_code: 0,
            busy: VecDeque::new(),
            always_busy: false,
            status_override: None,
        }
    }

    pub const fn id(&self) -> DeviceId {
        match self {
            Self::Ds18b20 { id, .. } | Self::Bridge { id, .. } => *id,
        }
    }
}

pub fn ds18b20_id(serial: u8) -> DeviceId {
    DeviceId::from_parts(FamilyCode::DS18B20, [serial, 0x11, 0x22, 0x33, 0x44, 0x55])
}

pub fn bridge_id(serial: u8) -> DeviceId {
    DeviceId::from_parts(FamilyCode::DS28E17, [serial, 0xA0, 0xB0, 0xC0, 0xD0, 0xE0])
}

/// Scratchpad holding `raw` with a valid CRC8
pub fn scratchpad(raw: u16) -> [u8; 9] {
    let [lo, hi] = raw.to_le_bytes();
    let mut bytes = [lo, hi, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0];
    bytes[8] = crc8(&bytes[..8]);
    bytes
}

// ============================================================================
// Bus
// ============================================================================

/// One primitive seen by the bus
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Select(DeviceId),
    Write(Vec<u8>),
    Read(usize),
    ReadBit,
}

#[derive(Default)]
pub struct SimBus {
    pub devices: Vec<SimDevice>,
    pub log: Vec<Op>,
    /// Every `search_family` call fails with this error
    pub search_error: Option<Error>,
    /// Devices that stay on the bus but never answer Match ROM
    pub unreachable: Vec<DeviceId>,
    selected: Option<usize>,
    frame: Vec<u8>,
    rx: VecDeque<u8>,
}

impl SimBus {
    pub fn new(devices: Vec<SimDevice>) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    pub fn device(&self, id: &DeviceId) -> &SimDevice {
        self.devices.iter().find(|d| d.id() == *id).unwrap()
    }

    pub fn device_mut(&mut self, id: &DeviceId) -> &mut SimDevice {
        self.devices.iter_mut().find(|d| d.id() == *id).unwrap()
    }

    /// Bytes written after each selection, paired with the selected device
    pub fn frames(&self) -> Vec<(DeviceId, Vec<u8>)> {
        let mut frames: Vec<(DeviceId, Vec<u8>)> = Vec::new();
        for op in &self.log {
            match op {
                Op::Select(id) => frames.push((*id, Vec::new())),
                Op::Write(bytes) => {
                    if let Some((_, frame)) = frames.last_mut() {
                        frame.extend_from_slice(bytes);
                    }
                }
                Op::Read(_) | Op::ReadBit => {}
            }
        }
        frames
    }

    /// Frames addressed to one device
    pub fn frames_to(&self, id: &DeviceId) -> Vec<Vec<u8>> {
        self.frames()
            .into_iter()
            .filter(|(to, _)| to == id)
            .map(|(_, frame)| frame)
            .collect()
    }

    /// Busy flag samples a bridge returns, then `always` once exhausted
    pub fn set_busy(&mut self, id: &DeviceId, script: &[bool], always: bool) {
        if let SimDevice::Bridge {
            busy, always_busy, ..
        } = self.device_mut(id)
        {
            *busy = script.iter().copied().collect();
            *always_busy = always;
        }
    }

    /// Status bytes a bridge returns instead of the real outcome
    pub fn set_status(&mut self, id: &DeviceId, status: [u8; 2]) {
        if let SimDevice::Bridge {
            status_override, ..
        } = self.device_mut(id)
        {
            *status_override = Some(status);
        }
    }

    /// Configuration last written to a VEML7700 target
    pub fn veml7700_conf(&self, id: &DeviceId) -> Option<u16> {
        match self.device(id) {
            SimDevice::Bridge {
                target: Target::Veml7700 { conf, .. },
                ..
            } => *conf,
            _ => None,
        }
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn process_frame(&mut self) {
        let Some(index) = self.selected else {
            return;
        };
        let frame = self.frame.clone();
        let mut consumed = false;
        let mut reply = Vec::new();

        match &mut self.devices[index] {
            SimDevice::Ds18b20 { scratchpad, .. } => match frame.as_slice() {
                [0x44] => consumed = true,
                [0xBE] => {
                    consumed = true;
                    reply.extend_from_slice(&scratchpad[..]);
                }
                _ => {}
            },
            SimDevice::Bridge {
                target,
                speed_code,
                status_override,
                ..
            } => match frame.as_slice() {
                [0xD2, code] => {
                    consumed = true;
                    *speed_code = *code;
                }
                [0xE1] => {
                    consumed = true;
                    reply.push(*speed_code);
                }
                [0x4B, addr, len, reg, rest @ ..] if rest.len() == usize::from(*len) + 1 => {
                    consumed = true;
                    let (payload, trailer) = rest.split_at(rest.len() - 2);
                    let crc_ok = trailer_ok(&frame[..frame.len() - 2], trailer);
                    let status = i2c_status(target, *addr, crc_ok);
                    if status == [0, 0] {
                        target.write(*reg, payload);
                    }
                    reply.extend_from_slice(&status_override.unwrap_or(status));
                }
                [0x2D, addr, 1, reg, count, lo, hi] => {
                    consumed = true;
                    let crc_ok = trailer_ok(&frame[..5], &[*lo, *hi]);
                    let status = status_override.unwrap_or(i2c_status(target, *addr, crc_ok));
                    reply.extend_from_slice(&status);
                    if status == [0, 0] {
                        reply.extend(target.read(*reg, usize::from(*count)));
                    }
                }
                _ => {}
            },
        }

        if consumed {
            self.frame.clear();
            self.rx.extend(reply);
        }
    }
}

fn trailer_ok(covered: &[u8], trailer: &[u8]) -> bool {
    let [lo, hi] = crc16_arc(CRC16_ARC_INIT, covered).to_le_bytes();
    trailer == [!lo, !hi]
}

fn i2c_status(target: &Target, addr: u8, crc_ok: bool) -> [u8; 2] {
    if !crc_ok {
        return [0x01, 0x00];
    }
    if target.address() != Some(addr >> 1) {
        return [0x02, 0x00];
    }
    [0x00, 0x00]
}

impl OneWire for SimBus {
    fn reset(&mut self) -> Result<bool> {
        self.selected = None;
        self.frame.clear();
        self.rx.clear();
        Ok(!self.devices.is_empty())
    }

    fn write_bit(&mut self, _bit: bool) -> Result<()> {
        Ok(())
    }

    /// Samples the selected bridge's busy flag
    fn read_bit(&mut self) -> Result<bool> {
        self.log.push(Op::ReadBit);
        let Some(index) = self.selected else {
            return Ok(true);
        };
        match &mut self.devices[index] {
            SimDevice::Bridge {
                busy, always_busy, ..
            } => Ok(busy.pop_front().unwrap_or(*always_busy)),
            SimDevice::Ds18b20 { .. } => Ok(false),
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write(&[byte])
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8];
        self.read(&mut byte)?;
        Ok(byte[0])
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.log.push(Op::Write(bytes.to_vec()));
        self.frame.extend_from_slice(bytes);
        self.process_frame();
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.log.push(Op::Read(buf.len()));
        for byte in buf.iter_mut() {
            // Released line reads as ones
            *byte = self.rx.pop_front().unwrap_or(0xFF);
        }
        Ok(())
    }

    fn select(&mut self, id: &DeviceId) -> Result<()> {
        self.reset()?;
        self.log.push(Op::Select(*id));
        if self.unreachable.contains(id) {
            return Err(Error::Bus);
        }
        let index = self
            .devices
            .iter()
            .position(|d| d.id() == *id)
            .ok_or(Error::Bus)?;
        self.selected = Some(index);
        Ok(())
    }

    fn search_family<const N: usize>(
        &mut self,
        family: FamilyCode,
        ids: &mut HVec<DeviceId, N>,
    ) -> Result<usize> {
        if let Some(e) = self.search_error {
            return Err(e);
        }
        let mut found = 0;
        for device in &self.devices {
            let id = device.id();
            if id.family() != family {
                continue;
            }
            if ids.push(id).is_err() {
                break;
            }
            found += 1;
        }
        Ok(found)
    }
}

// ============================================================================
// Delay and reporter
// ============================================================================

/// Delay that only adds up the time it was asked to wait
#[derive(Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl RecordingDelay {
    pub const fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }

    pub const fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub conversion_failures: Vec<(usize, Error)>,
    pub readings: Vec<(usize, SensorKind, Outcome)>,
    pub cycles: usize,
}

impl Report for RecordingReporter {
    fn conversion_failed(&mut self, index: usize, error: Error) {
        self.conversion_failures.push((index, error));
    }

    fn reading(&mut self, index: usize, kind: SensorKind, outcome: Outcome) {
        self.readings.push((index, kind, outcome));
    }

    fn end_cycle(&mut self) {
        self.cycles += 1;
    }
}
