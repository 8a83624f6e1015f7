//! `DS28E17` 1-Wire-to-I2C Master Bridge Driver
//!
//! Relays register reads and writes to an I2C bus hanging off a device on
//! the 1-Wire bus. Every command frame ends with the inverted CRC16/ARC of
//! everything sent before it; the bridge answers with a two-byte status once
//! its busy flag clears.

use core::fmt;

use embedded_hal::delay::DelayNs;

use crate::config::{BRIDGE_BUSY_CHECKS, BRIDGE_MAX_PAYLOAD};
use crate::crc::{crc16_arc, CRC16_ARC_INIT};
use crate::error::{Error, Result};
use crate::onewire::{Bus, OneWire};
use crate::types::DeviceId;

/// `DS28E17` function commands
mod cmd {
    pub const WRITE_DATA_WITH_STOP: u8 = 0x4B;
    pub const WRITE_READ_DATA_WITH_STOP: u8 = 0x2D;
    pub const WRITE_CONFIGURATION: u8 = 0xD2;
    pub const READ_CONFIGURATION: u8 = 0xE1;
}

/// Status byte 0 flags
mod status {
    pub const CRC: u8 = 0x01;
    pub const ADDRESS: u8 = 0x02;
    pub const START: u8 = 0x08;
}

/// Configuration register speed field
const SPEED_MASK: u8 = 0x03;

/// Register access on a secondary I2C bus
///
/// Implemented by [`Ds28e17`]; the bridged sensor decoders only see this.
pub trait RegisterBus {
    /// Write `payload` to `reg` of the device at 7-bit `address`
    ///
    /// # Errors
    ///
    /// [`Error::PayloadLength`] when `payload` does not fit one frame, any
    /// transport error, [`Error::Timeout`] or [`Error::Status`] from the
    /// bridge.
    fn write_register(&mut self, address: u8, reg: u8, payload: &[u8]) -> Result<()>;

    /// Read `buf.len()` bytes starting at `reg` of the device at `address`
    ///
    /// # Errors
    ///
    /// As [`write_register`](Self::write_register); `buf` is left
    /// unspecified on failure.
    fn read_register(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<()>;
}

/// Secondary bus clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum I2cSpeed {
    /// 100 kHz standard mode
    Khz100,
    /// 400 kHz fast mode
    #[default]
    Khz400,
    /// 900 kHz
    Khz900,
}

impl I2cSpeed {
    /// Configuration register code
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Khz100 => 0x00,
            Self::Khz400 => 0x01,
            Self::Khz900 => 0x02,
        }
    }

    /// Decode the configuration register speed field
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code & SPEED_MASK {
            0x00 => Some(Self::Khz100),
            0x01 => Some(Self::Khz400),
            0x02 => Some(Self::Khz900),
            _ => None,
        }
    }

    /// Time to move one byte across the I2C bus at this speed
    ///
    /// Unit of both the initial transfer wait and the busy poll interval.
    #[must_use]
    pub const fn base_wait_us(self) -> u32 {
        match self {
            Self::Khz100 => 90,
            Self::Khz400 => 23,
            Self::Khz900 => 10,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for I2cSpeed {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Khz100 => defmt::write!(f, "100kHz"),
            Self::Khz400 => defmt::write!(f, "400kHz"),
            Self::Khz900 => defmt::write!(f, "900kHz"),
        }
    }
}

/// Two status bytes returned after an I2C transaction
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BridgeStatus {
    /// Transaction status flags
    pub status: u8,
    /// Write status (index of the first NACKed payload byte, 0 if none)
    pub write_status: u8,
}

impl BridgeStatus {
    /// Wrap the raw status bytes
    #[must_use]
    pub const fn new(status: u8, write_status: u8) -> Self {
        Self {
            status,
            write_status,
        }
    }

    /// Bridge received a frame with a bad CRC16
    #[must_use]
    pub const fn crc_error(self) -> bool {
        self.status & status::CRC != 0
    }

    /// Target did not acknowledge its address
    #[must_use]
    pub const fn address_nack(self) -> bool {
        self.status & status::ADDRESS != 0
    }

    /// Bridge could not generate a start condition
    #[must_use]
    pub const fn start_error(self) -> bool {
        self.status & status::START != 0
    }

    /// Accept only an all-zero status
    ///
    /// # Errors
    ///
    /// [`Error::Status`] when any flag is set or either byte is non-zero,
    /// including bits with no documented meaning.
    pub fn check(self) -> Result<()> {
        if self.crc_error() || self.address_nack() || self.start_error() {
            return Err(Error::Status(self));
        }
        if self.status != 0 || self.write_status != 0 {
            return Err(Error::Status(self));
        }
        Ok(())
    }
}

impl fmt::Debug for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BridgeStatus({:#04x}, {:#04x})", self.status, self.write_status)
    }
}

impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:{:02X}", self.status, self.write_status)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BridgeStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{:02X}:{:02X}", self.status, self.write_status);
    }
}

/// `DS28E17` driver bound to one bridge on the bus
pub struct Ds28e17<'a, W, D> {
    bus: &'a mut Bus<W, D>,
    id: DeviceId,
    speed: I2cSpeed,
}

impl<'a, W, D> Ds28e17<'a, W, D>
where
    W: OneWire,
    D: DelayNs,
{
    /// Bind to the bridge `id`, assuming it runs its I2C bus at `speed`
    pub fn new(bus: &'a mut Bus<W, D>, id: DeviceId, speed: I2cSpeed) -> Self {
        Self { bus, id, speed }
    }

    /// Write the configured speed to the bridge's configuration register
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] when the bridge cannot be selected or written.
    pub fn configure(&mut self) -> Result<()> {
        self.bus.wire.select(&self.id)?;
        self.bus
            .wire
            .write(&[cmd::WRITE_CONFIGURATION, self.speed.code()])
    }

    /// Read back the configuration register
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] on transfer failure or an unknown speed code.
    pub fn read_configuration(&mut self) -> Result<I2cSpeed> {
        self.bus.wire.select(&self.id)?;
        self.bus.wire.write(&[cmd::READ_CONFIGURATION])?;
        let mut config = [0u8; 1];
        self.bus.wire.read(&mut config)?;
        I2cSpeed::from_code(config[0]).ok_or(Error::Bus)
    }

    /// Wait for the busy flag to clear
    ///
    /// `units` is the number of bytes the bridge must move on the I2C bus;
    /// the worst case is `base_wait_us * (units + BRIDGE_BUSY_CHECKS)`.
    fn wait_idle(&mut self, units: usize) -> Result<()> {
        if !self.bus.wire.read_bit()? {
            return Ok(());
        }

        let base_wait_us = self.speed.base_wait_us();
        for _ in 0..units {
            self.bus.delay.delay_us(base_wait_us);
        }

        for _ in 0..BRIDGE_BUSY_CHECKS {
            if !self.bus.wire.read_bit()? {
                return Ok(());
            }
            self.bus.delay.delay_us(base_wait_us);
        }

        warn!("DS28E17 {}: busy timeout", self.id);
        Err(Error::Timeout)
    }

    fn read_status(&mut self) -> Result<()> {
        let mut raw = [0u8; 2];
        self.bus.wire.read(&mut raw)?;
        let status = BridgeStatus::new(raw[0], raw[1]);
        if let Err(e) = status.check() {
            debug!("DS28E17 {}: status {}", self.id, status);
            return Err(e);
        }
        Ok(())
    }

    fn send_trailer(&mut self, crc: u16) -> Result<()> {
        let [lo, hi] = crc.to_le_bytes();
        self.bus.wire.write(&[!lo, !hi])
    }
}

impl<W, D> RegisterBus for Ds28e17<'_, W, D>
where
    W: OneWire,
    D: DelayNs,
{
    fn write_register(&mut self, address: u8, reg: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > BRIDGE_MAX_PAYLOAD {
            return Err(Error::PayloadLength);
        }
        let header = [cmd::WRITE_DATA_WITH_STOP, address << 1];
        // Length byte counts the register address too
        let length = u8::try_from(payload.len() + 1).map_err(|_| Error::PayloadLength)?;
        let target = [length, reg];

        let mut crc = crc16_arc(CRC16_ARC_INIT, &header);
        crc = crc16_arc(crc, &target);
        crc = crc16_arc(crc, payload);

        self.bus.wire.select(&self.id)?;
        self.bus.wire.write(&header)?;
        self.bus.wire.write(&target)?;
        self.bus.wire.write(payload)?;
        self.send_trailer(crc)?;

        self.wait_idle(payload.len() + 2)?;
        self.read_status()
    }

    fn read_register(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() || buf.len() > BRIDGE_MAX_PAYLOAD {
            return Err(Error::PayloadLength);
        }
        // One byte (the register address) is written before the read
        let header = [cmd::WRITE_READ_DATA_WITH_STOP, address << 1, 1];
        let count = [u8::try_from(buf.len()).map_err(|_| Error::PayloadLength)?];

        let mut crc = crc16_arc(CRC16_ARC_INIT, &header);
        crc = crc16_arc(crc, &[reg]);
        crc = crc16_arc(crc, &count);

        self.bus.wire.select(&self.id)?;
        self.bus.wire.write(&header)?;
        self.bus.wire.write(&[reg])?;
        self.bus.wire.write(&count)?;
        self.send_trailer(crc)?;

        self.wait_idle(1 + buf.len() + 2)?;
        self.read_status()?;
        self.bus.wire.read(buf)
    }
}
