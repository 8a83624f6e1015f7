//! 1-Wire Bus Abstractions
//!
//! The [`OneWire`] trait is the transport contract consumed by the decoders
//! and the dispatcher. Implementors provide the three primitives (reset,
//! write bit, read bit); byte transfers, Match ROM selection and the ROM
//! search have default implementations on top of them and may be overridden
//! by transports that do these in hardware.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::error::{Error, Result};
use crate::types::{DeviceId, FamilyCode, ROM_CODE_SIZE};

pub mod bitbang;
#[cfg(test)]
pub(crate) mod sim;

pub use bitbang::BitBangWire;

/// ROM-level commands
pub mod command {
    /// Address one device by its full ROM code
    pub const MATCH_ROM: u8 = 0x55;
    /// Start a ROM search pass
    pub const SEARCH_ROM: u8 = 0xF0;
}

/// ROM code length in bits
const ROM_BITS: u8 = 64;

const _: () = assert!(ROM_BITS as usize == ROM_CODE_SIZE * 8);

/// 1-Wire transport
pub trait OneWire {
    /// Issue a reset pulse; returns `true` when at least one device answered
    /// with a presence pulse.
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] when the line cannot be driven or is held low before
    /// the pulse.
    fn reset(&mut self) -> Result<bool>;

    /// Write one time slot
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] when the line cannot be driven.
    fn write_bit(&mut self, bit: bool) -> Result<()>;

    /// Read one time slot
    ///
    /// Also used to sample the DS28E17 busy flag.
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] when the line cannot be driven or sampled.
    fn read_bit(&mut self) -> Result<bool>;

    /// Write a byte, LSB first
    ///
    /// # Errors
    ///
    /// Any error from [`write_bit`](Self::write_bit).
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 != 0)?;
        }
        Ok(())
    }

    /// Read a byte, LSB first
    ///
    /// # Errors
    ///
    /// Any error from [`read_bit`](Self::read_bit).
    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Write a run of bytes after a successful [`select`](Self::select)
    ///
    /// # Errors
    ///
    /// Any error from [`write_byte`](Self::write_byte); bytes already sent
    /// stay sent.
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        bytes.iter().try_for_each(|&byte| self.write_byte(byte))
    }

    /// Fill `buf` from the bus after a successful [`select`](Self::select)
    ///
    /// # Errors
    ///
    /// Any error from [`read_byte`](Self::read_byte).
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        for byte in buf.iter_mut() {
            *byte = self.read_byte()?;
        }
        Ok(())
    }

    /// Reset the bus and address one device with Match ROM
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] when nothing answers the reset pulse.
    fn select(&mut self, id: &DeviceId) -> Result<()> {
        if !self.reset()? {
            return Err(Error::Bus);
        }
        self.write_byte(command::MATCH_ROM)?;
        self.write(id.as_bytes())
    }

    /// Run one Search ROM pass and return the next device, if any
    ///
    /// Returns `Ok(None)` once the search is exhausted, when nothing is on
    /// the bus, or when a family-targeted search steps past its family.
    ///
    /// # Errors
    ///
    /// [`Error::Bus`] on transfer failure, [`Error::Checksum`] when the
    /// assembled ROM code fails its CRC.
    fn search_next(&mut self, search: &mut RomSearch) -> Result<Option<DeviceId>> {
        if search.done {
            return Ok(None);
        }
        if !self.reset()? {
            search.done = true;
            return Ok(None);
        }
        self.write_byte(command::SEARCH_ROM)?;

        let mut last_zero = 0u8;
        for position in 1..=ROM_BITS {
            let id_bit = self.read_bit()?;
            let complement = self.read_bit()?;

            let direction = match (id_bit, complement) {
                (true, true) => {
                    // Nobody took part in this pass
                    search.done = true;
                    return Ok(None);
                }
                (bit, cmp) if bit != cmp => bit,
                _ => {
                    let direction = if position < search.last_discrepancy {
                        search.rom_bit(position)
                    } else {
                        position == search.last_discrepancy
                    };
                    if !direction {
                        last_zero = position;
                    }
                    direction
                }
            };

            search.set_rom_bit(position, direction);
            self.write_bit(direction)?;
        }

        search.last_discrepancy = last_zero;
        if last_zero == 0 {
            search.done = true;
        }

        let id = DeviceId::new(search.rom);
        if !id.is_crc_valid() {
            search.done = true;
            return Err(Error::Checksum);
        }
        if let Some(family) = search.family {
            if id.family() != family {
                search.done = true;
                return Ok(None);
            }
        }
        Ok(Some(id))
    }

    /// Append every device of `family` to `ids`, returning how many were found
    ///
    /// Stops early, keeping what was found, once `ids` is full.
    ///
    /// # Errors
    ///
    /// Any error from [`search_next`](Self::search_next).
    fn search_family<const N: usize>(
        &mut self,
        family: FamilyCode,
        ids: &mut Vec<DeviceId, N>,
    ) -> Result<usize> {
        let mut search = RomSearch::for_family(family);
        let mut found = 0;
        while let Some(id) = self.search_next(&mut search)? {
            if ids.push(id).is_err() {
                warn!("device table full, ignoring {}", id);
                break;
            }
            found += 1;
        }
        Ok(found)
    }
}

/// State carried between Search ROM passes
#[derive(Clone, Copy, Debug)]
pub struct RomSearch {
    rom: [u8; ROM_CODE_SIZE],
    last_discrepancy: u8,
    family: Option<FamilyCode>,
    done: bool,
}

impl RomSearch {
    /// Search every device on the bus
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rom: [0; ROM_CODE_SIZE],
            last_discrepancy: 0,
            family: None,
            done: false,
        }
    }

    /// Search only devices of one family
    #[must_use]
    pub const fn for_family(family: FamilyCode) -> Self {
        let mut rom = [0; ROM_CODE_SIZE];
        rom[0] = family.code();
        Self {
            rom,
            last_discrepancy: ROM_BITS,
            family: Some(family),
            done: false,
        }
    }

    /// Bit at 1-based `position` of the current ROM code
    fn rom_bit(&self, position: u8) -> bool {
        let index = usize::from(position - 1);
        self.rom[index / 8] & (1 << (index % 8)) != 0
    }

    fn set_rom_bit(&mut self, position: u8, bit: bool) {
        let index = usize::from(position - 1);
        let mask = 1 << (index % 8);
        if bit {
            self.rom[index / 8] |= mask;
        } else {
            self.rom[index / 8] &= !mask;
        }
    }
}

impl Default for RomSearch {
    fn default() -> Self {
        Self::new()
    }
}

/// The primary bus together with the delay source used for bus waits
///
/// Both are needed at once by the bridge driver (transfers and busy-poll
/// sleeps), so the fields are public and borrowed independently.
pub struct Bus<W, D> {
    /// 1-Wire transport
    pub wire: W,
    /// Blocking delay for bus waits and the settle interval
    pub delay: D,
}

impl<W: OneWire, D: DelayNs> Bus<W, D> {
    /// Pair a transport with a delay source
    #[must_use]
    pub const fn new(wire: W, delay: D) -> Self {
        Self { wire, delay }
    }
}
