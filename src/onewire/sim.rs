//! Search ROM simulator shared by the unit tests

use super::OneWire;
use crate::error::Result;
use crate::types::{DeviceId, ROM_CODE_SIZE};

#[derive(Clone, Copy)]
enum Phase {
    Command,
    IdBit,
    Complement,
    Direction,
}

/// Wired-AND model of several devices taking part in a ROM search
pub(crate) struct SearchSim {
    roms: std::vec::Vec<[u8; ROM_CODE_SIZE]>,
    active: std::vec::Vec<bool>,
    phase: Phase,
    position: usize,
}

impl SearchSim {
    pub(crate) fn new(ids: &[DeviceId]) -> Self {
        Self {
            roms: ids.iter().map(|id| *id.as_bytes()).collect(),
            active: std::vec![false; ids.len()],
            phase: Phase::Command,
            position: 0,
        }
    }

    fn bit_of(rom: &[u8; ROM_CODE_SIZE], position: usize) -> bool {
        rom[position / 8] & (1 << (position % 8)) != 0
    }

    fn wired_and(&self, complement: bool) -> bool {
        self.roms
            .iter()
            .zip(&self.active)
            .filter(|(_, &active)| active)
            .all(|(rom, _)| Self::bit_of(rom, self.position) != complement)
    }
}

impl OneWire for SearchSim {
    fn reset(&mut self) -> Result<bool> {
        self.active.iter_mut().for_each(|a| *a = true);
        self.phase = Phase::Command;
        self.position = 0;
        Ok(!self.roms.is_empty())
    }

    fn write_bit(&mut self, bit: bool) -> Result<()> {
        if let Phase::Direction = self.phase {
            for (rom, active) in self.roms.iter().zip(self.active.iter_mut()) {
                if Self::bit_of(rom, self.position) != bit {
                    *active = false;
                }
            }
            self.position += 1;
            self.phase = Phase::IdBit;
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool> {
        match self.phase {
            Phase::Command | Phase::IdBit => {
                // Search ROM command finished on the previous write
                self.phase = Phase::Complement;
                Ok(self.wired_and(false))
            }
            Phase::Complement => {
                self.phase = Phase::Direction;
                Ok(self.wired_and(true))
            }
            Phase::Direction => Ok(true),
        }
    }
}

/// `id` with its CRC byte flipped
pub(crate) fn corrupt_id(id: DeviceId) -> DeviceId {
    let mut rom = *id.as_bytes();
    rom[ROM_CODE_SIZE - 1] ^= 0x01;
    DeviceId::new(rom)
}
