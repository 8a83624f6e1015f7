//! Checksums used on the 1-Wire bus
//!
//! - CRC16/ARC protects DS28E17 command frames. The bridge transmits a frame
//!   in several pieces, so the running value is threaded through successive
//!   calls as the next seed.
//! - Dallas/Maxim CRC8 protects ROM codes and the DS18B20 scratchpad. A frame
//!   that includes its own CRC byte checks to zero.

/// CRC16/ARC reflected polynomial
pub const CRC16_ARC_POLY: u16 = 0xA001;

/// CRC16/ARC initial value
pub const CRC16_ARC_INIT: u16 = 0x0000;

/// Dallas/Maxim CRC8 reflected polynomial (x^8 + x^5 + x^4 + 1)
pub const CRC8_MAXIM_POLY: u8 = 0x8C;

/// Fold `bytes` into a CRC16/ARC value, LSB first.
///
/// `crc16_arc(s, a ++ b) == crc16_arc(crc16_arc(s, a), b)` for any split.
#[must_use]
pub fn crc16_arc(seed: u16, bytes: &[u8]) -> u16 {
    bytes.iter().fold(seed, |mut crc, &byte| {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC16_ARC_POLY
            } else {
                crc >> 1
            };
        }
        crc
    })
}

/// Fold `bytes` into a Dallas/Maxim CRC8 value.
#[must_use]
pub fn crc8_partial(seed: u8, bytes: &[u8]) -> u8 {
    let mut crc = seed;
    for &byte in bytes {
        let mut byte = byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= CRC8_MAXIM_POLY;
            }
            byte >>= 1;
        }
    }
    crc
}

/// Dallas/Maxim CRC8 of `bytes` starting from zero.
#[must_use]
pub fn crc8(bytes: &[u8]) -> u8 {
    crc8_partial(0, bytes)
}
