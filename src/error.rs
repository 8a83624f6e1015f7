//! Error taxonomy shared by the transport, the bridge and the decoders
//!
//! Every fallible operation returns [`Result`]. Callers treat `Checksum`,
//! `Timeout` and `Status` exactly like `Bus`: the transaction is abandoned and
//! nothing partial is returned. None of them is fatal to the node.

use core::fmt;

use crate::drivers::ds28e17::BridgeStatus;

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;

/// Sensor node error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// No presence pulse, or a pin transfer failed
    Bus,
    /// Frame integrity check failed (scratchpad CRC8 or ROM code CRC8)
    Checksum,
    /// The bridge busy flag did not clear within the poll budget
    Timeout,
    /// The bridge reported a failed I2C transaction
    Status(BridgeStatus),
    /// Decoded value lies outside the sensor's specified envelope
    OutOfRange,
    /// Requested transfer does not fit in a bridge frame
    PayloadLength,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => f.write_str("bus error"),
            Self::Checksum => f.write_str("checksum mismatch"),
            Self::Timeout => f.write_str("bridge busy timeout"),
            Self::Status(status) => write!(f, "bridge status {status}"),
            Self::OutOfRange => f.write_str("value out of range"),
            Self::PayloadLength => f.write_str("payload too long"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus => defmt::write!(f, "BUS"),
            Self::Checksum => defmt::write!(f, "CRC"),
            Self::Timeout => defmt::write!(f, "TIMEOUT"),
            Self::Status(status) => defmt::write!(f, "STATUS({})", status),
            Self::OutOfRange => defmt::write!(f, "RANGE"),
            Self::PayloadLength => defmt::write!(f, "LENGTH"),
        }
    }
}
