//! Measurement Reporting
//!
//! One outcome per registered device per cycle. [`format_line`] renders the
//! console line for an outcome; [`LogReporter`] sends those lines to the log.

use core::fmt::Write;

use heapless::String;

use crate::error::{Error, Result};
use crate::types::{Reading, SensorKind};

/// Longest rendered report line
pub const LINE_CAPACITY: usize = 64;

/// Width of the "<part> sensor" column
const LABEL_WIDTH: usize = 19;

/// A rendered report line
pub type Line = String<LINE_CAPACITY>;

/// Result of reading one device in one cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Decoded reading
    Reading(Reading),
    /// The read failed; the next cycle tries again
    Failed(Error),
    /// Device was never classified, no read attempted
    Unknown,
}

impl From<Result<Reading>> for Outcome {
    fn from(result: Result<Reading>) -> Self {
        match result {
            Ok(reading) => Self::Reading(reading),
            Err(e) => Self::Failed(e),
        }
    }
}

/// Receiver of per-device results
pub trait Report {
    /// Convert T could not be sent to the `DS18B20` at `index`
    fn conversion_failed(&mut self, index: usize, error: Error);

    /// Outcome of reading the device at `index`
    fn reading(&mut self, index: usize, kind: SensorKind, outcome: Outcome);

    /// Every device has been reported for this cycle
    fn end_cycle(&mut self) {}
}

fn push_label(line: &mut Line, kind: SensorKind) {
    let _ = write!(line, "{} sensor", kind.name());
    while line.len() < LABEL_WIDTH {
        if line.push(' ').is_err() {
            break;
        }
    }
}

/// Render the console line for one outcome
///
/// ```text
/// DS18B20 sensor     @ Index 0: Degrees C: -10.1
/// VEML7700 sensor    @ Index 2:       Lux: 5.7
/// Error reading from MCP9808 sensor 1
/// Unknown sensor     @ Index 3
/// ```
#[must_use]
pub fn format_line(index: usize, kind: SensorKind, outcome: &Outcome) -> Line {
    let mut line = Line::new();
    // Lines are bounded well below LINE_CAPACITY, writes cannot overflow
    match outcome {
        Outcome::Reading(Reading::Temperature(t)) => {
            push_label(&mut line, kind);
            let _ = write!(line, "@ Index {index}: Degrees C: {t}");
        }
        Outcome::Reading(Reading::Illuminance(lux)) => {
            push_label(&mut line, kind);
            let _ = write!(line, "@ Index {index}:       Lux: {lux}");
        }
        Outcome::Failed(_) => {
            let _ = write!(line, "Error reading from {} sensor {index}", kind.name());
        }
        Outcome::Unknown => {
            push_label(&mut line, SensorKind::Unknown);
            let _ = write!(line, "@ Index {index}");
        }
    }
    line
}

/// Render the line for a failed Convert T
#[must_use]
pub fn format_conversion_error(index: usize) -> Line {
    let mut line = Line::new();
    let _ = write!(line, "Error starting measurement on temperature sensor {index}");
    line
}

/// Reporter writing every line to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Report for LogReporter {
    fn conversion_failed(&mut self, index: usize, error: Error) {
        let line = format_conversion_error(index);
        warn!("{}: {}", line.as_str(), error);
    }

    fn reading(&mut self, index: usize, kind: SensorKind, outcome: Outcome) {
        let line = format_line(index, kind, &outcome);
        match outcome {
            Outcome::Failed(error) => warn!("{}: {}", line.as_str(), error),
            _ => info!("{}", line.as_str()),
        }
    }

    fn end_cycle(&mut self) {
        trace!("cycle complete");
    }
}
