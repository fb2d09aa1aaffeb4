//! Protocol errors

use std::time::Duration;
use thiserror::Error;

/// Errors raised while building or decoding packets
#[allow(missing_docs)]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Payload must contain at least one byte")]
    EmptyPayload,

    #[error("Temperature {0}°C is outside 18..=30")]
    TemperatureOutOfRange(i32),

    #[error("Unknown {field} code {code}")]
    UnknownCode { field: &'static str, code: i64 },

    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Bad magic: expected {expected:#06x}, got {actual:#06x}")]
    BadMagic { expected: u16, actual: u16 },

    #[error("Header timing table does not match the receiver firmware")]
    HeaderMismatch,

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Invalid hex line: {0}")]
    InvalidHex(String),
}

/// Errors that can occur while delivering a packet over the serial line
#[derive(Error, Debug)]
pub enum TransportError {
    /// The device could not be opened; nothing was written
    #[error("Failed to open {device}: {source}")]
    Open {
        /// Port name as configured
        device: String,
        /// Driver error
        #[source]
        source: serialport::Error,
    },

    /// Writing or polling the port failed
    #[error("Write failed: {0}")]
    Write(#[from] std::io::Error),

    /// The output queue did not drain within the flush timeout
    #[error("Flush timed out after {waited:?} with {pending} bytes pending")]
    Timeout {
        /// Bytes still queued at expiry
        pending: u32,
        /// Time spent waiting
        waited: Duration,
    },
}

impl From<hex::FromHexError> for ProtocolError {
    fn from(err: hex::FromHexError) -> Self {
        ProtocolError::InvalidHex(err.to_string())
    }
}
