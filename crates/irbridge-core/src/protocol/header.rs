//! Protocol header
//!
//! Every packet starts with the same 36-byte prefix. It tells the transmitter
//! how long each IR pulse lasts and how the following data bits are grouped.
//!
//! Header layout (big-endian):
//! - 2 bytes: magic (`0xCAFE`)
//! - 1 byte: LSB-first flag (`0` = most significant bit first)
//! - 1 byte: nibble flag (`1` = data grouped in 4-bit units)
//! - 32 bytes: lead, one, zero, end as (mark, space) pairs of i32 microseconds
//!
//! The values match a deployed receiver decoder and must not change.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use super::ProtocolError;

/// Encoded header length in bytes
pub const HEADER_LEN: usize = 36;

/// One IR pulse: on-time followed by off-time, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Duration {
    /// Carrier on
    pub mark: i32,
    /// Carrier off
    pub space: i32,
}

/// Pulse timing table carried by every packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timings {
    /// Synchronization pulse sent before the data bits
    pub lead: Duration,
    /// A `1` data bit
    pub one: Duration,
    /// A `0` data bit
    pub zero: Duration,
    /// Trailing pulse closing the frame
    pub end: Duration,
}

/// Fixed packet prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Frame marker, `0xCAFE` as a signed value
    pub magic: i16,
    /// Non-zero when bits go least significant first
    pub lsb: i8,
    /// Non-zero when data is grouped in 4-bit units
    pub nibble: i8,
    /// Pulse timing table
    pub timings: Timings,
}

/// The header embedded in every packet
pub const HEADER: Header = Header {
    magic: 0xCAFEu16 as i16,
    lsb: 0,
    nibble: 1,
    timings: Timings {
        lead: Duration { mark: 3100, space: 9800 },
        one: Duration { mark: 500, space: 1500 },
        zero: Duration { mark: 500, space: 550 },
        end: Duration { mark: 500, space: 0 },
    },
};

impl Header {
    /// Serialize the header in wire order
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        BigEndian::write_i16(&mut buf[0..2], self.magic);
        buf[2] = self.lsb as u8;
        buf[3] = self.nibble as u8;

        let t = &self.timings;
        let values = [
            t.lead.mark,
            t.lead.space,
            t.one.mark,
            t.one.space,
            t.zero.mark,
            t.zero.space,
            t.end.mark,
            t.end.space,
        ];
        BigEndian::write_i32_into(&values, &mut buf[4..]);
        buf
    }

    /// Parse a header from the start of `data`
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < HEADER_LEN {
            return Err(ProtocolError::TooShort {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }

        let mut values = [0i32; 8];
        BigEndian::read_i32_into(&data[4..HEADER_LEN], &mut values);
        let pulse = |i: usize| Duration {
            mark: values[i],
            space: values[i + 1],
        };

        Ok(Self {
            magic: BigEndian::read_i16(&data[0..2]),
            lsb: data[2] as i8,
            nibble: data[3] as i8,
            timings: Timings {
                lead: pulse(0),
                one: pulse(2),
                zero: pulse(4),
                end: pulse(6),
            },
        })
    }

    /// Whether data bits are sent least significant first
    pub fn lsb_first(&self) -> bool {
        self.lsb != 0
    }

    /// Whether the receiver groups data into 4-bit units
    pub fn uses_nibbles(&self) -> bool {
        self.nibble != 0
    }
}
