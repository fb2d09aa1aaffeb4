//! Packet encoding/decoding
//!
//! Packet format:
//! - 36 bytes: protocol header (see [`super::header`])
//! - N bytes: payload, verbatim
//! - 1 byte: checksum (low nibble of the signed 8-bit payload sum)

use super::header::{Header, HEADER, HEADER_LEN};
use super::ProtocolError;

/// Command-specific bytes following the header. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Wrap raw payload bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, ProtocolError> {
        if bytes.is_empty() {
            return Err(ProtocolError::EmptyPayload);
        }
        Ok(Self(bytes))
    }

    /// Payload bytes for one of the fixed command tables
    pub(crate) fn from_table<const N: usize>(bytes: [u8; N]) -> Self {
        debug_assert!(N > 0, "payload tables must not be empty");
        Self(bytes.to_vec())
    }

    /// Raw payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of payload bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed payload
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take back the byte vector
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for Payload {
    type Error = ProtocolError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

/// Checksum of the payload bytes.
///
/// Bytes are summed as signed 8-bit values; only the low nibble is kept, so
/// wrapping i8 addition gives the same result as any wider accumulator.
pub fn checksum(payload: &[u8]) -> u8 {
    let sum = payload
        .iter()
        .fold(0i8, |acc, &b| acc.wrapping_add(b as i8));
    (sum as u8) & 0x0F
}

/// Encode a payload into a full packet
pub fn encode(payload: &Payload) -> Vec<u8> {
    Packet::new(payload.clone()).to_bytes()
}

/// A protocol packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet payload
    pub payload: Payload,
}

impl Packet {
    /// Create a new packet with the given payload
    pub fn new(payload: Payload) -> Self {
        Self { payload }
    }

    /// Checksum byte trailing the payload
    pub fn checksum(&self) -> u8 {
        checksum(self.payload.as_bytes())
    }

    /// Encode the packet to raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_size());
        bytes.extend_from_slice(&HEADER.to_bytes());
        bytes.extend_from_slice(self.payload.as_bytes());
        bytes.push(self.checksum());
        bytes
    }

    /// Get the total encoded size
    pub fn encoded_size(&self) -> usize {
        HEADER_LEN + self.payload.len() + 1
    }

    /// Hex line as written to the transmitter, newline included
    pub fn to_hex_line(&self) -> String {
        let mut line = hex::encode(self.to_bytes());
        line.push('\n');
        line
    }

    /// Decode and verify a packet from raw bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        // Header, at least one payload byte, checksum
        let min = HEADER_LEN + 2;
        if data.len() < min {
            return Err(ProtocolError::TooShort {
                expected: min,
                actual: data.len(),
            });
        }

        let header = Header::from_bytes(data)?;
        if header.magic != HEADER.magic {
            return Err(ProtocolError::BadMagic {
                expected: HEADER.magic as u16,
                actual: header.magic as u16,
            });
        }
        if header != HEADER {
            return Err(ProtocolError::HeaderMismatch);
        }

        let (body, tail) = data[HEADER_LEN..].split_at(data.len() - HEADER_LEN - 1);
        let expected = checksum(body);
        if tail[0] != expected {
            return Err(ProtocolError::ChecksumMismatch {
                expected,
                actual: tail[0],
            });
        }

        Ok(Self {
            payload: Payload::new(body.to_vec())?,
        })
    }

    /// Decode a hex line, with or without its trailing newline
    pub fn from_hex_line(line: &str) -> Result<Self, ProtocolError> {
        let bytes = hex::decode(line.trim_end())?;
        Self::from_bytes(&bytes)
    }
}
