//! IR Packet Protocol
//!
//! Implements the header + payload + checksum packet understood by the IR
//! transmitter firmware, and the one-way serial line that carries it.
//!
//! A packet travels as lowercase hex followed by `\n`. The transmitter never
//! answers, so every command is a single fire-and-forget write.

pub mod command_builder;
pub mod commander;
pub mod commands;
mod error;
pub mod header;
mod packet;
pub mod serial;

pub use commander::{Commander, Delivery};
pub use commands::{AiLevel, Command, FanSpeed, Mode, Temperature, ToggleKind};
pub use error::{ProtocolError, TransportError};
pub use header::{Duration, Header, Timings, HEADER, HEADER_LEN};
pub use packet::{checksum, encode, Packet, Payload};
pub use serial::{list_ports, PortInfo, SerialConfig, SerialTransport, Transport};

/// Baud rate expected by the transmitter firmware
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default blocking limit for a single write in milliseconds
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 1000;

/// Default upper bound for the flush wait in milliseconds
pub const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 5000;

/// Interval between "bytes still pending" polls in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5;
