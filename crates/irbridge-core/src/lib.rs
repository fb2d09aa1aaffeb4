//! # irbridge Core Library
//!
//! Drives a serial-attached infrared transmitter that replays air-conditioner
//! remote commands.
//!
//! This library provides:
//! - The fixed IR packet header and packet encoder
//! - Payload tables for every supported command
//! - One-shot serial delivery of hex-encoded packets
//! - Persisted front-end settings
//!
//! ## Example
//!
//! ```rust,no_run
//! use irbridge_core::protocol::{Commander, FanSpeed, SerialConfig, Temperature};
//!
//! let commander = Commander::new(SerialConfig::new("/dev/ttyACM0"));
//! let delivery = commander.cool(true, Temperature::new(24)?, FanSpeed::Medium);
//! println!("{delivery:?}");
//! # Ok::<(), irbridge_core::protocol::ProtocolError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod protocol;
pub mod settings;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        AiLevel, Command, Commander, Delivery, FanSpeed, Mode, Packet, Payload, SerialConfig,
        Temperature, ToggleKind,
    };
    pub use crate::settings::{SettingChange, Settings, SettingsStore};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
