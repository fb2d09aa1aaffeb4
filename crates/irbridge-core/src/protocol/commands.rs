//! Protocol commands
//!
//! Typed air-conditioner intents and their wire codes.
//!
//! The enums serialize as their integer codes, the same numbers the settings
//! file and the receiver use.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{command_builder, Payload, ProtocolError};

/// Fan speed setting.
///
/// Wire codes are not contiguous; the receiver firmware matches on the exact values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FanSpeed {
    /// Code 0
    Low,
    /// Code 2
    #[default]
    Medium,
    /// Code 4
    High,
    /// Code 5, the unit's natural-breeze pattern
    Nature,
}

impl FanSpeed {
    /// Every speed, slowest first
    pub const ALL: [FanSpeed; 4] = [
        FanSpeed::Low,
        FanSpeed::Medium,
        FanSpeed::High,
        FanSpeed::Nature,
    ];

    /// Get the wire code for this speed
    pub fn code(&self) -> u8 {
        match self {
            FanSpeed::Low => 0,
            FanSpeed::Medium => 2,
            FanSpeed::High => 4,
            FanSpeed::Nature => 5,
        }
    }

    /// Look up a speed by its wire code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl TryFrom<u8> for FanSpeed {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(ProtocolError::UnknownCode {
            field: "fan speed",
            code: code as i64,
        })
    }
}

impl From<FanSpeed> for u8 {
    fn from(speed: FanSpeed) -> Self {
        speed.code()
    }
}

/// AI comfort level, from -2 (cooler) to +2 (warmer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AiLevel {
    /// -2
    MinusTwo,
    /// -1
    MinusOne,
    /// Neutral
    #[default]
    Zero,
    /// +1
    PlusOne,
    /// +2
    PlusTwo,
}

impl AiLevel {
    /// Every level, coolest first
    pub const ALL: [AiLevel; 5] = [
        AiLevel::MinusTwo,
        AiLevel::MinusOne,
        AiLevel::Zero,
        AiLevel::PlusOne,
        AiLevel::PlusTwo,
    ];

    /// Wire code (0..=4)
    pub fn code(&self) -> u8 {
        match self {
            AiLevel::MinusTwo => 0,
            AiLevel::MinusOne => 1,
            AiLevel::Zero => 2,
            AiLevel::PlusOne => 3,
            AiLevel::PlusTwo => 4,
        }
    }

    /// Signed offset shown to users (-2..=2)
    pub fn offset(&self) -> i8 {
        self.code() as i8 - 2
    }

    /// Look up a level by its signed offset
    pub fn from_offset(offset: i8) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.offset() == offset)
    }
}

impl TryFrom<u8> for AiLevel {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|l| l.code() == code)
            .ok_or(ProtocolError::UnknownCode {
                field: "AI level",
                code: code as i64,
            })
    }
}

impl From<AiLevel> for u8 {
    fn from(level: AiLevel) -> Self {
        level.code()
    }
}

/// Secondary feature switched on or off with a toggle command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum ToggleKind {
    /// Code 0
    #[default]
    EnergySave,
    /// Code 1
    SwingVertical,
    /// Code 2
    ComfortAir,
}

impl ToggleKind {
    /// Map a raw integer (settings file, command line) to a toggle kind.
    ///
    /// Returns `None` for codes outside the known set.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ToggleKind::EnergySave),
            1 => Some(ToggleKind::SwingVertical),
            2 => Some(ToggleKind::ComfortAir),
            _ => None,
        }
    }

    /// Raw integer code
    pub fn code(&self) -> i32 {
        match self {
            ToggleKind::EnergySave => 0,
            ToggleKind::SwingVertical => 1,
            ToggleKind::ComfortAir => 2,
        }
    }
}

impl TryFrom<i32> for ToggleKind {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(ProtocolError::UnknownCode {
            field: "toggle kind",
            code: code as i64,
        })
    }
}

impl From<ToggleKind> for i32 {
    fn from(kind: ToggleKind) -> Self {
        kind.code()
    }
}

/// Operating mode last selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mode {
    /// Code 0
    Fan,
    /// Code 1
    #[default]
    Cool,
    /// Code 2
    Dry,
    /// Code 3
    Ai,
    /// Code 4
    Toggle,
}

impl Mode {
    /// Raw integer code
    pub fn code(&self) -> u8 {
        match self {
            Mode::Fan => 0,
            Mode::Cool => 1,
            Mode::Dry => 2,
            Mode::Ai => 3,
            Mode::Toggle => 4,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        [Mode::Fan, Mode::Cool, Mode::Dry, Mode::Ai, Mode::Toggle]
            .into_iter()
            .find(|m| m.code() == code)
            .ok_or(ProtocolError::UnknownCode {
                field: "mode",
                code: code as i64,
            })
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        mode.code()
    }
}

/// Target temperature in °C, limited to what the appliance accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Temperature(u8);

impl Temperature {
    /// Lowest accepted setpoint
    pub const MIN: i32 = 18;
    /// Highest accepted setpoint
    pub const MAX: i32 = 30;

    /// Validate a setpoint in °C
    pub fn new(celsius: i32) -> Result<Self, ProtocolError> {
        if !(Self::MIN..=Self::MAX).contains(&celsius) {
            return Err(ProtocolError::TemperatureOutOfRange(celsius));
        }
        Ok(Self(celsius as u8))
    }

    /// Setpoint in °C
    pub fn celsius(&self) -> i32 {
        self.0 as i32
    }

    /// Wire byte: temperature minus 15 (3..=15)
    pub fn code(&self) -> u8 {
        self.0 - 15
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self(27)
    }
}

impl TryFrom<i32> for Temperature {
    type Error = ProtocolError;

    fn try_from(celsius: i32) -> Result<Self, Self::Error> {
        Self::new(celsius)
    }
}

impl From<Temperature> for i32 {
    fn from(t: Temperature) -> Self {
        t.celsius()
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

/// A single air-conditioner command
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Fan {
        power: bool,
        speed: FanSpeed,
    },
    Cool {
        power: bool,
        temperature: Temperature,
        speed: FanSpeed,
    },
    Dry {
        power: bool,
        speed: FanSpeed,
    },
    Ai {
        power: bool,
        level: AiLevel,
    },
    Turbo,
    PowerOff,
    Toggle {
        on: bool,
        kind: ToggleKind,
    },
}

impl Command {
    /// Build the payload bytes for this command
    pub fn payload(&self) -> Payload {
        match *self {
            Command::Fan { power, speed } => command_builder::fan(power, speed),
            Command::Cool {
                power,
                temperature,
                speed,
            } => command_builder::cool(power, temperature, speed),
            Command::Dry { power, speed } => command_builder::dry(power, speed),
            Command::Ai { power, level } => command_builder::ai(power, level),
            Command::Turbo => command_builder::turbo(),
            Command::PowerOff => command_builder::power_off(),
            Command::Toggle { on, kind } => command_builder::toggle(on, kind),
        }
    }

    /// The mode this command selects, if any
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Command::Fan { .. } => Some(Mode::Fan),
            Command::Cool { .. } => Some(Mode::Cool),
            Command::Dry { .. } => Some(Mode::Dry),
            Command::Ai { .. } => Some(Mode::Ai),
            Command::Toggle { .. } => Some(Mode::Toggle),
            Command::Turbo | Command::PowerOff => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_speed_codes() {
        assert_eq!(FanSpeed::Low.code(), 0);
        assert_eq!(FanSpeed::Medium.code(), 2);
        assert_eq!(FanSpeed::High.code(), 4);
        assert_eq!(FanSpeed::Nature.code(), 5);
        assert_eq!(FanSpeed::from_code(1), None);
        assert_eq!(FanSpeed::from_code(5), Some(FanSpeed::Nature));
    }

    #[test]
    fn test_ai_offsets() {
        assert_eq!(AiLevel::MinusTwo.offset(), -2);
        assert_eq!(AiLevel::PlusTwo.code(), 4);
        assert_eq!(AiLevel::from_offset(1), Some(AiLevel::PlusOne));
        assert_eq!(AiLevel::from_offset(3), None);
    }

    #[test]
    fn test_temperature_range() {
        assert_eq!(Temperature::new(18).unwrap().code(), 3);
        assert_eq!(Temperature::new(30).unwrap().code(), 15);
        assert_eq!(
            Temperature::new(31),
            Err(ProtocolError::TemperatureOutOfRange(31))
        );
        assert!(Temperature::new(17).is_err());
    }

    #[test]
    fn test_toggle_codes() {
        assert_eq!(ToggleKind::from_code(2), Some(ToggleKind::ComfortAir));
        assert_eq!(ToggleKind::from_code(3), None);
        assert_eq!(ToggleKind::from_code(-1), None);
    }

    #[test]
    fn test_enums_serialize_as_codes() {
        assert_eq!(serde_json::to_string(&FanSpeed::Nature).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Mode::Toggle).unwrap(), "4");
        assert_eq!(serde_json::to_string(&AiLevel::MinusOne).unwrap(), "1");
        assert_eq!(serde_json::to_string(&ToggleKind::ComfortAir).unwrap(), "2");

        assert_eq!(serde_json::from_str::<FanSpeed>("4").unwrap(), FanSpeed::High);
        assert!(serde_json::from_str::<FanSpeed>("1").is_err());
        assert!(serde_json::from_str::<Mode>("5").is_err());
        assert!(serde_json::from_str::<ToggleKind>("3").is_err());
    }

    #[test]
    fn test_temperature_serde() {
        let t: Temperature = serde_json::from_str("24").unwrap();
        assert_eq!(t.celsius(), 24);
        assert!(serde_json::from_str::<Temperature>("40").is_err());
    }
}
