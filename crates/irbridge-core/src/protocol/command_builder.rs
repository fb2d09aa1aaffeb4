//! Command Builder
//!
//! Maps each command to its payload bytes.
//!
//! Mode commands share a common shape:
//! - bytes 0..3: `08 08 00`
//! - byte 3: mode code, plus `0x08` when powering off
//! - byte 4: mode parameter (temperature, fixed marker or AI level)
//! - byte 5: fan speed code (or fixed marker for AI)
//!
//! Toggles use the prefix `08 08 01` followed by three feature bytes.

use super::{AiLevel, FanSpeed, Payload, Temperature, ToggleKind};

const MODE_PREFIX: [u8; 3] = [0x08, 0x08, 0x00];
const TOGGLE_PREFIX: [u8; 3] = [0x08, 0x08, 0x01];

/// Added to the mode code when the command turns the unit off
const POWER_OFF_FLAG: u8 = 0x08;

const MODE_COOL: u8 = 0x00;
const MODE_DRY: u8 = 0x01;
const MODE_FAN: u8 = 0x02;
const MODE_AI: u8 = 0x03;

fn mode_payload(mode: u8, power: bool, param: u8, last: u8) -> Payload {
    let [a, b, c] = MODE_PREFIX;
    let mode = if power { mode } else { mode + POWER_OFF_FLAG };
    Payload::from_table([a, b, c, mode, param, last])
}

/// Fan-only mode
pub fn fan(power: bool, speed: FanSpeed) -> Payload {
    mode_payload(MODE_FAN, power, 0x03, speed.code())
}

/// Cooling to a target temperature
pub fn cool(power: bool, temperature: Temperature, speed: FanSpeed) -> Payload {
    mode_payload(MODE_COOL, power, temperature.code(), speed.code())
}

/// Dehumidify mode
pub fn dry(power: bool, speed: FanSpeed) -> Payload {
    mode_payload(MODE_DRY, power, 0x09, speed.code())
}

/// AI mode. Powering on always starts from the neutral level.
pub fn ai(power: bool, level: AiLevel) -> Payload {
    let level = if power { AiLevel::Zero } else { level };
    mode_payload(MODE_AI, power, level.code(), 0x05)
}

/// Short high-power burst
pub fn turbo() -> Payload {
    Payload::from_table([0x08, 0x08, 0x01, 0x00, 0x00, 0x08])
}

/// Turn the unit off in any mode
pub fn power_off() -> Payload {
    Payload::from_table([0x08, 0x08, 0x0c, 0x00, 0x00, 0x05])
}

/// Switch a secondary feature on or off
pub fn toggle(on: bool, kind: ToggleKind) -> Payload {
    let (b0, b1, when_on, when_off) = match kind {
        ToggleKind::EnergySave => (0x00, 0x00, 0x04, 0x05),
        ToggleKind::SwingVertical => (0x03, 0x01, 0x04, 0x05),
        ToggleKind::ComfortAir => (0x03, 0x00, 0x09, 0x04),
    };
    let [a, b, c] = TOGGLE_PREFIX;
    Payload::from_table([a, b, c, b0, b1, if on { when_on } else { when_off }])
}
