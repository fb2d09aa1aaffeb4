//! Settings Module
//!
//! Persists the selected serial device and the last used air-conditioner
//! state so the front end can restore them on the next start.
//!
//! Every setter writes through to disk and then notifies subscribers with the
//! new value.
//!
//! Enumerated options are stored as their integer codes. Loading is lenient: a
//! key that is missing or holds a value of the wrong shape keeps its default
//! and is logged, so one bad entry never locks the user out of the rest.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::{AiLevel, FanSpeed, Mode, Temperature, ToggleKind};

/// Device used until the user picks one
#[cfg(target_os = "windows")]
pub const DEFAULT_DEVICE: &str = "COM1";
/// Device used until the user picks one
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_DEVICE: &str = "/dev/ACM0";

/// Errors raised while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Reading or writing the file failed
    #[error("Settings I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not JSON at all
    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options shared by every mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonSettings {
    /// Serial device of the transmitter
    pub device: String,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
        }
    }
}

/// Last used air-conditioner state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirConditionerSettings {
    /// Last selected mode
    pub mode: Mode,
    /// Last fan speed
    pub fan_speed: FanSpeed,
    /// Last AI comfort level
    pub ai: AiLevel,
    /// Last cooling setpoint
    pub temperature: Temperature,
    /// Raw toggle kind code. Kept as stored, even when no kind matches it.
    pub toggle: i32,
}

impl Default for AirConditionerSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            fan_speed: FanSpeed::default(),
            ai: AiLevel::default(),
            temperature: Temperature::default(),
            toggle: ToggleKind::default().code(),
        }
    }
}

/// Full settings document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Settings {
    /// `common` group
    pub common: CommonSettings,
    /// `air_conditioner` group
    pub air_conditioner: AirConditionerSettings,
}

impl Settings {
    /// Parse a settings document, keeping defaults for missing or invalid keys
    pub fn from_json(content: &str) -> Result<Self, SettingsError> {
        let doc: Value = serde_json::from_str(content)?;
        Ok(Self::from_document(&doc))
    }

    fn from_document(doc: &Value) -> Self {
        let mut settings = Settings::default();

        let common = &mut settings.common;
        merge(&mut common.device, doc, "common", "device");

        let ac = &mut settings.air_conditioner;
        merge(&mut ac.mode, doc, "air_conditioner", "mode");
        merge(&mut ac.fan_speed, doc, "air_conditioner", "fan_speed");
        merge(&mut ac.ai, doc, "air_conditioner", "ai");
        merge(&mut ac.temperature, doc, "air_conditioner", "temperature");
        merge(&mut ac.toggle, doc, "air_conditioner", "toggle");

        settings
    }
}

/// Overwrite `slot` with `doc[group][key]` when present and well formed
fn merge<T: DeserializeOwned>(slot: &mut T, doc: &Value, group: &str, key: &str) {
    let Some(value) = doc.get(group).and_then(|g| g.get(key)) else {
        return;
    };
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => *slot = parsed,
        Err(e) => warn!(group, key, %value, error = %e, "invalid setting, keeping default"),
    }
}

/// A single settings change, carrying the new value
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SettingChange {
    Device(String),
    Mode(Mode),
    FanSpeed(FanSpeed),
    Ai(AiLevel),
    Temperature(Temperature),
    /// Raw toggle kind code
    Toggle(i32),
}

type Listener = Box<dyn Fn(&SettingChange) + Send>;

/// File-backed settings with change listeners
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
    listeners: Vec<Listener>,
}

impl SettingsStore {
    /// Default settings file location (`<config dir>/irbridge/settings.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("irbridge").join("settings.json"))
    }

    /// Load settings from `path`, creating the file with defaults if missing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            let content = fs::read_to_string(&path)?;
            Settings::from_json(&content)?
        } else {
            Settings::default()
        };

        let store = Self {
            path,
            settings,
            listeners: Vec::new(),
        };
        // Fill in missing keys so the file always lists every option
        store.save()?;
        Ok(store)
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current values
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Write the current settings to disk
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Register a callback invoked after every successful change
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&SettingChange) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Selected serial device
    pub fn device(&self) -> &str {
        &self.settings.common.device
    }

    /// Select a serial device
    pub fn set_device(&mut self, device: impl Into<String>) -> Result<(), SettingsError> {
        let device = device.into();
        self.settings.common.device = device.clone();
        self.commit(SettingChange::Device(device))
    }

    /// Last selected mode
    pub fn mode(&self) -> Mode {
        self.settings.air_conditioner.mode
    }

    /// Record the selected mode
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), SettingsError> {
        self.settings.air_conditioner.mode = mode;
        self.commit(SettingChange::Mode(mode))
    }

    /// Last fan speed
    pub fn fan_speed(&self) -> FanSpeed {
        self.settings.air_conditioner.fan_speed
    }

    /// Record the fan speed
    pub fn set_fan_speed(&mut self, speed: FanSpeed) -> Result<(), SettingsError> {
        self.settings.air_conditioner.fan_speed = speed;
        self.commit(SettingChange::FanSpeed(speed))
    }

    /// Last AI level
    pub fn ai(&self) -> AiLevel {
        self.settings.air_conditioner.ai
    }

    /// Record the AI level
    pub fn set_ai(&mut self, level: AiLevel) -> Result<(), SettingsError> {
        self.settings.air_conditioner.ai = level;
        self.commit(SettingChange::Ai(level))
    }

    /// Last cooling setpoint
    pub fn temperature(&self) -> Temperature {
        self.settings.air_conditioner.temperature
    }

    /// Record the cooling setpoint
    pub fn set_temperature(&mut self, temperature: Temperature) -> Result<(), SettingsError> {
        self.settings.air_conditioner.temperature = temperature;
        self.commit(SettingChange::Temperature(temperature))
    }

    /// Raw code of the last toggled feature; see [`ToggleKind::from_code`]
    pub fn toggle(&self) -> i32 {
        self.settings.air_conditioner.toggle
    }

    /// Record the last toggled feature
    pub fn set_toggle(&mut self, toggle: ToggleKind) -> Result<(), SettingsError> {
        let code = toggle.code();
        self.settings.air_conditioner.toggle = code;
        self.commit(SettingChange::Toggle(code))
    }

    fn commit(&self, change: SettingChange) -> Result<(), SettingsError> {
        self.save()?;
        debug!(?change, "setting changed");
        for listener in &self.listeners {
            listener(&change);
        }
        Ok(())
    }
}
