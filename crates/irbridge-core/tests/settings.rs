use irbridge_core::protocol::{AiLevel, FanSpeed, Mode, Temperature, ToggleKind};
use irbridge_core::settings::{SettingChange, Settings, SettingsStore, DEFAULT_DEVICE};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[test]
fn test_open_creates_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let store = SettingsStore::open(&path).unwrap();

    assert!(path.exists());
    assert_eq!(store.settings(), &Settings::default());
    assert_eq!(store.device(), DEFAULT_DEVICE);
}

#[test]
fn test_changes_persist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");

    {
        let mut store = SettingsStore::open(&path).unwrap();
        store.set_device("/dev/ttyACM1").unwrap();
        store.set_mode(Mode::Dry).unwrap();
        store.set_fan_speed(FanSpeed::Nature).unwrap();
        store.set_ai(AiLevel::MinusOne).unwrap();
        store.set_temperature(Temperature::new(22).unwrap()).unwrap();
        store.set_toggle(ToggleKind::ComfortAir).unwrap();
    }

    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.device(), "/dev/ttyACM1");
    assert_eq!(store.mode(), Mode::Dry);
    assert_eq!(store.fan_speed(), FanSpeed::Nature);
    assert_eq!(store.ai(), AiLevel::MinusOne);
    assert_eq!(store.temperature().celsius(), 22);
    assert_eq!(store.toggle(), ToggleKind::ComfortAir.code());
}

#[test]
fn test_listeners_receive_new_values() {
    let dir = tempdir().unwrap();
    let mut store = SettingsStore::open(dir.path().join("settings.json")).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

    store.set_device("COM4").unwrap();
    store.set_temperature(Temperature::new(30).unwrap()).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            SettingChange::Device("COM4".to_string()),
            SettingChange::Temperature(Temperature::new(30).unwrap()),
        ]
    );
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(SettingsStore::open(&path).is_err());
}

#[test]
fn test_out_of_range_temperature_falls_back_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"air_conditioner": {"temperature": 12, "fan_speed": 4}}"#).unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.temperature().celsius(), 27);
    assert_eq!(store.fan_speed(), FanSpeed::High);
}

#[test]
fn test_bad_toggle_does_not_block_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"common": {"device": "COM7"}, "air_conditioner": {"toggle": "swing_horizontal", "ai": 4}}"#,
    )
    .unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.device(), "COM7");
    assert_eq!(store.ai(), AiLevel::PlusTwo);
    assert_eq!(store.toggle(), ToggleKind::default().code());

    // The repaired document is written back
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["air_conditioner"]["toggle"], 0);
    assert_eq!(written["common"]["device"], "COM7");
}

#[test]
fn test_unknown_toggle_code_survives_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"air_conditioner": {"toggle": 3}}"#).unwrap();

    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.toggle(), 3);
    assert_eq!(ToggleKind::from_code(store.toggle()), None);
}
