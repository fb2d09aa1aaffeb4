use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use irbridge_core::protocol::{
    list_ports, AiLevel, Command, Commander, Delivery, FanSpeed, Mode, Packet, SerialConfig,
    Temperature, ToggleKind, Transport,
};
use irbridge_core::settings::{Settings, SettingsStore};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "irbridge", version, about = "Send air-conditioner commands to an IR transmitter")]
struct Cli {
    /// Serial device (defaults to the one stored in settings)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Settings file location
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Give up waiting for the output queue after this many milliseconds (0 waits forever)
    #[arg(long, global = true, default_value_t = irbridge_core::protocol::DEFAULT_FLUSH_TIMEOUT_MS)]
    flush_timeout_ms: u64,

    /// Print the hex line instead of sending it
    #[arg(long, global = true)]
    print_only: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Fan-only mode
    Fan {
        #[arg(value_enum, default_value_t = Power::On)]
        power: Power,
        #[arg(short, long, value_enum)]
        speed: Option<Speed>,
    },
    /// Cool to a target temperature
    Cool {
        #[arg(value_enum, default_value_t = Power::On)]
        power: Power,
        /// Target temperature in °C (18-30)
        #[arg(short, long)]
        temperature: Option<i32>,
        #[arg(short, long, value_enum)]
        speed: Option<Speed>,
    },
    /// Dehumidify mode
    Dry {
        #[arg(value_enum, default_value_t = Power::On)]
        power: Power,
        #[arg(short, long, value_enum)]
        speed: Option<Speed>,
    },
    /// AI mode
    Ai {
        #[arg(value_enum, default_value_t = Power::On)]
        power: Power,
        /// Comfort offset from -2 to 2
        #[arg(short, long, allow_negative_numbers = true)]
        level: Option<i8>,
    },
    /// Turbo burst
    Turbo,
    /// Turn the unit off
    PowerOff,
    /// Switch a secondary feature (defaults to the last one toggled)
    Toggle {
        #[arg(value_enum)]
        power: Power,
        #[arg(value_enum)]
        kind: Option<Feature>,
    },
    /// List serial ports
    Ports,
    /// Verify and describe a hex line
    Decode { line: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Power {
    On,
    Off,
}

impl Power {
    fn is_on(self) -> bool {
        matches!(self, Power::On)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Speed {
    Low,
    Medium,
    High,
    Nature,
}

impl From<Speed> for FanSpeed {
    fn from(s: Speed) -> Self {
        match s {
            Speed::Low => FanSpeed::Low,
            Speed::Medium => FanSpeed::Medium,
            Speed::High => FanSpeed::High,
            Speed::Nature => FanSpeed::Nature,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Feature {
    EnergySave,
    SwingVertical,
    ComfortAir,
}

impl From<Feature> for ToggleKind {
    fn from(f: Feature) -> Self {
        match f {
            Feature::EnergySave => ToggleKind::EnergySave,
            Feature::SwingVertical => ToggleKind::SwingVertical,
            Feature::ComfortAir => ToggleKind::ComfortAir,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// What to put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Send(Command),
    /// Toggle the feature stored in settings, by its raw code
    StoredToggle { on: bool, code: i32 },
}

impl Request {
    fn to_hex_line(self) -> Result<String> {
        let command = match self {
            Request::Send(command) => command,
            Request::StoredToggle { on, code } => Command::Toggle {
                on,
                kind: ToggleKind::from_code(code)
                    .with_context(|| format!("stored toggle kind {code} is unknown"))?,
            },
        };
        Ok(Packet::new(command.payload()).to_hex_line())
    }
}

/// Resolve a subcommand into a request, filling gaps from settings
fn resolve(cmd: &Cmd, settings: &Settings) -> Result<Request> {
    let last = &settings.air_conditioner;
    let speed = |s: &Option<Speed>| s.map(FanSpeed::from).unwrap_or(last.fan_speed);

    let command = match cmd {
        Cmd::Fan { power, speed: s } => Command::Fan {
            power: power.is_on(),
            speed: speed(s),
        },
        Cmd::Cool {
            power,
            temperature,
            speed: s,
        } => Command::Cool {
            power: power.is_on(),
            temperature: match temperature {
                Some(t) => Temperature::new(*t)?,
                None => last.temperature,
            },
            speed: speed(s),
        },
        Cmd::Dry { power, speed: s } => Command::Dry {
            power: power.is_on(),
            speed: speed(s),
        },
        Cmd::Ai { power, level } => Command::Ai {
            power: power.is_on(),
            level: match level {
                Some(offset) => AiLevel::from_offset(*offset)
                    .with_context(|| format!("AI level {offset} is outside -2..=2"))?,
                None => last.ai,
            },
        },
        Cmd::Turbo => Command::Turbo,
        Cmd::PowerOff => Command::PowerOff,
        Cmd::Toggle { power, kind } => match kind {
            Some(kind) => Command::Toggle {
                on: power.is_on(),
                kind: ToggleKind::from(*kind),
            },
            None => {
                return Ok(Request::StoredToggle {
                    on: power.is_on(),
                    code: last.toggle,
                })
            }
        },
        Cmd::Ports | Cmd::Decode { .. } => {
            bail!("{cmd:?} is not an air-conditioner command")
        }
    };
    Ok(Request::Send(command))
}

/// Remember what was just sent so the next run starts from it
fn remember(store: &mut SettingsStore, command: &Command) -> Result<()> {
    if let Some(mode) = command.mode() {
        store.set_mode(mode)?;
    }
    match *command {
        Command::Fan { speed, .. } | Command::Dry { speed, .. } => store.set_fan_speed(speed)?,
        Command::Cool {
            temperature, speed, ..
        } => {
            store.set_temperature(temperature)?;
            store.set_fan_speed(speed)?;
        }
        Command::Ai { level, .. } => store.set_ai(level)?,
        Command::Toggle { kind, .. } => store.set_toggle(kind)?,
        Command::Turbo | Command::PowerOff => {}
    }
    Ok(())
}

/// Send a request and record it in settings once it reached the port
fn deliver<T: Transport>(
    commander: &Commander<T>,
    store: &mut SettingsStore,
    request: Request,
) -> Result<usize> {
    let delivery = match request {
        Request::Send(command) => commander.execute(command),
        Request::StoredToggle { on, code } => commander.toggle_code(on, code),
    };

    match delivery {
        Delivery::Sent { bytes } => {
            match request {
                Request::Send(command) => remember(store, &command)?,
                Request::StoredToggle { .. } => store.set_mode(Mode::Toggle)?,
            }
            Ok(bytes)
        }
        Delivery::NotSent => bail!("nothing to send"),
        Delivery::Failed(e) => Err(e).context("command not delivered"),
    }
}

/// Read settings without touching the file; any problem falls back to defaults
fn peek_settings(path: &Path) -> Settings {
    let loaded = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| Settings::from_json(&content).map_err(anyhow::Error::from));
    match loaded {
        Ok(settings) => settings,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "using default settings");
            Settings::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Cmd::Ports => {
            for port in list_ports() {
                match (port.vid, port.pid) {
                    (Some(vid), Some(pid)) => println!(
                        "{}  {:04x}:{:04x}  {}",
                        port.name,
                        vid,
                        pid,
                        port.product.as_deref().unwrap_or("")
                    ),
                    _ => println!("{}", port.name),
                }
            }
            return Ok(());
        }
        Cmd::Decode { line } => {
            let packet = Packet::from_hex_line(line)?;
            println!(
                "ok: {} bytes, payload {}, checksum {:#04x}",
                packet.encoded_size(),
                hex_spaced(packet.payload.as_bytes()),
                packet.checksum()
            );
            return Ok(());
        }
        _ => {}
    }

    let settings_path = match &cli.settings {
        Some(p) => p.clone(),
        None => SettingsStore::default_path().context("no config directory on this platform")?,
    };

    if cli.print_only {
        let request = resolve(&cli.command, &peek_settings(&settings_path))?;
        print!("{}", request.to_hex_line()?);
        return Ok(());
    }

    let mut store = SettingsStore::open(&settings_path)
        .with_context(|| format!("loading {}", settings_path.display()))?;
    tracing::debug!(path = %settings_path.display(), device = store.device(), "settings loaded");

    let request = resolve(&cli.command, store.settings())?;

    if let Some(device) = &cli.device {
        store.set_device(device.clone())?;
    }

    let config = SerialConfig {
        flush_timeout: match cli.flush_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        },
        ..SerialConfig::new(store.device())
    };

    let bytes = deliver(&Commander::new(config), &mut store, request)?;
    println!("sent {bytes} bytes to {}", store.device());
    Ok(())
}

fn hex_spaced(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use irbridge_core::protocol::TransportError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Packet>>,
    }

    impl Transport for Recorder {
        fn send(&self, _config: &SerialConfig, packet: &Packet) -> Result<usize, TransportError> {
            self.sent.lock().unwrap().push(packet.clone());
            Ok(packet.to_hex_line().len())
        }
    }

    struct Unplugged;

    impl Transport for Unplugged {
        fn send(&self, _config: &SerialConfig, _packet: &Packet) -> Result<usize, TransportError> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged").into())
        }
    }

    fn stored() -> Settings {
        let mut settings = Settings::default();
        settings.air_conditioner.fan_speed = FanSpeed::Nature;
        settings.air_conditioner.temperature = Temperature::new(22).unwrap();
        settings.air_conditioner.ai = AiLevel::MinusOne;
        settings.air_conditioner.toggle = ToggleKind::SwingVertical.code();
        settings
    }

    #[test]
    fn test_resolve_fills_gaps_from_settings() {
        let cool = Cmd::Cool {
            power: Power::On,
            temperature: None,
            speed: None,
        };
        assert_eq!(
            resolve(&cool, &stored()).unwrap(),
            Request::Send(Command::Cool {
                power: true,
                temperature: Temperature::new(22).unwrap(),
                speed: FanSpeed::Nature,
            })
        );

        let ai = Cmd::Ai {
            power: Power::Off,
            level: None,
        };
        assert_eq!(
            resolve(&ai, &stored()).unwrap(),
            Request::Send(Command::Ai {
                power: false,
                level: AiLevel::MinusOne,
            })
        );
    }

    #[test]
    fn test_resolve_prefers_arguments() {
        let cool = Cmd::Cool {
            power: Power::On,
            temperature: Some(19),
            speed: Some(Speed::Low),
        };
        assert_eq!(
            resolve(&cool, &stored()).unwrap(),
            Request::Send(Command::Cool {
                power: true,
                temperature: Temperature::new(19).unwrap(),
                speed: FanSpeed::Low,
            })
        );
    }

    #[test]
    fn test_resolve_rejects_out_of_range_arguments() {
        let hot = Cmd::Cool {
            power: Power::On,
            temperature: Some(35),
            speed: None,
        };
        assert!(resolve(&hot, &stored()).is_err());

        let ai = Cmd::Ai {
            power: Power::On,
            level: Some(3),
        };
        assert!(resolve(&ai, &stored()).is_err());
        assert!(resolve(&Cmd::Ports, &stored()).is_err());
    }

    #[test]
    fn test_toggle_without_kind_uses_stored_code() {
        let toggle = Cmd::Toggle {
            power: Power::On,
            kind: None,
        };
        assert_eq!(
            resolve(&toggle, &stored()).unwrap(),
            Request::StoredToggle { on: true, code: 1 }
        );
    }

    #[test]
    fn test_sent_command_is_remembered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::open(&path).unwrap();
        let commander = Commander::with_transport(SerialConfig::new("COM1"), Recorder::default());

        let request = Request::Send(Command::Dry {
            power: true,
            speed: FanSpeed::High,
        });
        let bytes = deliver(&commander, &mut store, request).unwrap();

        assert_eq!(bytes, 2 * 43 + 1);
        assert_eq!(commander.transport().sent.lock().unwrap().len(), 1);
        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.mode(), Mode::Dry);
        assert_eq!(reopened.fan_speed(), FanSpeed::High);
    }

    #[test]
    fn test_failed_command_is_not_remembered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::open(&path).unwrap();
        let commander = Commander::with_transport(SerialConfig::new("COM1"), Unplugged);

        let request = Request::Send(Command::Cool {
            power: true,
            temperature: Temperature::new(20).unwrap(),
            speed: FanSpeed::Low,
        });
        assert!(deliver(&commander, &mut store, request).is_err());

        assert_eq!(store.settings(), &Settings::default());
        assert_eq!(SettingsStore::open(&path).unwrap().settings(), &Settings::default());
    }

    #[test]
    fn test_stored_toggle_goes_through_code_lookup() {
        let dir = tempdir().unwrap();
        let mut store = SettingsStore::open(dir.path().join("settings.json")).unwrap();
        let commander = Commander::with_transport(SerialConfig::new("COM1"), Recorder::default());

        let request = Request::StoredToggle { on: false, code: 2 };
        deliver(&commander, &mut store, request).unwrap();

        let sent = commander.transport().sent.lock().unwrap();
        assert_eq!(sent[0].payload.as_bytes(), &[0x08, 0x08, 0x01, 0x03, 0x00, 0x04]);
        assert_eq!(store.mode(), Mode::Toggle);
    }

    #[test]
    fn test_unknown_stored_toggle_sends_nothing() {
        let dir = tempdir().unwrap();
        let mut store = SettingsStore::open(dir.path().join("settings.json")).unwrap();
        let commander = Commander::with_transport(SerialConfig::new("COM1"), Recorder::default());

        let request = Request::StoredToggle { on: true, code: 3 };
        assert!(deliver(&commander, &mut store, request).is_err());
        assert!(request.to_hex_line().is_err());

        assert!(commander.transport().sent.lock().unwrap().is_empty());
        assert_eq!(store.mode(), Mode::default());
    }

    #[test]
    fn test_print_only_survives_bad_settings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let settings = peek_settings(&path);
        assert_eq!(settings, Settings::default());
        let request = resolve(&Cmd::Turbo, &settings).unwrap();
        assert!(request.to_hex_line().unwrap().ends_with('\n'));
        assert_eq!(peek_settings(&dir.path().join("missing.json")), Settings::default());
    }
}
