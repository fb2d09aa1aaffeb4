//! Commander
//!
//! Front door for the surrounding application: one method per air-conditioner
//! command, each encoding a packet and sending it before returning.
//!
//! The transmitter is one-way, so failures are logged and handed back as a
//! [`Delivery`] value instead of being raised. Callers that only care about
//! firing the command can ignore the result.

use tracing::{debug, warn};

use super::{
    AiLevel, Command, FanSpeed, Packet, SerialConfig, SerialTransport, Temperature, ToggleKind,
    Transport, TransportError,
};

/// What happened to a command
#[derive(Debug)]
pub enum Delivery {
    /// The hex line was written and drained
    Sent {
        /// Length of the hex line including the newline
        bytes: usize,
    },
    /// Nothing was built, so nothing was sent
    NotSent,
    /// Building succeeded but the serial line failed
    Failed(TransportError),
}

impl Delivery {
    /// True when the line reached the port
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}

/// Encodes commands and pushes them through a [`Transport`]
pub struct Commander<T = SerialTransport> {
    config: SerialConfig,
    transport: T,
}

impl Commander<SerialTransport> {
    /// Commander talking to a real serial port
    pub fn new(config: SerialConfig) -> Self {
        Self::with_transport(config, SerialTransport)
    }
}

impl<T: Transport> Commander<T> {
    /// Commander with a custom transport (tests, alternate links)
    pub fn with_transport(config: SerialConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Select the serial device used by later commands
    pub fn set_device(&mut self, device: impl Into<String>) {
        self.config.device = device.into();
        debug!(device = %self.config.device, "device selected");
    }

    /// Currently selected device
    pub fn device(&self) -> &str {
        &self.config.device
    }

    /// Serial settings used for every send
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fan-only mode
    pub fn fan(&self, power: bool, speed: FanSpeed) -> Delivery {
        self.execute(Command::Fan { power, speed })
    }

    /// Cool to `temperature`
    pub fn cool(&self, power: bool, temperature: Temperature, speed: FanSpeed) -> Delivery {
        self.execute(Command::Cool {
            power,
            temperature,
            speed,
        })
    }

    /// Dehumidify mode
    pub fn dry(&self, power: bool, speed: FanSpeed) -> Delivery {
        self.execute(Command::Dry { power, speed })
    }

    /// AI mode; powering on always starts from the neutral level
    pub fn ai(&self, power: bool, level: AiLevel) -> Delivery {
        self.execute(Command::Ai { power, level })
    }

    /// Turbo burst
    pub fn turbo(&self) -> Delivery {
        self.execute(Command::Turbo)
    }

    /// Turn the unit off
    pub fn power_off(&self) -> Delivery {
        self.execute(Command::PowerOff)
    }

    /// Switch a secondary feature on or off
    pub fn toggle(&self, on: bool, kind: ToggleKind) -> Delivery {
        self.execute(Command::Toggle { on, kind })
    }

    /// Toggle by raw kind code. Unknown codes send nothing.
    pub fn toggle_code(&self, on: bool, code: i32) -> Delivery {
        match ToggleKind::from_code(code) {
            Some(kind) => self.toggle(on, kind),
            None => {
                warn!(code, "unknown toggle kind, nothing sent");
                Delivery::NotSent
            }
        }
    }

    /// Encode and send a command, blocking until the line is drained
    pub fn execute(&self, command: Command) -> Delivery {
        debug!(?command, "command");

        let packet = Packet::new(command.payload());
        match self.transport.send(&self.config, &packet) {
            Ok(bytes) => Delivery::Sent { bytes },
            Err(e) => {
                warn!(device = %self.config.device, error = %e, "command dropped");
                Delivery::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl Transport for Recorder {
        fn send(&self, config: &SerialConfig, packet: &Packet) -> Result<usize, TransportError> {
            let bytes = packet.to_bytes();
            let n = bytes.len();
            self.sent
                .lock()
                .unwrap()
                .push((config.device.clone(), bytes));
            Ok(n)
        }
    }

    #[test]
    fn test_set_device_last_writer_wins() {
        let mut commander = Commander::with_transport(SerialConfig::new("COM1"), Recorder::default());
        commander.set_device("/dev/ttyACM0");
        commander.set_device("/dev/ttyACM1");
        commander.turbo();

        let sent = commander.transport().sent.lock().unwrap();
        assert_eq!(sent[0].0, "/dev/ttyACM1");
    }

    #[test]
    fn test_unknown_toggle_sends_nothing() {
        let commander = Commander::with_transport(SerialConfig::new("COM1"), Recorder::default());
        assert!(matches!(commander.toggle_code(true, 7), Delivery::NotSent));
        assert!(commander.transport().sent.lock().unwrap().is_empty());

        assert!(commander.toggle_code(true, 1).is_sent());
        assert_eq!(commander.transport().sent.lock().unwrap().len(), 1);
    }
}
