//! Serial port handling
//!
//! Delivers packets to the IR transmitter. The port is opened fresh for each
//! packet, the hex line is written, the output queue is drained, and the
//! handle is dropped before returning.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use super::{
    Packet, TransportError, DEFAULT_BAUD_RATE, DEFAULT_FLUSH_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WRITE_TIMEOUT_MS,
};

/// Serial line configuration for one transmit call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port name (e.g., "/dev/ttyACM0" or "COM3")
    pub device: String,
    /// Baud rate
    pub baud_rate: u32,
    /// How long a single write may block on a full driver buffer
    pub write_timeout: Duration,
    /// Upper bound for the flush wait. `None` waits until the queue drains.
    pub flush_timeout: Option<Duration>,
    /// Delay between output queue polls
    pub poll_interval: Duration,
}

impl SerialConfig {
    /// Default configuration for `device`
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
            flush_timeout: Some(Duration::from_millis(DEFAULT_FLUSH_TIMEOUT_MS)),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Something that can put a packet on the wire
pub trait Transport {
    /// Deliver one packet, returning the number of bytes written
    fn send(&self, config: &SerialConfig, packet: &Packet) -> Result<usize, TransportError>;
}

/// Writable sink that reports how many bytes are still queued for output
pub trait OutputQueue: Write {
    /// Bytes written but not yet transmitted
    fn pending(&self) -> io::Result<u32>;
}

impl OutputQueue for Box<dyn SerialPort> {
    fn pending(&self) -> io::Result<u32> {
        self.bytes_to_write().map_err(io::Error::from)
    }
}

/// Transport backed by a real serial port
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialTransport;

impl Transport for SerialTransport {
    fn send(&self, config: &SerialConfig, packet: &Packet) -> Result<usize, TransportError> {
        let mut port = open_port(config)?;
        write_line(&mut port, packet, config)
        // port dropped here, releasing the device
    }
}

/// Open a serial port at 8N1 without flow control
pub fn open_port(config: &SerialConfig) -> Result<Box<dyn SerialPort>, TransportError> {
    serialport::new(config.device.as_str(), config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(config.write_timeout)
        .open()
        .map_err(|source| TransportError::Open {
            device: config.device.clone(),
            source,
        })
}

/// Write the packet as a hex line and wait for the output queue to drain
pub fn write_line<P>(port: &mut P, packet: &Packet, config: &SerialConfig) -> Result<usize, TransportError>
where
    P: OutputQueue + ?Sized,
{
    let line = packet.to_hex_line();
    tracing::debug!(hex = %line.trim_end(), "writing packet");

    port.write_all(line.as_bytes())?;
    drain(port, config.flush_timeout, config.poll_interval)?;

    Ok(line.len())
}

/// Poll the output queue until it is empty.
///
/// `write()` only hands bytes to the driver, so the handle must stay open
/// until the queue reports zero or the last bytes may never leave the port.
pub fn drain<P>(port: &P, timeout: Option<Duration>, poll: Duration) -> Result<(), TransportError>
where
    P: OutputQueue + ?Sized,
{
    let start = Instant::now();
    loop {
        let pending = port.pending()?;
        if pending == 0 {
            return Ok(());
        }

        let waited = start.elapsed();
        if let Some(limit) = timeout {
            if waited >= limit {
                return Err(TransportError::Timeout { pending, waited });
            }
        }

        std::thread::sleep(poll);
    }
}

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// USB ports first, then by name with trailing numbers compared numerically
/// (so `COM3` < `COM10` and `ttyACM2` < `ttyACM10`).
fn port_order(port: &PortInfo) -> (bool, &str, u64) {
    let stem = port.name.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = port.name[stem.len()..].parse().unwrap_or(0);
    (port.vid.is_none(), stem, number)
}

/// List available serial ports for display.
///
/// Device names passed to [`SerialConfig`] are never checked against this list.
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| port_order(a).cmp(&port_order(b)));
    ports
}
