//! Serial port communication implementation
//!
//! Provides low-level serial port operations for the USB link to the
//! motor controller board.
//!
//! Supports:
//! - Port enumeration and discovery
//! - Opening a device at the configured baud rate and timeout
//! - Non-blocking availability checks for the background listener
//! - Blocking writes bounded by the port timeout

use crate::communication::ConnectionParams;
use motorpanel_core::{ConnectionError, Error, Result};
use std::io::{self, Read, Write};

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Arduino Uno")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// Serial number if available
    pub serial_number: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set serial number
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }

    /// Label shown in a port picker, e.g. "/dev/ttyACM0 - USB Arduino Uno"
    pub fn label(&self) -> String {
        format!("{} - {}", self.port_name, self.description)
    }
}

/// List serial ports currently attached to the system
///
/// Every call takes a fresh snapshot. Ports that look like USB controller
/// boards are listed first:
/// - Windows: COM* (e.g., COM1, COM3)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    match serialport::available_ports() {
        Ok(ports) => {
            let mut port_infos: Vec<SerialPortInfo> = ports
                .iter()
                .map(|port| {
                    let info = SerialPortInfo::new(&port.port_name, get_port_description(port));

                    match &port.port_type {
                        serialport::SerialPortType::UsbPort(usb_info) => {
                            let mut info = info.with_usb_ids(usb_info.vid, usb_info.pid);
                            if let Some(ref mfg) = usb_info.manufacturer {
                                info = info.with_manufacturer(mfg);
                            }
                            if let Some(ref serial) = usb_info.serial_number {
                                info = info.with_serial_number(serial);
                            }
                            info
                        }
                        _ => info,
                    }
                })
                .collect();

            // Stable sort keeps the OS order within each group.
            port_infos.sort_by_key(|info| !is_controller_port(&info.port_name));
            tracing::debug!("Found {} serial ports", port_infos.len());
            Ok(port_infos)
        }
        Err(e) => {
            tracing::error!("Failed to enumerate serial ports: {}", e);
            Err(ConnectionError::Enumeration {
                reason: e.to_string(),
            }
            .into())
        }
    }
}

/// Pick the port to connect to from a snapshot
///
/// With no explicit request the first listed port is used.
pub fn select_port<'a>(
    ports: &'a [SerialPortInfo],
    requested: Option<&str>,
) -> Result<&'a SerialPortInfo> {
    if ports.is_empty() {
        return Err(Error::PortEnumerationEmpty);
    }

    match requested {
        Some(name) => ports
            .iter()
            .find(|port| port.port_name == name)
            .ok_or_else(|| {
                ConnectionError::PortNotFound {
                    port: name.to_string(),
                }
                .into()
            }),
        None => Ok(&ports[0]),
    }
}

/// Check if a port name matches USB controller board patterns
fn is_controller_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial")
        || port_name.starts_with("/dev/cu.usbmodem")
}

/// Get a user-friendly description for a port
fn get_port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Low-level serial port interface
pub trait SerialPort: Send {
    /// Write all of `data`, bounded by the port timeout
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Number of bytes that can be read without blocking
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read data from the port
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Get the port name
    fn name(&self) -> String;

    /// Close the port
    fn close(&mut self) -> io::Result<()>;
}

/// Opens serial devices by name
pub trait PortOpener: Send + Sync {
    /// Open `device` with the given parameters
    fn open(&self, device: &str, params: &ConnectionParams) -> Result<Box<dyn SerialPort>>;
}

/// Opener backed by the operating system's serial ports
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePortOpener;

impl PortOpener for NativePortOpener {
    fn open(&self, device: &str, params: &ConnectionParams) -> Result<Box<dyn SerialPort>> {
        Ok(Box::new(RealSerialPort::open(device, params)?))
    }
}

/// Real serial port implementation using serialport crate
pub struct RealSerialPort {
    name: String,
    port: Box<dyn serialport::SerialPort>,
}

impl RealSerialPort {
    /// Open a serial port with the given parameters
    pub fn open(device: &str, params: &ConnectionParams) -> Result<Self> {
        let builder = serialport::new(device, params.baud_rate)
            .timeout(params.timeout())
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None);

        match builder.open() {
            Ok(port) => Ok(RealSerialPort {
                name: device.to_string(),
                port,
            }),
            Err(e) => {
                tracing::warn!("Failed to open serial port {}: {}", device, e);
                Err(open_error(device, &e).into())
            }
        }
    }
}

/// Classify an open failure as missing, busy, denied, or other
fn open_error(device: &str, e: &serialport::Error) -> ConnectionError {
    let port = device.to_string();
    match e.kind() {
        serialport::ErrorKind::NoDevice => ConnectionError::PortNotFound { port },
        serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
            ConnectionError::PortNotFound { port }
        }
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            ConnectionError::AccessDenied { port }
        }
        serialport::ErrorKind::Io(io::ErrorKind::ResourceBusy) => {
            ConnectionError::PortInUse { port }
        }
        _ => ConnectionError::FailedToOpen {
            port,
            reason: e.to_string(),
        },
    }
}

impl SerialPort for RealSerialPort {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::from)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn close(&mut self) -> io::Result<()> {
        // The OS handle is released when the port is dropped.
        self.port.flush()
    }
}
