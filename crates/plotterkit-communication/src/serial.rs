//! Serial transport
//!
//! [`SerialTransport`] is the narrow byte-level interface the link needs:
//! write a buffer, read one reply line, discard pending input.
//! [`SerialportTransport`] implements it on top of the `serialport` crate.
//!
//! Reading an acknowledgment has no deadline: a read that times out at the
//! port level just waits again, so a silent controller blocks the stream
//! until it answers or the OS reports an I/O error.

use crate::error::{SerialError, SerialResult};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, error};

/// How long one port-level read waits before it is retried
pub const READ_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Low-level serial port interface
pub trait SerialTransport: Send {
    /// Write the whole buffer and flush it
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Block until one line arrives; `Ok(None)` when the device hung up
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Drop anything already received
    fn clear_input(&mut self) -> io::Result<()>;
}

/// Real serial port implementation using the serialport crate
pub struct SerialportTransport {
    port: Box<dyn serialport::SerialPort>,
    pending: Vec<u8>,
}

impl SerialportTransport {
    /// Open a port at the given baud rate
    pub fn open(port: &str, baud_rate: u32) -> io::Result<Self> {
        let port = serialport::new(port, baud_rate)
            .timeout(READ_POLL_INTERVAL)
            .open()
            .map_err(io::Error::from)?;
        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }

}

fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=end).collect();
    Some(String::from_utf8_lossy(&line).trim_end().to_string())
}

/// Read until `pending` holds a full line. Timeouts are waited out.
fn read_reply<R: Read + ?Sized>(reader: &mut R, pending: &mut Vec<u8>) -> io::Result<Option<String>> {
    let mut buf = [0u8; 256];
    loop {
        if let Some(line) = take_line(pending) {
            return Ok(Some(line));
        }
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(n) => pending.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                debug!("Still waiting for the controller to answer");
            }
            Err(e) => return Err(e),
        }
    }
}

impl SerialTransport for SerialportTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        read_reply(&mut *self.port, &mut self.pending)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }
}

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,
    /// Port description (e.g., "USB Serial Port")
    pub description: String,
    /// Whether the name matches a typical controller connection
    pub likely_controller: bool,
}

/// List available serial ports, likely controller ports first
pub fn list_ports() -> SerialResult<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        error!("Failed to enumerate serial ports: {}", e);
        SerialError::Enumeration(e.to_string())
    })?;

    let mut infos: Vec<SerialPortInfo> = ports
        .iter()
        .map(|port| SerialPortInfo {
            port_name: port.port_name.clone(),
            description: port_description(&port.port_type),
            likely_controller: is_controller_port(&port.port_name),
        })
        .collect();
    infos.sort_by(|a, b| {
        b.likely_controller
            .cmp(&a.likely_controller)
            .then_with(|| a.port_name.cmp(&b.port_name))
    });

    debug!("Found {} serial ports", infos.len());
    Ok(infos)
}

/// Check if a port name matches common controller connections
///
/// - Windows: COM*
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*, /dev/ttyAMA* (Raspberry Pi UART)
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
fn is_controller_port(port_name: &str) -> bool {
    if let Some(num) = port_name.strip_prefix("COM") {
        return !num.is_empty() && num.chars().all(|c| c.is_ascii_digit());
    }

    ["/dev/ttyUSB", "/dev/ttyACM", "/dev/ttyAMA", "/dev/cu.usbserial-", "/dev/cu.usbmodem"]
        .iter()
        .any(|prefix| port_name.starts_with(prefix))
}

fn port_description(port_type: &serialport::SerialPortType) -> String {
    match port_type {
        serialport::SerialPortType::UsbPort(usb_info) => format!(
            "USB {} {}",
            usb_info.manufacturer.as_deref().unwrap_or("Device"),
            usb_info.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_port_patterns() {
        assert!(is_controller_port("COM3"));
        assert!(!is_controller_port("COM"));
        assert!(!is_controller_port("COMX"));
        assert!(is_controller_port("/dev/ttyUSB0"));
        assert!(is_controller_port("/dev/ttyAMA10"));
        assert!(is_controller_port("/dev/cu.usbmodem1101"));
        assert!(!is_controller_port("/dev/ttyS0"));
    }

    /// Replays scripted read results
    struct Scripted(std::collections::VecDeque<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn timed_out() -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out"))
    }

    #[test]
    fn test_read_waits_out_timeouts() {
        let mut reader = Scripted(
            vec![timed_out(), Ok(b"o".to_vec()), timed_out(), timed_out(), Ok(b"k\r\nerr".to_vec())].into(),
        );
        let mut pending = Vec::new();

        assert_eq!(read_reply(&mut reader, &mut pending).unwrap(), Some("ok".to_string()));
        assert_eq!(pending, b"err");
        assert_eq!(read_reply(&mut reader, &mut pending).unwrap(), None);
    }

    #[test]
    fn test_read_error_is_returned() {
        let mut reader = Scripted(
            vec![Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))].into(),
        );
        let err = read_reply(&mut reader, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_open_missing_port_fails() {
        assert!(SerialportTransport::open("/dev/plotterkit-no-such-port", 115200).is_err());
    }
}
