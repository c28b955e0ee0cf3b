use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, trace};

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::{EmicError, Result};

pub const EMIC_BAUD: u32 = 9600;
pub const RX_BUFFER_SIZE: usize = 1024;
const READ_TIMEOUT: Duration = Duration::from_millis(20);

/// Physical link parameters requested from a [`Transport`].
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub baud: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub rx_pin: u8,
    pub tx_pin: u8,
    pub invert: bool,
    pub timeout: Duration,
    pub rx_buffer: usize,
}

impl LinkConfig {
    /// The fixed 9600 8N1 profile the Emic 2 speaks.
    pub fn emic2(tx_pin: u8, rx_pin: u8) -> Self {
        Self {
            baud: EMIC_BAUD,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            rx_pin,
            tx_pin,
            invert: false,
            timeout: READ_TIMEOUT,
            rx_buffer: RX_BUFFER_SIZE,
        }
    }
}

/// Byte-oriented, non-blocking channel. Shared shape of the link and the console.
pub trait ByteChannel {
    /// Writes as much of `buf` as is currently accepted.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize>;
    /// Bytes readable without blocking.
    fn available(&mut self) -> Result<usize>;
    /// Reads at most `buf.len()` bytes, never more than [`ByteChannel::available`].
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize>;

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut b = [0u8; 1];
        match self.read_bytes(&mut b)? {
            0 => Ok(None),
            _ => Ok(Some(b[0])),
        }
    }
}

/// The serial link to the peripheral.
pub trait Transport: ByteChannel {
    /// (Re)opens the link, closing any prior session first.
    fn configure(&mut self, cfg: &LinkConfig) -> Result<()>;
    /// Discards pending output.
    fn flush(&mut self) -> Result<()>;
    fn close(&mut self);
}

/// [`Transport`] over a host serial device.
///
/// Incoming bytes are pulled into a read-ahead buffer bounded by
/// [`LinkConfig::rx_buffer`]; anything beyond that stays in the OS queue.
pub struct SerialTransport {
    dev: String,
    port: Option<Box<dyn SerialPort>>,
    rx: VecDeque<u8>,
    rx_cap: usize,
}

impl SerialTransport {
    pub fn new(dev: impl Into<String>) -> Self {
        Self {
            dev: dev.into(),
            port: None,
            rx: VecDeque::new(),
            rx_cap: RX_BUFFER_SIZE,
        }
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(EmicError::NotOpen)
    }

    fn fill(&mut self) -> Result<()> {
        let room = self.rx_cap.saturating_sub(self.rx.len());
        if room == 0 {
            return Ok(());
        }
        let port = self.port()?;
        let pending = port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(());
        }
        let mut tmp = vec![0u8; pending.min(room)];
        let n = match port.read(&mut tmp) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::TimedOut => 0,
            Err(e) => return Err(e.into()),
        };
        self.rx.extend(&tmp[..n]);
        Ok(())
    }
}

impl ByteChannel for SerialTransport {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.port()?.write(buf)?;
        trace!("tx {:?}", String::from_utf8_lossy(&buf[..n]));
        Ok(n)
    }

    fn available(&mut self) -> Result<usize> {
        self.fill()?;
        Ok(self.rx.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Transport for SerialTransport {
    fn configure(&mut self, cfg: &LinkConfig) -> Result<()> {
        self.close();
        if cfg.invert {
            return Err(EmicError::Unsupported("inverted signalling"));
        }
        let port = serialport::new(&self.dev, cfg.baud)
            .timeout(cfg.timeout)
            .data_bits(cfg.data_bits)
            .parity(cfg.parity)
            .stop_bits(cfg.stop_bits)
            .flow_control(FlowControl::None)
            .open()?;
        self.port = Some(port);
        self.rx_cap = cfg.rx_buffer;
        self.rx = VecDeque::with_capacity(cfg.rx_buffer);
        debug!(
            "opened {} at {} baud (tx pin {}, rx pin {}, rx buffer {})",
            self.dev, cfg.baud, cfg.tx_pin, cfg.rx_pin, cfg.rx_buffer
        );
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.port()?.clear(ClearBuffer::Output)?;
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("closed {}", self.dev);
        }
        self.rx.clear();
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emic2_profile() {
        let cfg = LinkConfig::emic2(17, 16);
        assert_eq!(cfg.baud, 9600);
        assert_eq!(cfg.data_bits, DataBits::Eight);
        assert_eq!(cfg.parity, Parity::None);
        assert_eq!(cfg.stop_bits, StopBits::One);
        assert_eq!((cfg.tx_pin, cfg.rx_pin), (17, 16));
        assert!(cfg.rx_buffer >= 1024);
        assert!(!cfg.invert);
    }

    #[test]
    fn unopened_link_reports_not_open() {
        let mut t = SerialTransport::new("/dev/null-emic");
        assert!(matches!(t.write_bytes(b"X"), Err(EmicError::NotOpen)));
        assert!(matches!(t.available(), Err(EmicError::NotOpen)));
        assert_eq!(t.read_bytes(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn inverted_link_is_rejected() {
        let mut t = SerialTransport::new("/dev/null-emic");
        let mut cfg = LinkConfig::emic2(1, 2);
        cfg.invert = true;
        assert!(matches!(t.configure(&cfg), Err(EmicError::Unsupported(_))));
    }
}
