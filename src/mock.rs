//! Scripted link, console and display used by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::{EmicError, Result};
use crate::frame::{ACK, TERMINATOR};
use crate::port::{ByteChannel, LinkConfig, Transport};

/// Fake peripheral. Bytes become readable once their release time has passed.
#[derive(Debug, Default)]
pub struct MockTransport {
    schedule: VecDeque<(Instant, Vec<u8>)>,
    rx: VecDeque<u8>,
    pub written: Vec<u8>,
    pub writes: usize,
    /// reply `:` to every completed command, as an idle Emic 2 does
    pub auto_ack: bool,
    pub config: Option<LinkConfig>,
    pub open: bool,
    pub flushes: usize,
    pub closes: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acking() -> Self {
        Self {
            auto_ack: true,
            ..Self::default()
        }
    }

    /// Make `bytes` readable after `delay`. Deliveries are released in push order.
    pub fn push_after(&mut self, delay: Duration, bytes: &[u8]) {
        self.schedule.push_back((Instant::now() + delay, bytes.to_vec()));
    }

    pub fn push_now(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    fn release(&mut self) {
        let now = Instant::now();
        while let Some((at, _)) = self.schedule.front() {
            if *at > now {
                break;
            }
            if let Some((_, bytes)) = self.schedule.pop_front() {
                self.rx.extend(bytes);
            }
        }
    }
}

impl ByteChannel for MockTransport {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        self.written.extend_from_slice(buf);
        self.writes += 1;
        let complete = buf.last() == Some(&TERMINATOR) || buf == b"X" || buf == b"Z";
        if self.auto_ack && complete {
            self.rx.push_back(ACK);
        }
        Ok(buf.len())
    }

    fn available(&mut self) -> Result<usize> {
        self.release();
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

impl Transport for MockTransport {
    fn configure(&mut self, cfg: &LinkConfig) -> Result<()> {
        if cfg.invert {
            return Err(EmicError::Unsupported("inverted signalling"));
        }
        self.config = Some(cfg.clone());
        self.open = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.closes += 1;
    }
}

/// Console whose typed input is queued up front.
#[derive(Debug, Default)]
pub struct MockConsole {
    input: VecDeque<u8>,
}

impl MockConsole {
    pub fn typed(bytes: &[u8]) -> Self {
        Self {
            input: bytes.iter().copied().collect(),
        }
    }
}

impl ByteChannel for MockConsole {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.input.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.input.len());
        for (dst, src) in buf.iter_mut().zip(self.input.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

/// Display sink whose contents stay inspectable after it is handed to the controller.
#[derive(Debug, Clone, Default)]
pub struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl SharedSink {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
