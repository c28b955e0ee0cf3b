use tracing::debug;

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::error::Result;
use crate::port::ByteChannel;

/// Operator console relayed to the peripheral by [`crate::emic::Emic2::relay`].
pub trait Console: ByteChannel {}

impl<T: ByteChannel> Console for T {}

/// Console that never has input and swallows output.
#[derive(Debug, Default)]
pub struct NullConsole;

impl ByteChannel for NullConsole {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(0)
    }

    fn read_bytes(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }
}

/// Stdin/stdout console. Stdin is drained by a reader thread so polling never blocks.
pub struct StdioConsole {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    closed: bool,
}

impl StdioConsole {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut buf = [0u8; 256];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self {
            rx,
            pending: VecDeque::new(),
            closed: false,
        }
    }

    fn pump(&mut self) {
        while !self.closed {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("console input closed");
                    self.closed = true;
                }
            }
        }
    }
}

impl ByteChannel for StdioConsole {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        let mut out = io::stdout().lock();
        out.write_all(buf)?;
        out.flush()?;
        Ok(buf.len())
    }

    fn available(&mut self) -> Result<usize> {
        self.pump();
        Ok(self.pending.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.pending.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_console_is_silent() {
        let mut c = NullConsole;
        assert_eq!(c.available().unwrap(), 0);
        assert_eq!(c.read_byte().unwrap(), None);
        assert_eq!(c.write_bytes(b"abc").unwrap(), 3);
    }
}
