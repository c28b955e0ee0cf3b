//! Driver for the Parallax Emic 2 text-to-speech module over a serial link.

pub mod console;
pub mod emic;
pub mod error;
pub mod frame;
pub mod port;
pub mod proto;
pub mod selftest;
pub mod stats;

#[cfg(test)]
mod mock;

pub use console::{Console, NullConsole, StdioConsole};
pub use emic::{Callback, Emic2, Timeout, WaitMode, WaitOutcome, WriteOpts};
pub use error::{EmicError, Result};
pub use port::{ByteChannel, LinkConfig, SerialTransport, Transport};
pub use proto::command::{Command, Language, Parser, Voice};
