use tracing::{info, trace, warn};

use std::io::{self, Write};
use std::mem;
use std::thread;
use std::time::{Duration, Instant};

use crate::console::{Console, NullConsole};
use crate::error::Result;
use crate::frame::{ACK, build_frame, device_volume};
use crate::port::{LinkConfig, Transport};
use crate::proto::command::{Command, Demo, Language, Parser, Voice};
use crate::stats::RelayStats;

pub const DEFAULT_VOICE: u8 = 1;
pub const QUIET_VOLUME: f32 = 62.0;
pub const DEFAULT_VOLUME: f32 = 75.0;
pub const LOUD_VOLUME: f32 = 85.0;
pub const DEFAULT_WPM: u32 = 230;
pub const DEFAULT_PARSER: Parser = Parser::DecTalk;
/// Relay window used by settings commands when not synchronous.
pub const SETTLE_TIME: Duration = Duration::from_millis(25);
/// Bound on the acknowledgment wait of synchronous settings commands.
pub const SYNC_TIMEOUT: Duration = Duration::from_millis(1000);
/// Pause between relay drain chunks.
pub const RELAY_PACE: Duration = Duration::from_millis(20);

/// Invoked immediately before any bytes are written to the peripheral.
pub type Callback = Box<dyn FnMut()>;

/// Result of [`Emic2::wait_for`]. Exactly one per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Matched,
    /// First non-matching byte, when mismatches are not ignored.
    Mismatched(u8),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    Never,
    After(Duration),
}

impl Timeout {
    /// `0` means wait forever.
    pub fn from_millis(ms: u64) -> Self {
        match ms {
            0 => Timeout::Never,
            ms => Timeout::After(Duration::from_millis(ms)),
        }
    }
}

/// How `say` and `demo` return after sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Block until the peripheral acknowledges, with no timeout.
    Sync,
    /// Return right away.
    NoWait,
    /// Relay peripheral output for the given window, then return.
    Relay(Duration),
}

impl WaitMode {
    pub fn relay_millis(ms: u64) -> Self {
        match ms {
            0 => WaitMode::NoWait,
            ms => WaitMode::Relay(Duration::from_millis(ms)),
        }
    }
}

/// Options for [`Emic2::write_str`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOpts {
    /// Block until `:` with no timeout.
    pub sync: bool,
    /// Bytes to send; `0` sends up to the first NUL or the end of the string.
    pub length: usize,
}

/// Driver for one Emic 2 module on one serial link.
pub struct Emic2<T: Transport> {
    link: T,
    tx_pin: u8,
    rx_pin: u8,
    on_write: Option<Callback>,
    debug: bool,
    console: Box<dyn Console>,
    display: Box<dyn Write>,
    scratch: Vec<u8>,
    pub(crate) passes: u32,
}

impl<T: Transport> Emic2<T> {
    pub fn new(link: T, tx_pin: u8, rx_pin: u8) -> Self {
        Self {
            link,
            tx_pin,
            rx_pin,
            on_write: None,
            debug: false,
            console: Box::new(NullConsole),
            display: Box::new(io::stdout()),
            scratch: Vec::new(),
            passes: 0,
        }
    }

    pub fn with_console(mut self, console: Box<dyn Console>) -> Self {
        self.console = console;
        self
    }

    pub fn with_display(mut self, display: Box<dyn Write>) -> Self {
        self.display = display;
        self
    }

    pub fn tx_pin(&self) -> u8 {
        self.tx_pin
    }

    pub fn rx_pin(&self) -> u8 {
        self.rx_pin
    }

    #[cfg(test)]
    pub(crate) fn link(&self) -> &T {
        &self.link
    }

    #[cfg(test)]
    pub(crate) fn link_mut(&mut self) -> &mut T {
        &mut self.link
    }

    /// Returns the previous debug flag.
    pub fn set_debug(&mut self, debug: bool) -> bool {
        mem::replace(&mut self.debug, debug)
    }

    /// Returns the previous callback.
    pub fn set_callback(&mut self, cb: Option<Callback>) -> Option<Callback> {
        mem::replace(&mut self.on_write, cb)
    }

    /// Open the link at 9600 8N1, stop any playback and select the default parser.
    pub fn setup(&mut self) -> Result<()> {
        self.link.close();
        self.link.configure(&LinkConfig::emic2(self.tx_pin, self.rx_pin))?;
        self.link.flush()?;
        self.stop_playback(true)?;
        self.set_parser(DEFAULT_PARSER, true)?;
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<usize> {
        if let Some(cb) = self.on_write.as_mut() {
            cb();
        }
        let n = self.link.write_bytes(bytes)?;
        if n < bytes.len() {
            warn!("short write: {} of {} bytes accepted", n, bytes.len());
        }
        Ok(n)
    }

    pub fn write_byte(&mut self, c: u8) -> Result<usize> {
        self.send(&[c])
    }

    /// Write raw bytes. With `sync`, block until `:` arrives (no timeout).
    pub fn write(&mut self, data: &[u8], sync: bool) -> Result<usize> {
        let n = self.send(data)?;
        if sync {
            self.wait_for(ACK, Timeout::Never, true)?;
        }
        Ok(n)
    }

    pub fn write_str(&mut self, data: &str, opts: WriteOpts) -> Result<usize> {
        let bytes = data.as_bytes();
        let len = match opts.length {
            0 => bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len()),
            n => n.min(bytes.len()),
        };
        self.write(&bytes[..len], opts.sync)
    }

    /// Poll the link until `expected` is read or `timeout` elapses.
    ///
    /// Other bytes are discarded when `ignore_mismatch` is set; otherwise the
    /// first one ends the wait as [`WaitOutcome::Mismatched`].
    pub fn wait_for(
        &mut self,
        expected: u8,
        timeout: Timeout,
        ignore_mismatch: bool,
    ) -> Result<WaitOutcome> {
        // a bound too large to represent is no bound
        let deadline = match timeout {
            Timeout::Never => None,
            Timeout::After(d) => Instant::now().checked_add(d),
        };
        loop {
            if self.link.available()? > 0
                && let Some(b) = self.link.read_byte()?
            {
                if b == expected {
                    return Ok(WaitOutcome::Matched);
                }
                if !ignore_mismatch {
                    return Ok(WaitOutcome::Mismatched(b));
                }
                trace!("discarding {:#04x} while waiting for {:#04x}", b, expected);
            }
            if passed(deadline) {
                return Ok(WaitOutcome::TimedOut);
            }
            std::hint::spin_loop();
        }
    }

    /// Show peripheral output on the display and forward console input to the
    /// peripheral until `window` has elapsed.
    ///
    /// Each drain chunk is sized to the byte count available at poll time. The
    /// deadline is checked after every chunk, so the window overruns by at most
    /// one chunk plus [`RELAY_PACE`].
    pub fn relay(&mut self, window: Duration) -> Result<RelayStats> {
        let deadline = Instant::now().checked_add(window);
        let mut stats = RelayStats::new();
        let mut buf = mem::take(&mut self.scratch);
        let res = self.relay_inner(deadline, &mut buf, &mut stats);
        self.scratch = buf;
        res?;
        stats.finish();
        Ok(stats)
    }

    fn relay_inner(
        &mut self,
        deadline: Option<Instant>,
        buf: &mut Vec<u8>,
        stats: &mut RelayStats,
    ) -> Result<()> {
        loop {
            let mut recvd = false;
            loop {
                let len = self.link.available()?;
                if len == 0 {
                    break;
                }
                buf.clear();
                buf.resize(len, 0);
                let n = self.link.read_bytes(buf)?;
                if n == 0 {
                    break;
                }
                recvd = true;
                self.display.write_all(&buf[..n])?;
                stats.add_shown(n);
                thread::sleep(RELAY_PACE);
                if passed(deadline) {
                    break;
                }
            }
            if recvd {
                self.display.write_all(b"\n")?;
                self.display.flush()?;
            }

            let len = self.console.available()?;
            if len > 0 {
                buf.clear();
                buf.resize(len, 0);
                let n = self.console.read_bytes(buf)?;
                if n > 0 {
                    self.send(&buf[..n])?;
                    self.display.write_all(&buf[..n])?;
                    self.display.flush()?;
                    stats.add_forwarded(n);
                }
            }

            if passed(deadline) {
                return Ok(());
            }
        }
    }

    fn finish(&mut self, wait: WaitMode) -> Result<()> {
        match wait {
            WaitMode::Sync => {
                self.wait_for(ACK, Timeout::Never, true)?;
            }
            WaitMode::Relay(window) if !window.is_zero() => {
                self.relay(window)?;
            }
            WaitMode::Relay(_) | WaitMode::NoWait => {}
        }
        Ok(())
    }

    /// Speak `text`. Returns the number of bytes sent.
    pub fn say(&mut self, text: &str, wait: WaitMode) -> Result<usize> {
        let cmd = Command::Speak(text.to_string());
        self.log_command(&cmd);
        let sent = self.send(&build_frame(&cmd))?;
        self.finish(wait)?;
        Ok(sent)
    }

    /// Play built-in demo `which` (0..=2).
    pub fn demo(&mut self, which: u8, wait: WaitMode) -> Result<usize> {
        let cmd = Command::Demo(Demo::new(which)?);
        self.log_command(&cmd);
        let sent = self.send(&build_frame(&cmd))?;
        self.finish(wait)?;
        Ok(sent)
    }

    fn log_command(&self, cmd: &Command) {
        if self.debug {
            info!("Writing '{}' to Emic-2", cmd.describe());
        }
    }

    /// Send a settings/query command. With `sync`, wait up to [`SYNC_TIMEOUT`]
    /// for `:` ignoring other output; otherwise relay for [`SETTLE_TIME`].
    pub fn command(&mut self, cmd: Command, sync: bool) -> Result<Option<WaitOutcome>> {
        self.log_command(&cmd);
        self.send(&build_frame(&cmd))?;
        if sync {
            let outcome = self.wait_for(ACK, Timeout::After(SYNC_TIMEOUT), true)?;
            if outcome != WaitOutcome::Matched {
                warn!("'{}' not acknowledged: {:?}", cmd.describe(), outcome);
            }
            Ok(Some(outcome))
        } else {
            self.relay(SETTLE_TIME)?;
            Ok(None)
        }
    }

    pub fn stop_playback(&mut self, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Stop, sync)
    }

    pub fn toggle_pause(&mut self, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::TogglePause, sync)
    }

    pub fn set_voice(&mut self, which: u8, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Voice(Voice::new(which)?), sync)
    }

    pub fn set_volume(&mut self, volume: f32, sync: bool) -> Result<Option<WaitOutcome>> {
        let vol = device_volume(volume);
        if self.debug {
            info!("Volume = {:.2} ({})", volume, vol);
        }
        self.command(Command::Volume(vol), sync)
    }

    pub fn set_words_per_minute(&mut self, wpm: u32, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Rate(wpm), sync)
    }

    pub fn set_parser(&mut self, parser: Parser, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Parser(parser), sync)
    }

    pub fn set_language(&mut self, language: Language, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Language(language), sync)
    }

    pub fn set_default(&mut self, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Defaults, sync)
    }

    pub fn get_current(&mut self, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Current, sync)
    }

    pub fn get_info(&mut self, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Version, sync)
    }

    pub fn get_help(&mut self, sync: bool) -> Result<Option<WaitOutcome>> {
        self.command(Command::Help, sync)
    }
}

fn passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

impl<T: Transport> Drop for Emic2<T> {
    fn drop(&mut self) {
        self.link.close();
    }
}
