use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;

use emic_speak::emic::{DEFAULT_VOLUME, LOUD_VOLUME, QUIET_VOLUME, WaitMode};
use emic_speak::{Language, Parser as TextParser};

#[derive(Parser, Debug, Clone)]
#[command(name = "emic-speak", about = "Drive an Emic 2 text-to-speech module over serial")]
pub struct Cli {
    #[command(flatten)]
    pub ser: SerialOpts,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Speak text
    Say(SayOpts),
    /// Play a built-in demo (0, 1 or 2)
    Demo {
        which: u8,
        #[command(flatten)]
        wait: WaitOpts,
    },
    /// Stop playback
    Stop,
    /// Toggle pause
    Pause,
    /// Select voice 0..=8
    Voice { which: u8 },
    /// Set volume: "quiet", "default", "loud" or a number
    Volume { level: String },
    /// Set speaking rate in words per minute
    Rate { wpm: u32 },
    /// Select the text parser
    Parser { parser: ParserArg },
    /// Select the language
    Language { language: LanguageArg },
    /// Revert to default settings
    Defaults,
    /// Print current settings
    Current,
    /// Print version information
    Info,
    /// Print the module's command list
    Commands,
    /// Pass-through terminal: show module output, forward typed input
    Relay {
        /// Seconds to relay for
        #[arg(long, default_value_t = 30.0)]
        secs: f64,
    },
    /// Run the speech self test
    Selftest,
}

#[derive(Args, Debug, Clone)]
pub struct SerialOpts {
    /// Serial device path
    #[arg(long, env = "EMIC_DEV", default_value = "/dev/ttyUSB0")]
    pub dev: String,
    /// TX pin identifier reported to the link
    #[arg(long, default_value_t = 17)]
    pub tx_pin: u8,
    /// RX pin identifier reported to the link
    #[arg(long, default_value_t = 16)]
    pub rx_pin: u8,
    /// Log each command sent
    #[arg(long, default_value_t = false)]
    pub debug: bool,
    /// Wait for the module's ':' after settings commands
    #[arg(long, default_value_t = false)]
    pub sync: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SayOpts {
    pub text: String,
    #[command(flatten)]
    pub wait: WaitOpts,
}

#[derive(Args, Debug, Clone)]
pub struct WaitOpts {
    /// "sync" to block until spoken, else milliseconds to relay output (0 = return at once)
    #[arg(long, default_value = "sync")]
    pub wait: String,
}

impl WaitOpts {
    pub fn mode(&self) -> anyhow::Result<WaitMode> {
        if self.wait.eq_ignore_ascii_case("sync") {
            Ok(WaitMode::Sync)
        } else {
            let ms: u64 = self
                .wait
                .parse()
                .map_err(|_| anyhow!("wait must be 'sync' or integer ms"))?;
            Ok(WaitMode::relay_millis(ms))
        }
    }
}

pub fn parse_volume(level: &str) -> anyhow::Result<f32> {
    match level.to_ascii_lowercase().as_str() {
        "quiet" => Ok(QUIET_VOLUME),
        "default" => Ok(DEFAULT_VOLUME),
        "loud" => Ok(LOUD_VOLUME),
        other => other
            .parse()
            .map_err(|_| anyhow!("volume must be quiet, default, loud or a number")),
    }
}

/// Relay window from `--secs`; non-finite, negative and oversized values are rejected.
pub fn relay_window(secs: f64) -> anyhow::Result<Duration> {
    if !secs.is_finite() {
        bail!("secs must be a finite number of seconds, got {}", secs);
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("relay window of {} seconds", secs))
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ParserArg {
    Dectalk,
    Epson,
}

impl From<ParserArg> for TextParser {
    fn from(p: ParserArg) -> Self {
        match p {
            ParserArg::Dectalk => TextParser::DecTalk,
            ParserArg::Epson => TextParser::Epson,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LanguageArg {
    English,
    Castilian,
    Latin,
}

impl From<LanguageArg> for Language {
    fn from(l: LanguageArg) -> Self {
        match l {
            LanguageArg::English => Language::UsEnglish,
            LanguageArg::Castilian => Language::CastilianSpanish,
            LanguageArg::Latin => Language::LatinSpanish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_modes() {
        let w = |s: &str| WaitOpts { wait: s.into() }.mode();
        assert_eq!(w("SYNC").unwrap(), WaitMode::Sync);
        assert_eq!(w("0").unwrap(), WaitMode::NoWait);
        assert_eq!(w("250").unwrap(), WaitMode::Relay(Duration::from_millis(250)));
        assert!(w("soon").is_err());
    }

    #[test]
    fn relay_window_bounds() {
        assert_eq!(relay_window(1.5).unwrap(), Duration::from_millis(1500));
        assert_eq!(relay_window(0.0).unwrap(), Duration::ZERO);
        assert!(relay_window(f64::NAN).is_err());
        assert!(relay_window(f64::INFINITY).is_err());
        assert!(relay_window(-1.0).is_err());
        assert!(relay_window(1e19).is_err());
    }

    #[test]
    fn volume_presets() {
        assert_eq!(parse_volume("Loud").unwrap(), 85.0);
        assert_eq!(parse_volume("70.5").unwrap(), 70.5);
        assert!(parse_volume("max").is_err());
    }

    #[test]
    fn parses_say_with_global_opts() {
        let cli = Cli::try_parse_from([
            "emic-speak", "--dev", "/dev/ttyS1", "--debug", "say", "Hello", "--wait", "100",
        ])
        .unwrap();
        assert_eq!(cli.ser.dev, "/dev/ttyS1");
        assert!(cli.ser.debug);
        match cli.cmd {
            Cmd::Say(opts) => assert_eq!(opts.text, "Hello"),
            _ => panic!("wrong subcommand"),
        }
    }
}
