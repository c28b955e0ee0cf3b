use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use emic_speak::{Emic2, SerialTransport, StdioConsole, WaitOutcome};

mod cli;

use cli::{Cli, Cmd};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let ser = &args.ser;
    let mut emic = Emic2::new(SerialTransport::new(&ser.dev), ser.tx_pin, ser.rx_pin)
        .with_console(Box::new(StdioConsole::spawn()));
    emic.set_debug(ser.debug);
    emic.setup()
        .with_context(|| format!("setting up Emic 2 on {}", ser.dev))?;

    let sync = ser.sync;
    let outcome = match args.cmd {
        Cmd::Say(opts) => {
            emic.say(&opts.text, opts.wait.mode()?)?;
            None
        }
        Cmd::Demo { which, wait } => {
            emic.demo(which, wait.mode()?)?;
            None
        }
        Cmd::Stop => emic.stop_playback(sync)?,
        Cmd::Pause => emic.toggle_pause(sync)?,
        Cmd::Voice { which } => emic.set_voice(which, sync)?,
        Cmd::Volume { level } => emic.set_volume(cli::parse_volume(&level)?, sync)?,
        Cmd::Rate { wpm } => emic.set_words_per_minute(wpm, sync)?,
        Cmd::Parser { parser } => emic.set_parser(parser.into(), sync)?,
        Cmd::Language { language } => emic.set_language(language.into(), sync)?,
        Cmd::Defaults => emic.set_default(sync)?,
        Cmd::Current => emic.get_current(sync)?,
        Cmd::Info => emic.get_info(sync)?,
        Cmd::Commands => emic.get_help(sync)?,
        Cmd::Relay { secs } => {
            let stats = emic.relay(cli::relay_window(secs)?)?;
            info!(
                "relayed {} bytes from module, {} typed",
                stats.shown, stats.forwarded
            );
            None
        }
        Cmd::Selftest => {
            if !emic.selftest()? {
                warn!("self test pass limit reached");
            }
            None
        }
    };

    if let Some(o) = outcome
        && o != WaitOutcome::Matched
    {
        anyhow::bail!("module did not acknowledge: {:?}", o);
    }
    Ok(())
}
