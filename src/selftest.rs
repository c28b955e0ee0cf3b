use tracing::info;

use std::thread;
use std::time::Duration;

use crate::emic::{
    DEFAULT_PARSER, DEFAULT_VOICE, DEFAULT_VOLUME, DEFAULT_WPM, Emic2, QUIET_VOLUME, WaitMode,
};
use crate::error::Result;
use crate::port::Transport;
use crate::proto::command::Voice;

/// Passes allowed per controller.
pub const MAX_PASSES: u32 = 3;

const PHRASES: [(&str, u64); 2] = [
    (
        "[:rate 200][:n1][:dv ap 90 pr 0] All your base are belong to us.",
        300,
    ),
    (
        "[:rate 200][:n1][:dv ap 90 pr 0] Intruder Alert, Intruder Alert, Movement in sector 5.",
        500,
    ),
];

impl<T: Transport> Emic2<T> {
    /// Speak through every voice and a couple of DECtalk phrases, then restore
    /// defaults. Returns `false` without speaking once [`MAX_PASSES`] have run.
    pub fn selftest(&mut self) -> Result<bool> {
        let old_debug = self.set_debug(false);
        let res = self.selftest_pass();
        self.set_debug(old_debug);
        let ran = res?;
        if ran {
            self.set_voice(DEFAULT_VOICE, true)?;
            self.set_volume(DEFAULT_VOLUME, true)?;
            self.say("The Speech Tests Have Now Completed.", WaitMode::Sync)?;
            info!("finished speaking");
        }
        Ok(ran)
    }

    fn selftest_pass(&mut self) -> Result<bool> {
        self.stop_playback(true)?;
        self.set_voice(DEFAULT_VOICE, true)?;
        self.set_volume(QUIET_VOLUME, true)?;
        self.set_words_per_minute(DEFAULT_WPM, true)?;
        self.set_parser(DEFAULT_PARSER, true)?;

        if self.passes >= MAX_PASSES {
            return Ok(false);
        }
        self.passes += 1;
        info!("self test pass {}", self.passes);

        self.say(
            &format!("Starting Speech Tests, pass number {}.", self.passes),
            WaitMode::Sync,
        )?;
        for voice in 0..Voice::COUNT {
            self.set_voice(voice, true)?;
            self.say(&format!("Voice {}.", voice), WaitMode::Sync)?;
        }
        self.relay(Duration::from_millis(1200))?;

        for (phrase, pause_ms) in PHRASES {
            self.say(phrase, WaitMode::Sync)?;
            thread::sleep(Duration::from_millis(pause_ms));
        }

        self.set_voice(DEFAULT_VOICE, true)?;
        self.stop_playback(true)?;
        Ok(true)
    }
}
