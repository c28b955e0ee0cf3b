use crate::proto::command::Command;

/// Carriage return terminating every command except stop/toggle.
pub const TERMINATOR: u8 = b'\r';
/// Sent by the peripheral once it is idle.
pub const ACK: u8 = b':';

/// Maps a caller volume onto the device's integer scale: `round(0.66 * v - 48)`.
pub fn device_volume(volume: f32) -> i32 {
    (0.66f32 * volume - 48.0f32).round() as i32
}

/// Serialize a command to its wire bytes.
pub fn build_frame(cmd: &Command) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    out.push(cmd.letter());
    match cmd {
        // single letter, no terminator
        Command::Stop | Command::TogglePause => return out,
        Command::Speak(text) => out.extend_from_slice(text.as_bytes()),
        Command::Demo(d) => out.push(d.digit()),
        Command::Voice(v) => out.push(v.digit()),
        Command::Volume(v) => out.extend_from_slice(v.to_string().as_bytes()),
        Command::Rate(wpm) => out.extend_from_slice(wpm.to_string().as_bytes()),
        Command::Parser(p) => out.push(p.digit()),
        Command::Language(l) => out.push(l.digit()),
        Command::Defaults | Command::Current | Command::Version | Command::Help => {}
    }
    out.push(TERMINATOR);
    out
}
