use std::fmt;

use crate::error::{EmicError, Result};

/// Text parser used by the synthesizer. Epson is the power-up default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parser {
    DecTalk = 0,
    Epson = 1,
}

impl Parser {
    pub fn digit(self) -> u8 {
        b'0' + self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Parser::DecTalk => "DECtalk",
            Parser::Epson => "Epson",
        }
    }
}

impl fmt::Display for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    UsEnglish = 0,
    CastilianSpanish = 1,
    LatinSpanish = 2,
}

impl Language {
    pub fn digit(self) -> u8 {
        b'0' + self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::UsEnglish => "US English",
            Language::CastilianSpanish => "Castilian Spanish",
            Language::LatinSpanish => "Latin Spanish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the nine built-in voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice(u8);

impl Voice {
    pub const COUNT: u8 = 9;

    pub fn new(index: u8) -> Result<Self> {
        if index < Self::COUNT {
            Ok(Voice(index))
        } else {
            Err(EmicError::InvalidArgument("voice", index.to_string()))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn digit(self) -> u8 {
        b'0' + self.0
    }
}

/// One of the three built-in demo messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demo(u8);

impl Demo {
    pub const COUNT: u8 = 3;

    pub fn new(index: u8) -> Result<Self> {
        if index < Self::COUNT {
            Ok(Demo(index))
        } else {
            Err(EmicError::InvalidArgument("demo", index.to_string()))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn digit(self) -> u8 {
        b'0' + self.0
    }
}

/// Commands understood by the peripheral.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ---- Playback ----
    Stop,
    TogglePause,
    Speak(String),
    Demo(Demo),

    // ---- Settings ----
    Voice(Voice),
    /// Device-scale volume, already transformed (see [`crate::frame::device_volume`]).
    Volume(i32),
    Rate(u32),
    Parser(Parser),
    Language(Language),
    Defaults,

    // ---- Queries ----
    Current,
    Version,
    Help,
}

impl Command {
    pub fn letter(&self) -> u8 {
        match self {
            Command::Stop => b'X',
            Command::TogglePause => b'Z',
            Command::Speak(_) => b'S',
            Command::Demo(_) => b'D',
            Command::Voice(_) => b'N',
            Command::Volume(_) => b'V',
            Command::Rate(_) => b'W',
            Command::Parser(_) => b'P',
            Command::Language(_) => b'L',
            Command::Defaults => b'R',
            Command::Current => b'C',
            Command::Version => b'I',
            Command::Help => b'H',
        }
    }

    /// Human-readable description used by the debug log.
    pub fn describe(&self) -> String {
        match self {
            Command::Stop => "Stop Playing".into(),
            Command::TogglePause => "Toggle Pause".into(),
            Command::Speak(text) => format!("Say \"{}\"", text),
            Command::Demo(d) => format!("Play Demo {}", d.index()),
            Command::Voice(v) => format!("Select Voice {}", v.index()),
            Command::Volume(v) => format!("Volume = {}", v),
            Command::Rate(wpm) => format!("{} Words/Minute", wpm),
            Command::Parser(p) => format!("Parser = {} ({})", *p as u8, p),
            Command::Language(l) => format!("Language = {} ({})", *l as u8, l),
            Command::Defaults => "Revert to default text-to-speech settings".into(),
            Command::Current => "Print current text-to-speech settings".into(),
            Command::Version => "Print version information".into(),
            Command::Help => "Print list of available commands".into(),
        }
    }
}
