//! Instrument identity for extracted and synthesized notes

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIDI channel reserved for drums (channel 10 when counted from 1)
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Instrument name used for every drum-channel note
pub const PERCUSSION: &str = "percussion";

/// Who plays a note: a General MIDI program, or the drum kit
///
/// Drum-channel notes are `Percussion` no matter which program change the
/// track saw last.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Instrument {
    Melodic(u8),
    Percussion,
}

impl Instrument {
    /// Resolve the instrument for a note event on `channel`, given the
    /// track's current program.
    pub fn for_channel(channel: u8, program: u8) -> Self {
        if channel == PERCUSSION_CHANNEL {
            Instrument::Percussion
        } else {
            Instrument::Melodic(program)
        }
    }

    pub fn is_percussion(&self) -> bool {
        matches!(self, Instrument::Percussion)
    }

    pub fn program(&self) -> Option<u8> {
        match self {
            Instrument::Melodic(program) => Some(*program),
            Instrument::Percussion => None,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Melodic(program) => write!(f, "program {}", program),
            Instrument::Percussion => f.write_str(PERCUSSION),
        }
    }
}
