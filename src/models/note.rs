//! Note pairing and the textual note token
//!
//! `NoteTracker` pairs note-on with note-off for each pitch and reports the
//! raw duration in ticks. `NoteToken` is the `instrument_symbol_duration`
//! word that one completed note becomes in the output table.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Separator between the three fields of a note token
pub const TOKEN_SEPARATOR: char = '_';

/// Notes field value for a grid step with nothing sounding
pub const REST: &str = "rest";

/// A note that has been switched on and not yet off
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingNote {
    pub pitch: u8,
    pub on_tick: u64,
}

/// A note-on/note-off pair with a positive duration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletedNote {
    pub pitch: u8,
    pub on_tick: u64,
    pub duration_ticks: u64,
}

/// Pending notes for one track, keyed by pitch
///
/// A second note-on for a pitch that is still sounding replaces the first;
/// the replaced note never produces a completed note.
#[derive(Clone, Debug, Default)]
pub struct NoteTracker {
    pending: HashMap<u8, PendingNote>,
}

impl NoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_on(&mut self, pitch: u8, tick: u64) {
        self.pending.insert(pitch, PendingNote { pitch, on_tick: tick });
    }

    /// Close the pending note for `pitch`
    ///
    /// Stray note-offs are ignored. A note whose duration is zero (or whose
    /// off precedes its on) is dropped, but its pending entry is still
    /// cleared.
    pub fn note_off(&mut self, pitch: u8, tick: u64) -> Option<CompletedNote> {
        let pending = self.pending.remove(&pitch)?;
        let duration_ticks = tick.checked_sub(pending.on_tick).filter(|d| *d > 0)?;
        Some(CompletedNote {
            pitch,
            on_tick: pending.on_tick,
            duration_ticks,
        })
    }

    pub fn pending(&self, pitch: u8) -> Option<&PendingNote> {
        self.pending.get(&pitch)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// One note as text: `<instrument>_<symbol>_<duration>`
#[derive(Clone, Debug, PartialEq)]
pub struct NoteToken {
    pub instrument: String,
    pub symbol: String,
    /// Duration in quarter notes
    pub duration: f64,
}

impl NoteToken {
    pub fn new(instrument: impl Into<String>, symbol: impl Into<String>, duration: f64) -> Self {
        Self {
            instrument: instrument.into(),
            symbol: symbol.into(),
            duration,
        }
    }
}

/// Print a duration rounded to 3 places, always with a decimal point
/// (`1.0`, `0.25`, `0.125`).
pub fn format_duration(duration: f64) -> String {
    let rounded = (duration * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}

impl fmt::Display for NoteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.instrument,
            self.symbol,
            format_duration(self.duration),
            sep = TOKEN_SEPARATOR
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenParseError(pub String);

impl fmt::Display for TokenParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed note token: {:?}", self.0)
    }
}

impl std::error::Error for TokenParseError {}

impl FromStr for NoteToken {
    type Err = TokenParseError;

    /// Instrument is everything before the first separator and duration
    /// everything after the last, so drum symbols may contain underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TokenParseError(s.to_string());
        let (instrument, rest) = s.trim().split_once(TOKEN_SEPARATOR).ok_or_else(malformed)?;
        let (symbol, duration) = rest.rsplit_once(TOKEN_SEPARATOR).ok_or_else(malformed)?;
        if instrument.is_empty() || symbol.is_empty() {
            return Err(malformed());
        }
        let duration: f64 = duration.parse().map_err(|_| malformed())?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(malformed());
        }
        Ok(NoteToken::new(instrument, symbol, duration))
    }
}
