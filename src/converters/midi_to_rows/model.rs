//! Decoded MIDI sequence with absolute tick timestamps
//!
//! This is only what the extraction pass looks at: note, meter and program
//! events. Everything else in the file collapses into `EventKind::Other`.

use crate::models::TimeSignature;

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub resolution: u16,              // Ticks per quarter note
    pub tracks: Vec<Vec<TimedEvent>>, // One per SMF track, ascending by tick
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub tick: u64, // Absolute, not delta
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
    ProgramChange { channel: u8, program: u8 },
    TimeSignature(TimeSignature),
    Tempo { bpm: f64 },
    Other,
}

impl TimedEvent {
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }
}

impl Sequence {
    /// Total number of events across tracks
    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(Vec::len).sum()
    }

    /// Every event tagged with its track index, track by track
    pub fn events(&self) -> impl Iterator<Item = (usize, &TimedEvent)> {
        self.tracks
            .iter()
            .enumerate()
            .flat_map(|(track, events)| events.iter().map(move |event| (track, event)))
    }
}

/// Convert a SMF tempo (microseconds per quarter note) to BPM
pub fn micros_to_bpm(micros_per_quarter: u32) -> f64 {
    if micros_per_quarter == 0 {
        return 0.0;
    }
    60_000_000.0 / micros_per_quarter as f64
}

/// Largest tempo value a SMF tempo event can hold (24 bits)
pub const MAX_MICROS_PER_QUARTER: u32 = 0x00FF_FFFF;

/// Convert BPM to a SMF tempo (microseconds per quarter note)
pub fn bpm_to_micros(bpm: f64) -> u32 {
    if bpm.is_nan() || bpm <= 0.0 {
        return 500_000;
    }
    ((60_000_000.0 / bpm) as u32).min(MAX_MICROS_PER_QUARTER)
}
