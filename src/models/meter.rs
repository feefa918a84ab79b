//! Tempo and time signature timelines
//!
//! A MIDI file declares tempo and meter as sparse change events. The
//! timelines here keep those changes in ascending tick order and answer
//! "what was in effect at tick T".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tempo in beats per minute when a file never declares one
pub const DEFAULT_BPM: f64 = 120.0;

/// Default time signature when a file never declares one
pub const DEFAULT_TIME_SIGNATURE: TimeSignature = TimeSignature {
    numerator: 4,
    denominator: 4,
};

/// A time signature such as 4/4 or 6/8
///
/// The denominator is always a power of two.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self { numerator, denominator }
    }

    /// Build from the SMF encoding, where the denominator is stored as a
    /// power of two (2 => quarter, 3 => eighth).
    pub fn from_midi(numerator: u8, denominator_power: u8) -> Self {
        let denominator = 1u32
            .checked_shl(denominator_power as u32)
            .and_then(|d| u8::try_from(d).ok())
            .unwrap_or(DEFAULT_TIME_SIGNATURE.denominator);
        Self { numerator, denominator }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Ascending (tick, value) association list
///
/// Recording at an existing tick replaces the earlier value.
#[derive(Clone, Debug, PartialEq)]
pub struct MeterTimeline<V> {
    entries: Vec<(u64, V)>,
}

impl<V: Clone> MeterTimeline<V> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert or overwrite the value in effect from `tick` onward
    pub fn record(&mut self, tick: u64, value: V) {
        match self.entries.binary_search_by_key(&tick, |(t, _)| *t) {
            Ok(index) => self.entries[index].1 = value,
            Err(index) => self.entries.insert(index, (tick, value)),
        }
    }

    /// Record `value` at tick 0 if nothing has been recorded yet
    pub fn seed(&mut self, value: V) {
        if self.entries.is_empty() {
            self.entries.push((0, value));
        }
    }

    /// Latest value recorded at or before `tick`
    ///
    /// Ticks preceding every record resolve to the first record. Returns
    /// `None` only for an unseeded, empty timeline.
    pub fn value_at(&self, tick: u64) -> Option<&V> {
        // Number of entries with key <= tick
        let upto = self.entries.partition_point(|(t, _)| *t <= tick);
        let index = upto.saturating_sub(1);
        self.entries.get(index).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u64, V)> {
        self.entries.iter()
    }
}

impl<V: Clone> Default for MeterTimeline<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tempo and time signature timelines for one conversion
#[derive(Clone, Debug, Default)]
pub struct MeterMap {
    pub tempos: MeterTimeline<f64>,
    pub time_signatures: MeterTimeline<TimeSignature>,
}

impl MeterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tempo(&mut self, tick: u64, bpm: f64) {
        self.tempos.record(tick, bpm);
    }

    pub fn record_time_signature(&mut self, tick: u64, signature: TimeSignature) {
        self.time_signatures.record(tick, signature);
    }

    /// Fill in the MIDI defaults (120 BPM, 4/4) for any timeline the file
    /// never declared.
    pub fn seed_defaults(&mut self) {
        self.tempos.seed(DEFAULT_BPM);
        self.time_signatures.seed(DEFAULT_TIME_SIGNATURE);
    }

    pub fn bpm_at(&self, tick: u64) -> f64 {
        self.tempos.value_at(tick).copied().unwrap_or(DEFAULT_BPM)
    }

    pub fn time_signature_at(&self, tick: u64) -> TimeSignature {
        self.time_signatures
            .value_at(tick)
            .copied()
            .unwrap_or(DEFAULT_TIME_SIGNATURE)
    }
}
