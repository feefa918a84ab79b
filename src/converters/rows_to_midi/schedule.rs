//! Row scheduling: note tables to per-track delta-timed note events
//!
//! Scheduling happens in two phases. Every note-on/note-off is first
//! placed on a single absolute-tick timeline; that timeline is then walked
//! in tick order and each event is appended to its own track with a delta
//! against that track's previous event. Deltas have to be computed after
//! the global sort, because each track is delta-encoded on its own.

use super::defaults::{next_free_channel, CHANNEL_COUNT, ROWS_PER_QUARTER};
use crate::mapping::{FailureCounts, NoteMapper};
use crate::models::{Instrument, NoteToken, DEFAULT_BPM, PERCUSSION, PERCUSSION_CHANNEL, REST};
use crate::table::Row;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMessage {
    On { pitch: u8 },
    Off { pitch: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaEvent {
    pub delta: u64, // Ticks since the previous event on the same track
    pub message: NoteMessage,
}

/// One output track: a channel owned by one instrument
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPlan {
    pub channel: u8,
    pub name: String,
    pub instrument: Instrument,
    pub events: Vec<DeltaEvent>,
}

impl TrackPlan {
    fn new(channel: u8, name: &str, instrument: Instrument) -> Self {
        Self {
            channel,
            name: name.to_string(),
            instrument,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub resolution: u16,
    /// Single tempo for the whole file
    pub bpm: f64,
    /// Tracks in creation order; the percussion track is always first
    pub tracks: Vec<TrackPlan>,
    /// Tokens skipped because the mapping had no number for them, by
    /// (instrument name, symbol)
    pub failures: FailureCounts<(String, String)>,
    /// Tokens that did not parse as `instrument_symbol_duration`
    pub malformed_tokens: usize,
    /// Instruments that found no free channel
    pub dropped_instruments: BTreeSet<String>,
}

/// Mean of every tempo present in `rows`, or the MIDI default
pub fn average_bpm(rows: &[Row]) -> f64 {
    let tempos: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.bpm)
        .filter(|bpm| bpm.is_finite())
        .collect();
    if tempos.is_empty() {
        return DEFAULT_BPM;
    }
    tempos.iter().sum::<f64>() / tempos.len() as f64
}

/// Hands out one channel per instrument name
struct ChannelAllocator {
    tracks: Vec<TrackPlan>,
    in_use: [bool; CHANNEL_COUNT],
    track_by_name: HashMap<String, usize>,
    dropped: BTreeSet<String>,
}

impl ChannelAllocator {
    fn new() -> Self {
        let mut in_use = [false; CHANNEL_COUNT];
        in_use[PERCUSSION_CHANNEL as usize] = true;
        let mut track_by_name = HashMap::new();
        track_by_name.insert(PERCUSSION.to_string(), 0);
        Self {
            tracks: vec![TrackPlan::new(PERCUSSION_CHANNEL, PERCUSSION, Instrument::Percussion)],
            in_use,
            track_by_name,
            dropped: BTreeSet::new(),
        }
    }

    /// Track index for `name`, creating the track on first use
    fn track_for(&mut self, name: &str, instrument: Instrument) -> Option<usize> {
        if let Some(&index) = self.track_by_name.get(name) {
            return Some(index);
        }
        if self.dropped.contains(name) {
            return None;
        }
        let Some(channel) = next_free_channel(&self.in_use) else {
            log::debug!("No free MIDI channel left for instrument {}", name);
            self.dropped.insert(name.to_string());
            return None;
        };
        self.in_use[channel as usize] = true;
        self.tracks.push(TrackPlan::new(channel, name, instrument));
        let index = self.tracks.len() - 1;
        self.track_by_name.insert(name.to_string(), index);
        Some(index)
    }
}

/// Schedule every note of `rows`; row `i` starts at `i * resolution / 4`,
/// rounded down per row so the offset never accumulates
pub fn schedule_rows(rows: &[Row], mapper: &NoteMapper, resolution: u16) -> Schedule {
    let mut allocator = ChannelAllocator::new();
    let mut failures = FailureCounts::new();
    let mut malformed_tokens = 0;

    // Phase 1: absolute tick -> (track, message), in scheduling order
    let mut by_tick: BTreeMap<u64, Vec<(usize, NoteMessage)>> = BTreeMap::new();

    for (index, row) in rows.iter().enumerate() {
        let tick = index as u64 * resolution as u64 / ROWS_PER_QUARTER;

        let words = row
            .notes
            .split(',')
            .map(str::trim)
            .filter(|word| !word.is_empty() && *word != REST);

        for word in words {
            let token: NoteToken = match word.parse() {
                Ok(token) => token,
                Err(e) => {
                    log::warn!("Skipping row {}: {}", index, e);
                    malformed_tokens += 1;
                    continue;
                }
            };

            let Some(instrument) = mapper.instrument_for(&token.instrument) else {
                failures.record((token.instrument, token.symbol));
                continue;
            };
            let Some(track) = allocator.track_for(&token.instrument, instrument) else {
                continue;
            };
            let Some(pitch) = mapper.note_number(&token.symbol, instrument) else {
                failures.record((token.instrument, token.symbol));
                continue;
            };

            let off_tick = tick + (token.duration * resolution as f64) as u64;
            by_tick.entry(tick).or_default().push((track, NoteMessage::On { pitch }));
            by_tick.entry(off_tick).or_default().push((track, NoteMessage::Off { pitch }));
        }
    }

    // Phase 2: ascending ticks, deltas per track
    let mut tracks = allocator.tracks;
    let mut previous = vec![0u64; tracks.len()];
    for (tick, events) in by_tick {
        for (track, message) in events {
            let delta = tick - previous[track];
            tracks[track].events.push(DeltaEvent { delta, message });
            previous[track] = tick;
        }
    }

    Schedule {
        resolution,
        bpm: average_bpm(rows),
        tracks,
        failures,
        malformed_tokens,
        dropped_instruments: allocator.dropped,
    }
}
