//! Event pass: MIDI events to per-tick note tokens
//!
//! The pass is a fold over `(track, event)` pairs. All scratch state lives
//! in `ExtractState`, which is created for one conversion and consumed when
//! the pass finishes.

use crate::converters::midi_to_rows::model::{EventKind, Sequence, TimedEvent};
use crate::mapping::{FailureCounts, NoteMapper};
use crate::models::{CompletedNote, DurationQuantizer, Instrument, MeterMap, NoteToken, NoteTracker};
use std::collections::{BTreeMap, HashMap};

/// Read-only inputs shared by every step of the fold
pub struct NoteContext<'a> {
    pub resolution: u16,
    pub mapper: &'a NoteMapper,
    pub quantizer: DurationQuantizer<'a>,
    /// Program assumed for notes on a track that never changed program
    pub default_program: u8,
}

impl<'a> NoteContext<'a> {
    pub fn new(mapper: &'a NoteMapper, resolution: u16, default_program: u8) -> Self {
        Self {
            resolution,
            mapper,
            quantizer: mapper.duration_quantizer(),
            default_program,
        }
    }
}

/// Accumulated state of the event pass
#[derive(Debug, Default)]
pub struct ExtractState {
    programs: HashMap<usize, u8>,
    trackers: HashMap<usize, NoteTracker>,
    meter: MeterMap,
    tokens: BTreeMap<u64, Vec<String>>,
    failures: FailureCounts<(Instrument, u8)>,
}

/// Result of the event pass
#[derive(Debug)]
pub struct TokenPass {
    /// Note-on tick -> tokens of the notes starting there
    pub tokens: BTreeMap<u64, Vec<String>>,
    /// Meter timelines with MIDI defaults filled in
    pub meter: MeterMap,
    /// Notes skipped because the mapping had no symbol for them
    pub failures: FailureCounts<(Instrument, u8)>,
}

impl ExtractState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the state
    pub fn apply(mut self, context: &NoteContext, track: usize, event: &TimedEvent) -> Self {
        let tick = event.tick;
        match event.kind {
            EventKind::NoteOn { pitch, velocity, .. } if velocity > 0 => {
                self.trackers.entry(track).or_default().note_on(pitch, tick);
            }
            // A velocity-0 note-on is an alternate encoding of note-off
            EventKind::NoteOn { channel, pitch, .. } | EventKind::NoteOff { channel, pitch } => {
                let completed = self
                    .trackers
                    .entry(track)
                    .or_default()
                    .note_off(pitch, tick);
                if let Some(note) = completed {
                    let program = self.programs.get(&track).copied().unwrap_or(context.default_program);
                    self.emit(context, Instrument::for_channel(channel, program), note);
                }
            }
            EventKind::ProgramChange { program, .. } => {
                self.programs.insert(track, program);
            }
            EventKind::TimeSignature(signature) => self.meter.record_time_signature(tick, signature),
            EventKind::Tempo { bpm } => self.meter.record_tempo(tick, bpm),
            EventKind::Other => {}
        }
        self
    }

    fn emit(&mut self, context: &NoteContext, instrument: Instrument, note: CompletedNote) {
        let mapper = context.mapper;
        let (name, symbol) = match (
            mapper.program_name(instrument),
            mapper.note_name(note.pitch, instrument),
        ) {
            (Some(name), Some(symbol)) => (name, symbol),
            _ => {
                self.failures.record((instrument, note.pitch));
                return;
            }
        };

        let quarters = note.duration_ticks as f64 / context.resolution as f64;
        let duration = context.quantizer.quantize(name, quarters);
        let token = NoteToken::new(name, symbol, duration);

        self.tokens.entry(note.on_tick).or_default().push(token.to_string());
    }

    /// Finish the pass; notes still sounding at the end are discarded
    pub fn finish(mut self) -> TokenPass {
        self.meter.seed_defaults();
        TokenPass {
            tokens: self.tokens,
            meter: self.meter,
            failures: self.failures,
        }
    }
}

/// Run the event pass over every track of `sequence`
pub fn extract_tokens(sequence: &Sequence, context: &NoteContext) -> TokenPass {
    sequence
        .events()
        .fold(ExtractState::new(), |state, (track, event)| state.apply(context, track, event))
        .finish()
}
