//! MIDI file to note table conversion
//!
//! ```text
//! SMF bytes → parse (absolute ticks) → extract (tokens per tick)
//!           → grid (quantize, fill rests, measure/beat) → Table
//! ```

mod extract;
mod grid;
mod model;
mod parse;

pub use extract::{extract_tokens, ExtractState, NoteContext, TokenPass};
pub use grid::{build_rows, fill_rests, quantize_tokens, BeatCounter};
pub use model::*;
pub use parse::parse_smf;

use crate::mapping::{FailureCounts, NoteMapper};
use crate::models::{Instrument, NoteLength};
use crate::table::{Column, Table};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Last note-on tick accepted before a file is rejected as too long
pub const DEFAULT_MAX_TICK: u64 = 10_000_000;

/// Program assumed for a track that plays notes before any program change
pub const DEFAULT_PROGRAM: u8 = 1;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("could not read MIDI file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode MIDI data: {0}")]
    Midi(#[from] midly::Error),
    #[error("SMPTE timecode timing is not supported")]
    UnsupportedTiming,
    #[error("resolution of {resolution} ticks per quarter is too coarse for a {grid:?} grid")]
    GridTooFine { resolution: u16, grid: NoteLength },
    #[error("too many timestamps: last note at tick {max_tick} exceeds the limit of {limit}")]
    TickCeilingExceeded { max_tick: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, ReadError>;

/// Extraction settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ExtractOptions {
    /// Grid that note starts are snapped down to
    pub timing_quantization: NoteLength,
    pub extract_timestamp: bool,
    pub extract_bpm: bool,
    pub extract_time_signature: bool,
    pub extract_measure: bool,
    pub extract_beat: bool,
    /// Reject files whose last note starts after this tick
    pub max_tick: u64,
    /// Program for tracks that play notes before any program change
    pub default_program: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            timing_quantization: NoteLength::Sixteenth,
            extract_timestamp: true,
            extract_bpm: true,
            extract_time_signature: true,
            extract_measure: true,
            extract_beat: true,
            max_tick: DEFAULT_MAX_TICK,
            default_program: DEFAULT_PROGRAM,
        }
    }
}

impl ExtractOptions {
    /// Columns switched on, in output order
    pub fn columns(&self) -> Vec<Column> {
        [
            (self.extract_timestamp, Column::Timestamp),
            (self.extract_bpm, Column::Bpm),
            (self.extract_time_signature, Column::TimeSignature),
            (self.extract_measure, Column::Measure),
            (self.extract_beat, Column::Beat),
            (true, Column::Notes),
        ]
        .into_iter()
        .filter_map(|(on, column)| on.then_some(column))
        .collect()
    }
}

/// Outcome of one extraction
#[derive(Debug, Default)]
pub struct Extraction {
    pub table: Table,
    /// Notes skipped because the mapping had no name for them, by
    /// (instrument, pitch)
    pub failures: FailureCounts<(Instrument, u8)>,
    /// Set when the file could not be converted; `table` is then empty
    pub error: Option<ReadError>,
}

impl Extraction {
    fn failed(error: ReadError, columns: Vec<Column>) -> Self {
        Self {
            table: Table::new(columns),
            failures: FailureCounts::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Reads MIDI files into note tables
///
/// Holds only configuration; every conversion builds and drops its own
/// scratch state, so one reader can serve any number of calls.
#[derive(Clone, Debug)]
pub struct MidiReader {
    mapper: NoteMapper,
    options: ExtractOptions,
}

impl MidiReader {
    pub fn new(mapper: NoteMapper) -> Self {
        Self::with_options(mapper, ExtractOptions::default())
    }

    pub fn with_options(mapper: NoteMapper, options: ExtractOptions) -> Self {
        Self { mapper, options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ExtractOptions {
        &mut self.options
    }

    pub fn mapper(&self) -> &NoteMapper {
        &self.mapper
    }

    /// Convert a MIDI file, reporting failures in the result instead of
    /// returning them
    pub fn convert_file(&self, path: impl AsRef<Path>) -> Extraction {
        let path = path.as_ref();
        self.try_convert_file(path).unwrap_or_else(|error| {
            log::error!("Could not convert MIDI file {}: {}", path.display(), error);
            Extraction::failed(error, self.options.columns())
        })
    }

    /// Convert in-memory SMF bytes, reporting failures in the result
    pub fn convert_bytes(&self, bytes: &[u8]) -> Extraction {
        self.try_convert_bytes(bytes).unwrap_or_else(|error| {
            log::error!("Could not convert MIDI data: {}", error);
            Extraction::failed(error, self.options.columns())
        })
    }

    pub fn try_convert_file(&self, path: impl AsRef<Path>) -> Result<Extraction> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ReadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.try_convert_bytes(&bytes)
    }

    pub fn try_convert_bytes(&self, bytes: &[u8]) -> Result<Extraction> {
        let sequence = parse_smf(bytes)?;
        self.convert_sequence(&sequence)
    }

    /// Convert an already decoded sequence
    pub fn convert_sequence(&self, sequence: &Sequence) -> Result<Extraction> {
        let grid_length = self.options.timing_quantization;
        let step = grid_length.ticks(sequence.resolution);
        if step == 0 {
            return Err(ReadError::GridTooFine {
                resolution: sequence.resolution,
                grid: grid_length,
            });
        }

        let context = NoteContext::new(&self.mapper, sequence.resolution, self.options.default_program);
        let pass = extract_tokens(sequence, &context);

        if !pass.failures.is_empty() {
            log::debug!("{} notes had no symbol in the note mapping", pass.failures.total());
        }

        let Some(max_tick) = pass.tokens.keys().next_back().copied() else {
            log::info!("No notes extracted from {} events", sequence.event_count());
            return Ok(Extraction {
                table: Table::new(self.options.columns()),
                failures: pass.failures,
                error: None,
            });
        };

        if max_tick > self.options.max_tick {
            return Err(ReadError::TickCeilingExceeded {
                max_tick,
                limit: self.options.max_tick,
            });
        }

        let mut grid = quantize_tokens(&pass.tokens, step);
        fill_rests(&mut grid, max_tick, step);
        let table = build_rows(&grid, &pass.meter, &self.options);

        log::debug!(
            "Extracted {} rows ({} ticks per step) from {} tracks",
            table.len(),
            step,
            sequence.tracks.len()
        );

        Ok(Extraction {
            table,
            failures: pass.failures,
            error: None,
        })
    }
}
