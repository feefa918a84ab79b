//! Note table to MIDI file conversion
//!
//! Every row is one sixteenth note. Each distinct instrument gets its own
//! track and channel; drums always sit on channel 9 in the first track,
//! which also carries the (single, averaged) tempo.

pub mod defaults;
mod schedule;
mod write;

pub use defaults::{DEFAULT_RESOLUTION, DEFAULT_VELOCITY};
pub use schedule::{average_bpm, schedule_rows, DeltaEvent, NoteMessage, Schedule, TrackPlan};
pub use write::write_smf;

use crate::mapping::{FailureCounts, NoteMapper};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("midi write error: {0}")]
    Midi(String),
    #[error("could not write MIDI file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("delta of {delta} ticks on track {track} does not fit in a MIDI event")]
    DeltaOverflow { track: String, delta: u64 },
}

pub type Result<T> = std::result::Result<T, WriteError>;

/// Synthesis settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WriteOptions {
    /// Ticks per quarter note of the written file
    pub resolution: u16,
    /// Velocity of every note-on
    pub velocity: u8,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

/// Outcome of one synthesis
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// SMF bytes
    pub bytes: Vec<u8>,
    /// Tokens skipped because the mapping had no number for them, by
    /// (instrument name, symbol)
    pub failures: FailureCounts<(String, String)>,
    pub malformed_tokens: usize,
    /// Instruments left out because all sixteen channels were taken
    pub dropped_instruments: BTreeSet<String>,
}

/// Writes note tables as MIDI files
#[derive(Clone, Debug)]
pub struct MidiWriter {
    mapper: NoteMapper,
    options: WriteOptions,
}

impl MidiWriter {
    pub fn new(mapper: NoteMapper) -> Self {
        Self::with_options(mapper, WriteOptions::default())
    }

    pub fn with_options(mapper: NoteMapper, options: WriteOptions) -> Self {
        Self { mapper, options }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    pub fn mapper(&self) -> &NoteMapper {
        &self.mapper
    }

    /// Plan the tracks and delta-timed events for `table`
    pub fn schedule(&self, table: &Table) -> Schedule {
        schedule_rows(table.rows(), &self.mapper, self.options.resolution)
    }

    /// Convert `table` to SMF bytes
    pub fn to_bytes(&self, table: &Table) -> Result<Synthesis> {
        let schedule = self.schedule(table);
        let mut bytes = Vec::new();
        write_smf(&schedule, self.options.velocity, &mut bytes)?;

        log::debug!(
            "Wrote {} rows to {} tracks at {:.2} BPM",
            table.len(),
            schedule.tracks.len(),
            schedule.bpm
        );
        if !schedule.failures.is_empty() {
            log::debug!("{} tokens had no entry in the note mapping", schedule.failures.total());
        }

        Ok(Synthesis {
            bytes,
            failures: schedule.failures,
            malformed_tokens: schedule.malformed_tokens,
            dropped_instruments: schedule.dropped_instruments,
        })
    }

    /// Convert `table` and write the MIDI file to `path`
    pub fn convert_to_file(&self, table: &Table, path: impl AsRef<Path>) -> Result<Synthesis> {
        let path = path.as_ref();
        let synthesis = self.to_bytes(table)?;
        std::fs::write(path, &synthesis.bytes).map_err(|source| WriteError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Wrote MIDI file {}", path.display());
        Ok(synthesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = WriteOptions::default();
        assert_eq!(options.resolution, 120);
        assert_eq!(options.velocity, 127);

        let parsed: WriteOptions = serde_json::from_str(r#"{"resolution": 480}"#).unwrap();
        assert_eq!(parsed.resolution, 480);
        assert_eq!(parsed.velocity, DEFAULT_VELOCITY);
    }

    #[test]
    fn test_empty_table_still_has_percussion_track() {
        let writer = MidiWriter::new(NoteMapper::default());
        let synthesis = writer.to_bytes(&Table::default()).unwrap();
        let smf = midly::Smf::parse(&synthesis.bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);
    }
}
