//! Format converters
//!
//! This module contains the two directions of the codec: MIDI files to
//! note tables, and note tables back to MIDI files.

pub mod midi_to_rows;
pub mod rows_to_midi;

// Re-export for convenience
pub use midi_to_rows::{Extraction, ExtractOptions, MidiReader, ReadError};
pub use rows_to_midi::{MidiWriter, Synthesis, WriteError, WriteOptions};
