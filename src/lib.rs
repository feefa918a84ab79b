//! MIDI ⇄ note table codec
//!
//! Reads MIDI files into one row per quantized time step (tempo, time
//! signature, measure, beat and the notes starting at that step) and writes
//! such tables back out as MIDI files.
//!
//! ```rust,ignore
//! use midi_table::{MidiReader, MidiWriter, NoteMapper};
//!
//! let mapper = NoteMapper::from_path("mapping.json")?;
//! let extraction = MidiReader::new(mapper.clone()).convert_file("song.mid");
//! MidiWriter::new(mapper).convert_to_file(&extraction.table, "copy.mid")?;
//! ```

pub mod converters;
pub mod mapping;
pub mod models;
pub mod table;

// Re-export commonly used types
pub use converters::{
    Extraction, ExtractOptions, MidiReader, MidiWriter, ReadError, Synthesis, WriteError, WriteOptions,
};
pub use mapping::{MappingConfig, MappingError, NoteMapper};
pub use models::{Instrument, NoteLength, NoteToken, TimeSignature};
pub use table::{Column, Row, Table, TableError};
