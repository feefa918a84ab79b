//! Models module
//!
//! Value types and small state machines shared by the MIDI reader and
//! writer: meter timelines, note pairing, quantization and instruments.

pub mod instrument;
pub mod meter;
pub mod note;
pub mod quantize;

// Re-export commonly used types
pub use instrument::{Instrument, PERCUSSION, PERCUSSION_CHANNEL};
pub use meter::{MeterMap, MeterTimeline, TimeSignature, DEFAULT_BPM, DEFAULT_TIME_SIGNATURE};
pub use note::{CompletedNote, NoteToken, NoteTracker, PendingNote, REST};
pub use quantize::{DurationQuantizer, NoteLength};
