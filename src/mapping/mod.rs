//! Note mapping between MIDI numbers and text symbols
//!
//! The mapping configuration names General MIDI programs (`0 -> piano`),
//! drum pitches on the percussion channel (`36 -> kick`) and, optionally,
//! the durations each named instrument may take. Melodic pitches always use
//! letter names with an octave suffix, `c0` (pitch 0) through `g10`
//! (pitch 127).
//!
//! Example configuration (JSON):
//!
//! ```json
//! {
//!   "programs": { "0": "piano", "33": "bass" },
//!   "percussion": { "36": "kick", "38": "snare" },
//!   "durations": { "percussion": [0.25, 0.5, 1.0] }
//! }
//! ```

pub mod failures;

pub use failures::FailureCounts;

use crate::models::{DurationQuantizer, Instrument, PERCUSSION};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

/// Letter names within one octave
pub const NOTE_NAMES: [&str; 12] = ["c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b"];

/// Highest MIDI note number
pub const MAX_MIDI_NOTE: u8 = 127;

static PITCH_SYMBOLS: Lazy<Vec<String>> = Lazy::new(|| {
    (0..=MAX_MIDI_NOTE)
        .map(|pitch| {
            let name = NOTE_NAMES[pitch as usize % 12];
            format!("{}{}", name, pitch / 12)
        })
        .collect()
});

static PITCH_NUMBERS: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    PITCH_SYMBOLS
        .iter()
        .enumerate()
        .map(|(pitch, symbol)| (symbol.as_str(), pitch as u8))
        .collect()
});

/// Letter name of a melodic pitch (`60 -> "c5"`)
pub fn pitch_symbol(pitch: u8) -> Option<&'static str> {
    PITCH_SYMBOLS.get(pitch as usize).map(String::as_str)
}

/// MIDI number of a melodic letter name (`"c5" -> 60`)
pub fn pitch_number(symbol: &str) -> Option<u8> {
    PITCH_NUMBERS.get(symbol).copied()
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read note mapping {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON note mapping: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML note mapping: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid key {0:?} in midi-to-text mapping")]
    LegacyKey(String),
}

pub type Result<T> = std::result::Result<T, MappingError>;

/// Note mapping configuration as stored on disk
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct MappingConfig {
    /// General MIDI program number -> instrument name
    pub programs: BTreeMap<u8, String>,
    /// Drum pitch -> drum symbol
    pub percussion: BTreeMap<u8, String>,
    /// Instrument name -> allowed durations in quarter notes
    pub durations: HashMap<String, Vec<f64>>,
}

/// Top-level key of the older single-table layout:
///
/// ```json
/// { "midi-to-text": { "0": "piano", "percussion": { "36": "kick" } } }
/// ```
pub const LEGACY_TABLE_KEY: &str = "midi-to-text";

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyEntry {
    Program(String),
    Drums(BTreeMap<String, String>),
}

/// Only looks for the legacy table; every other key is ignored
#[derive(Deserialize)]
struct LegacyFile {
    #[serde(rename = "midi-to-text", default)]
    midi_to_text: Option<BTreeMap<String, LegacyEntry>>,
}

fn parse_number(key: &str) -> Result<u8> {
    key.trim()
        .parse()
        .map_err(|_| MappingError::LegacyKey(key.to_string()))
}

impl MappingConfig {
    fn from_legacy(table: BTreeMap<String, LegacyEntry>) -> Result<Self> {
        let mut config = MappingConfig::default();
        for (key, entry) in table {
            match entry {
                LegacyEntry::Drums(drums) if key == PERCUSSION => {
                    for (pitch, name) in drums {
                        config.percussion.insert(parse_number(&pitch)?, name);
                    }
                }
                LegacyEntry::Program(name) => {
                    config.programs.insert(parse_number(&key)?, name);
                }
                LegacyEntry::Drums(_) => return Err(MappingError::LegacyKey(key)),
            }
        }
        Ok(config)
    }
}

/// Symbol lookups in both directions
#[derive(Clone, Debug)]
pub struct NoteMapper {
    config: MappingConfig,
    program_by_name: HashMap<String, u8>,
    drum_by_name: HashMap<String, u8>,
}

impl NoteMapper {
    pub fn new(config: MappingConfig) -> Self {
        // Several programs may share a name; the lowest number wins
        let mut program_by_name = HashMap::new();
        for (program, name) in &config.programs {
            program_by_name.entry(name.clone()).or_insert(*program);
        }
        let mut drum_by_name = HashMap::new();
        for (pitch, name) in &config.percussion {
            drum_by_name.entry(name.clone()).or_insert(*pitch);
        }
        Self {
            config,
            program_by_name,
            drum_by_name,
        }
    }

    /// Parse a JSON mapping in either the current layout or the older
    /// `midi-to-text` layout
    pub fn from_json_str(source: &str) -> Result<Self> {
        let legacy: LegacyFile = serde_json::from_str(source)?;
        let config = match legacy.midi_to_text {
            Some(table) => MappingConfig::from_legacy(table)?,
            None => serde_json::from_str(source)?,
        };
        Ok(Self::new(config))
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let legacy: LegacyFile = serde_yaml::from_str(source)?;
        let config = match legacy.midi_to_text {
            Some(table) => MappingConfig::from_legacy(table)?,
            None => serde_yaml::from_str(source)?,
        };
        Ok(Self::new(config))
    }

    /// Load a mapping file; `.yaml`/`.yml` are read as YAML, anything
    /// else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        if is_yaml {
            Self::from_yaml_str(&source)
        } else {
            Self::from_json_str(&source)
        }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Name of the instrument playing a note
    pub fn program_name(&self, instrument: Instrument) -> Option<&str> {
        match instrument {
            Instrument::Percussion => Some(PERCUSSION),
            Instrument::Melodic(program) => self.config.programs.get(&program).map(String::as_str),
        }
    }

    /// Symbol for `pitch`: a letter name for melodic instruments, the
    /// configured drum name for percussion.
    pub fn note_name(&self, pitch: u8, instrument: Instrument) -> Option<&str> {
        match instrument {
            Instrument::Melodic(_) => pitch_symbol(pitch),
            Instrument::Percussion => self.config.percussion.get(&pitch).map(String::as_str),
        }
    }

    /// Instrument for a name found in a note token
    pub fn instrument_for(&self, name: &str) -> Option<Instrument> {
        if name == PERCUSSION {
            return Some(Instrument::Percussion);
        }
        self.program_by_name.get(name).copied().map(Instrument::Melodic)
    }

    /// MIDI pitch for a symbol played by `instrument`
    pub fn note_number(&self, symbol: &str, instrument: Instrument) -> Option<u8> {
        match instrument {
            Instrument::Melodic(_) => pitch_number(symbol),
            Instrument::Percussion => self.drum_by_name.get(symbol).copied(),
        }
    }

    /// Duration rounding backed by this mapping's duration table
    pub fn duration_quantizer(&self) -> DurationQuantizer<'_> {
        if self.config.durations.is_empty() {
            DurationQuantizer::fixed_step()
        } else {
            DurationQuantizer::with_table(&self.config.durations)
        }
    }
}

impl Default for NoteMapper {
    fn default() -> Self {
        Self::new(MappingConfig::default())
    }
}
