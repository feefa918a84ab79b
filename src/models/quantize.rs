//! Timing and duration quantization
//!
//! Timing quantization snaps note starts down onto a fixed tick grid.
//! Duration quantization rounds a length in quarter notes either to the
//! nearest allowed value for the instrument or to the nearest 1/8 of a
//! quarter note.

use num_rational::Ratio;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::collections::HashMap;

/// Fixed duration step (in quarter notes) used when an instrument has no
/// allowed-duration list
pub const DURATION_STEP: f64 = 0.125;

/// Decimal places kept on quantized durations
pub const DURATION_PRECISION: i32 = 3;

/// Grid resolutions, stored as subdivisions of a quarter note
#[derive(Serialize_repr, Deserialize_repr, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NoteLength {
    Quarter = 1,
    Eighth = 2,
    #[default]
    Sixteenth = 4,
    ThirtySecond = 8,
}

impl NoteLength {
    /// Subdivisions per quarter note
    pub fn per_quarter(self) -> u64 {
        self as u64
    }

    /// Length as a ratio of a quarter note (1, 1/2, 1/4, 1/8)
    pub fn quarter_ratio(self) -> Ratio<u64> {
        Ratio::new(1, self.per_quarter())
    }

    /// Length in ticks at the given resolution, rounded down
    pub fn ticks(self, resolution: u16) -> u64 {
        resolution as u64 / self.per_quarter()
    }
}

/// Round `tick` down to the nearest multiple of `step`
///
/// Events belong to the grid step in which they begin.
pub fn round_down(tick: u64, step: u64) -> u64 {
    if step == 0 {
        return 0;
    }
    tick - tick % step
}

/// Round `tick` up to the nearest multiple of `step`
pub fn round_up(tick: u64, step: u64) -> u64 {
    if step == 0 {
        return 0;
    }
    tick.div_ceil(step) * step
}

fn round_to_precision(value: f64) -> f64 {
    let scale = 10f64.powi(DURATION_PRECISION);
    (value * scale).round() / scale
}

/// Round to the nearest multiple of [`DURATION_STEP`], keeping 3 decimals
///
/// Halfway values round to the even multiple (0.3125 -> 0.25, 0.4375 -> 0.5).
/// A positive value never rounds to zero; it is raised to one step.
pub fn round_to_step(duration: f64) -> f64 {
    let rounded = round_to_precision(DURATION_STEP * (duration / DURATION_STEP).round_ties_even());
    if rounded <= 0.0 && duration > 0.0 {
        DURATION_STEP
    } else {
        rounded
    }
}

/// Value in `allowed` closest to `duration`; the earliest wins a tie
pub fn nearest_allowed(duration: f64, allowed: &[f64]) -> Option<f64> {
    allowed.iter().copied().fold(None, |best, candidate| match best {
        Some(b) if (b - duration).abs() <= (candidate - duration).abs() => Some(b),
        _ => Some(candidate),
    })
}

/// Duration rounding for one conversion
///
/// Instruments listed in the table round to their allowed values; every
/// other instrument rounds to the fixed step.
#[derive(Clone, Debug, Default)]
pub struct DurationQuantizer<'a> {
    allowed: Option<&'a HashMap<String, Vec<f64>>>,
}

impl<'a> DurationQuantizer<'a> {
    /// Fixed-step rounding for every instrument
    pub fn fixed_step() -> Self {
        Self { allowed: None }
    }

    pub fn with_table(allowed: &'a HashMap<String, Vec<f64>>) -> Self {
        Self { allowed: Some(allowed) }
    }

    pub fn quantize(&self, instrument: &str, duration: f64) -> f64 {
        let from_table = self
            .allowed
            .and_then(|table| table.get(instrument))
            .and_then(|values| nearest_allowed(duration, values));
        // Listed values are taken as-is, not snapped to the fixed step
        match from_table {
            Some(value) => round_to_precision(value),
            None => round_to_step(duration),
        }
    }
}
