//! Grid pass: per-tick tokens to dense, meter-annotated rows

use crate::converters::midi_to_rows::ExtractOptions;
use crate::models::quantize::{round_down, round_up};
use crate::models::{MeterMap, NoteLength, TimeSignature, REST};
use crate::table::{Row, Table};
use num_rational::Ratio;
use std::collections::BTreeMap;

/// Snap every token list down onto the grid and merge lists that land on
/// the same step.
pub fn quantize_tokens(tokens: &BTreeMap<u64, Vec<String>>, step: u64) -> BTreeMap<u64, String> {
    let mut grid: BTreeMap<u64, String> = BTreeMap::new();
    for (tick, notes) in tokens {
        if notes.is_empty() {
            continue;
        }
        let joined = notes.join(",");
        grid.entry(round_down(*tick, step))
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&joined);
            })
            .or_insert(joined);
    }
    grid
}

/// Insert a rest at every empty grid step from 0 through `max_tick`
/// rounded up to the grid.
pub fn fill_rests(grid: &mut BTreeMap<u64, String>, max_tick: u64, step: u64) {
    if step == 0 {
        return;
    }
    let last = round_up(max_tick, step);
    for tick in (0..=last).step_by(step as usize) {
        grid.entry(tick).or_insert_with(|| REST.to_string());
    }
}

/// Running measure and beat position while walking grid rows
///
/// Counts are only right when the grid is at least as fine as the time
/// signature's beat unit; coarser grids undercount measures. The quarter
/// note grid in particular counts two beat units per row.
#[derive(Debug, Clone)]
pub struct BeatCounter {
    grid: NoteLength,
    measure: u64,
    current_beat: u64,
    previous: Option<TimeSignature>,
}

impl BeatCounter {
    pub fn new(grid: NoteLength) -> Self {
        Self {
            grid,
            measure: 1,
            current_beat: 1,
            previous: None,
        }
    }

    /// Position of row `index` under `signature`, as (measure, beat)
    pub fn advance(&mut self, index: u64, signature: TimeSignature) -> (u64, f64) {
        // Grid rows per beat of the signature
        let modifier = Ratio::new(
            4 * self.grid.per_quarter(),
            u64::from(signature.denominator.max(1)),
        );
        let mut total = Ratio::from_integer(index) / modifier;
        if self.grid == NoteLength::Quarter {
            total = total * 2;
        }

        if *total.numer() > 0 && total.is_integer() {
            self.current_beat += 1;
        }

        let changed = self.previous.is_some_and(|previous| previous != signature);
        if self.current_beat > u64::from(signature.numerator) || changed {
            self.measure += 1;
            self.current_beat = 1;
        }
        self.previous = Some(signature);

        let fraction = total.fract();
        let beat = self.current_beat as f64 + *fraction.numer() as f64 / *fraction.denom() as f64;
        (self.measure, beat)
    }
}

/// Annotate the dense grid with the columns selected in `options`
pub fn build_rows(grid: &BTreeMap<u64, String>, meter: &MeterMap, options: &ExtractOptions) -> Table {
    let mut table = Table::new(options.columns());
    let mut counter = BeatCounter::new(options.timing_quantization);

    for (index, (tick, notes)) in grid.iter().enumerate() {
        let signature = meter.time_signature_at(*tick);
        let (measure, beat) = counter.advance(index as u64, signature);

        table.push(Row {
            timestamp: options.extract_timestamp.then_some(*tick),
            bpm: options.extract_bpm.then(|| meter.bpm_at(*tick)),
            time_signature: options.extract_time_signature.then(|| signature.to_string()),
            measure: options.extract_measure.then_some(measure),
            beat: options.extract_beat.then_some(beat),
            notes: notes.clone(),
        });
    }

    table
}
