// MIDI -> note table extraction tests
//
// Fixtures are encoded with midly in memory; each test checks the rows a
// reader produces for one small file.

mod common;

use common::*;
use midi_table::{Column, ExtractOptions, MidiReader, NoteMapper, ReadError};

#[test]
fn test_four_four_sixteenth_grid() {
    // Two quarter notes a measure apart at 480 ticks per quarter
    let bytes = smf_bytes(
        480,
        vec![vec![
            (0, program(0, 0)),
            (0, note_on(0, 60, 100)),
            (480, note_off(0, 60)),
            (1920, note_on(0, 64, 100)),
            (2400, note_off(0, 64)),
        ]],
    );

    let extraction = MidiReader::new(mapper()).convert_bytes(&bytes);
    assert!(extraction.is_ok());

    let rows = extraction.table.rows();
    assert_eq!(rows.len(), 17);

    assert_eq!(rows[0].notes, "piano_c5_1.0");
    assert_eq!(rows[0].timestamp, Some(0));
    assert_eq!(rows[0].bpm, Some(120.0));
    assert_eq!(rows[0].time_signature.as_deref(), Some("4/4"));
    assert_eq!(rows[0].measure, Some(1));
    assert_eq!(rows[0].beat, Some(1.0));

    assert_eq!(rows[1].notes, "rest");
    assert_eq!(rows[1].beat, Some(1.25));
    assert_eq!(rows[4].beat, Some(2.0));

    assert_eq!(rows[16].notes, "piano_e5_1.0");
    assert_eq!(rows[16].timestamp, Some(1920));
    assert_eq!(rows[16].measure, Some(2));
    assert_eq!(rows[16].beat, Some(1.0));
}

#[test]
fn test_grid_ticks_are_contiguous() {
    let bytes = smf_bytes(
        96,
        vec![vec![
            (0, note_on(0, 60, 90)),
            (24, note_off(0, 60)),
            (250, note_on(0, 62, 90)),
            (300, note_off(0, 62)),
        ]],
    );

    let extraction = MidiReader::new(mapper()).convert_bytes(&bytes);
    let ticks: Vec<u64> = extraction
        .table
        .rows()
        .iter()
        .filter_map(|row| row.timestamp)
        .collect();

    // 250 rounds down to 240 and the grid ends on the next step
    assert_eq!(ticks.first(), Some(&0));
    assert_eq!(ticks.last(), Some(&264));
    assert!(ticks.windows(2).all(|pair| pair[1] - pair[0] == 24));
    assert_eq!(extraction.table.rows()[10].notes, "piano_d5_0.5");
}

#[test]
fn test_halfway_durations_round_to_even_step() {
    // 30 ticks at 96 per quarter is 0.3125, halfway between 0.25 and 0.375
    let bytes = smf_bytes(
        96,
        vec![vec![
            (0, note_on(0, 60, 100)),
            (30, note_off(0, 60)),
            (48, note_on(0, 62, 100)),
            (90, note_off(0, 62)),
        ]],
    );

    let extraction = MidiReader::new(mapper()).convert_bytes(&bytes);
    let rows = extraction.table.rows();
    assert_eq!(rows[0].notes, "piano_c5_0.25");
    // 42 ticks is 0.4375, halfway between 0.375 and 0.5
    assert_eq!(rows[2].notes, "piano_d5_0.5");
}

#[test]
fn test_velocity_zero_ends_note() {
    let bytes = smf_bytes(
        120,
        vec![vec![(0, note_on(0, 48, 64)), (60, note_on(0, 48, 0))]],
    );

    let extraction = MidiReader::new(mapper()).convert_bytes(&bytes);
    assert_eq!(extraction.table.rows()[0].notes, "piano_c4_0.5");
}

#[test]
fn test_drum_channel_uses_percussion_names() {
    let bytes = smf_bytes(
        120,
        vec![
            vec![(0, tempo(600_000))],
            vec![
                (0, note_on(9, 36, 100)),
                (30, note_off(9, 36)),
                (30, note_on(9, 38, 100)),
                (60, note_off(9, 38)),
                (60, note_on(9, 42, 100)),
                (90, note_off(9, 42)),
            ],
        ],
    );

    let extraction = MidiReader::new(mapper()).convert_bytes(&bytes);
    let notes: Vec<&str> = extraction.table.rows().iter().map(|r| r.notes.as_str()).collect();
    assert_eq!(notes, vec!["percussion_kick_0.25", "percussion_snare_0.25"]);
    assert_eq!(extraction.table.rows()[0].bpm, Some(100.0));

    // Pitch 42 has no drum name
    assert_eq!(extraction.failures.total(), 1);
}

#[test]
fn test_selected_columns_only() {
    let bytes = smf_bytes(120, vec![vec![(0, note_on(0, 60, 100)), (120, note_off(0, 60))]]);
    let options = ExtractOptions {
        extract_timestamp: false,
        extract_bpm: false,
        extract_time_signature: false,
        ..ExtractOptions::default()
    };

    let extraction = MidiReader::with_options(mapper(), options).convert_bytes(&bytes);
    assert_eq!(extraction.table.columns(), &[Column::Measure, Column::Beat, Column::Notes]);

    let csv = extraction.table.to_csv_string().unwrap();
    assert_eq!(csv.lines().next(), Some("measure,beat,notes"));
}

#[test]
fn test_unreadable_path_gives_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.mid");

    let extraction = MidiReader::new(NoteMapper::default()).convert_file(&path);
    assert!(extraction.table.is_empty());
    assert!(matches!(extraction.error, Some(ReadError::Io { .. })));
}

#[test]
fn test_tick_ceiling() {
    let bytes = smf_bytes(120, vec![vec![(5000, note_on(0, 60, 100)), (5120, note_off(0, 60))]]);
    let options = ExtractOptions {
        max_tick: 1000,
        ..ExtractOptions::default()
    };
    let reader = MidiReader::with_options(mapper(), options);

    let extraction = reader.convert_bytes(&bytes);
    assert!(extraction.table.is_empty());
    assert!(matches!(
        extraction.error,
        Some(ReadError::TickCeilingExceeded { max_tick: 5000, limit: 1000 })
    ));
}

#[test]
fn test_file_without_notes() {
    let bytes = smf_bytes(120, vec![vec![(0, tempo(500_000)), (0, program(0, 33))]]);

    let extraction = MidiReader::new(mapper()).convert_bytes(&bytes);
    assert!(extraction.is_ok());
    assert!(extraction.table.is_empty());
}
