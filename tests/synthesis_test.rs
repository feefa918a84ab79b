// Note table -> MIDI synthesis tests, plus full round trips through both
// converters

mod common;

use common::*;
use midi_table::{MidiReader, MidiWriter, Row, Table, WriteOptions};
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use std::fs::File;

/// (absolute tick, channel, pitch, is note-on) for every note event
fn note_events(track: &[midly::TrackEvent]) -> Vec<(u32, u8, u8, bool)> {
    let mut tick = 0;
    track
        .iter()
        .filter_map(|event| {
            tick += event.delta.as_int();
            match event.kind {
                TrackEventKind::Midi { channel, message: MidiMessage::NoteOn { key, .. } } => {
                    Some((tick, channel.as_int(), key.as_int(), true))
                }
                TrackEventKind::Midi { channel, message: MidiMessage::NoteOff { key, .. } } => {
                    Some((tick, channel.as_int(), key.as_int(), false))
                }
                _ => None,
            }
        })
        .collect()
}

fn table(notes: &[&str]) -> Table {
    Table::from_rows(notes.iter().map(|n| Row::notes(*n)).collect())
}

#[test]
fn test_single_token() {
    let synthesis = MidiWriter::new(mapper()).to_bytes(&table(&["piano_c4_0.25"])).unwrap();
    let smf = Smf::parse(&synthesis.bytes).unwrap();

    assert_eq!(smf.tracks.len(), 2);
    assert_eq!(
        note_events(&smf.tracks[1]),
        vec![(0, 0, 48, true), (30, 0, 48, false)]
    );
    assert!(note_events(&smf.tracks[0]).is_empty());
}

#[test]
fn test_tempo_is_average_of_rows() {
    let mut rows = vec![Row::notes("piano_c5_0.25"), Row::notes("rest")];
    rows[0].bpm = Some(90.0);
    rows[1].bpm = Some(150.0);

    let synthesis = MidiWriter::new(mapper()).to_bytes(&Table::from_rows(rows)).unwrap();
    let smf = Smf::parse(&synthesis.bytes).unwrap();
    let tempos: Vec<u32> = smf
        .tracks
        .iter()
        .flatten()
        .filter_map(|event| match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(micros)) => Some(micros.as_int()),
            _ => None,
        })
        .collect();
    assert_eq!(tempos, vec![500_000]);
}

#[test]
fn test_custom_resolution_and_skipped_tokens() {
    let options = WriteOptions {
        resolution: 480,
        ..WriteOptions::default()
    };
    let writer = MidiWriter::with_options(mapper(), options);
    let synthesis = writer
        .to_bytes(&table(&["rest", "bass_e2_0.5,tuba_c5_1.0", "bass_e2"]))
        .unwrap();

    assert_eq!(synthesis.malformed_tokens, 1);
    assert_eq!(synthesis.failures.total(), 1);

    let smf = Smf::parse(&synthesis.bytes).unwrap();
    assert_eq!(smf.tracks.len(), 2);
    assert_eq!(
        note_events(&smf.tracks[1]),
        vec![(120, 0, 28, true), (360, 0, 28, false)]
    );
}

#[test]
fn test_round_trip_through_table() {
    let bytes = smf_bytes(
        120,
        vec![
            vec![
                (0, program(0, 0)),
                (0, note_on(0, 60, 100)),
                (30, note_on(0, 64, 100)),
                (60, note_off(0, 64)),
                (120, note_off(0, 60)),
            ],
            vec![(60, note_on(9, 36, 100)), (90, note_off(9, 36))],
        ],
    );

    let reader = MidiReader::new(mapper());
    let first = reader.convert_bytes(&bytes);
    let notes: Vec<&str> = first.table.rows().iter().map(|r| r.notes.as_str()).collect();
    assert_eq!(notes, vec!["piano_c5_1.0", "piano_e5_0.25", "percussion_kick_0.25"]);

    let synthesis = MidiWriter::new(mapper()).to_bytes(&first.table).unwrap();
    let second = reader.convert_bytes(&synthesis.bytes);
    assert!(second.is_ok());
    assert_eq!(second.table, first.table);
}

#[test]
fn test_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let midi_path = dir.path().join("song.mid");
    let csv_path = dir.path().join("song.csv");

    let source = table(&["piano_c5_0.5", "rest", "bass_e2_0.25,percussion_snare_0.25", "rest"]);
    MidiWriter::new(mapper()).convert_to_file(&source, &midi_path).unwrap();

    let extraction = MidiReader::new(mapper()).convert_file(&midi_path);
    assert!(extraction.is_ok());
    extraction
        .table
        .write_csv(File::create(&csv_path).unwrap())
        .unwrap();

    let reloaded = Table::read_csv(File::open(&csv_path).unwrap()).unwrap();
    assert_eq!(reloaded, extraction.table);

    let rows = reloaded.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].notes, "piano_c5_0.5");
    assert_eq!(rows[1].notes, "rest");
    assert_eq!(rows[2].notes, "percussion_snare_0.25,bass_e2_0.25");
}
