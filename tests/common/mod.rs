// Shared fixtures for the integration tests

#![allow(dead_code)]

use midi_table::{MappingConfig, NoteMapper};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

pub fn mapper() -> NoteMapper {
    let mut config = MappingConfig::default();
    config.programs.insert(0, "piano".to_string());
    // Tracks without a program change play program 1
    config.programs.insert(1, "piano".to_string());
    config.programs.insert(33, "bass".to_string());
    config.percussion.insert(36, "kick".to_string());
    config.percussion.insert(38, "snare".to_string());
    NoteMapper::new(config)
}

pub fn note_on(channel: u8, pitch: u8, velocity: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: channel.into(),
        message: MidiMessage::NoteOn {
            key: pitch.into(),
            vel: velocity.into(),
        },
    }
}

pub fn note_off(channel: u8, pitch: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: channel.into(),
        message: MidiMessage::NoteOff {
            key: pitch.into(),
            vel: 0.into(),
        },
    }
}

pub fn program(channel: u8, program: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: channel.into(),
        message: MidiMessage::ProgramChange {
            program: program.into(),
        },
    }
}

pub fn tempo(micros_per_quarter: u32) -> TrackEventKind<'static> {
    TrackEventKind::Meta(MetaMessage::Tempo(micros_per_quarter.into()))
}

/// Encode tracks of (absolute tick, event) pairs as a Format 1 SMF
pub fn smf_bytes(resolution: u16, tracks: Vec<Vec<(u32, TrackEventKind<'static>)>>) -> Vec<u8> {
    let tracks = tracks
        .into_iter()
        .map(|events| {
            let mut previous = 0;
            let mut track: Vec<TrackEvent> = events
                .into_iter()
                .map(|(tick, kind)| {
                    let delta = tick - previous;
                    previous = tick;
                    TrackEvent {
                        delta: delta.into(),
                        kind,
                    }
                })
                .collect();
            track.push(TrackEvent {
                delta: 0.into(),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            });
            track
        })
        .collect();

    let smf = Smf {
        header: Header::new(Format::Parallel, Timing::Metrical(resolution.into())),
        tracks,
    };
    let mut out = Vec::new();
    smf.write(&mut out).expect("Failed to encode fixture");
    out
}
