use crate::converters::midi_to_rows::{model::*, ReadError, Result};
use crate::models::TimeSignature;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

/// Decode SMF bytes into a sequence with absolute tick timestamps
pub fn parse_smf(bytes: &[u8]) -> Result<Sequence> {
    let smf = Smf::parse(bytes)?;

    let resolution = match smf.header.timing {
        Timing::Metrical(tpq) => tpq.as_int(),
        Timing::Timecode(..) => return Err(ReadError::UnsupportedTiming),
    };

    let tracks = smf
        .tracks
        .iter()
        .map(|track| {
            // Deltas accumulate into absolute ticks
            let mut tick = 0u64;
            track
                .iter()
                .map(|event| {
                    tick += event.delta.as_int() as u64;
                    TimedEvent::new(tick, decode_kind(&event.kind))
                })
                .collect()
        })
        .collect();

    Ok(Sequence { resolution, tracks })
}

fn decode_kind(kind: &TrackEventKind) -> EventKind {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
                    channel,
                    pitch: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::NoteOff { key, .. } => EventKind::NoteOff {
                    channel,
                    pitch: key.as_int(),
                },
                MidiMessage::ProgramChange { program } => EventKind::ProgramChange {
                    channel,
                    program: program.as_int(),
                },
                // Controllers, pitch bend and aftertouch are not extracted
                _ => EventKind::Other,
            }
        }
        TrackEventKind::Meta(MetaMessage::Tempo(micros)) => EventKind::Tempo {
            bpm: micros_to_bpm(micros.as_int()),
        },
        TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denominator_power, _, _)) => {
            EventKind::TimeSignature(TimeSignature::from_midi(*numerator, *denominator_power))
        }
        _ => EventKind::Other,
    }
}
