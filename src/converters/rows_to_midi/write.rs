use crate::converters::midi_to_rows::bpm_to_micros;
use crate::converters::rows_to_midi::{schedule::*, WriteError, Result};
use crate::models::Instrument;
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

/// Largest delta a SMF event can carry (28 bits)
const MAX_DELTA: u64 = 0x0FFF_FFFF;

/// Write a schedule as a Standard MIDI File (SMF) Format 1
pub fn write_smf(schedule: &Schedule, velocity: u8, out: &mut Vec<u8>) -> Result<()> {
    let tracks = schedule
        .tracks
        .iter()
        .map(|plan| build_track(schedule, plan, velocity))
        .collect::<Result<Vec<_>>>()?;

    let header = Header {
        format: Format::Parallel,
        timing: Timing::Metrical(schedule.resolution.into()),
    };

    let smf = Smf {
        header,
        tracks,
    };

    smf.write(out)
        .map_err(|e| WriteError::Midi(format!("Failed to write MIDI: {}", e)))?;

    Ok(())
}

fn build_track<'a>(schedule: &Schedule, plan: &'a TrackPlan, velocity: u8) -> Result<Track<'a>> {
    let mut events = Vec::with_capacity(plan.events.len() + 4);

    // Track name
    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(plan.name.as_bytes())),
    });

    // The percussion track doubles as the tempo track
    let program = match plan.instrument {
        Instrument::Percussion => {
            events.push(TrackEvent {
                delta: 0.into(),
                kind: TrackEventKind::Meta(MetaMessage::Tempo(bpm_to_micros(schedule.bpm).into())),
            });
            0
        }
        Instrument::Melodic(program) => program,
    };

    // Program change (instrument)
    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Midi {
            channel: plan.channel.into(),
            message: MidiMessage::ProgramChange {
                program: program.into(),
            },
        },
    });

    // Note events, already delta-encoded
    for event in &plan.events {
        if event.delta > MAX_DELTA {
            return Err(WriteError::DeltaOverflow {
                track: plan.name.clone(),
                delta: event.delta,
            });
        }
        let message = match event.message {
            NoteMessage::On { pitch } => MidiMessage::NoteOn {
                key: pitch.into(),
                vel: velocity.into(),
            },
            NoteMessage::Off { pitch } => MidiMessage::NoteOff {
                key: pitch.into(),
                vel: 0.into(),
            },
        };
        events.push(TrackEvent {
            delta: (event.delta as u32).into(),
            kind: TrackEventKind::Midi {
                channel: plan.channel.into(),
                message,
            },
        });
    }

    // End of track
    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    Ok(events)
}
