#![allow(dead_code)]

use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use tocata::{NoteEvent, PitchBendEvent, Player, RecordingBackend, Song, SynthCommand};

pub fn player() -> (Player, RecordingBackend) {
    let backend = RecordingBackend::new();
    (Player::new(Box::new(backend.clone())), backend)
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Builds a song from `(channel, note)` pairs.
pub fn song(looping: bool, notes: &[(u8, NoteEvent)]) -> Song {
    let mut song = Song::new(looping);
    for &(channel, note) in notes {
        song.add_note(channel, note);
    }
    song.finish()
}

pub fn bend(time: f64, value: i16) -> PitchBendEvent {
    PitchBendEvent { time, value }
}

pub fn all_notes_off(commands: &[SynthCommand]) -> Vec<u8> {
    commands
        .iter()
        .filter_map(|command| match command {
            SynthCommand::AllNotesOff { channel } => Some(*channel),
            _ => None,
        })
        .collect()
}

pub fn note_on(delta: u32, channel: u8, key: u8, vel: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: channel.into(),
            message: MidiMessage::NoteOn {
                key: key.into(),
                vel: vel.into(),
            },
        },
    }
}

pub fn note_off(delta: u32, channel: u8, key: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: channel.into(),
            message: MidiMessage::NoteOff {
                key: key.into(),
                vel: 64.into(),
            },
        },
    }
}

pub fn tempo(delta: u32, us_per_quarter: u32) -> TrackEvent<'static> {
    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter.into())),
    }
}

/// Serializes tracks into a Standard MIDI File, closing each track.
pub fn smf_bytes(format: Format, ppq: u16, tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
    let tracks = tracks
        .into_iter()
        .map(|mut track| {
            track.push(TrackEvent {
                delta: 0.into(),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            });
            track
        })
        .collect();
    let smf = Smf {
        header: Header::new(format, Timing::Metrical(ppq.into())),
        tracks,
    };
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).expect("write smf");
    bytes
}
