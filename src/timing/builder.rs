use std::fs;
use std::path::Path;

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEventKind};
use tracing::debug;

use super::song::{ControlChange, NoteEvent, PitchBendEvent, Song};
use crate::error::LoadError;

/// 120 BPM, in microseconds per quarter note.
pub const DEFAULT_TEMPO: u32 = 500_000;

pub fn load_song(path: &Path, looping: bool) -> Result<Song, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    build_song(&bytes, looping)
}

/// Tempo changes from every track laid out on one tick axis. In a format 1
/// file the tempo usually lives in the conductor track while the notes live
/// in the others, so no track can be timed on its own.
struct TempoMap {
    segments: Vec<TempoSegment>,
    ppq: f64,
}

#[derive(Debug, Clone, Copy)]
struct TempoSegment {
    tick: u64,
    /// Song time at `tick`
    seconds: f64,
    us_per_quarter: f64,
}

impl TempoSegment {
    fn seconds_at(&self, tick: u64, ppq: f64) -> f64 {
        let ticks = tick.saturating_sub(self.tick) as f64;
        self.seconds + ticks * self.us_per_quarter / (1e6 * ppq)
    }
}

impl TempoMap {
    fn new(tracks: &[Track<'_>], ppq: f64) -> Self {
        let mut changes = Vec::new();
        for track in tracks {
            let mut tick: u64 = 0;
            for event in track {
                tick += u64::from(event.delta.as_int());
                if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                    changes.push((tick, f64::from(tempo.as_int())));
                }
            }
        }
        // stable, so of two changes on one tick the later track wins
        changes.sort_by_key(|&(tick, _)| tick);

        let mut segments = vec![TempoSegment {
            tick: 0,
            seconds: 0.0,
            us_per_quarter: f64::from(DEFAULT_TEMPO),
        }];
        for (tick, us_per_quarter) in changes {
            let Some(last) = segments.last_mut() else {
                continue;
            };
            if last.tick == tick {
                last.us_per_quarter = us_per_quarter;
            } else {
                let seconds = last.seconds_at(tick, ppq);
                segments.push(TempoSegment {
                    tick,
                    seconds,
                    us_per_quarter,
                });
            }
        }

        Self { segments, ppq }
    }

    fn seconds_at(&self, tick: u64) -> f64 {
        let index = self
            .segments
            .partition_point(|segment| segment.tick <= tick)
            .saturating_sub(1);
        self.segments
            .get(index)
            .map_or(0.0, |segment| segment.seconds_at(tick, self.ppq))
    }
}

/// Parses a format 1 Standard MIDI File into per-channel timelines.
///
/// Tempo changes are collected from all tracks first, starting from the
/// default tempo, and every track is timed against that shared map. A change
/// only affects the ticks that follow it.
pub fn build_song(bytes: &[u8], looping: bool) -> Result<Song, LoadError> {
    let smf = Smf::parse(bytes)?;

    let ppq = match (smf.header.format, smf.header.timing) {
        (Format::Parallel, Timing::Metrical(ticks)) if ticks.as_int() > 0 => {
            f64::from(ticks.as_int())
        }
        (Format::Parallel, Timing::Metrical(_)) => {
            return Err(LoadError::Format("zero ticks per quarter note".into()));
        }
        (Format::Parallel, Timing::Timecode(..)) => {
            return Err(LoadError::Format(
                "timecode division is not supported".into(),
            ));
        }
        (format, _) => {
            return Err(LoadError::Format(format!(
                "expected a format 1 (parallel) file, found {format:?}"
            )));
        }
    };

    let tempo = TempoMap::new(&smf.tracks, ppq);
    debug!(changes = tempo.segments.len() - 1, "built tempo map");
    let mut song = Song::new(looping);

    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut ticks: u64 = 0;
        let mut seconds = 0.0_f64;

        for event in track {
            ticks += u64::from(event.delta.as_int());
            seconds = tempo.seconds_at(ticks);
            song.length_seconds = song.length_seconds.max(seconds);

            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let channel = channel.as_int();
            match message {
                // velocity 0 is the running-status way of writing note-off
                MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => {
                    song.add_note(channel, NoteEvent::off(seconds, key.as_int(), 0));
                }
                MidiMessage::NoteOn { key, vel } => {
                    song.add_note(channel, NoteEvent::on(seconds, key.as_int(), vel.as_int()));
                }
                MidiMessage::NoteOff { key, vel } => {
                    song.add_note(channel, NoteEvent::off(seconds, key.as_int(), vel.as_int()));
                }
                MidiMessage::Controller { controller, value } => {
                    song.setup.push(ControlChange {
                        channel,
                        controller: controller.as_int(),
                        value: value.as_int(),
                    });
                }
                MidiMessage::PitchBend { bend } => {
                    song.add_pitch_bend(
                        channel,
                        PitchBendEvent {
                            time: seconds,
                            value: bend.as_int(),
                        },
                    );
                }
                _ => {}
            }
        }

        debug!(track = track_index, ticks, seconds, "parsed track");
    }

    Ok(song.finish())
}
