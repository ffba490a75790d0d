use super::song::{BEND_CENTER, Song};
use super::transport::TransportState;
use crate::audio::SynthBackend;
use crate::channels::ChannelSet;
use crate::events::NoteCallbackEvent;

/// Fires every note and pitch bend that became due, channel by channel.
///
/// Cursors always move past due notes, even on muted channels, so a channel
/// that gets unmuted picks up at the current song position. Callbacks are
/// appended to `out` only for channels the filter admits; the backend hears
/// every active channel regardless.
pub fn schedule_channels(
    song: &mut Song,
    transport: &TransportState,
    backend: &mut dyn SynthBackend,
    filter: ChannelSet,
    out: &mut Vec<NoteCallbackEvent>,
) {
    let now = transport.virtual_time;
    let length = song.length_seconds;
    let looping = song.looping;
    let emit = !transport.paused;

    for (index, channel) in song.channels_mut().iter_mut().enumerate() {
        let channel_id = index as u8;

        while let Some(note) = channel.next_note() {
            if now < note.start {
                break;
            }
            if emit && channel.is_active() {
                let pitch = channel.transposed(note.pitch);
                if note.is_note_on {
                    backend.note_on(channel_id, pitch, note.velocity);
                } else {
                    backend.note_off(channel_id, pitch);
                }
                if filter.admits(channel_id) {
                    out.push(NoteCallbackEvent {
                        channel: channel_id,
                        pitch,
                        velocity: note.velocity,
                        is_note_on: note.is_note_on,
                        timestamp: note.start,
                        next: channel.lookahead(now, length, looping),
                    });
                }
            }
            channel.advance_note();
        }

        while let Some(bend) = channel.next_bend() {
            if now < bend.time {
                break;
            }
            if emit {
                backend.pitch_bend(channel_id, bend.value);
            }
            channel.advance_bend();
        }
    }
}

/// Runs after a scheduling pass. A looping song that reached its end folds
/// time back, silences each sounding channel once and rewinds every cursor.
pub fn wrap_if_finished(
    song: &mut Song,
    transport: &mut TransportState,
    backend: &mut dyn SynthBackend,
) -> bool {
    if !song.looping || !transport.wrap(song.length_seconds) {
        return false;
    }
    silence(song, backend);
    song.rewind();
    recenter_bends(song, backend);
    true
}

/// All-notes-off on every channel that has anything to play.
pub fn silence(song: &Song, backend: &mut dyn SynthBackend) {
    for channel in song.sounding_channels().iter() {
        backend.all_notes_off(channel);
    }
}

pub fn recenter_bends(song: &Song, backend: &mut dyn SynthBackend) {
    for (index, channel) in song.channels().iter().enumerate() {
        if !channel.pitch_bends().is_empty() {
            backend.pitch_bend(index as u8, BEND_CENTER);
        }
    }
}
