use crate::channels::{CHANNEL_COUNT, ChannelSet, channel_index};
use crate::events::Lookahead;

/// Neutral pitch-bend value.
pub const BEND_CENTER: i16 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// Seconds from song start
    pub start: f64,
    pub is_note_on: bool,
    pub pitch: u8,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn on(start: f64, pitch: u8, velocity: u8) -> Self {
        Self {
            start,
            is_note_on: true,
            pitch,
            velocity,
        }
    }

    pub fn off(start: f64, pitch: u8, velocity: u8) -> Self {
        Self {
            start,
            is_note_on: false,
            pitch,
            velocity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchBendEvent {
    pub time: f64,
    /// -8192..=8191, 0 is neutral
    pub value: i16,
}

/// A controller value found in the file. These are applied to the backend
/// once when the song is installed, not replayed at their timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChange {
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
}

/// Everything one MIDI channel plays, plus where playback currently is.
#[derive(Debug, Clone, Default)]
pub struct ChannelTimeline {
    notes: Vec<NoteEvent>,
    pitch_bends: Vec<PitchBendEvent>,
    // index of the next note-on after each note, filled in by `finish`
    next_note_on: Vec<Option<usize>>,
    note_pos: usize,
    bend_pos: usize,
    active: bool,
    transpose: i32,
}

impl ChannelTimeline {
    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn pitch_bends(&self) -> &[PitchBendEvent] {
        &self.pitch_bends
    }

    pub fn note_pos(&self) -> usize {
        self.note_pos
    }

    pub fn bend_pos(&self) -> usize {
        self.bend_pos
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has_notes(&self) -> bool {
        !self.notes.is_empty()
    }

    pub fn transpose(&self) -> i32 {
        self.transpose
    }

    pub(crate) fn set_transpose(&mut self, semitones: i32) {
        self.transpose = semitones;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active && self.has_notes();
    }

    /// Applies the channel transpose, clamped to the MIDI pitch range.
    pub fn transposed(&self, pitch: u8) -> u8 {
        (i32::from(pitch) + self.transpose).clamp(0, 127) as u8
    }

    pub(crate) fn next_note(&self) -> Option<NoteEvent> {
        self.notes.get(self.note_pos).copied()
    }

    pub(crate) fn next_bend(&self) -> Option<PitchBendEvent> {
        self.pitch_bends.get(self.bend_pos).copied()
    }

    pub(crate) fn advance_note(&mut self) {
        self.note_pos = (self.note_pos + 1).min(self.notes.len());
    }

    pub(crate) fn advance_bend(&mut self) {
        self.bend_pos = (self.bend_pos + 1).min(self.pitch_bends.len());
    }

    pub(crate) fn rewind(&mut self) {
        self.note_pos = 0;
        self.bend_pos = 0;
    }

    /// Moves both cursors to the first event at or after `time`. Returns the
    /// bend value in effect just before `time`, if the channel has bent yet.
    pub(crate) fn seek(&mut self, time: f64) -> Option<i16> {
        self.note_pos = self.notes.partition_point(|note| note.start < time);
        self.bend_pos = self.pitch_bends.partition_point(|bend| bend.time < time);
        self.bend_pos
            .checked_sub(1)
            .map(|index| self.pitch_bends[index].value)
    }

    /// Next note-on after the note under the cursor. When the channel has no
    /// later note-on and the song loops, the first note-on of the channel is
    /// reported relative to the start of the next pass.
    pub fn lookahead(&self, now: f64, length: f64, looping: bool) -> Option<Lookahead> {
        let after = self.next_note_on.get(self.note_pos).copied().flatten();
        match after {
            Some(index) => {
                let note = &self.notes[index];
                Some(Lookahead {
                    pitch: self.transposed(note.pitch),
                    delta: note.start - now,
                })
            }
            None if looping => self
                .notes
                .iter()
                .find(|note| note.is_note_on)
                .map(|note| Lookahead {
                    pitch: self.transposed(note.pitch),
                    delta: note.start + length - now,
                }),
            None => None,
        }
    }

    fn finish(&mut self) {
        // sort_by is stable, equal timestamps keep file order
        self.notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.pitch_bends.sort_by(|a, b| a.time.total_cmp(&b.time));

        self.next_note_on = vec![None; self.notes.len()];
        let mut upcoming = None;
        for index in (0..self.notes.len()).rev() {
            self.next_note_on[index] = upcoming;
            if self.notes[index].is_note_on {
                upcoming = Some(index);
            }
        }

        self.active = self.has_notes();
        self.transpose = 0;
        self.rewind();
    }
}

/// Sixteen channel timelines and the loop settings that go with them.
#[derive(Debug, Clone, Default)]
pub struct Song {
    channels: [ChannelTimeline; CHANNEL_COUNT],
    pub length_seconds: f64,
    pub looping: bool,
    pub setup: Vec<ControlChange>,
}

impl Song {
    pub fn new(looping: bool) -> Self {
        Self {
            looping,
            ..Self::default()
        }
    }

    pub fn channels(&self) -> &[ChannelTimeline; CHANNEL_COUNT] {
        &self.channels
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [ChannelTimeline; CHANNEL_COUNT] {
        &mut self.channels
    }

    pub fn channel(&self, channel: u8) -> Option<&ChannelTimeline> {
        channel_index(channel).map(|index| &self.channels[index])
    }

    pub(crate) fn channel_mut(&mut self, channel: u8) -> Option<&mut ChannelTimeline> {
        channel_index(channel).map(move |index| &mut self.channels[index])
    }

    /// Appends a note to a channel. Out-of-range channels are dropped.
    pub fn add_note(&mut self, channel: u8, note: NoteEvent) {
        if let Some(timeline) = self.channel_mut(channel) {
            timeline.notes.push(note);
            self.length_seconds = self.length_seconds.max(note.start);
        }
    }

    pub fn add_pitch_bend(&mut self, channel: u8, bend: PitchBendEvent) {
        if let Some(timeline) = self.channel_mut(channel) {
            timeline.pitch_bends.push(bend);
            self.length_seconds = self.length_seconds.max(bend.time);
        }
    }

    /// Sorts every channel, marks channels with notes active and rewinds
    /// all cursors. Must run once after the last event is added.
    pub fn finish(mut self) -> Self {
        for channel in &mut self.channels {
            channel.finish();
        }
        self
    }

    /// Channels that will currently produce sound.
    pub fn active_channels(&self) -> ChannelSet {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, channel)| channel.active)
            .map(|(index, _)| index as u8)
            .collect()
    }

    /// Channels with at least one note, muted or not.
    pub fn sounding_channels(&self) -> ChannelSet {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, channel)| channel.has_notes())
            .map(|(index, _)| index as u8)
            .collect()
    }

    pub(crate) fn rewind(&mut self) {
        for channel in &mut self.channels {
            channel.rewind();
        }
    }

    pub fn is_finished(&self, time: f64) -> bool {
        !self.looping && time >= self.length_seconds
    }
}
