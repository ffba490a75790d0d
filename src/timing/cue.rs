use std::collections::VecDeque;

use crate::audio::SynthBackend;
use crate::channels::channel_index;

pub const DEFAULT_CUE_VELOCITY: u8 = 100;

/// One step of a short hand-written phrase (menu blips, puzzle chimes).
/// `delay` is measured from the previous step of the same phrase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueEvent {
    pub delay: f64,
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub note_on: bool,
}

impl CueEvent {
    pub fn on(delay: f64, channel: u8, pitch: u8) -> Self {
        Self {
            delay,
            channel,
            pitch,
            velocity: DEFAULT_CUE_VELOCITY,
            note_on: true,
        }
    }

    pub fn off(delay: f64, channel: u8, pitch: u8) -> Self {
        Self {
            note_on: false,
            ..Self::on(delay, channel, pitch)
        }
    }

    pub fn with_velocity(self, velocity: u8) -> Self {
        Self {
            velocity: velocity.min(127),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingCue {
    at: f64,
    channel: u8,
    pitch: u8,
    velocity: u8,
    note_on: bool,
}

/// Notes played straight to the backend on their own clock, unaffected by
/// song pause, seek or speed.
#[derive(Debug, Default)]
pub struct CueQueue {
    pending: VecDeque<PendingCue>,
    clock: f64,
}

impl CueQueue {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Queues a phrase starting now. Phrases queued while another is still
    /// playing overlap with it rather than waiting for it to finish.
    pub fn extend(&mut self, events: &[CueEvent]) {
        let mut at = self.clock;
        for event in events {
            if channel_index(event.channel).is_none() {
                continue;
            }
            at += event.delay.max(0.0);
            self.pending.push_back(PendingCue {
                at,
                channel: event.channel,
                pitch: event.pitch.min(127),
                velocity: event.velocity.min(127),
                note_on: event.note_on,
            });
        }
        self.pending
            .make_contiguous()
            .sort_by(|a, b| a.at.total_cmp(&b.at));
    }

    pub fn advance(&mut self, dt: f64, backend: &mut dyn SynthBackend) {
        if self.pending.is_empty() {
            self.clock = 0.0;
            return;
        }
        self.clock += dt;
        while let Some(cue) = self.pending.front().copied() {
            if cue.at > self.clock {
                break;
            }
            self.pending.pop_front();
            fire(cue, backend);
        }
        if self.pending.is_empty() {
            self.clock = 0.0;
        }
    }

    /// Drops everything queued. Pending note-offs are sent right away so a
    /// phrase cut short does not leave notes hanging.
    pub fn clear(&mut self, backend: &mut dyn SynthBackend) {
        for cue in self.pending.drain(..).filter(|cue| !cue.note_on) {
            fire(cue, backend);
        }
        self.clock = 0.0;
    }
}

fn fire(cue: PendingCue, backend: &mut dyn SynthBackend) {
    if cue.note_on {
        backend.note_on(cue.channel, cue.pitch, cue.velocity);
    } else {
        backend.note_off(cue.channel, cue.pitch);
    }
}
