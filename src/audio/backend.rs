use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::events::SynthCommand;

/// The narrow slice of a synthesizer the player drives. Implementations are
/// called with the playback lock held, so every method must return quickly.
pub trait SynthBackend: Send {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, pitch: u8);
    fn pitch_bend(&mut self, channel: u8, value: i16);
    fn control_change(&mut self, channel: u8, controller: u8, value: u8);
    fn all_notes_off(&mut self, channel: u8);
    fn select_program(&mut self, channel: u8, bank: u16, program: u8);

    fn apply(&mut self, command: SynthCommand) {
        match command {
            SynthCommand::NoteOn {
                channel,
                pitch,
                velocity,
            } => self.note_on(channel, pitch, velocity),
            SynthCommand::NoteOff { channel, pitch } => self.note_off(channel, pitch),
            SynthCommand::PitchBend { channel, value } => self.pitch_bend(channel, value),
            SynthCommand::ControlChange {
                channel,
                controller,
                value,
            } => self.control_change(channel, controller, value),
            SynthCommand::AllNotesOff { channel } => self.all_notes_off(channel),
            SynthCommand::SelectProgram {
                channel,
                bank,
                program,
            } => self.select_program(channel, bank, program),
        }
    }
}

/// Discards everything. Used when no output device is reachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl SynthBackend for NullBackend {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        trace!(channel, pitch, velocity, "note on");
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        trace!(channel, pitch, "note off");
    }

    fn pitch_bend(&mut self, channel: u8, value: i16) {
        trace!(channel, value, "pitch bend");
    }

    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        trace!(channel, controller, value, "control change");
    }

    fn all_notes_off(&mut self, channel: u8) {
        trace!(channel, "all notes off");
    }

    fn select_program(&mut self, channel: u8, bank: u16, program: u8) {
        trace!(channel, bank, program, "select program");
    }
}

/// Keeps every command it receives. Clones share one log, so a handle kept
/// outside the player can inspect what the player sent.
#[derive(Debug, Default, Clone)]
pub struct RecordingBackend {
    log: Arc<Mutex<Vec<SynthCommand>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<SynthCommand> {
        self.log.lock().clone()
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&self) -> Vec<SynthCommand> {
        std::mem::take(&mut *self.log.lock())
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    fn push(&self, command: SynthCommand) {
        self.log.lock().push(command);
    }
}

impl SynthBackend for RecordingBackend {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.push(SynthCommand::NoteOn {
            channel,
            pitch,
            velocity,
        });
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        self.push(SynthCommand::NoteOff { channel, pitch });
    }

    fn pitch_bend(&mut self, channel: u8, value: i16) {
        self.push(SynthCommand::PitchBend { channel, value });
    }

    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        self.push(SynthCommand::ControlChange {
            channel,
            controller,
            value,
        });
    }

    fn all_notes_off(&mut self, channel: u8) {
        self.push(SynthCommand::AllNotesOff { channel });
    }

    fn select_program(&mut self, channel: u8, bank: u16, program: u8) {
        self.push(SynthCommand::SelectProgram {
            channel,
            bank,
            program,
        });
    }
}
