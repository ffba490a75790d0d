/// Controller numbers the player sends on its own.
pub mod cc {
    pub const BANK_SELECT_MSB: u8 = 0;
    pub const VOLUME: u8 = 7;
    pub const PAN: u8 = 10;
    pub const EXPRESSION: u8 = 11;
    pub const BANK_SELECT_LSB: u8 = 32;
    pub const REVERB: u8 = 91;
    pub const CHORUS: u8 = 93;
    pub const ALL_NOTES_OFF: u8 = 123;
}

/// A single instruction for the synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthCommand {
    NoteOn {
        channel: u8,
        pitch: u8,
        velocity: u8,
    },
    NoteOff { channel: u8, pitch: u8 },
    /// Signed around zero, -8192..=8191.
    PitchBend { channel: u8, value: i16 },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    AllNotesOff { channel: u8 },
    SelectProgram {
        channel: u8,
        bank: u16,
        program: u8,
    },
}

impl SynthCommand {
    pub fn channel(&self) -> u8 {
        match *self {
            SynthCommand::NoteOn { channel, .. }
            | SynthCommand::NoteOff { channel, .. }
            | SynthCommand::PitchBend { channel, .. }
            | SynthCommand::ControlChange { channel, .. }
            | SynthCommand::AllNotesOff { channel }
            | SynthCommand::SelectProgram { channel, .. } => channel,
        }
    }

    /// Encodes the command as raw MIDI 1.0 messages, handing each one to
    /// `send` in wire order.
    pub fn for_each_message(&self, mut send: impl FnMut(&[u8])) {
        let status = |kind: u8| kind | (self.channel() & 0x0f);
        match *self {
            SynthCommand::NoteOn {
                pitch, velocity, ..
            } => send(&[status(0x90), pitch & 0x7f, velocity & 0x7f]),
            SynthCommand::NoteOff { pitch, .. } => send(&[status(0x80), pitch & 0x7f, 0]),
            SynthCommand::PitchBend { value, .. } => {
                let raw = (i32::from(value) + 8192).clamp(0, 0x3fff) as u16;
                send(&[status(0xe0), (raw & 0x7f) as u8, (raw >> 7) as u8]);
            }
            SynthCommand::ControlChange {
                controller, value, ..
            } => send(&[status(0xb0), controller & 0x7f, value & 0x7f]),
            SynthCommand::AllNotesOff { .. } => send(&[status(0xb0), cc::ALL_NOTES_OFF, 0]),
            SynthCommand::SelectProgram { bank, program, .. } => {
                send(&[status(0xb0), cc::BANK_SELECT_MSB, ((bank >> 7) & 0x7f) as u8]);
                send(&[status(0xb0), cc::BANK_SELECT_LSB, (bank & 0x7f) as u8]);
                send(&[status(0xc0), program & 0x7f]);
            }
        }
    }
}

/// The next note-on in a channel, as seen from the event that carries it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookahead {
    /// Transposed pitch of the upcoming note.
    pub pitch: u8,
    /// Virtual seconds until it starts. Accounts for the loop wrap when the
    /// next note-on is the first one of the following pass.
    pub delta: f64,
}

/// Payload delivered to the consuming thread for every emitted note event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteCallbackEvent {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub is_note_on: bool,
    /// Song time the event was scheduled for.
    pub timestamp: f64,
    pub next: Option<Lookahead>,
}

impl NoteCallbackEvent {
    pub fn has_next_note_on(&self) -> bool {
        self.next.is_some()
    }
}
