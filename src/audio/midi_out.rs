use midir::{MidiOutput, MidiOutputConnection};
use tracing::{info, warn};

use super::SynthBackend;
use crate::error::BackendError;
use crate::events::SynthCommand;

const CLIENT_NAME: &str = "tocata";

/// Sends backend commands to a hardware or virtual MIDI output port.
pub struct MidiOutBackend {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiOutBackend {
    /// Connects to the first output port whose name contains `port_hint`,
    /// or to the first port at all when no hint is given.
    pub fn connect(port_hint: Option<&str>) -> Result<Self, BackendError> {
        let output = MidiOutput::new(CLIENT_NAME)?;

        let mut chosen = None;
        for port in output.ports() {
            let name = output.port_name(&port)?;
            if port_hint.is_none_or(|hint| name.contains(hint)) {
                chosen = Some((port, name));
                break;
            }
        }

        let Some((port, port_name)) = chosen else {
            return Err(match port_hint {
                Some(hint) => BackendError::PortNotFound(hint.to_string()),
                None => BackendError::NoPort,
            });
        };

        let connection = output
            .connect(&port, "tocata-out")
            .map_err(|err| BackendError::Connect(err.to_string()))?;
        info!(port = %port_name, "connected midi output");

        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn send(&mut self, command: SynthCommand) {
        let connection = &mut self.connection;
        command.for_each_message(|message| {
            if let Err(err) = connection.send(message) {
                warn!(%err, ?command, "midi send failed");
            }
        });
    }
}

impl SynthBackend for MidiOutBackend {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.send(SynthCommand::NoteOn {
            channel,
            pitch,
            velocity,
        });
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        self.send(SynthCommand::NoteOff { channel, pitch });
    }

    fn pitch_bend(&mut self, channel: u8, value: i16) {
        self.send(SynthCommand::PitchBend { channel, value });
    }

    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        self.send(SynthCommand::ControlChange {
            channel,
            controller,
            value,
        });
    }

    fn all_notes_off(&mut self, channel: u8) {
        self.send(SynthCommand::AllNotesOff { channel });
    }

    fn select_program(&mut self, channel: u8, bank: u16, program: u8) {
        self.send(SynthCommand::SelectProgram {
            channel,
            bank,
            program,
        });
    }
}

impl Drop for MidiOutBackend {
    fn drop(&mut self) {
        for channel in 0..16 {
            self.send(SynthCommand::AllNotesOff { channel });
        }
    }
}
