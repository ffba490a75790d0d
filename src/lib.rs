pub mod audio;
pub mod channels;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod timing;
pub mod ui;

pub use audio::{MidiOutBackend, NullBackend, RecordingBackend, SoundPreset, SynthBackend};
pub use channels::{CHANNEL_COUNT, ChannelSet};
pub use config::PlayerConfig;
pub use engine::{Player, PlayerStatus, SongInfo};
pub use error::{BackendError, ConfigError, LoadError, PlayerError};
pub use events::{Lookahead, NoteCallbackEvent, SynthCommand};
pub use timing::{CueEvent, NoteEvent, PitchBendEvent, Song, TransportState};
