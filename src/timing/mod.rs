mod builder;
mod cue;
mod scheduler;
mod song;
mod transport;

pub use builder::{DEFAULT_TEMPO, build_song, load_song};
pub use cue::{CueEvent, CueQueue, DEFAULT_CUE_VELOCITY};
pub use scheduler::{recenter_bends, schedule_channels, silence, wrap_if_finished};
pub use song::{BEND_CENTER, ChannelTimeline, ControlChange, NoteEvent, PitchBendEvent, Song};
pub use transport::TransportState;
