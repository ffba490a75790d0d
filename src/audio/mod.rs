mod backend;
mod midi_out;
mod preset;

pub use backend::{NullBackend, RecordingBackend, SynthBackend};
pub use midi_out::MidiOutBackend;
pub use preset::{DEFAULT_PAN, SoundPreset, apply_presets};
