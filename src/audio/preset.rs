use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SynthBackend;
use crate::channels::CHANNEL_COUNT;
use crate::error::PlayerError;
use crate::events::cc;

/// Bank and program a channel plays with. Bank 128 is the General MIDI
/// percussion bank on most soundfonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundPreset {
    pub bank: u16,
    pub program: u8,
}

/// Spreads the channels across the stereo field, drums centred.
pub const DEFAULT_PAN: [u8; CHANNEL_COUNT] = [
    64, 54, 74, 44, 84, 34, 94, 49, 79, 64, 59, 69, 39, 89, 29, 99,
];

/// Binds one preset to every channel and resets the mix controllers.
pub fn apply_presets(
    backend: &mut dyn SynthBackend,
    presets: &[SoundPreset],
) -> Result<(), PlayerError> {
    if presets.len() != CHANNEL_COUNT {
        return Err(PlayerError::PresetCount(presets.len()));
    }

    for (index, preset) in presets.iter().enumerate() {
        let channel = index as u8;
        backend.select_program(channel, preset.bank, preset.program);
        backend.control_change(channel, cc::PAN, DEFAULT_PAN[index]);
        backend.control_change(channel, cc::VOLUME, 127);
        backend.control_change(channel, cc::EXPRESSION, 127);
        backend.control_change(channel, cc::REVERB, 127);
        backend.control_change(channel, cc::CHORUS, 10);
        backend.all_notes_off(channel);
        debug!(channel, bank = preset.bank, program = preset.program, "bound preset");
    }

    Ok(())
}
