pub const CHANNEL_COUNT: usize = 16;

/// Maps a caller-supplied channel number onto a timeline slot. Anything
/// outside 0..16 has no slot and control operations ignore it.
pub fn channel_index(channel: u8) -> Option<usize> {
    let index = usize::from(channel);
    (index < CHANNEL_COUNT).then_some(index)
}

/// A set of MIDI channels packed into one word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChannelSet(u16);

impl ChannelSet {
    pub const EMPTY: ChannelSet = ChannelSet(0);

    pub fn with(self, channel: u8) -> Self {
        match channel_index(channel) {
            Some(index) => Self(self.0 | 1 << index),
            None => self,
        }
    }

    pub fn without(self, channel: u8) -> Self {
        match channel_index(channel) {
            Some(index) => Self(self.0 & !(1 << index)),
            None => self,
        }
    }

    pub fn contains(self, channel: u8) -> bool {
        channel_index(channel).is_some_and(|index| self.0 & (1 << index) != 0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Filter semantics: an empty set lets every channel through.
    pub fn admits(self, channel: u8) -> bool {
        self.is_empty() || self.contains(channel)
    }

    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..CHANNEL_COUNT as u8).filter(move |&channel| self.contains(channel))
    }
}

impl FromIterator<u8> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        iter.into_iter().fold(ChannelSet::EMPTY, ChannelSet::with)
    }
}
