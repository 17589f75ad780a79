//! Provides [`DmxValue`], the channel/intensity pair that travels from the MIDI conversion
//! stage into the channel store.

/// A single DMX channel assignment: a channel index plus an 8-bit intensity.
///
/// A default-constructed `DmxValue` is *unset* and is ignored by the channel store; any
/// explicitly constructed pair (including `(0, 0)`) counts as set. Equality considers only
/// channel and value, never the set flag.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmxValue {
    channel: u8,
    value: u8,
    set: bool,
}

impl DmxValue {
    /// Construct a set `DmxValue` from a channel index and an intensity.
    pub const fn new(channel: u8, value: u8) -> Self {
        Self {
            channel,
            value,
            set: true,
        }
    }

    /// Returns the DMX channel index.
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Returns the 8-bit intensity.
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Returns `true` if this value was explicitly constructed rather than defaulted.
    pub const fn is_set(&self) -> bool {
        self.set
    }
}

impl PartialEq for DmxValue {
    fn eq(&self, other: &Self) -> bool {
        self.channel == other.channel && self.value == other.value
    }
}

impl Eq for DmxValue {}
