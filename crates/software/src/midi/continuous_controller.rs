//! Provides [`ContinuousController`], the parsed form of a MIDI Control Change frame and the
//! numeric mapping from the 7-bit MIDI domain onto the 8-bit DMX domain.

use crate::dmx::{DMX_MAX_VALUE, DmxValue};
use crate::midi::MIDI_MAX_VALUE;

/// A MIDI Continuous Controller message, reduced to its controller number and value.
///
/// The controller number addresses the DMX channel of the same index. Both halves nominally
/// live in the 7-bit MIDI domain `[0, 127]`; out-of-domain inputs are never rejected, they are
/// clamped during [`to_dmx`][Self::to_dmx].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContinuousController {
    controller: u8,
    value: u8,
}

impl ContinuousController {
    /// Construct a `ContinuousController` from a raw controller/value pair.
    pub const fn new(controller: u8, value: u8) -> Self {
        Self { controller, value }
    }

    /// Returns the controller number.
    pub const fn controller(&self) -> u8 {
        self.controller
    }

    /// Returns the controller value.
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Convert this controller message into a [`DmxValue`].
    ///
    /// The controller number becomes the DMX channel, ceiling-clamped to 127. The value is
    /// doubled to widen 7 bits to 8; inputs above 127 collapse to the fixed ceiling 254 (the
    /// top of the doubled MIDI domain) rather than 255.
    pub fn to_dmx(self) -> DmxValue {
        let channel = self.controller.min(MIDI_MAX_VALUE);
        let value = if self.value > MIDI_MAX_VALUE {
            DMX_MAX_VALUE
        } else {
            self.value << 1
        };
        DmxValue::new(channel, value)
    }
}
