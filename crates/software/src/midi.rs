//! MIDI input handling: the non-blocking byte-source contract, the Control Change frame
//! parser, and the conversion of parsed frames into DMX values.

mod continuous_controller;
pub use continuous_controller::*;

mod reader;
pub use reader::*;

/// Upper bound of the 7-bit MIDI domain shared by controller numbers and values.
pub const MIDI_MAX_VALUE: u8 = 0x7f;

/// A non-blocking source of raw MIDI bytes, typically a UART receive line.
///
/// `read` must never stall the caller: reporting that no byte is available is a valid and
/// frequent result, not an error. The core polls this source once per host-loop tick.
pub trait SerialReader {
    /// Open the underlying transport. Called once by [`MidiDmxBridge::begin`][crate::bridge::MidiDmxBridge::begin].
    fn begin(&mut self);

    /// Take the next byte from the source, or `None` if nothing is pending.
    fn read(&mut self) -> Option<u8>;
}
