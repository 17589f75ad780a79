//! Provides [`MidiReader`], a byte-stream state machine recognizing 3-byte MIDI Control
//! Change frames on a single configured channel.

use wmidi::Channel;

use crate::midi::{ContinuousController, SerialReader};

/// High nibble marking a status byte as a Control Change message.
const CONTROL_CHANGE_MARKER: u8 = 0xb0;

/// Parser position within the 3-byte Control Change frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum State {
    /// Scanning for the status byte of the configured channel.
    WaitingForStatus,
    /// Status byte accepted; the next byte is the controller number.
    WaitingForController,
    /// Controller number captured; the next byte completes the frame.
    WaitingForValue { controller: u8 },
}

/// A resynchronizing reader for MIDI Control Change frames.
///
/// A valid frame is exactly three bytes: a status byte whose high nibble is the Control
/// Change marker `0xB` and whose low nibble is the MIDI channel, then a controller number,
/// then a value. While waiting for a status byte, anything that is not the configured
/// channel's status byte is consumed and discarded; stray data bytes and frames addressed
/// to other channels are scanned past without stalling.
///
/// Parser state survives an exhausted byte source: a frame whose tail has not arrived yet is
/// resumed on the next poll rather than dropped.
pub struct MidiReader {
    /// The exact status byte that opens a frame for the configured channel.
    status: u8,
    state: State,
}

impl MidiReader {
    /// Construct a reader listening for Control Change frames on the given MIDI channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            status: CONTROL_CHANGE_MARKER | channel.index(),
            state: State::WaitingForStatus,
        }
    }

    /// Drive the state machine with bytes from `serial` until a frame completes or the
    /// source runs dry.
    ///
    /// Returns the parsed controller/value pair of the first completed frame, leaving any
    /// remaining bytes in the source for the next poll. Returns `None` without blocking when
    /// no frame can be completed this tick.
    pub fn poll<S: SerialReader>(&mut self, serial: &mut S) -> Option<ContinuousController> {
        while let Some(byte) = serial.read() {
            match self.state {
                State::WaitingForStatus => {
                    if byte == self.status {
                        self.state = State::WaitingForController;
                    }
                }
                State::WaitingForController => {
                    self.state = State::WaitingForValue { controller: byte };
                }
                State::WaitingForValue { controller } => {
                    self.state = State::WaitingForStatus;
                    return Some(ContinuousController::new(controller, byte));
                }
            }
        }
        None
    }
}
