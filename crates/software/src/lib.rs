//! This crate contains the architecture-agnostic core of the MIDI-DMX bridge, a device which
//! translates live [MIDI Continuous Controller](https://midi.org/midi-1-0) messages into
//! [DMX-512](https://en.wikipedia.org/wiki/DMX512) lighting-channel values.
//!
//! The core is strictly single-threaded and polled: a host loop feeds it bytes from a
//! non-blocking serial source, and the core answers with synchronous change callbacks, one per
//! channel whose output value actually changed. All input is absorbed by clamping or silent
//! discard; no operation in this crate fails.

#![deny(missing_docs)]
#![no_std]

pub mod bridge;
pub mod configuration;
pub mod dmx;
pub mod midi;
