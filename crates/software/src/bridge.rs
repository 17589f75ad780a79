//! Provides [`MidiDmxBridge`], the polled orchestrator tying the MIDI reader to the DMX
//! channel store.

use wmidi::Channel;

use crate::dmx::{Dmx, DmxRgb, DmxRgbChannels, GAIN_UNITY};
use crate::midi::{MidiReader, SerialReader};

/// The one-instance core of the device: byte source in, change callbacks out.
///
/// The host loop owns a single `MidiDmxBridge` and drives it cooperatively: one
/// [`listen`][Self::listen] per tick, plus the attenuation and scene entry points whenever
/// its sensors report something new. All callback invocations happen synchronously inside
/// these calls; the host must not re-enter the bridge from within the callback.
pub struct MidiDmxBridge<S: SerialReader, F: FnMut(u8, u8)> {
    serial: S,
    reader: MidiReader,
    dmx: Dmx<F>,
}

impl<S: SerialReader, F: FnMut(u8, u8)> MidiDmxBridge<S, F> {
    /// Construct a bridge listening on the given MIDI channel.
    ///
    /// `on_change` receives every effective output change; `serial` supplies the raw MIDI
    /// bytes and is opened by [`begin`][Self::begin].
    pub fn new(channel: Channel, on_change: F, serial: S) -> Self {
        Self {
            serial,
            reader: MidiReader::new(channel),
            dmx: Dmx::new(on_change),
        }
    }

    /// Open the underlying byte source. Call once before the first poll.
    pub fn begin(&mut self) {
        self.serial.begin();
    }

    /// Poll the byte source for the next Control Change frame and feed it into the store.
    ///
    /// At most one frame is processed per call; a dry source or a partial frame leaves the
    /// store untouched.
    pub fn listen(&mut self) {
        if let Some(cc) = self.reader.poll(&mut self.serial) {
            self.dmx.set_midi_cc_value(cc.controller(), cc.value());
        }
    }

    /// Map a raw 8-bit sensor reading linearly onto the gain domain and apply it.
    ///
    /// 0 blacks the output out; 255 means unity gain. The store's dead zone decides whether
    /// the change is worth re-emitting.
    pub fn set_attenuation(&mut self, attenuation: u8) {
        let gain = u32::from(attenuation) * u32::from(GAIN_UNITY) / u32::from(u8::MAX);
        self.dmx.set_gain(gain as u16);
    }

    /// Store the static scene's channel assignment and color triple.
    pub fn set_static_scene(&mut self, channels: DmxRgbChannels, rgb: DmxRgb) {
        self.dmx.set_static_scene(channels, rgb);
    }

    /// Activate the preconfigured static scene.
    pub fn switch_to_static_scene(&mut self) {
        self.dmx.activate_static_scene();
    }

    /// Return to the live, MIDI-driven scene.
    pub fn switch_to_dynamic_scene(&mut self) {
        self.dmx.activate_dynamic_scene();
    }
}
