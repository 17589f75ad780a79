//! The DMX side of the bridge: the channel-value store with its gain stage and the
//! static/dynamic scene engine.

mod scene;
pub use scene::*;

mod value;
pub use value::*;

use tinyvec::ArrayVec;

use crate::midi::ContinuousController;

/// Highest intensity a MIDI-driven conversion can produce (`127 * 2`).
pub const DMX_MAX_VALUE: u8 = 0xfe;

/// Number of channel slots addressable by this system, one per MIDI controller number.
pub const DMX_CHANNEL_COUNT: usize = 128;

/// Gain value denoting no attenuation.
pub const GAIN_UNITY: u16 = 1024;

/// Width of the hysteresis band around the last applied gain.
///
/// Gain requests within this band are absorbed without re-emitting channels, suppressing
/// output chatter from a noisy potentiometer.
pub const GAIN_DEAD_ZONE: u16 = 5;

/// Capacity of the lit-channel record: every slot of all three static-scene colors.
const STATIC_LIT_SLOTS: usize = 3 * STATIC_SCENE_SLOTS;

/// Scales an intensity by a gain in `[0, GAIN_UNITY]`.
const fn apply_gain(value: u8, gain: u16) -> u8 {
    ((value as u32 * gain as u32) / GAIN_UNITY as u32) as u8
}

/// The channel-value store of the bridge.
///
/// `Dmx` keeps the last value actually emitted for each of the 128 addressable channels and
/// invokes the change callback exactly when an output value changes (a repeated write of the
/// same value stays silent, as does re-activating the current scene). The first write to a
/// channel always emits, even a zero.
///
/// Two scenes exist in parallel: the dynamic scene mirrors live MIDI input, the static scene
/// shows a preconfigured RGB pattern. Writes arriving while the static scene is active are
/// recorded but reach the output only once the dynamic scene is reactivated. Both scene
/// transitions black out what the previous scene had lit before lighting their own channels.
///
/// No operation here fails: out-of-range input is clamped or discarded per the rules on each
/// method.
pub struct Dmx<F: FnMut(u8, u8)> {
    on_change: F,
    scene: Scene,
    /// Last applied gain; dead-zone comparisons are made against this value only, so
    /// absorbed requests never move the reference point.
    gain: u16,
    /// Raw, pre-gain value of the dynamic scene per channel. `None` until first written.
    dynamic: [Option<u8>; DMX_CHANNEL_COUNT],
    /// Last value emitted through the callback per channel. `None` until first emitted.
    emitted: [Option<u8>; DMX_CHANNEL_COUNT],
    rgb_channels: DmxRgbChannels,
    rgb: DmxRgb,
    /// Channels lit by the static scene with their raw colors, captured in lighting order
    /// when the scene is activated. Empty while the dynamic scene is active.
    static_lit: ArrayVec<[(u8, u8); STATIC_LIT_SLOTS]>,
}

impl<F: FnMut(u8, u8)> Dmx<F> {
    /// Construct a store that reports output changes through `on_change`.
    ///
    /// The dynamic scene is active and the gain is at unity.
    pub fn new(on_change: F) -> Self {
        Self {
            on_change,
            scene: Scene::default(),
            gain: GAIN_UNITY,
            dynamic: [None; DMX_CHANNEL_COUNT],
            emitted: [None; DMX_CHANNEL_COUNT],
            rgb_channels: DmxRgbChannels::new(),
            rgb: DmxRgb::default(),
            static_lit: ArrayVec::default(),
        }
    }

    /// Write a value into the dynamic scene.
    ///
    /// Unset values and channels above 127 are discarded. While the dynamic scene is active
    /// the gain-adjusted value is emitted if it differs from the channel's last output;
    /// while the static scene is active the write is only recorded.
    pub fn set_dmx_value(&mut self, value: DmxValue) {
        let channel = value.channel();
        if !value.is_set() || channel as usize >= DMX_CHANNEL_COUNT {
            return;
        }

        self.dynamic[channel as usize] = Some(value.value());
        if self.scene == Scene::Dynamic {
            let scaled = apply_gain(value.value(), self.gain);
            self.emit(channel, scaled);
        }
    }

    /// Write a raw MIDI controller/value pair into the dynamic scene.
    ///
    /// Convenience composition of [`ContinuousController::to_dmx`] and
    /// [`set_dmx_value`][Self::set_dmx_value].
    pub fn set_midi_cc_value(&mut self, controller: u8, value: u8) {
        self.set_dmx_value(ContinuousController::new(controller, value).to_dmx());
    }

    /// Apply a new gain, clamped to `[0, GAIN_UNITY]`.
    ///
    /// Requests within [`GAIN_DEAD_ZONE`] of the last applied gain are absorbed without any
    /// output change. A request outside the band becomes the new reference and re-emits
    /// every lit channel whose adjusted value changed.
    pub fn set_gain(&mut self, gain: u16) {
        let gain = gain.min(GAIN_UNITY);
        if self.gain.abs_diff(gain) <= GAIN_DEAD_ZONE {
            return;
        }

        self.gain = gain;
        match self.scene {
            Scene::Dynamic => self.emit_dynamic_scene(),
            Scene::Static => self.refresh_static_scene(),
        }
    }

    /// Store the static scene's channel assignment and color triple.
    ///
    /// Takes effect on the next [`activate_static_scene`][Self::activate_static_scene];
    /// never emits by itself.
    pub fn set_static_scene(&mut self, channels: DmxRgbChannels, rgb: DmxRgb) {
        self.rgb_channels = channels;
        self.rgb = rgb;
    }

    /// Switch to the static scene. No-op if it is already active.
    ///
    /// Every currently lit channel is blacked out first, then the configured channels are
    /// lit with the gain-adjusted color intensities in red, green, blue order.
    pub fn activate_static_scene(&mut self) {
        if self.scene == Scene::Static {
            return;
        }

        self.blackout_lit_channels();
        self.scene = Scene::Static;
        self.light_static_scene();
    }

    /// Switch to the dynamic scene. No-op if it is already active.
    ///
    /// The static pattern is extinguished in the order it was lit, then the recorded dynamic
    /// values are re-emitted wherever they differ from what is currently shown.
    pub fn activate_dynamic_scene(&mut self) {
        if self.scene == Scene::Dynamic {
            return;
        }

        let lit = core::mem::take(&mut self.static_lit);
        for (channel, _) in lit {
            self.emit(channel, 0);
        }

        self.scene = Scene::Dynamic;
        self.emit_dynamic_scene();
    }

    /// Emit `value` on `channel` if it differs from the channel's last output.
    fn emit(&mut self, channel: u8, value: u8) {
        if self.emitted[channel as usize] != Some(value) {
            self.emitted[channel as usize] = Some(value);
            (self.on_change)(channel, value);
        }
    }

    /// Emit 0 on every channel whose last output was non-zero.
    fn blackout_lit_channels(&mut self) {
        for channel in 0..DMX_CHANNEL_COUNT as u8 {
            if matches!(self.emitted[channel as usize], Some(value) if value != 0) {
                self.emit(channel, 0);
            }
        }
    }

    /// Emit the gain-adjusted dynamic value of every written channel that is not shown yet.
    fn emit_dynamic_scene(&mut self) {
        for channel in 0..DMX_CHANNEL_COUNT as u8 {
            if let Some(raw) = self.dynamic[channel as usize] {
                let scaled = apply_gain(raw, self.gain);
                self.emit(channel, scaled);
            }
        }
    }

    /// Capture the configured pattern as the lit-channel record, then emit it.
    ///
    /// Blackouts and gain refreshes work from this record, so reconfiguring the scene while
    /// it is shown cannot strand channels lit under the previous assignment.
    fn light_static_scene(&mut self) {
        let channels = self.rgb_channels.clone();
        let DmxRgb { red, green, blue } = self.rgb;
        self.static_lit.clear();
        for (list, color) in [
            (channels.red(), red),
            (channels.green(), green),
            (channels.blue(), blue),
        ] {
            for &channel in list {
                self.static_lit.push((channel, color));
            }
        }
        self.refresh_static_scene();
    }

    /// Re-emit the lit static pattern with the current gain, in the order it was lit.
    fn refresh_static_scene(&mut self) {
        let lit = self.static_lit.clone();
        for (channel, color) in lit {
            self.emit(channel, apply_gain(color, self.gain));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MIDI_MAX_VALUE;
    use core::cell::RefCell;
    use tinyvec::ArrayVec;

    type Log = RefCell<ArrayVec<[(u8, u8); 32]>>;

    fn recording(log: &Log) -> Dmx<impl FnMut(u8, u8) + '_> {
        Dmx::new(move |channel, value| log.borrow_mut().push((channel, value)))
    }

    fn rgb_scene() -> (DmxRgbChannels, DmxRgb) {
        let mut channels = DmxRgbChannels::new();
        channels.push_red(1);
        channels.push_green(2);
        channels.push_blue(3);
        (channels, DmxRgb::new(21, 42, 63))
    }

    #[test]
    fn set_dmx_value_unset_is_ignored() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::default());

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn set_dmx_value_emits_at_unity_gain() {
        for (channel, value) in [(0u8, 0u8), (0, 255), (1, 1), (127, 254)] {
            let log = Log::default();
            let mut dmx = recording(&log);

            dmx.set_dmx_value(DmxValue::new(channel, value));

            assert_eq!(&[(channel, value)], log.borrow().as_slice());
        }
    }

    #[test]
    fn set_dmx_value_discards_out_of_range_channels() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::new(128, 42));
        dmx.set_dmx_value(DmxValue::new(255, 42));

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn repeated_writes_do_not_re_emit() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::new(1, 42));
        dmx.set_dmx_value(DmxValue::new(1, 42));

        assert_eq!(&[(1, 42)], log.borrow().as_slice());
    }

    #[test]
    fn set_midi_cc_value_scales_and_clamps() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_midi_cc_value(1, 2);
        dmx.set_midi_cc_value(2, 200);
        dmx.set_midi_cc_value(200, 3);

        assert_eq!(
            &[(1, 4), (2, DMX_MAX_VALUE), (MIDI_MAX_VALUE, 6)],
            log.borrow().as_slice()
        );
    }

    #[test]
    fn gain_scales_subsequent_writes() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_gain(512);
        dmx.set_dmx_value(DmxValue::new(0, 254));

        assert_eq!(&[(0, 127)], log.borrow().as_slice());
    }

    #[test]
    fn gain_change_re_emits_only_changed_channels() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::new(0, 254));
        dmx.set_dmx_value(DmxValue::new(1, 0));
        dmx.set_gain(512);

        // channel 1 stays at 0 under the new gain and must not re-fire
        assert_eq!(&[(0, 254), (1, 0), (0, 127)], log.borrow().as_slice());
    }

    #[test]
    fn gain_clamps_above_unity() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::new(0, 254));
        dmx.set_gain(512);
        dmx.set_gain(32767);

        assert_eq!(
            &[(0, 254), (0, 127), (0, 254)],
            log.borrow().as_slice()
        );
    }

    #[test]
    fn gain_dead_zone_absorbs_small_changes() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::new(0, 254));
        dmx.set_gain(512);
        dmx.set_gain(516);
        dmx.set_gain(507);

        assert_eq!(&[(0, 254), (0, 127)], log.borrow().as_slice());
    }

    #[test]
    fn gain_dead_zone_reference_is_the_last_applied_gain() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::new(0, 254));
        dmx.set_gain(512);
        // absorbed: 4 away from the applied 512
        dmx.set_gain(516);
        // 8 away from the still-standing 512 reference, 4 away from the absorbed 516;
        // the absorbed request must not have moved the reference
        dmx.set_gain(520);

        assert_eq!(
            &[(0, 254), (0, 127), (0, 128)],
            log.borrow().as_slice()
        );
    }

    #[test]
    fn static_scene_activation_blacks_out_then_lights_rgb() {
        let log = Log::default();
        let mut dmx = recording(&log);
        let (channels, rgb) = rgb_scene();

        dmx.set_static_scene(channels, rgb);
        dmx.set_dmx_value(DmxValue::new(4, 10));
        dmx.activate_static_scene();

        assert_eq!(
            &[(4, 10), (4, 0), (1, 21), (2, 42), (3, 63)],
            log.borrow().as_slice()
        );
    }

    #[test]
    fn static_scene_activation_is_idempotent() {
        let log = Log::default();
        let mut dmx = recording(&log);
        let (channels, rgb) = rgb_scene();

        dmx.set_static_scene(channels, rgb);
        dmx.activate_static_scene();
        let emitted = log.borrow().len();
        dmx.activate_static_scene();

        assert_eq!(emitted, log.borrow().len());
    }

    #[test]
    fn dynamic_scene_activation_is_idempotent() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.activate_dynamic_scene();

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn static_scene_suppresses_dynamic_writes() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.activate_static_scene();
        dmx.set_dmx_value(DmxValue::new(1, 42));

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn dynamic_scene_restores_writes_held_back_by_the_static_scene() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.activate_static_scene();
        dmx.set_dmx_value(DmxValue::new(1, 42));
        dmx.activate_dynamic_scene();

        assert_eq!(&[(1, 42)], log.borrow().as_slice());
    }

    #[test]
    fn dynamic_scene_activation_extinguishes_the_static_pattern_in_rgb_order() {
        let log = Log::default();
        let mut dmx = recording(&log);
        let (channels, rgb) = rgb_scene();

        dmx.set_static_scene(channels, rgb);
        dmx.activate_static_scene();
        dmx.set_dmx_value(DmxValue::new(1, 42));
        dmx.activate_dynamic_scene();

        assert_eq!(
            &[
                (1, 21),
                (2, 42),
                (3, 63),
                (1, 0),
                (2, 0),
                (3, 0),
                (1, 42)
            ],
            log.borrow().as_slice()
        );
    }

    #[test]
    fn reconfiguring_while_static_still_extinguishes_the_lit_channels() {
        let log = Log::default();
        let mut dmx = recording(&log);
        let (channels, rgb) = rgb_scene();

        dmx.set_static_scene(channels, rgb);
        dmx.activate_static_scene();

        let mut other = DmxRgbChannels::new();
        other.push_red(10);
        other.push_green(11);
        other.push_blue(12);
        dmx.set_static_scene(other, DmxRgb::new(1, 2, 3));
        dmx.activate_dynamic_scene();

        // the channels actually lit go dark; the pending assignment emits nothing
        assert_eq!(
            &[(1, 21), (2, 42), (3, 63), (1, 0), (2, 0), (3, 0)],
            log.borrow().as_slice()
        );
    }

    #[test]
    fn gain_change_while_static_refreshes_the_lit_pattern() {
        let log = Log::default();
        let mut dmx = recording(&log);
        let (channels, rgb) = rgb_scene();

        dmx.set_static_scene(channels, rgb);
        dmx.activate_static_scene();

        let mut other = DmxRgbChannels::new();
        other.push_red(10);
        dmx.set_static_scene(other, DmxRgb::new(1, 2, 3));
        dmx.set_gain(512);

        assert_eq!(
            &[(1, 21), (2, 42), (3, 63), (1, 10), (2, 21), (3, 31)],
            log.borrow().as_slice()
        );
    }

    #[test]
    fn scene_roundtrip_restores_the_dynamic_value() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::new(1, 42));
        dmx.activate_static_scene();
        dmx.activate_dynamic_scene();

        assert_eq!(&[(1, 42), (1, 0), (1, 42)], log.borrow().as_slice());
    }

    #[test]
    fn blackout_skips_channels_already_dark() {
        let log = Log::default();
        let mut dmx = recording(&log);

        dmx.set_dmx_value(DmxValue::new(1, 0));
        dmx.activate_static_scene();

        assert_eq!(&[(1, 0)], log.borrow().as_slice());
    }
}
