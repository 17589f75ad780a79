//! Scene selection and the preconfigured static-scene types.

use num_derive::{FromPrimitive, ToPrimitive};
use tinyvec::ArrayVec;

use crate::configuration::CycleConfig;
use crate::midi::MIDI_MAX_VALUE;

/// Default number of DMX channels each color of the static scene can drive.
pub const STATIC_SCENE_SLOTS: usize = 8;

/// Selects which of the two scenes drives the output.
///
/// Exactly one scene is active at a time. [`Dynamic`][Scene::Dynamic] follows live MIDI
/// input; [`Static`][Scene::Static] shows the preconfigured RGB pattern and holds dynamic
/// writes back until the dynamic scene is reactivated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ToPrimitive, FromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scene {
    /// Live, MIDI-CC-driven channel output. The initial scene.
    #[default]
    Dynamic,
    /// Fixed, preconfigured RGB output overriding live input.
    Static,
}

impl CycleConfig for Scene {}

/// The color triple shown by the static scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmxRgb {
    /// Intensity sent to every red-assigned channel.
    pub red: u8,
    /// Intensity sent to every green-assigned channel.
    pub green: u8,
    /// Intensity sent to every blue-assigned channel.
    pub blue: u8,
}

impl DmxRgb {
    /// Construct a color triple.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// The DMX channels the static scene assigns to each color, in lighting order.
///
/// Each color owns a bounded list of channel indices; assignments beyond the capacity `N`
/// are ignored rather than grown onto a heap. Channels outside the addressable range
/// `[0, 127]` and duplicates within one color are likewise ignored.
#[derive(Clone, Debug)]
pub struct DmxRgbChannels<const N: usize = STATIC_SCENE_SLOTS> {
    red: ArrayVec<[u8; N]>,
    green: ArrayVec<[u8; N]>,
    blue: ArrayVec<[u8; N]>,
}

impl Default for DmxRgbChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DmxRgbChannels<N> {
    /// Construct an assignment with no channels on any color.
    pub fn new() -> Self {
        Self {
            red: ArrayVec::default(),
            green: ArrayVec::default(),
            blue: ArrayVec::default(),
        }
    }

    /// Assign a DMX channel to the red component.
    pub fn push_red(&mut self, channel: u8) {
        Self::push(&mut self.red, channel);
    }

    /// Assign a DMX channel to the green component.
    pub fn push_green(&mut self, channel: u8) {
        Self::push(&mut self.green, channel);
    }

    /// Assign a DMX channel to the blue component.
    pub fn push_blue(&mut self, channel: u8) {
        Self::push(&mut self.blue, channel);
    }

    /// The channels lit with the red intensity, in assignment order.
    pub fn red(&self) -> &[u8] {
        &self.red
    }

    /// The channels lit with the green intensity, in assignment order.
    pub fn green(&self) -> &[u8] {
        &self.green
    }

    /// The channels lit with the blue intensity, in assignment order.
    pub fn blue(&self) -> &[u8] {
        &self.blue
    }

    fn push(list: &mut ArrayVec<[u8; N]>, channel: u8) {
        // only add addressable channels, and only while space allows; otherwise ignore input
        if channel <= MIDI_MAX_VALUE && list.len() != list.capacity() && !list.contains(&channel)
        {
            list.push(channel);
        }
    }
}
