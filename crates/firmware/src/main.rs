//! Embassy-based firmware for the MIDI-DMX bridge, a device which converts live MIDI
//! Continuous Controller messages arriving on a serial MIDI input into DMX-512 lighting
//! channels. The firmware targets the [Nucleo-F767ZI development
//! board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html).
//!
//! All conversion logic lives in the architecture-agnostic `midi_dmx_bridge_lib` crate; this
//! crate only wires it to the board: a 31250-baud UART for MIDI input, a 250-kbaud UART for
//! the DMX line, a pushbutton cycling the static/dynamic scene, and a potentiometer on the
//! ADC controlling attenuation.

#![no_std]
#![no_main]

mod io;

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::{
    adc::Adc,
    bind_interrupts,
    exti::ExtiInput,
    gpio::Pull,
    peripherals,
    usart::{self, StopBits, UartRx, UartTx},
};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    watch::{Receiver, Sender, Watch},
};
use embassy_time::Timer;
use midi_dmx_bridge_lib::{
    bridge::MidiDmxBridge,
    configuration::CycleConfig,
    dmx::{DmxRgb, DmxRgbChannels, Scene},
};
use static_cell::StaticCell;
use wmidi::Channel;

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        USART3 => usart::InterruptHandler<peripherals::USART3>;
    }
);

/// MIDI channel the bridge listens on.
const MIDI_CHANNEL: Channel = Channel::Ch1;

/// Color shown while the static scene is active: warm amber house light.
const STATIC_SCENE_RGB: DmxRgb = DmxRgb::new(255, 127, 0);

/// DMX channels of the fixture driven by the static scene.
fn static_scene_channels() -> DmxRgbChannels {
    let mut channels = DmxRgbChannels::new();
    channels.push_red(1);
    channels.push_green(2);
    channels.push_blue(3);
    channels
}

const SCENE_RECEIVER_CNT: usize = 1;
type SceneSync = Watch<CriticalSectionRawMutex, Scene, SCENE_RECEIVER_CNT>;
type SceneSender<'a> = Sender<'a, CriticalSectionRawMutex, Scene, SCENE_RECEIVER_CNT>;
type SceneReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, Scene, SCENE_RECEIVER_CNT>;

/// Synchronizes the scene selection between the button task and the bridge task.
static SCENE_SYNC: SceneSync = Watch::new_with(Scene::Dynamic);

const ATTENUATION_RECEIVER_CNT: usize = 1;
type AttenuationSync = Watch<CriticalSectionRawMutex, u8, ATTENUATION_RECEIVER_CNT>;
type AttenuationSender<'a> = Sender<'a, CriticalSectionRawMutex, u8, ATTENUATION_RECEIVER_CNT>;
type AttenuationReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, u8, ATTENUATION_RECEIVER_CNT>;

/// Synchronizes potentiometer readings between the ADC task and the bridge task.
static ATTENUATION_SYNC: AttenuationSync = Watch::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Initializing MIDI-DMX bridge");

    let p = embassy_stm32::init(Default::default());

    // MIDI input arrives at the fixed MIDI baud rate on USART3.
    let mut config = usart::Config::default();
    config.baudrate = 31250;
    let rx = unwrap!(UartRx::new(p.USART3, Irqs, p.PD9, p.DMA1_CH1, config));
    static RX_RING: StaticCell<[u8; 256]> = StaticCell::new();
    let rx = rx.into_ring_buffered(RX_RING.init([0; 256]));
    unwrap!(spawner.spawn(io::midi_rx_task(rx, io::MIDI_BYTES.sender())));

    // The DMX line leaves on USART2: 250 kbaud, 8N2, a break before each frame.
    let mut config = usart::Config::default();
    config.baudrate = 250_000;
    config.stop_bits = StopBits::STOP2;
    let tx = unwrap!(UartTx::new(p.USART2, p.PD5, p.DMA1_CH6, config));
    unwrap!(spawner.spawn(io::dmx_tx_task(tx)));

    let button = ExtiInput::new(p.PC13, p.EXTI13, Pull::None);
    unwrap!(spawner.spawn(scene_input_task(button, SCENE_SYNC.sender())));

    let adc = Adc::new(p.ADC1);
    unwrap!(spawner.spawn(attenuation_input_task(
        adc,
        p.PA3,
        ATTENUATION_SYNC.sender()
    )));

    let serial = io::QueuedSerialReader::new(io::MIDI_BYTES.receiver());
    let scenes = unwrap!(SCENE_SYNC.receiver());
    let levels = unwrap!(ATTENUATION_SYNC.receiver());
    unwrap!(spawner.spawn(bridge_task(serial, scenes, levels)));
}

/// Handles button presses, cycling through the [`Scene`] selections.
#[embassy_executor::task]
async fn scene_input_task(mut button: ExtiInput<'static>, scenes: SceneSender<'static>) -> ! {
    loop {
        button.wait_for_rising_edge().await;

        let new_scene = scenes
            .try_get()
            .expect("Scene state should never be uninitialized")
            .cycle();
        info!("Scene button pressed, selecting {}", new_scene);
        scenes.send(new_scene);
    }
}

/// Polls the attenuation potentiometer and publishes changed readings.
///
/// The 12-bit conversion is degraded to the 8-bit attenuation domain before publishing; the
/// core's gain dead zone absorbs the residual jitter.
#[embassy_executor::task]
async fn attenuation_input_task(
    mut adc: Adc<'static, peripherals::ADC1>,
    mut pot: peripherals::PA3,
    levels: AttenuationSender<'static>,
) -> ! {
    let mut last: Option<u8> = None;
    loop {
        let raw = (adc.blocking_read(&mut pot) >> 4) as u8;
        if last != Some(raw) {
            last = Some(raw);
            levels.send(raw);
        }
        Timer::after_millis(50).await;
    }
}

/// The single task owning the conversion core, polling it cooperatively.
///
/// The core expects exactly one thread of control: MIDI bytes, scene switches and
/// attenuation changes are all applied from this loop, and every change callback runs
/// synchronously inside it.
#[embassy_executor::task]
async fn bridge_task(
    serial: io::QueuedSerialReader,
    mut scenes: SceneReceiver<'static>,
    mut levels: AttenuationReceiver<'static>,
) -> ! {
    let mut bridge = MidiDmxBridge::new(MIDI_CHANNEL, io::stage_dmx_value, serial);
    bridge.set_static_scene(static_scene_channels(), STATIC_SCENE_RGB);
    bridge.begin();

    loop {
        bridge.listen();

        if let Some(scene) = scenes.try_changed() {
            match scene {
                Scene::Static => bridge.switch_to_static_scene(),
                Scene::Dynamic => bridge.switch_to_dynamic_scene(),
            }
        }

        if let Some(level) = levels.try_changed() {
            bridge.set_attenuation(level);
        }

        Timer::after_micros(500).await;
    }
}
