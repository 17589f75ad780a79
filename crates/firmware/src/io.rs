//! Board I/O shims: the queued MIDI byte source feeding the core and the DMX-512 frame
//! transmitter consuming its change callbacks.
//!
//! The core is strictly polled and single-threaded, so the asynchronous UART receive path is
//! decoupled from it by a bounded byte queue: the receive task drains the ring-buffered UART
//! into the queue, and the bridge task takes bytes out one poll at a time.

use core::cell::RefCell;

use defmt::*;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::{RingBufferedUartRx, UartTx};
use embassy_sync::{
    blocking_mutex::{Mutex, raw::CriticalSectionRawMutex},
    channel::{Channel, Receiver, Sender},
};
use embassy_time::Timer;
use midi_dmx_bridge_lib::midi::SerialReader;

/// Capacity of the MIDI byte queue. Bytes arriving while it is full are dropped; the
/// reader's resynchronization recovers from the torn frame.
pub const MIDI_BYTE_QUEUE_DEPTH: usize = 64;

/// Queue carrying raw MIDI bytes from the UART task to the bridge task.
pub type MidiByteQueue = Channel<CriticalSectionRawMutex, u8, MIDI_BYTE_QUEUE_DEPTH>;
type MidiByteSender = Sender<'static, CriticalSectionRawMutex, u8, MIDI_BYTE_QUEUE_DEPTH>;
type MidiByteReceiver = Receiver<'static, CriticalSectionRawMutex, u8, MIDI_BYTE_QUEUE_DEPTH>;

/// Buffers MIDI input between UART interrupts and bridge polls.
pub static MIDI_BYTES: MidiByteQueue = Channel::new();

/// One DMX-512 frame: the start code followed by 512 channel slots.
const DMX_FRAME_SIZE: usize = 513;

/// The frame continuously transmitted on the DMX line. Slot 0 is the start code and stays 0.
static DMX_FRAME: Mutex<CriticalSectionRawMutex, RefCell<[u8; DMX_FRAME_SIZE]>> =
    Mutex::new(RefCell::new([0; DMX_FRAME_SIZE]));

/// Interval between DMX frame refreshes.
const DMX_REFRESH_MS: u64 = 25;

/// The core's change callback: stage one channel value into the outgoing frame.
///
/// DMX slots are 1-based on the wire, so channel `n` lands in slot `n + 1`.
pub fn stage_dmx_value(channel: u8, value: u8) {
    trace!("Staging DMX channel {} = {}", channel, value);
    DMX_FRAME.lock(|frame| frame.borrow_mut()[usize::from(channel) + 1] = value);
}

/// The non-blocking byte source handed to the bridge, backed by [`MIDI_BYTES`].
pub struct QueuedSerialReader {
    receiver: MidiByteReceiver,
}

impl QueuedSerialReader {
    /// Construct a reader draining the given queue endpoint.
    pub fn new(receiver: MidiByteReceiver) -> Self {
        Self { receiver }
    }
}

impl SerialReader for QueuedSerialReader {
    fn begin(&mut self) {
        // the UART is opened during board init; nothing left to do here
    }

    fn read(&mut self) -> Option<u8> {
        self.receiver.try_receive().ok()
    }
}

/// Task draining the MIDI UART into the byte queue.
#[embassy_executor::task]
pub async fn midi_rx_task(mut rx: RingBufferedUartRx<'static>, bytes: MidiByteSender) -> ! {
    let mut buf = [0u8; 16];
    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                for &byte in &buf[..n] {
                    if bytes.try_send(byte).is_err() {
                        warn!("MIDI byte queue full, dropping byte {}", byte);
                    }
                }
            }
            Err(e) => {
                warn!("MIDI UART receive error: {}", e);
            }
        }
    }
}

/// Task refreshing the DMX line from the staged frame.
///
/// DMX-512 expects a break followed by the full frame, repeated continuously; receivers hold
/// their last value between frames, so staging and transmission need no handshake.
#[embassy_executor::task]
pub async fn dmx_tx_task(mut tx: UartTx<'static, Async>) -> ! {
    loop {
        let frame = DMX_FRAME.lock(|frame| *frame.borrow());
        tx.send_break();
        if let Err(e) = tx.write(&frame).await {
            warn!("DMX UART transmit error: {}", e);
        }
        Timer::after_millis(DMX_REFRESH_MS).await;
    }
}
