//! Carries MIDI events from the control loop to the USB endpoint.
//!
//! The control loop never waits on USB: events are encoded into USB-MIDI Event Packets and queued, and a separate task
//! drains the queue into the endpoint. If the host isn't reading, the queue fills and further events are dropped.

use crate::UsbDriver;
use defmt::{info, panic, warn};
use embassy_stm32::usb;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_usb::{class::midi::MidiClass, driver::EndpointError};
use sackbut_lib::{
    sink::MidiSink,
    usb_midi::{self, PACKET_LEN, Transfer},
};
use wmidi::MidiMessage;

/// Enough room for a full all-notes-off sweep plus a tick's worth of ordinary traffic.
const OUTBOX_CAPACITY: usize = 256;

/// The instrument has a single output jack.
const CABLE: u8 = 0;

/// Packets waiting to be written to the USB endpoint.
static OUTBOX: Channel<CriticalSectionRawMutex, [u8; PACKET_LEN], OUTBOX_CAPACITY> = Channel::new();

/// A [`MidiSink`] which queues events for the [`midi_out`] task.
#[cfg_attr(feature = "midi-log", allow(dead_code))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UsbMidiSink;

impl MidiSink for UsbMidiSink {
    fn send(&mut self, message: MidiMessage<'static>) {
        let Some(packet) = usb_midi::encode(CABLE, &message) else {
            warn!("Only channel voice messages can be sent; dropping message");
            return;
        };
        if OUTBOX.try_send(packet).is_err() {
            warn!("Outbound MIDI queue is full; dropping packet {:x}", packet);
        }
    }
}

/// Task responsible for writing queued packets to the host.
#[embassy_executor::task]
pub async fn midi_out(mut class: MidiClass<'static, UsbDriver>) -> ! {
    loop {
        class.wait_connection().await;
        info!("USB connected");
        // whatever piled up while unplugged is out of context now
        while OUTBOX.try_receive().is_ok() {}
        let _ = forward(&mut class).await;
        info!("USB disconnected");
    }
}

#[doc(hidden)]
struct Disconnected {}

impl From<EndpointError> for Disconnected {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => panic!("Buffer overflow"),
            EndpointError::Disabled => Disconnected {},
        }
    }
}

/// Helper function which batches as many queued packets as fit into one bulk transfer and writes them.
async fn forward<'d, T: usb::Instance + 'd>(
    class: &mut MidiClass<'d, usb::Driver<'d, T>>,
) -> Result<(), Disconnected> {
    let mut transfer = Transfer::new();
    loop {
        transfer.clear();
        transfer.push(OUTBOX.receive().await);
        while !transfer.is_full() {
            match OUTBOX.try_receive() {
                Ok(packet) => {
                    transfer.push(packet);
                }
                Err(_) => break,
            }
        }
        class.write_packet(transfer.as_slice()).await?;
    }
}
