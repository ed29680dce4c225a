//! Wraps MIDI messages in USB-MIDI Event Packets (USB Device Class Definition for MIDI Devices 1.0, section 4).
//!
//! Every packet is 32 bits long: a header byte holding the virtual cable number (high nibble) and the Code Index
//! Number (low nibble), followed by the three bytes of the MIDI event. For channel voice messages the Code Index Number
//! is simply the status nibble.

use tinyvec::ArrayVec;
use wmidi::MidiMessage;

/// Size of a USB-MIDI Event Packet.
pub const PACKET_LEN: usize = 4;

/// Largest payload of a full-speed bulk endpoint.
pub const MAX_TRANSFER_LEN: usize = 64;

/// Returns the USB-MIDI Event Packet carrying `message` on the given virtual cable.
///
/// Only three-byte channel voice messages (note on/off, control change, pitch bend, etc.) are supported; anything else
/// returns `None`.
pub fn encode(cable: u8, message: &MidiMessage) -> Option<[u8; PACKET_LEN]> {
    if message.bytes_size() != 3 {
        return None;
    }

    let mut packet = [0_u8; PACKET_LEN];
    message.copy_to_slice(&mut packet[1..]).ok()?;

    let status = packet[1];
    // system messages (0xF_) use a different Code Index Number scheme
    if !(0x80..0xF0).contains(&status) {
        return None;
    }
    packet[0] = (cable & 0x0F) << 4 | status >> 4;
    Some(packet)
}

/// Accumulates packets into a single bulk transfer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transfer {
    data: ArrayVec<[u8; MAX_TRANSFER_LEN]>,
}

impl Transfer {
    /// Constructs an empty [`Transfer`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a packet. Returns `false`, leaving the transfer untouched, when there is no room left.
    pub fn push(&mut self, packet: [u8; PACKET_LEN]) -> bool {
        if self.is_full() {
            return false;
        }
        self.data.extend_from_slice(&packet);
        true
    }

    /// Determine if another packet would fit.
    pub fn is_full(&self) -> bool {
        self.data.capacity() - self.data.len() < PACKET_LEN
    }

    /// Determine if any packets have been added.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes to hand to the endpoint.
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Empties the transfer for reuse.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wmidi::{Channel, ControlFunction, Note, U7, U14};

    #[test]
    fn note_on() {
        let message = MidiMessage::NoteOn(Channel::Ch1, Note::F3, U7::from_u8_lossy(127));
        assert_eq!(
            Some([0x09, 0x90, 53, 127]),
            encode(0, &message),
            "Expected left but got right"
        );
    }

    #[test]
    fn note_off_on_another_cable_and_channel() {
        let message = MidiMessage::NoteOff(Channel::Ch3, Note::C4, U7::from_u8_lossy(0));
        assert_eq!(Some([0x18, 0x82, 60, 0]), encode(1, &message));
    }

    #[test]
    fn control_change() {
        let message = MidiMessage::ControlChange(
            Channel::Ch1,
            ControlFunction::BREATH_CONTROLLER,
            U7::from_u8_lossy(99),
        );
        assert_eq!(Some([0x0B, 0xB0, 2, 99]), encode(0, &message));
    }

    #[test]
    fn pitch_bend_is_lsb_first() {
        let message = MidiMessage::PitchBendChange(Channel::Ch1, U14::try_from(8191_u16).unwrap());
        assert_eq!(Some([0x0E, 0xE0, 0x7F, 0x3F]), encode(0, &message));
    }

    #[test]
    fn unsupported_messages() {
        assert_eq!(None, encode(0, &MidiMessage::TimingClock));
        assert_eq!(
            None,
            encode(
                0,
                &MidiMessage::ProgramChange(Channel::Ch1, U7::from_u8_lossy(5))
            ),
            "Two-byte messages aren't supported"
        );
    }

    #[test]
    fn transfer_holds_sixteen_packets() {
        let mut transfer = Transfer::new();
        assert!(transfer.is_empty());
        for _ in 0..16 {
            assert!(transfer.push([0x09, 0x90, 60, 127]));
        }
        assert!(transfer.is_full());
        assert!(
            !transfer.push([0x08, 0x80, 60, 0]),
            "Should refuse a 17th packet"
        );
        assert_eq!(MAX_TRANSFER_LEN, transfer.as_slice().len());

        transfer.clear();
        assert!(transfer.is_empty());
    }
}
