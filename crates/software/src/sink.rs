//! The outbound side of the instrument: anything that can accept MIDI events.
//!
//! Emission is fire-and-forget. There is no acknowledgment channel, so a sink that can't deliver an event (e.g., a
//! full USB queue) drops it rather than reporting back.

use wmidi::{Channel, ControlFunction, ControlValue, MidiMessage, Note, PitchBend, Velocity};

/// A destination for the MIDI events produced by the control loop.
pub trait MidiSink {
    /// Accepts a single message.
    fn send(&mut self, message: MidiMessage<'static>);

    /// Sends a NoteOn.
    fn note_on(&mut self, channel: Channel, note: Note, velocity: Velocity) {
        self.send(MidiMessage::NoteOn(channel, note, velocity));
    }

    /// Sends a NoteOff.
    fn note_off(&mut self, channel: Channel, note: Note, velocity: Velocity) {
        self.send(MidiMessage::NoteOff(channel, note, velocity));
    }

    /// Sends a Pitch Bend Change.
    fn pitch_bend(&mut self, channel: Channel, value: PitchBend) {
        self.send(MidiMessage::PitchBendChange(channel, value));
    }

    /// Sends a Control Change.
    fn control_change(&mut self, channel: Channel, function: ControlFunction, value: ControlValue) {
        self.send(MidiMessage::ControlChange(channel, function, value));
    }
}

/// A [`MidiSink`] which writes one human-readable log line per event instead of sending anything.
///
/// Handy at the bench, where reading `Note On: F3 (53)` beats decoding `09 90 35 7f`.
#[cfg(feature = "defmt")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[cfg(feature = "defmt")]
impl MidiSink for LogSink {
    fn send(&mut self, message: MidiMessage<'static>) {
        match message {
            MidiMessage::NoteOn(channel, note, velocity) => defmt::info!(
                "Note On: {} ({}), velocity {}, channel {}",
                note.to_str(),
                u8::from(note),
                u8::from(velocity),
                channel.number()
            ),
            MidiMessage::NoteOff(channel, note, velocity) => defmt::info!(
                "Note Off: {} ({}), velocity {}, channel {}",
                note.to_str(),
                u8::from(note),
                u8::from(velocity),
                channel.number()
            ),
            MidiMessage::PitchBendChange(channel, value) => defmt::info!(
                "Pitch Bend: {}, channel {}",
                u16::from(value),
                channel.number()
            ),
            MidiMessage::ControlChange(channel, function, value) => defmt::info!(
                "Control Change {}: {}, channel {}",
                u8::from(function),
                u8::from(value),
                channel.number()
            ),
            _ => defmt::info!("Unexpected outbound MIDI message"),
        }
    }
}
