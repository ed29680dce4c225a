//! The panic button: a blunt, state-independent way out of a stuck note.
//!
//! Receivers occasionally miss a NoteOff (a cable gets yanked, a host drops a packet). Rather than trust the arbiter's
//! idea of what's sounding, the sweep releases every note on the channel. It deliberately leaves
//! [`InstrumentState`][crate::arbiter::InstrumentState] alone; the next tick without breath resets it naturally.

use crate::sink::MidiSink;
use wmidi::{Channel, Note, U7};

/// Number of MIDI note numbers.
pub const NOTE_CNT: u8 = 128;

/// Sends a NoteOff for every note number, lowest first.
pub fn all_notes_off<S: MidiSink>(channel: Channel, sink: &mut S) {
    #[cfg(feature = "defmt")]
    defmt::warn!(
        "Panic: releasing all {} notes on channel {}",
        NOTE_CNT,
        channel.number()
    );

    (0..NOTE_CNT)
        .map(|number| Note::from(U7::from_u8_lossy(number)))
        .for_each(|note| sink.note_off(channel, note, U7::from_u8_lossy(0)));
}
