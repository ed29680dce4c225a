//! Decodes the chorded overtone switches into a note.
//!
//! Like the lips of a brass player, the four overtone switches select which partial of the harmonic series sounds
//! over the current slide position. The chords follow a Gray code: stepping to a neighboring overtone only ever
//! changes one switch, so a performer rolling a finger between adjacent partials can't land on a third, unrelated
//! note halfway through.

use wmidi::{Note, U7};

/// Number of entries in [`OVERTONES`].
pub const OVERTONE_CNT: usize = 10;

/// The switch chord that selects an overtone.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Chord {
    /// Selected by this 4-bit pattern (switch 3 is the most significant bit, a set bit is a pressed switch).
    Pattern(u8),
    /// Part of the harmonic series but deliberately left off the switches.
    Unselectable,
}

/// One partial of the instrument's harmonic series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overtone {
    /// How the performer reaches it.
    pub chord: Chord,
    note: U7,
}

impl Overtone {
    const fn new(chord: Chord, note: u8) -> Self {
        Self {
            chord,
            note: U7::from_u8_lossy(note),
        }
    }

    /// The [`Note`] this overtone sounds in first position.
    pub fn note(&self) -> Note {
        Note::from(self.note)
    }
}

/// The harmonic series of a B♭ tenor trombone, fundamental first.
///
/// The pedal tone is out of reach of the switches (the instrument has no pedal register) and so is the seventh
/// partial, which sits too flat to be useful.
pub const OVERTONES: [Overtone; OVERTONE_CNT] = [
    Overtone::new(Chord::Unselectable, 34),    // B♭1, pedal
    Overtone::new(Chord::Pattern(0b0001), 46), // B♭2
    Overtone::new(Chord::Pattern(0b0011), 53), // F3
    Overtone::new(Chord::Pattern(0b0010), 58), // B♭3
    Overtone::new(Chord::Pattern(0b0110), 62), // D4
    Overtone::new(Chord::Pattern(0b0100), 65), // F4
    Overtone::new(Chord::Unselectable, 68),    // A♭4
    Overtone::new(Chord::Pattern(0b1100), 70), // B♭4
    Overtone::new(Chord::Pattern(0b1000), 72), // C5
    Overtone::new(Chord::Pattern(0b1001), 74), // D5
];

/// [`OVERTONES`] indexed by switch pattern instead of by partial.
const BY_PATTERN: [Option<u8>; 16] = invert(&OVERTONES);

const fn invert(overtones: &[Overtone; OVERTONE_CNT]) -> [Option<u8>; 16] {
    let mut by_pattern = [None; 16];
    let mut i = 0;
    while i < OVERTONE_CNT {
        if let Chord::Pattern(pattern) = overtones[i].chord {
            by_pattern[(pattern & 0b1111) as usize] = Some(i as u8);
        }
        i += 1;
    }
    by_pattern
}

/// Packs the raw levels of the four overtone switches into a pattern.
///
/// The switches pull their pins low when pressed, so a low level sets the corresponding bit. `levels[3]` becomes the
/// most significant bit.
pub fn pack(levels: [bool; 4]) -> u8 {
    levels
        .iter()
        .enumerate()
        .filter(|&(_, &level)| !level)
        .fold(0_u8, |pattern, (switch, _)| pattern | 1 << switch)
}

/// Returns the index into [`OVERTONES`] selected by a switch pattern, or `None` when no chord matches.
pub fn lookup(pattern: u8) -> Option<usize> {
    BY_PATTERN
        .get(usize::from(pattern))
        .copied()
        .flatten()
        .map(usize::from)
}

/// Reads the overtone switches and returns the selected [`Note`], if the chord is a valid one.
///
/// Callers should keep sounding whatever was already sounding when this returns `None`: switches pass through invalid
/// chords on their way between valid ones, and those transients must not be heard.
pub fn decode(levels: [bool; 4]) -> Option<Note> {
    lookup(pack(levels)).map(|index| OVERTONES[index].note())
}
