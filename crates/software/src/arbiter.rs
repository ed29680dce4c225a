//! The note/event arbiter: the state machine that decides, once per tick, which MIDI events the instrument emits.
//!
//! The instrument is monophonic, so at any moment it is either silent or sounding exactly one note. Note events are
//! never delayed; continuous values (pitch bend and breath) are filtered twice, first by a minimum interval between
//! rounds of steady-state updates and then, value by value, by a minimum change since the last value actually sent.

use crate::{
    configuration::{ChangeThresholds, ExpressionController, InstrumentConfig, SlideMode},
    sink::MidiSink,
    slide::NEUTRAL,
};
use embassy_time::{Duration, Instant};
use wmidi::{Channel, Note, U7, U14};

/// Everything the instrument remembers from one tick to the next.
///
/// A single instance lives for as long as the control loop runs. Only the arbiter and the quantization toggle write
/// to it, and only from within a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstrumentState {
    /// The note presently sounding, if any.
    pub current_note: Option<Note>,
    /// The last pitch bend value sent.
    pub current_pitch_bend: u16,
    /// The last expression value sent.
    pub current_volume: U7,
    /// Whether the slide is quantized.
    pub slide_mode: SlideMode,
    /// When the last round of steady-state pitch bend and expression updates went out.
    pub last_control_send: Option<Instant>,
}

impl Default for InstrumentState {
    fn default() -> Self {
        Self {
            current_note: None,
            current_pitch_bend: NEUTRAL,
            current_volume: U7::from_u8_lossy(0),
            slide_mode: SlideMode::default(),
            last_control_send: None,
        }
    }
}

impl InstrumentState {
    /// Determine if a note is sounding.
    pub fn is_sounding(&self) -> bool {
        self.current_note.is_some()
    }
}

/// The mapped sensor values for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voicing {
    /// Pitch bend, or `None` when the slide isn't being touched.
    pub pitch_bend: Option<u16>,
    /// The note the overtone switches ask for, or `None` when there is no valid candidate.
    pub note: Option<Note>,
    /// Breath expression; zero means silence.
    pub volume: U7,
}

/// What the arbiter did during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    /// Silent before and after.
    Rest,
    /// Breath stopped; the note was released.
    NoteOff(Note),
    /// Breath started; a note began.
    NoteOn(Note),
    /// The overtone changed mid-breath.
    NoteChange {
        /// The note that was released.
        from: Note,
        /// The note that replaced it.
        to: Note,
    },
    /// The same note kept sounding.
    Sustain,
}

/// Decides which events to emit given the [`InstrumentState`] and a tick's [`Voicing`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arbiter {
    channel: Channel,
    velocity: U7,
    thresholds: ChangeThresholds,
    control_interval: Duration,
    expression: ExpressionController,
}

impl Arbiter {
    /// Constructs an [`Arbiter`] from the relevant parts of the configuration.
    pub fn new(config: &InstrumentConfig) -> Self {
        Self {
            channel: config.channel,
            velocity: config.note_on_velocity,
            thresholds: config.thresholds,
            control_interval: config.control_interval,
            expression: config.expression,
        }
    }

    /// Runs one tick of the state machine, emitting events to `sink`.
    ///
    /// The rules are tried in order:
    /// 1. no breath while sounding releases the note;
    /// 2. breath while silent starts the candidate note, bending first so it never sounds at the wrong pitch;
    /// 3. a new candidate while sounding releases the old note before bending and starting the new one;
    /// 4. otherwise a sounding note receives pitch bend and expression updates, at most once per control interval.
    pub fn arbitrate<S: MidiSink>(
        &self,
        state: &mut InstrumentState,
        voicing: Voicing,
        now: Instant,
        sink: &mut S,
    ) -> Transition {
        let Voicing {
            pitch_bend,
            note,
            volume,
        } = voicing;

        match (state.current_note, note) {
            (Some(current), _) if u8::from(volume) == 0 => {
                sink.note_off(self.channel, current, U7::from_u8_lossy(0));
                state.current_note = None;
                #[cfg(feature = "defmt")]
                defmt::debug!("Released {}", current.to_str());
                Transition::NoteOff(current)
            }
            (None, Some(candidate)) if u8::from(volume) > 0 => {
                self.send_pitch_bend(state, pitch_bend, sink);
                sink.note_on(self.channel, candidate, self.velocity);
                state.current_note = Some(candidate);
                #[cfg(feature = "defmt")]
                defmt::debug!("Started {}", candidate.to_str());
                Transition::NoteOn(candidate)
            }
            (Some(current), Some(candidate)) if candidate != current => {
                sink.note_off(self.channel, current, U7::from_u8_lossy(0));
                self.send_pitch_bend(state, pitch_bend, sink);
                self.send_expression(state, volume, sink);
                sink.note_on(self.channel, candidate, self.velocity);
                state.current_note = Some(candidate);
                #[cfg(feature = "defmt")]
                defmt::debug!("Changed {} to {}", current.to_str(), candidate.to_str());
                Transition::NoteChange {
                    from: current,
                    to: candidate,
                }
            }
            (Some(_), _) => {
                if self.control_window_open(state, now) {
                    state.last_control_send = Some(now);
                    self.send_pitch_bend(state, pitch_bend, sink);
                    self.send_expression(state, volume, sink);
                }
                Transition::Sustain
            }
            (None, _) => Transition::Rest,
        }
    }

    fn control_window_open(&self, state: &InstrumentState, now: Instant) -> bool {
        state.last_control_send.is_none_or(|last| {
            now.checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= self.control_interval)
        })
    }

    fn send_pitch_bend<S: MidiSink>(
        &self,
        state: &mut InstrumentState,
        pitch_bend: Option<u16>,
        sink: &mut S,
    ) {
        let Some(pitch_bend) = pitch_bend else {
            return;
        };
        if pitch_bend.abs_diff(state.current_pitch_bend) <= self.thresholds.pitch_bend {
            return;
        }
        if let Ok(value) = U14::try_from(pitch_bend) {
            sink.pitch_bend(self.channel, value);
            state.current_pitch_bend = pitch_bend;
        }
    }

    fn send_expression<S: MidiSink>(&self, state: &mut InstrumentState, volume: U7, sink: &mut S) {
        if u8::from(volume).abs_diff(u8::from(state.current_volume)) > self.thresholds.expression {
            sink.control_change(self.channel, self.expression.control_function(), volume);
            state.current_volume = volume;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{vec, vec::Vec};
    use wmidi::{ControlFunction, MidiMessage};

    const CH: Channel = Channel::Ch1;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn u7(value: u8) -> U7 {
        U7::from_u8_lossy(value)
    }

    fn arbiter() -> Arbiter {
        Arbiter::new(&InstrumentConfig::default())
    }

    fn sounding(note: Note) -> InstrumentState {
        InstrumentState {
            current_note: Some(note),
            current_pitch_bend: 4096,
            current_volume: u7(60),
            slide_mode: SlideMode::Continuous,
            last_control_send: Some(at(0)),
        }
    }

    fn voicing(pitch_bend: Option<u16>, note: Option<Note>, volume: u8) -> Voicing {
        Voicing {
            pitch_bend,
            note,
            volume: u7(volume),
        }
    }

    fn bend(value: u16) -> MidiMessage<'static> {
        MidiMessage::PitchBendChange(CH, U14::try_from(value).unwrap())
    }

    fn breath(value: u8) -> MidiMessage<'static> {
        MidiMessage::ControlChange(CH, ControlFunction::BREATH_CONTROLLER, u7(value))
    }

    #[test]
    fn silence_stays_silent() {
        let mut state = InstrumentState::default();
        let mut sink = Vec::new();
        let transition = arbiter().arbitrate(
            &mut state,
            voicing(Some(100), Some(Note::C4), 0),
            at(0),
            &mut sink,
        );
        assert_eq!(Transition::Rest, transition);
        assert!(sink.is_empty());
        assert_eq!(InstrumentState::default(), state);
    }

    #[test]
    fn breath_starts_note_after_bend() {
        let mut state = InstrumentState::default();
        let mut sink = Vec::new();
        let transition = arbiter().arbitrate(
            &mut state,
            voicing(Some(4096), Some(Note::C4), 60),
            at(0),
            &mut sink,
        );

        assert_eq!(Transition::NoteOn(Note::C4), transition);
        assert_eq!(
            vec![bend(4096), MidiMessage::NoteOn(CH, Note::C4, u7(127))],
            sink,
            "Expected left but got right"
        );
        assert_eq!(Some(Note::C4), state.current_note);
        assert_eq!(4096, state.current_pitch_bend);
    }

    #[test]
    fn unchanged_bend_is_not_resent_at_note_on() {
        let mut state = InstrumentState::default();
        let mut sink = Vec::new();
        arbiter().arbitrate(
            &mut state,
            voicing(Some(NEUTRAL - 5), Some(Note::C4), 60),
            at(0),
            &mut sink,
        );
        assert_eq!(vec![MidiMessage::NoteOn(CH, Note::C4, u7(127))], sink);
        assert_eq!(
            NEUTRAL, state.current_pitch_bend,
            "Suppressed values aren't recorded as sent"
        );
    }

    #[test]
    fn untouched_slide_keeps_last_bend() {
        let mut state = InstrumentState::default();
        let mut sink = Vec::new();
        arbiter().arbitrate(
            &mut state,
            voicing(None, Some(Note::C4), 60),
            at(0),
            &mut sink,
        );
        assert_eq!(vec![MidiMessage::NoteOn(CH, Note::C4, u7(127))], sink);
    }

    #[test]
    fn breath_without_candidate_stays_silent() {
        let mut state = InstrumentState::default();
        let mut sink = Vec::new();
        let transition =
            arbiter().arbitrate(&mut state, voicing(Some(100), None, 90), at(0), &mut sink);
        assert_eq!(Transition::Rest, transition);
        assert!(sink.is_empty());
    }

    #[test]
    fn no_breath_releases_note() {
        let mut state = sounding(Note::C4);
        let mut sink = Vec::new();
        let transition = arbiter().arbitrate(
            &mut state,
            voicing(Some(0), Some(Note::E4), 0),
            at(100),
            &mut sink,
        );

        assert_eq!(Transition::NoteOff(Note::C4), transition);
        assert_eq!(vec![MidiMessage::NoteOff(CH, Note::C4, u7(0))], sink);
        assert_eq!(None, state.current_note);
    }

    #[test]
    fn overtone_change_is_ordered() {
        let mut state = sounding(Note::C4);
        let mut sink = Vec::new();
        let transition = arbiter().arbitrate(
            &mut state,
            voicing(Some(2000), Some(Note::E4), 80),
            at(1),
            &mut sink,
        );

        assert_eq!(
            Transition::NoteChange {
                from: Note::C4,
                to: Note::E4,
            },
            transition
        );
        assert_eq!(
            vec![
                MidiMessage::NoteOff(CH, Note::C4, u7(0)),
                bend(2000),
                breath(80),
                MidiMessage::NoteOn(CH, Note::E4, u7(127)),
            ],
            sink,
            "Expected left but got right"
        );
        assert_eq!(Some(Note::E4), state.current_note);
        assert_eq!(u7(80), state.current_volume);
    }

    #[test]
    fn note_change_ignores_throttle() {
        let mut state = sounding(Note::C4);
        state.last_control_send = Some(at(99));
        let mut sink = Vec::new();
        arbiter().arbitrate(
            &mut state,
            voicing(None, Some(Note::E4), 60),
            at(100),
            &mut sink,
        );
        assert_eq!(
            vec![
                MidiMessage::NoteOff(CH, Note::C4, u7(0)),
                MidiMessage::NoteOn(CH, Note::E4, u7(127)),
            ],
            sink
        );
    }

    #[test]
    fn note_change_filters_jitter() {
        let mut state = sounding(Note::C4);
        let mut sink = Vec::new();
        // within thresholds of the last values sent: 4096 and 60
        arbiter().arbitrate(
            &mut state,
            voicing(Some(4106), Some(Note::E4), 61),
            at(50),
            &mut sink,
        );
        assert_eq!(
            vec![
                MidiMessage::NoteOff(CH, Note::C4, u7(0)),
                MidiMessage::NoteOn(CH, Note::E4, u7(127)),
            ],
            sink,
            "Expected left but got right"
        );
        assert_eq!(4096, state.current_pitch_bend);
        assert_eq!(u7(60), state.current_volume);
    }

    #[test]
    fn sustain_updates_controls() {
        let mut state = sounding(Note::C4);
        let mut sink = Vec::new();
        let transition = arbiter().arbitrate(
            &mut state,
            voicing(Some(5000), Some(Note::C4), 90),
            at(50),
            &mut sink,
        );

        assert_eq!(Transition::Sustain, transition);
        assert_eq!(
            vec![bend(5000), breath(90)],
            sink,
            "Expected left but got right"
        );
        assert_eq!(Some(at(50)), state.last_control_send);
    }

    #[test]
    fn sustain_is_throttled() {
        let arbiter = arbiter();
        let mut state = sounding(Note::C4);
        state.last_control_send = None;
        let mut sink = Vec::new();

        arbiter.arbitrate(
            &mut state,
            voicing(Some(5000), Some(Note::C4), 90),
            at(100),
            &mut sink,
        );
        assert_eq!(2, sink.len());

        arbiter.arbitrate(
            &mut state,
            voicing(Some(6000), Some(Note::C4), 100),
            at(109),
            &mut sink,
        );
        assert_eq!(
            2,
            sink.len(),
            "Updates within 10 ms of the last must be withheld"
        );

        arbiter.arbitrate(
            &mut state,
            voicing(Some(6000), Some(Note::C4), 100),
            at(110),
            &mut sink,
        );
        assert_eq!(vec![bend(5000), breath(90), bend(6000), breath(100)], sink);
    }

    #[test]
    fn jitter_is_filtered() {
        let arbiter = arbiter();
        let mut state = sounding(Note::C4);
        let mut sink = Vec::new();

        // within thresholds: 10 pitch bend units, 1 expression unit
        arbiter.arbitrate(
            &mut state,
            voicing(Some(4106), Some(Note::C4), 61),
            at(50),
            &mut sink,
        );
        assert!(sink.is_empty(), "Jitter should not produce traffic");

        arbiter.arbitrate(
            &mut state,
            voicing(Some(4107), Some(Note::C4), 62),
            at(100),
            &mut sink,
        );
        assert_eq!(vec![bend(4107), breath(62)], sink);
    }

    #[test]
    fn missing_candidate_while_sounding_sustains() {
        let mut state = sounding(Note::C4);
        let mut sink = Vec::new();
        let transition =
            arbiter().arbitrate(&mut state, voicing(None, None, 60), at(50), &mut sink);
        assert_eq!(Transition::Sustain, transition);
        assert_eq!(Some(Note::C4), state.current_note);
    }

    #[test]
    fn volume_controller() {
        let arbiter = Arbiter::new(&InstrumentConfig {
            expression: ExpressionController::Volume,
            ..Default::default()
        });
        let mut state = sounding(Note::C4);
        let mut sink = Vec::new();
        arbiter.arbitrate(
            &mut state,
            voicing(None, Some(Note::C4), 100),
            at(50),
            &mut sink,
        );
        let volume = MidiMessage::ControlChange(CH, ControlFunction::CHANNEL_VOLUME, u7(100));
        assert_eq!(vec![volume], sink);
    }
}
