//! One tick of the control loop, from raw sensor readings to MIDI events.

use crate::{
    arbiter::{Arbiter, InstrumentState, Transition, Voicing},
    breath::Breath,
    configuration::{InstrumentConfig, SlideMode},
    debounce::QuantizationToggle,
    overtone, panic,
    sink::MidiSink,
    slide::Slide,
};
use embassy_time::Instant;
use wmidi::Channel;

/// A point sample of every input, taken at the start of a tick.
///
/// Switch fields hold raw pin levels unless noted; the hardware decides nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorFrame {
    /// Levels of the four overtone switches, which pull low when pressed. Index 3 is the most significant.
    pub overtone_switches: [bool; 4],
    /// Raw breath-pressure reading.
    pub breath: u16,
    /// Raw slide-position reading.
    pub slide: u16,
    /// Level of the quantization toggle button, which pulls low when pressed.
    pub quantize_switch: bool,
    /// `true` while the panic button is held.
    pub panic: bool,
}

/// What happened during a tick that the hardware side may need to act on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    /// The arbiter's decision.
    pub transition: Transition,
    /// The new slide mode, if the toggle was pressed; the indicator should follow.
    pub slide_mode: Option<SlideMode>,
    /// Whether an all-notes-off sweep went out.
    pub panicked: bool,
}

/// Owns the [`InstrumentState`] and runs the mappers, decoder, arbiter, toggle and panic sweep against it.
#[derive(Clone, Copy, Debug)]
pub struct Controller {
    channel: Channel,
    slide: Slide,
    breath: Breath,
    arbiter: Arbiter,
    toggle: QuantizationToggle,
    state: InstrumentState,
}

impl Controller {
    /// Constructs a silent [`Controller`].
    pub fn new(config: &InstrumentConfig) -> Self {
        Self {
            channel: config.channel,
            slide: Slide::new(config.slide),
            breath: Breath::new(config.breath),
            arbiter: Arbiter::new(config),
            toggle: QuantizationToggle::new(config.debounce),
            state: InstrumentState::default(),
        }
    }

    /// Getter.
    pub fn state(&self) -> &InstrumentState {
        &self.state
    }

    /// Processes one [`SensorFrame`] sampled at `now`.
    ///
    /// The toggle is polled first, whether or not the slide is touched, so a press is never missed and the new mode
    /// applies to this very tick.
    pub fn tick<S: MidiSink>(
        &mut self,
        frame: &SensorFrame,
        now: Instant,
        sink: &mut S,
    ) -> TickReport {
        let slide_mode = self
            .toggle
            .poll(frame.quantize_switch, now, &mut self.state.slide_mode);

        let voicing = Voicing {
            pitch_bend: self.slide.pitch_bend(frame.slide, self.state.slide_mode),
            // an invalid chord keeps whatever is sounding
            note: overtone::decode(frame.overtone_switches).or(self.state.current_note),
            volume: self.breath.volume(frame.breath),
        };
        let transition = self.arbiter.arbitrate(&mut self.state, voicing, now, sink);

        if frame.panic {
            panic::all_notes_off(self.channel, sink);
        }

        TickReport {
            transition,
            slide_mode,
            panicked: frame.panic,
        }
    }
}
