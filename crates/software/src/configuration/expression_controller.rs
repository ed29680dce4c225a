use num_derive::{FromPrimitive, ToPrimitive};
use wmidi::ControlFunction;

/// Determines which MIDI controller carries the breath reading.
///
/// Most wind-aware patches listen for Breath Controller (CC 2), so that's the default. Channel Volume (CC 7) is offered
/// for receivers that ignore breath entirely; with it selected the breath reading rides on volume instead.
#[derive(Debug, Default, Clone, Copy, ToPrimitive, FromPrimitive, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExpressionController {
    /// MIDI CC 2: Breath Controller
    #[default]
    Breath,
    /// MIDI CC 7: Channel Volume
    Volume,
}

impl ExpressionController {
    /// Returns the [`ControlFunction`] to send the breath reading on.
    pub fn control_function(&self) -> ControlFunction {
        match self {
            Self::Breath => ControlFunction::BREATH_CONTROLLER,
            Self::Volume => ControlFunction::CHANNEL_VOLUME,
        }
    }
}

impl super::CycleConfig for ExpressionController {}
