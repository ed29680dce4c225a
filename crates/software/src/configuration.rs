//! This module contains both user-configurable settings (implemented as enums), the calibration data describing the
//! attached sensors, and traits to make them easier to work with in code.

mod calibration;
pub use calibration::*;

mod expression_controller;
pub use expression_controller::*;

mod slide_mode;
pub use slide_mode::*;

use embassy_time::Duration;
use num_traits::{FromPrimitive, ToPrimitive};
use wmidi::{Channel, U7};

/// A trait which allows infinite cycling of an enum's variants.
///
/// Useful for pushbutton user interfaces, allowing presses to advance from the current to the next variant,
/// cycling back to the beginning when all variants have been exhausted.
pub trait CycleConfig {
    /// Return the next variant, cycling back to the beginning as needed.
    fn cycle(self) -> Self
    where
        Self: FromPrimitive + ToPrimitive + Sized,
    {
        let index = self
            .to_u8()
            .expect("enum variants should be castable to u8");
        match <Self as FromPrimitive>::from_u8(index + 1) {
            Some(new_selection) => new_selection,
            None => FromPrimitive::from_u8(0).expect("enum should not be empty"),
        }
    }
}

/// Everything the control loop needs to know about the instrument that isn't read from a sensor.
///
/// Fixed properties of the hardware (e.g., where the ends of the slide strip sit) live here alongside performer
/// selections. Should the device ever learn to calibrate itself, this is the struct it would rewrite.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentConfig {
    /// The single channel on which every event is sent.
    pub channel: Channel,
    /// Describes the raw travel of the slide-position sensor.
    pub slide: SlideCalibration,
    /// Describes the raw range of the breath-pressure sensor.
    pub breath: BreathCalibration,
    /// Minimum change in a continuous value before it's worth sending again.
    pub thresholds: ChangeThresholds,
    /// Minimum interval between two rounds of steady-state pitch bend and expression messages.
    pub control_interval: Duration,
    /// Period of the control loop.
    pub tick_period: Duration,
    /// How long a switch must hold still before its new level is believed.
    pub debounce: Duration,
    /// Velocity of every NoteOn. Breath, not attack, shapes the loudness of this instrument.
    pub note_on_velocity: U7,
    /// Which controller carries the breath reading.
    pub expression: ExpressionController,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            channel: Channel::Ch1,
            slide: SlideCalibration::default(),
            breath: BreathCalibration::default(),
            thresholds: ChangeThresholds::default(),
            control_interval: Duration::from_millis(10),
            tick_period: Duration::from_millis(50),
            debounce: Duration::from_millis(10),
            note_on_velocity: U7::from_u8_lossy(127),
            expression: ExpressionController::default(),
        }
    }
}
