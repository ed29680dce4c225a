//! Translates the slide-position strip into pitch bend.
//!
//! The instrument only ever bends down: first position is the unbent fundamental and seventh position is the furthest
//! the pitch can be pulled. Pitch bend values therefore occupy the lower half of the 14-bit range, from [`NEUTRAL`]
//! (no bend) down to zero (maximum bend down).

use crate::configuration::{SlideCalibration, SlideMode};

/// The pitch bend value for an unbent note, i.e., first position.
pub const NEUTRAL: u16 = 16383 / 2;

/// The pitch bend value for seventh position.
pub const MAX_BEND_DOWN: u16 = 0;

/// Converts raw slide readings into pitch bend values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slide {
    calibration: SlideCalibration,
}

impl Slide {
    /// Constructs a [`Slide`].
    pub fn new(calibration: SlideCalibration) -> Self {
        Self { calibration }
    }

    /// Returns the pitch bend for a raw reading, or `None` when the performer's finger is off the strip.
    ///
    /// Readings past either end-stop are treated as the end-stop itself. In [`SlideMode::Quantized`] the result is
    /// snapped to the nearest of the seven slide positions (see [`quantize`]).
    pub fn pitch_bend(&self, raw: u16, mode: SlideMode) -> Option<u16> {
        let SlideCalibration {
            no_touch_threshold,
            position_1,
            position_7,
        } = self.calibration;

        if raw > no_touch_threshold {
            return None;
        }

        if position_1 == position_7 {
            return Some(NEUTRAL);
        }

        let clamped = raw.clamp(position_1.min(position_7), position_1.max(position_7));
        let bend = map_range(
            i32::from(clamped),
            (i32::from(position_1), i32::from(position_7)),
            (i32::from(NEUTRAL), i32::from(MAX_BEND_DOWN)),
        )
        // the sensor can overshoot the calibrated travel; pitch bend can't
        .clamp(0, i32::from(NEUTRAL)) as u16;

        if mode.is_quantized() {
            Some(quantize(bend))
        } else {
            Some(bend)
        }
    }
}

/// Linear interpolation in integer arithmetic; the division truncates toward zero.
fn map_range(value: i32, (in_start, in_end): (i32, i32), (out_start, out_end): (i32, i32)) -> i32 {
    (value - in_start) * (out_end - out_start) / (in_end - in_start) + out_start
}

/// Snaps a pitch bend value to the center of the slide position whose band contains it.
///
/// Interior positions are full-width bands centered on their snapped value; first and seventh positions sit at the
/// ends of the range and so are only half as wide. Values outside the slide's range fall back to zero.
pub fn quantize(bend: u16) -> u16 {
    match bend {
        0..=683 => 0,
        684..=2048 => 1365,
        2049..=3413 => 2731,
        3414..=4779 => 4096,
        4780..=6144 => 5461,
        6145..=7509 => 6827,
        7510..=8192 => 8191,
        _ => 0,
    }
}
