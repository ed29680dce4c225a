//! Translates breath pressure into a 7-bit expression value.

use crate::configuration::BreathCalibration;
use wmidi::U7;

/// Converts raw breath-pressure readings into expression values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Breath {
    calibration: BreathCalibration,
}

impl Breath {
    /// Constructs a [`Breath`].
    pub fn new(calibration: BreathCalibration) -> Self {
        Self { calibration }
    }

    /// Returns the expression value for a raw reading.
    ///
    /// Zero means silence. Anything below the noise floor is zero so that a resting sensor never starts a note; from
    /// the noise floor up to the ceiling the value rises linearly to 127, and stays there.
    pub fn volume(&self, raw: u16) -> U7 {
        let BreathCalibration {
            noise_floor,
            ceiling,
        } = self.calibration;

        if raw < noise_floor {
            return U7::from_u8_lossy(0);
        }
        if ceiling <= noise_floor {
            return U7::from_u8_lossy(127);
        }

        let clamped = u32::from(raw.min(ceiling) - noise_floor);
        let span = u32::from(ceiling - noise_floor);
        // clamped <= span, so this never exceeds 127
        U7::from_u8_lossy((clamped * 127 / span) as u8)
    }
}
