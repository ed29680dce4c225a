/// Raw readings (12-bit ADC counts) describing the travel of the slide-position strip.
///
/// The strip is wired with inverted polarity relative to pitch: first position (slide all the way in, no bend) reads
/// higher than seventh position (slide all the way out, maximum bend down). When nothing touches the strip its wiper
/// floats to the top of the range, which is how an untouched strip is told apart from first position.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlideCalibration {
    /// Readings above this mean the performer's finger is off the strip.
    pub no_touch_threshold: u16,
    /// Reading at first position.
    pub position_1: u16,
    /// Reading at seventh position.
    pub position_7: u16,
}

impl Default for SlideCalibration {
    fn default() -> Self {
        Self {
            no_touch_threshold: 4000,
            position_1: 3700,
            position_7: 300,
        }
    }
}

/// Raw readings (12-bit ADC counts) describing the range of the breath-pressure sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BreathCalibration {
    /// Below this the reading is sensor noise, not breath.
    pub noise_floor: u16,
    /// The hardest the performer is expected to blow. Anything at or above is full expression.
    pub ceiling: u16,
}

impl Default for BreathCalibration {
    fn default() -> Self {
        Self {
            noise_floor: 300,
            ceiling: 3000,
        }
    }
}

/// How far a continuous value must move from the last value actually sent before it is sent again.
///
/// Changes must be strictly greater than the threshold, so jitter of exactly the threshold is still swallowed.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChangeThresholds {
    /// In pitch bend units (14-bit).
    pub pitch_bend: u16,
    /// In controller units (7-bit); applies to both breath and volume.
    pub expression: u8,
}

impl Default for ChangeThresholds {
    fn default() -> Self {
        Self {
            pitch_bend: 10,
            expression: 1,
        }
    }
}
