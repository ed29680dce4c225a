use num_derive::{FromPrimitive, ToPrimitive};

/// Determines how the slide-position sensor is translated into pitch bend.
///
/// A real trombone slide is continuous, and good players lip each note into tune. Quantization trades that freedom for
/// the seven classic slide positions: wherever the finger lands inside a position's band, the bend snaps to that
/// position's center. The performer flips between the two with the quantization toggle switch; the indicator LED is lit
/// while quantization is active.
#[derive(Debug, Default, Clone, Copy, ToPrimitive, FromPrimitive, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlideMode {
    /// Pitch bend follows the finger exactly.
    #[default]
    Continuous,
    /// Pitch bend snaps to one of seven slide positions.
    Quantized,
}

impl SlideMode {
    /// Returns true for [`SlideMode::Quantized`].
    pub fn is_quantized(&self) -> bool {
        *self == Self::Quantized
    }
}

impl super::CycleConfig for SlideMode {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::CycleConfig;

    #[test]
    fn is_quantized() {
        assert!(SlideMode::Quantized.is_quantized(), "Should be quantized");
        assert!(
            !SlideMode::Continuous.is_quantized(),
            "Should be continuous"
        );
    }

    #[test]
    fn toggles_between_two_modes() {
        assert_eq!(SlideMode::Quantized, SlideMode::Continuous.cycle());
        assert_eq!(SlideMode::Continuous, SlideMode::Quantized.cycle());
    }
}
