//! Debouncing for the instrument's momentary switches, and the quantization toggle built on top of it.

use crate::configuration::{CycleConfig, SlideMode};
use embassy_time::{Duration, Instant};

/// A transition of the debounced level.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// High to low.
    Falling,
    /// Low to high.
    Rising,
}

/// Filters contact bounce out of a polled switch.
///
/// A new level is only believed once the raw level has held still for the debounce interval. Until then the previous
/// stable level is reported.
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    interval: Duration,
    stable: bool,
    raw: bool,
    raw_since: Option<Instant>,
    edge: Option<Edge>,
}

impl Debouncer {
    /// Constructs a [`Debouncer`] whose switch starts out at `level`.
    pub fn new(level: bool, interval: Duration) -> Self {
        Self {
            interval,
            stable: level,
            raw: level,
            raw_since: None,
            edge: None,
        }
    }

    /// Feeds a raw sample taken at `now`. Returns `true` if the stable level changed as a result.
    pub fn update(&mut self, level: bool, now: Instant) -> bool {
        self.edge = None;

        if level != self.raw || self.raw_since.is_none() {
            self.raw = level;
            self.raw_since = Some(now);
        }

        if self.raw == self.stable {
            return false;
        }

        let held = self
            .raw_since
            .and_then(|since| now.checked_duration_since(since))
            .unwrap_or(Duration::from_ticks(0));
        if held < self.interval {
            return false;
        }

        self.stable = self.raw;
        self.edge = if self.stable {
            Some(Edge::Rising)
        } else {
            Some(Edge::Falling)
        };
        true
    }

    /// The debounced level.
    pub fn level(&self) -> bool {
        self.stable
    }

    /// Returns `true` if the last [`update`][Self::update] produced a falling edge.
    pub fn fell(&self) -> bool {
        self.edge == Some(Edge::Falling)
    }

    /// Returns `true` if the last [`update`][Self::update] produced a rising edge.
    pub fn rose(&self) -> bool {
        self.edge == Some(Edge::Rising)
    }
}

/// The pushbutton that flips the slide between continuous and quantized.
///
/// The button pulls its pin low when pressed, so a press is a falling edge. Polled once per tick regardless of whether
/// the slide is being touched.
#[derive(Clone, Copy, Debug)]
pub struct QuantizationToggle {
    button: Debouncer,
}

impl QuantizationToggle {
    /// Constructs a [`QuantizationToggle`] for a released button.
    pub fn new(debounce: Duration) -> Self {
        Self {
            button: Debouncer::new(true, debounce),
        }
    }

    /// Samples the button, cycling `mode` on a press. Returns the new mode if it changed so the indicator can follow.
    pub fn poll(&mut self, level: bool, now: Instant, mode: &mut SlideMode) -> Option<SlideMode> {
        self.button.update(level, now);
        if !self.button.fell() {
            return None;
        }

        *mode = mode.cycle();
        #[cfg(feature = "defmt")]
        defmt::info!("Slide mode is now {}", *mode);
        Some(*mode)
    }
}
