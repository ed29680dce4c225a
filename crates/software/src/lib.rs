//! This crate contains architecture-agnostic logic for Sackbut, a wind controller modeled on the trombone which
//! translates breath pressure, a slide-position strip and a chorded set of overtone switches into
//! [MIDI](https://midi.org/midi-1-0).
//!
//! Each tick of the control loop samples every sensor into a [`SensorFrame`][controller::SensorFrame] and hands it to
//! the [`Controller`][controller::Controller], which maps the readings and lets the [`arbiter`] decide which events
//! to emit through a [`MidiSink`][sink::MidiSink].

#![deny(missing_docs)]
#![no_std]

#[cfg(test)]
extern crate std;

pub mod arbiter;
pub mod breath;
pub mod configuration;
pub mod controller;
pub mod debounce;
pub mod overtone;
pub mod panic;
pub mod sink;
pub mod slide;
pub mod usb_midi;
