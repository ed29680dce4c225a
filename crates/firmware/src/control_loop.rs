//! The fixed-rate loop that samples the sensors and runs the [`Controller`].

use defmt::info;
use embassy_stm32::{
    Peri,
    adc::Adc,
    gpio::{Input, Output},
    peripherals::{ADC1, PA3, PC0},
};
use embassy_time::{Instant, Ticker};
use sackbut_lib::{
    configuration::{InstrumentConfig, SlideMode},
    controller::{Controller, SensorFrame},
};

/// The instrument's inputs, wired up and ready to be read.
pub struct Sensors {
    pub adc: Adc<'static, ADC1>,
    pub breath: Peri<'static, PA3>,
    pub slide: Peri<'static, PC0>,
    pub overtone_switches: [Input<'static>; 4],
    pub quantize_switch: Input<'static>,
    pub panic: Input<'static>,
}

impl Sensors {
    /// Takes a point sample of every input.
    fn sample(&mut self) -> SensorFrame {
        SensorFrame {
            overtone_switches: self.overtone_switches.each_ref().map(|switch| switch.is_high()),
            breath: self.adc.blocking_read(&mut self.breath),
            slide: self.adc.blocking_read(&mut self.slide),
            quantize_switch: self.quantize_switch.is_high(),
            panic: self.panic.is_high(),
        }
    }
}

/// Task responsible for turning the performance into MIDI, one tick at a time.
///
/// Sampling happens at the top of each tick and emission right after; the only waiting is for the next tick.
#[embassy_executor::task]
pub async fn control_loop(
    config: InstrumentConfig,
    mut sensors: Sensors,
    mut quantized_led: Output<'static>,
    mut panic_led: Output<'static>,
) -> ! {
    let mut controller = Controller::new(&config);

    #[cfg(feature = "midi-log")]
    let mut sink = sackbut_lib::sink::LogSink;
    #[cfg(not(feature = "midi-log"))]
    let mut sink = crate::outbox::UsbMidiSink;

    info!("Control loop running every {} ms", config.tick_period.as_millis());
    let mut ticker = Ticker::every(config.tick_period);
    loop {
        let frame = sensors.sample();
        let report = controller.tick(&frame, Instant::now(), &mut sink);

        match report.slide_mode {
            Some(SlideMode::Quantized) => quantized_led.set_high(),
            Some(SlideMode::Continuous) => quantized_led.set_low(),
            None => {}
        }
        if report.panicked {
            panic_led.set_high();
        } else {
            panic_led.set_low();
        }

        ticker.next().await;
    }
}
