//! Sackbut is [Embassy](https://embassy.dev)-based firmware for a wind controller modeled on the trombone. The
//! performer blows into a breath-pressure sensor, slides a finger along a position strip in place of the slide, and
//! chooses among the partials of the harmonic series with a chord of four overtone switches. The firmware runs on the
//! [Nucleo-F767ZI development board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html), which is powered by
//! an F7-series STM32 microcontroller, and presents itself to the host as a class-compliant USB MIDI device.
//!
//! All of the musical decisions live in `sackbut_lib`; this crate samples the hardware, keeps time, and moves bytes.
//!
//! For details about the hardware or how to use the device, see the `README`.

#![no_std]
#![no_main]

mod control_loop;
mod outbox;

use crate::control_loop::Sensors;
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::{
    Config,
    adc::{Adc, SampleTime},
    bind_interrupts,
    gpio::{Input, Level, Output, Pull, Speed},
    peripherals,
    time::Hertz,
    usb,
};
use embassy_usb::{Builder, UsbDevice, class::midi::MidiClass};
use sackbut_lib::configuration::InstrumentConfig;
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        OTG_FS => usb::InterruptHandler<peripherals::USB_OTG_FS>;
    }
);

type UsbDriver = usb::Driver<'static, peripherals::USB_OTG_FS>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Initializing Sackbut");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: high-speed external clock
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        // pll: phase-locked loop, crucial for dividing clock
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            // per section 5.2 of RM0410: most peripheral clocks are derived from their bus clock, but the 48MHz clock used for USB OTG FS
            // is derived from main PLL VCO (PLLQ clock) or PLLSAI VCO (PLLSAI clock)
            divq: Some(PllQDiv::DIV9), // 8mhz / 4 * 216 / 9 = 48Mhz
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.mux.clk48sel = mux::Clk48sel::PLL1_Q;
    }
    let p = embassy_stm32::init(config);

    // Create the driver, from the HAL.
    static ENDPOINT_OUT_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
    let mut config = embassy_stm32::usb::Config::default();

    // USB devices which are self-powered (i.e., that can stay powered on if unplugged from the host)
    // need to enable vbus_detection to comply with the USB spec. Per section 6.10 of the Nucleo board
    // manual (UM1974), CN13 (the USB port) cannot power the board; external power is necessary.
    // See docs on `vbus_detection` for details.
    config.vbus_detection = true;

    let driver = usb::Driver::new_fs(
        p.USB_OTG_FS,
        Irqs,
        p.PA12,
        p.PA11,
        ENDPOINT_OUT_BUFFER.init([0; 256]),
        config,
    );

    // per https://pid.codes, FOSS projects can apply to be listed under the vendor ID owned by InterBiometrics
    let vendor_id = 0x1209;
    // reads "SACkBut", more or less
    let product_id = 0x5ACB;

    let mut config = embassy_usb::Config::new(vendor_id, product_id);
    config.manufacturer = Some("Pawpaw Works");
    config.product = Some("Sackbut");
    config.self_powered = true;
    config.max_power = 0;

    // Create embassy-usb DeviceBuilder using the driver and config.
    // It needs some buffers for building the descriptors.
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUFFER.init([0; 64]),
    );

    // the instrument only talks; it has one output jack and no input jacks
    let class = MidiClass::new(&mut builder, 0, 1, 64);

    let usb = builder.build();

    unwrap!(spawner.spawn(usb_task(usb)));
    unwrap!(spawner.spawn(outbox::midi_out(class)));

    let mut adc = Adc::new(p.ADC1);
    // the sensors are high-impedance; give the sampling capacitor as long as it wants
    adc.set_sample_time(SampleTime::CYCLES480);

    let sensors = Sensors {
        adc,
        breath: p.PA3,
        slide: p.PC0,
        // switch 0 is the least significant bit of the chord
        overtone_switches: [
            Input::new(p.PE2, Pull::Up),
            Input::new(p.PE3, Pull::Up),
            Input::new(p.PE4, Pull::Up),
            Input::new(p.PE5, Pull::Up),
        ],
        quantize_switch: Input::new(p.PD1, Pull::Up),
        // the Nucleo's user button has an external pull-down and reads high when pressed
        panic: Input::new(p.PC13, Pull::None),
    };
    let quantized_led = Output::new(p.PB7, Level::Low, Speed::Low);
    let panic_led = Output::new(p.PB14, Level::Low, Speed::Low);

    unwrap!(spawner.spawn(control_loop::control_loop(
        InstrumentConfig::default(),
        sensors,
        quantized_led,
        panic_led
    )));
}

#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}
