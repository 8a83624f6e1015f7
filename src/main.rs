//! Sensor Node Main Application
//!
//! Entry point for the STM32G474-based 1-Wire sensor node firmware.
//! Initializes the bus pin, discovers devices and measures forever.

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, OutputOpenDrain, Speed};
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use ow_sensor_node::node::SensorNode;
use ow_sensor_node::prelude::*;
use ow_sensor_node::report::Outcome;

/// Log reporter that also blinks the status LED once per cycle
struct BlinkReporter<'d> {
    log: LogReporter,
    led: Output<'d>,
}

impl Report for BlinkReporter<'_> {
    fn conversion_failed(&mut self, index: usize, error: Error) {
        self.log.conversion_failed(index, error);
    }

    fn reading(&mut self, index: usize, kind: SensorKind, outcome: Outcome) {
        self.log.reading(index, kind, outcome);
    }

    fn end_cycle(&mut self) {
        self.log.end_cycle();
        self.led.toggle();
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("1-Wire Sensor Node v{}", env!("CARGO_PKG_VERSION"));

    // Initialize STM32G474 peripherals with default clock configuration
    let p = embassy_stm32::init(embassy_stm32::Config::default());

    info!("Peripherals initialized");

    // Status LED (PA5 on Nucleo boards)
    let led = Output::new(p.PA5, Level::Low, Speed::Low);

    // 1-Wire data line on PA8, open drain with external 4.7k pull-up
    let data = OutputOpenDrain::new(p.PA8, Level::High, Speed::Low);
    let wire = BitBangWire::new(data, Delay);
    let mut bus = Bus::new(wire, Delay);

    info!("1-Wire bus on {}", pins::ONEWIRE_DATA);

    let mut reporter = BlinkReporter {
        log: LogReporter,
        led,
    };

    // The measurement loop is blocking and never yields
    let mut node = SensorNode::new(NodeConfig::default());
    node.run(&mut bus, &mut reporter)
}
