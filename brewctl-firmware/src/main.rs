//! brewctl - Brewing Temperature Controller Firmware
//!
//! Main firmware binary for RP2040-based mash controllers: one NTC
//! thermistor, one SSR-driven heater element and a circulation pump.
//!
//! Board wiring (Raspberry Pi Pico):
//! - GPIO26 (ADC0): thermistor divider
//! - GPIO16 (PWM0 A): heater SSR
//! - GPIO17: pump relay
//! - GPIO0/GPIO1 (UART0): operator command line, 115200 baud

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use brewctl_core::config::{load_offset, load_tunings, ControllerConfig};
use brewctl_core::Supervisor;
use brewctl_drivers::{BetaThermistor, EhOutputPin, GpioPump, PwmHeater, ThermistorConfig};
use brewctl_hal_rp2040::{Rp2040FlashStorage, RpAdc, SsrPwm};

use crate::controller::{EmbassyClock, SharedController};

mod channels;
mod controller;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static CONTROLLER: StaticCell<SharedController> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("brewctl firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Restore persisted calibration and gains before touching the outputs
    let mut storage = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);
    let offset = load_offset(&mut storage).await;

    let mut config = ControllerConfig::default();
    match load_tunings(&mut storage).await {
        Some(tunings) => {
            info!(
                "Using stored tunings: Kp={} Ki={} Kd={}",
                tunings.kp, tunings.ki, tunings.kd
            );
            config.tunings = tunings;
        }
        None => info!("No stored tunings, using defaults"),
    }

    // Thermistor on ADC0
    let adc = Adc::new_blocking(p.ADC, embassy_rp::adc::Config::default());
    let therm_channel = Channel::new_pin(p.PIN_26, Pull::None);
    let sensor = BetaThermistor::new(
        RpAdc::new(adc, therm_channel),
        ThermistorConfig::default(),
        offset,
    );

    // Heater SSR and pump relay, both off from the first instruction
    let pwm = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, PwmConfig::default());
    let heater = PwmHeater::new(SsrPwm::new(pwm));
    let pump = GpioPump::new_active_high(EhOutputPin::new(Output::new(p.PIN_17, Level::Low)));

    info!("Sensor and actuators initialized");

    let supervisor = Supervisor::new(sensor, heater, pump, EmbassyClock, config);
    let controller: &'static SharedController = CONTROLLER.init(Mutex::new(supervisor));

    // Setup UART for operator commands
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (_tx, rx) = uart.split();

    info!("UART initialized for operator commands");

    // Spawn tasks
    spawner.spawn(tasks::control_task(controller)).unwrap();
    spawner.spawn(tasks::safety_task(controller)).unwrap();
    spawner.spawn(tasks::telemetry_task(controller)).unwrap();
    spawner.spawn(tasks::autotune_task(controller)).unwrap();
    spawner.spawn(tasks::calibration_task(storage)).unwrap();
    spawner.spawn(tasks::serial_rx_task(rx, controller)).unwrap();
    spawner.spawn(tasks::shutdown_task(controller)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
