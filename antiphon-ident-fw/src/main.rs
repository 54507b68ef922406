//! Antiphon device identity reader
//!
//! STM32F103 utility firmware: reads the factory-programmed 96-bit
//! unique identifier, reports it over defmt, and lights the board LED
//! when it matches the identifier this firmware was provisioned for.

#![no_std]
#![no_main]

use core::ptr;

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

use antiphon_core::ident::DeviceId;

/// Base address of the factory UID words on STM32F1 parts
const UID_BASE: *const u32 = 0x1FFF_F7E8 as *const u32;

/// Identifier of the unit this firmware was provisioned for
const EXPECTED_ID: DeviceId = DeviceId::from_words([0x066E_FF34, 0x3437_534D, 0x4323_2328]);

/// Read the three UID words from system memory, high word first
fn read_device_id() -> DeviceId {
    let words = unsafe {
        [
            ptr::read_volatile(UID_BASE),
            ptr::read_volatile(UID_BASE.add(1)),
            ptr::read_volatile(UID_BASE.add(2)),
        ]
    };
    DeviceId::from_words(words)
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Antiphon identity reader starting...");

    let p = embassy_stm32::init(Default::default());

    // Let the rest of the board settle after power-on
    Timer::after_millis(500).await;

    let id = read_device_id();
    let [high, mid, low] = id.words();
    info!("device id: {=u32:08x} {=u32:08x} {=u32:08x}", high, mid, low);

    // Blue-pill style boards: LED on PC13, active low
    let mut led = Output::new(p.PC13, Level::High, Speed::Low);

    if id == EXPECTED_ID {
        info!("device id match");
        led.set_low();
    } else {
        warn!("device id mismatch");
    }

    loop {
        Timer::after_secs(60).await;
    }
}
