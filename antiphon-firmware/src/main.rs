//! Antiphon loopback self-test firmware
//!
//! STM32L053 demo: SPI1 (master) and SPI2 (slave) are wired together on
//! the board. Pressing the user button exchanges one byte in each
//! direction; the main loop verifies both arrivals and toggles the
//! green LED on a match. Any fault - a channel interrupt without data,
//! a byte mismatch, a clock stage that never comes up - is latched and
//! rendered as a counted blink pattern on the red LED until reset.

#![no_std]
#![no_main]

mod board;
mod clock;
mod globals;
mod irq;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::{NVIC, SYST};
use cortex_m_rt::entry;
use defmt::*;
use stm32l0::stm32l0x3 as pac;
use {defmt_rtt as _, panic_probe as _};

use antiphon_core::exchange::ExchangeOutcome;

/// SysTick reload for a 1 ms tick on the 2 MHz MSI reset clock
const SYSTICK_RELOAD_MSI: u32 = 2_000;
/// SysTick reload for a 1 ms tick on the 16 MHz PLL clock
const SYSTICK_RELOAD_PLL: u32 = 16_000;

#[entry]
fn main() -> ! {
    info!("Antiphon loopback self-test starting...");

    let dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    // Coarse 1 ms tick so the clock bring-up waits can measure time
    configure_systick(&mut cp.SYST, SYSTICK_RELOAD_MSI);

    let clock_result = clock::configure_pll_16mhz(&dp);
    board::configure_leds(&dp);

    if let Err(fault) = clock_result {
        warn!("clock bring-up failed: {}", fault);
        globals::report_fault(fault);
        // Bring-up stops here; SysTick keeps blinking the fault code.
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // Re-derive the 1 ms tick from the 16 MHz core clock
    configure_systick(&mut cp.SYST, SYSTICK_RELOAD_PLL);

    board::configure_spi1(&dp);
    board::configure_spi2(&dp);
    board::configure_trigger(&dp);

    unsafe {
        cp.NVIC.set_priority(pac::Interrupt::SPI1, 0);
        cp.NVIC.set_priority(pac::Interrupt::SPI2, 0);
        cp.NVIC.set_priority(pac::Interrupt::EXTI0_1, 0);
        NVIC::unmask(pac::Interrupt::SPI1);
        NVIC::unmask(pac::Interrupt::SPI2);
        NVIC::unmask(pac::Interrupt::EXTI0_1);
    }

    info!("bring-up complete, press the user button to run an exchange");

    // Exchanges start in the button interrupt; this loop only verifies.
    loop {
        let (outcome, matches) = critical_section::with(|cs| {
            let mut lb = globals::LOOPBACK.borrow_ref_mut(cs);
            (lb.poll_exchange(), lb.matches())
        });
        match outcome {
            Some(ExchangeOutcome::Match) => {
                critical_section::with(|cs| {
                    globals::REPORTER.borrow_ref_mut(cs).exchange_matched()
                });
                info!("exchange {} verified", matches);
            }
            Some(ExchangeOutcome::Mismatch) => {
                warn!("exchange mismatch");
            }
            None => {}
        }
    }
}

/// Program SysTick for a 1 ms period at the given core clock
fn configure_systick(syst: &mut SYST, reload: u32) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(reload - 1);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
}
