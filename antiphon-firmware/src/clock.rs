//! System clock bring-up
//!
//! Brings the system clock to 16 MHz: voltage scale 1, HSI16 divided by
//! 4 feeding the PLL, PLL x8 /2. Each stage is a startup wait with its
//! own timeout; the first stage that fails aborts bring-up with a
//! per-subsystem fault.

use stm32l0::stm32l0x3 as pac;

use antiphon_core::fault::{Fault, Subsystem};
use antiphon_core::startup::wait_ready;

use crate::globals;

// Stage timeouts in ticks (1 ms tick)
const OSCILLATOR_TIMEOUT: u32 = 100;
const PLL_TIMEOUT: u32 = 100;
const CLOCK_SWITCH_TIMEOUT: u32 = 5000;

// Register bits
const APB1ENR_PWREN: u32 = 1 << 28;
const PWR_CR_VOS_MASK: u32 = 0b11 << 11;
const PWR_CR_VOS_RANGE1: u32 = 0b01 << 11;
const CR_HSI16ON: u32 = 1 << 0;
const CR_HSI16RDYF: u32 = 1 << 2;
const CR_HSI16DIVEN: u32 = 1 << 3;
const CR_HSI16DIVF: u32 = 1 << 4;
const CR_PLLON: u32 = 1 << 24;
const CR_PLLRDY: u32 = 1 << 25;
const CFGR_PLLMUL8: u32 = 0b0011 << 18;
const CFGR_PLLDIV2: u32 = 0b01 << 22;
const CFGR_SW_PLL: u32 = 0b11;
const CFGR_SWS_PLL: u32 = 0b11 << 2;

/// Switch the system clock from the MSI reset clock to the 16 MHz PLL
///
/// Requires a running tick (the waits measure time against it). On a
/// timeout the caller latches the returned fault and bring-up stops.
pub fn configure_pll_16mhz(dp: &pac::Peripherals) -> Result<(), Fault> {
    // Voltage scale 1 (1.65V - 1.95V) for full-speed operation
    dp.RCC
        .apb1enr()
        .modify(|r, w| unsafe { w.bits(r.bits() | APB1ENR_PWREN) });
    dp.PWR
        .cr()
        .modify(|r, w| unsafe { w.bits((r.bits() & !PWR_CR_VOS_MASK) | PWR_CR_VOS_RANGE1) });

    // HSI16 with the /4 divider, then wait for both ready flags
    dp.RCC
        .cr()
        .modify(|r, w| unsafe { w.bits(r.bits() | CR_HSI16ON | CR_HSI16DIVEN) });
    wait_ready(globals::now, OSCILLATOR_TIMEOUT, Subsystem::Oscillator, || {
        dp.RCC.cr().read().bits() & (CR_HSI16RDYF | CR_HSI16DIVF)
            == (CR_HSI16RDYF | CR_HSI16DIVF)
    })?;

    // PLL on HSI16/4, x8 /2; the PLL source mux stays at its HSI16
    // reset value
    dp.RCC
        .cfgr()
        .modify(|r, w| unsafe { w.bits(r.bits() | CFGR_PLLMUL8 | CFGR_PLLDIV2) });
    dp.RCC
        .cr()
        .modify(|r, w| unsafe { w.bits(r.bits() | CR_PLLON) });
    wait_ready(globals::now, PLL_TIMEOUT, Subsystem::Pll, || {
        dp.RCC.cr().read().bits() & CR_PLLRDY != 0
    })?;

    // Select the PLL as system clock and wait for the switch
    dp.RCC
        .cfgr()
        .modify(|r, w| unsafe { w.bits(r.bits() | CFGR_SW_PLL) });
    wait_ready(globals::now, CLOCK_SWITCH_TIMEOUT, Subsystem::ClockSwitch, || {
        dp.RCC.cfgr().read().bits() & CFGR_SWS_PLL == CFGR_SWS_PLL
    })?;

    Ok(())
}
