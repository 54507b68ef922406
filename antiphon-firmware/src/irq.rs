//! Interrupt handlers
//!
//! Thin shims over the shared loopback context. All handlers run to
//! completion; the SysTick exception advances the tick counter and then
//! steps the status reporter.

use cortex_m::peripheral::NVIC;
use cortex_m_rt::exception;
use defmt::*;
use stm32l0::stm32l0x3 as pac;
use stm32l0::stm32l0x3::{interrupt, Interrupt};

use antiphon_core::channel::{ChannelId, ChannelState};
use antiphon_core::exchange::start_exchange;
use antiphon_core::traits::ByteLink;

use crate::board::{MasterLink, SlaveLink};
use crate::globals;

#[exception]
fn SysTick() {
    globals::TICK.advance();
    critical_section::with(|cs| {
        let code = globals::LOOPBACK.borrow_ref(cs).latch().blink_code();
        globals::REPORTER.borrow_ref_mut(cs).on_tick(code);
    });
}

#[interrupt]
fn EXTI0_1() {
    let exti = unsafe { &*pac::EXTI::ptr() };
    if exti.pr().read().bits() & 1 != 0 {
        // Clear the edge flag before starting the exchange; no new
        // trigger is serviced until then.
        exti.pr().write(|w| unsafe { w.bits(1) });

        if start_exchange(&mut MasterLink, &mut SlaveLink) {
            trace!("trigger edge, exchange started");
        }
    }
}

#[interrupt]
fn SPI1() {
    let byte = MasterLink.take_received();
    let state = critical_section::with(|cs| {
        let mut lb = globals::LOOPBACK.borrow_ref_mut(cs);
        lb.on_channel_interrupt(ChannelId::A, byte);
        lb.channel_state(ChannelId::A)
    });
    if state == ChannelState::Disabled {
        // Fail-stop: the channel never completes again until reset.
        NVIC::mask(Interrupt::SPI1);
        warn!("channel A receive fault, interrupt masked");
    }
}

#[interrupt]
fn SPI2() {
    let byte = SlaveLink.take_received();
    let state = critical_section::with(|cs| {
        let mut lb = globals::LOOPBACK.borrow_ref_mut(cs);
        lb.on_channel_interrupt(ChannelId::B, byte);
        lb.channel_state(ChannelId::B)
    });
    if state == ChannelState::Disabled {
        NVIC::mask(Interrupt::SPI2);
        warn!("channel B receive fault, interrupt masked");
    }
}
