//! Shared state between interrupt handlers and the main loop
//!
//! The loopback context and the status reporter live behind
//! critical-section mutexes; the tick counter is atomic on its own and
//! is read lock-free.

use core::cell::RefCell;

use critical_section::Mutex;

use antiphon_core::exchange::Loopback;
use antiphon_core::fault::Fault;
use antiphon_core::status::{BlinkTiming, StatusReporter};
use antiphon_core::tick::TickCounter;

use crate::board::{FaultLed, SuccessLed};

/// Millisecond tick counter, incremented only by the SysTick exception
pub static TICK: TickCounter = TickCounter::new();

/// Loopback context shared by the channel interrupts and the main loop
pub static LOOPBACK: Mutex<RefCell<Loopback>> = Mutex::new(RefCell::new(Loopback::new()));

/// Status reporter driven from the SysTick exception
pub static REPORTER: Mutex<RefCell<StatusReporter<FaultLed, SuccessLed>>> = Mutex::new(
    RefCell::new(StatusReporter::new(FaultLed, SuccessLed, BlinkTiming::DEFAULT)),
);

/// Current tick count
pub fn now() -> u32 {
    TICK.now()
}

/// Latch a fault from thread context
pub fn report_fault(fault: Fault) {
    critical_section::with(|cs| LOOPBACK.borrow_ref_mut(cs).latch_mut().report(fault));
}
