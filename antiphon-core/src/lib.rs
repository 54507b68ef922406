//! Board-agnostic core logic for the Antiphon self-test firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (indicator pins, byte links)
//! - Free-running tick counter and wraparound-safe elapsed-time checks
//! - Per-channel receive state machine with fail-stop fault handling
//! - The loopback exchange context and verifier
//! - Blink-coded status reporting
//! - Startup waits with per-subsystem timeouts
//! - Factory device identifier handling

#![no_std]
#![deny(unsafe_code)]

pub mod channel;
pub mod exchange;
pub mod fault;
pub mod ident;
pub mod startup;
pub mod status;
pub mod tick;
pub mod traits;
