//! Fault taxonomy and the sticky fault latch
//!
//! Every fault in the system is captured into a single latch. Once set,
//! the value persists until explicit external reset; the status reporter
//! reads it continuously and renders the code as a blink pattern.

use crate::channel::ChannelId;

/// Subsystems that can time out during clock bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Subsystem {
    /// High-speed internal oscillator (and its divider)
    Oscillator,
    /// Phase-locked loop lock
    Pll,
    /// System clock mux switch
    ClockSwitch,
}

/// Fault conditions reported through the status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// A channel interrupt fired without data ready; the channel is
    /// fail-stopped and never completes again until reset
    ChannelFault(ChannelId),
    /// Both channels completed but the received bytes did not match the
    /// expected values
    TransferMismatch,
    /// A clock-tree subsystem did not come up within its timeout
    StartupTimeout(Subsystem),
}

impl Fault {
    /// Blink code rendered by the status reporter
    ///
    /// The indicator shows `code` blinks per reporting cycle.
    pub fn code(&self) -> u8 {
        match self {
            Fault::ChannelFault(ChannelId::A) => 1,
            Fault::ChannelFault(ChannelId::B) => 2,
            Fault::TransferMismatch => 3,
            Fault::StartupTimeout(Subsystem::Oscillator) => 4,
            Fault::StartupTimeout(Subsystem::Pll) => 5,
            Fault::StartupTimeout(Subsystem::ClockSwitch) => 6,
        }
    }
}

/// Latch contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Latched {
    /// No fault recorded
    Clear,
    /// A fault is recorded and reported
    Set(Fault),
    /// Reporting suppressed until cleared or overwritten
    Suppressed,
}

/// Sticky fault latch
///
/// Written by any handler that detects a fault; read continuously by the
/// status reporter. Writers may race: last write wins, which is benign
/// because the value is only ever replaced by another fault. Nothing
/// clears the latch automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultLatch {
    latched: Latched,
}

impl Default for FaultLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultLatch {
    /// Create a clear latch
    pub const fn new() -> Self {
        Self {
            latched: Latched::Clear,
        }
    }

    /// Record a fault, replacing whatever was latched before
    pub fn report(&mut self, fault: Fault) {
        self.latched = Latched::Set(fault);
    }

    /// Stop reporting without clearing
    ///
    /// A subsequent `report` overwrites the suppression.
    pub fn suppress(&mut self) {
        self.latched = Latched::Suppressed;
    }

    /// Explicit external reset
    pub fn clear(&mut self) {
        self.latched = Latched::Clear;
    }

    /// The currently latched fault, if any
    pub fn current(&self) -> Option<Fault> {
        match self.latched {
            Latched::Set(fault) => Some(fault),
            _ => None,
        }
    }

    /// True when anything (fault or suppression) is latched
    pub fn is_set(&self) -> bool {
        self.latched != Latched::Clear
    }

    /// Blink code for the status reporter
    ///
    /// `None` while clear or suppressed: the reporter shows the idle
    /// pattern.
    pub fn blink_code(&self) -> Option<u8> {
        self.current().map(|fault| fault.code())
    }
}
