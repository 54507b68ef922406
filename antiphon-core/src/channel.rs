//! Per-channel receive handling
//!
//! Each loopback channel has a binary state machine: while `Armed`, a
//! receive interrupt with data ready captures the byte and marks the
//! channel complete; an interrupt without data ready is a protocol fault
//! that fail-stops the channel permanently.

use crate::fault::Fault;

/// Identifies one of the two loopback channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelId {
    /// Master side of the exchange
    A,
    /// Slave side of the exchange
    B,
}

/// Receive-side state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Interrupts serviced normally
    Armed,
    /// Fail-stopped after a fault; terminal until external reset
    Disabled,
}

/// Receive state for one channel
///
/// Written only by that channel's interrupt handler; read and drained
/// only by the main-loop consumer. The receive slot is single-buffered:
/// a second arrival before the consumer drains it overwrites the byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelReceiver {
    id: ChannelId,
    state: ChannelState,
    received: Option<u8>,
}

impl ChannelReceiver {
    /// Create an armed receiver with an empty slot
    pub const fn new(id: ChannelId) -> Self {
        Self {
            id,
            state: ChannelState::Armed,
            received: None,
        }
    }

    /// Channel identity
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Current state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// True while the channel services interrupts
    pub fn is_armed(&self) -> bool {
        self.state == ChannelState::Armed
    }

    /// Completion flag: a byte has arrived and has not been drained
    pub fn complete(&self) -> bool {
        self.received.is_some()
    }

    /// Service one receive interrupt
    ///
    /// `byte` is the data-register contents when the receive flag was
    /// set, or `None` when the interrupt fired without data ready. The
    /// latter is a protocol fault: the channel transitions to `Disabled`
    /// and the returned fault must be latched. The caller is expected to
    /// also mask the hardware interrupt line.
    ///
    /// Interrupts arriving after the channel is disabled are ignored.
    pub fn on_interrupt(&mut self, byte: Option<u8>) -> Option<Fault> {
        if self.state == ChannelState::Disabled {
            return None;
        }
        match byte {
            Some(byte) => {
                self.received = Some(byte);
                None
            }
            None => {
                self.state = ChannelState::Disabled;
                Some(Fault::ChannelFault(self.id))
            }
        }
    }

    /// Drain the received byte and clear the completion flag
    ///
    /// Must run atomically with respect to this channel's interrupt
    /// handler (interrupt masked, or inside a critical section).
    pub fn take(&mut self) -> Option<u8> {
        self.received.take()
    }
}
