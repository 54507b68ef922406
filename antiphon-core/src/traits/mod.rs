//! Hardware abstraction traits
//!
//! The seams between the board-agnostic logic and chip-specific code:
//! digital indicator outputs and byte-oriented synchronous links.

pub mod gpio;
pub mod link;

pub use gpio::IndicatorPin;
pub use link::ByteLink;
