//! Startup waits for clock-tree bring-up
//!
//! Each bring-up stage busy-polls a ready flag against the tick counter.
//! A stage that does not come up within its timeout reports a
//! per-subsystem fault and bring-up stops.

use crate::fault::{Fault, Subsystem};
use crate::tick::Deadline;

/// Busy-poll `ready` until it returns true or `timeout` ticks elapse
///
/// `now` reads the current tick counter; the elapsed check uses
/// wrapping arithmetic, so the wait is correct across a counter
/// overflow. On timeout returns `Fault::StartupTimeout(subsystem)` for
/// latching.
pub fn wait_ready<N, R>(
    mut now: N,
    timeout: u32,
    subsystem: Subsystem,
    mut ready: R,
) -> Result<(), Fault>
where
    N: FnMut() -> u32,
    R: FnMut() -> bool,
{
    let deadline = Deadline::new(now(), timeout);
    while !ready() {
        if deadline.expired(now()) {
            return Err(Fault::StartupTimeout(subsystem));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_immediately() {
        let mut ticks = 0u32;
        let result = wait_ready(
            || {
                ticks += 1;
                ticks
            },
            10,
            Subsystem::Oscillator,
            || true,
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_ready_after_a_few_ticks() {
        let mut ticks = 0u32;
        let mut polls = 0u32;
        let result = wait_ready(
            || {
                ticks += 1;
                ticks
            },
            10,
            Subsystem::Pll,
            || {
                polls += 1;
                polls >= 5
            },
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_timeout_reports_subsystem() {
        let mut ticks = 0u32;
        let result = wait_ready(
            || {
                ticks += 1;
                ticks
            },
            10,
            Subsystem::ClockSwitch,
            || false,
        );
        assert_eq!(result, Err(Fault::StartupTimeout(Subsystem::ClockSwitch)));
        // The check fired within one tick of the deadline.
        assert!(ticks <= 13);
    }

    #[test]
    fn test_wait_across_counter_wraparound() {
        let mut ticks = u32::MAX - 3;
        let result = wait_ready(
            || {
                ticks = ticks.wrapping_add(1);
                ticks
            },
            100,
            Subsystem::Oscillator,
            {
                let mut polls = 0;
                move || {
                    polls += 1;
                    polls >= 10
                }
            },
        );
        assert_eq!(result, Ok(()));
    }
}
