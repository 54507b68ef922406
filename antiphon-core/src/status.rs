//! Blink-coded status reporting
//!
//! Driven once per tick. While the fault latch is clear the reporter is
//! idle; when a fault is latched, the fault indicator blinks `code`
//! times per reporting cycle (2 x code - 1 pin transitions), repeating
//! until the latch is externally reset. The success indicator is toggled
//! by the verifier on each matching exchange and forced off while a
//! blink pattern is active.

use crate::traits::IndicatorPin;

/// Blink pattern timing, in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkTiming {
    /// Overall reporting cycle period
    pub long_ticks: u32,
    /// Width of one blink phase
    pub short_ticks: u32,
}

impl BlinkTiming {
    /// Timing used on real hardware with a 1 ms tick
    pub const DEFAULT: Self = Self {
        long_ticks: 1000,
        short_ticks: 200,
    };
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Status reporter driving the two indicator outputs
///
/// Owns the fault and success pins. `on_tick` must be called exactly
/// once per tick, from the tick interrupt.
#[derive(Debug)]
pub struct StatusReporter<F, S> {
    fault_pin: F,
    success_pin: S,
    timing: BlinkTiming,
    /// Ticks remaining in the current reporting cycle
    long_remaining: u32,
    /// Ticks remaining in the current blink phase
    short_remaining: u32,
    /// Fault-pin transitions left in the current pattern
    budget: u16,
}

impl<F: IndicatorPin, S: IndicatorPin> StatusReporter<F, S> {
    /// Create a reporter with both indicators untouched
    pub const fn new(fault_pin: F, success_pin: S, timing: BlinkTiming) -> Self {
        Self {
            fault_pin,
            success_pin,
            long_remaining: timing.long_ticks,
            short_remaining: timing.short_ticks,
            budget: 0,
            timing,
        }
    }

    /// Toggle the success indicator after a verified exchange
    pub fn exchange_matched(&mut self) {
        self.success_pin.toggle();
    }

    /// Scheduling step, once per tick
    ///
    /// `code` is the latch's current blink code, or `None` while the
    /// latch is clear or suppressed.
    pub fn on_tick(&mut self, code: Option<u8>) {
        if self.long_remaining == 0 {
            match code {
                None => {
                    // Idle: nothing distinguishing, just restart the cycle.
                    self.long_remaining = self.timing.long_ticks;
                }
                Some(code) => {
                    self.budget = 2 * u16::from(code) - 1;
                    self.short_remaining = self.timing.short_ticks;
                    self.long_remaining = self.timing.long_ticks * 2;
                    self.fault_pin.set_high();
                    self.success_pin.set_low();
                }
            }
        } else {
            self.long_remaining -= 1;
        }

        if self.budget > 0 {
            if self.short_remaining == 0 {
                self.fault_pin.toggle();
                self.short_remaining = self.timing.short_ticks;
                self.budget -= 1;
            } else {
                self.short_remaining -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock pin that counts every state transition.
    #[derive(Default)]
    struct MockPin {
        high: bool,
        transitions: u32,
    }

    impl IndicatorPin for MockPin {
        fn set_high(&mut self) {
            if !self.high {
                self.transitions += 1;
            }
            self.high = true;
        }

        fn set_low(&mut self) {
            if self.high {
                self.transitions += 1;
            }
            self.high = false;
        }

        fn toggle(&mut self) {
            self.high = !self.high;
            self.transitions += 1;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    const TIMING: BlinkTiming = BlinkTiming {
        long_ticks: 20,
        short_ticks: 3,
    };

    fn reporter() -> StatusReporter<MockPin, MockPin> {
        StatusReporter::new(MockPin::default(), MockPin::default(), TIMING)
    }

    #[test]
    fn test_idle_leaves_indicators_alone() {
        let mut rep = reporter();
        for _ in 0..200 {
            rep.on_tick(None);
        }
        assert_eq!(rep.fault_pin.transitions, 0);
        assert_eq!(rep.success_pin.transitions, 0);
    }

    #[test]
    fn test_code_three_gives_five_toggles_per_cycle() {
        let mut rep = reporter();

        // Run until the first long cycle expires and the pattern arms.
        for _ in 0..=TIMING.long_ticks {
            rep.on_tick(Some(3));
        }
        assert!(rep.fault_pin.is_set_high());
        let forced_on = rep.fault_pin.transitions;

        // Drain the whole pattern: 5 toggle transitions (2 x 3 - 1).
        for _ in 0..(5 * (TIMING.short_ticks + 1)) {
            rep.on_tick(Some(3));
        }
        assert_eq!(rep.fault_pin.transitions - forced_on, 5);
        assert_eq!(rep.budget, 0);
    }

    #[test]
    fn test_pattern_repeats_until_cleared() {
        let mut rep = reporter();

        // Two full reporting cycles: the doubled long period plus slack.
        let mut toggles_per_cycle = [0u32; 2];
        let mut last = 0;
        for cycle in &mut toggles_per_cycle {
            for _ in 0..(2 * TIMING.long_ticks + 1) {
                rep.on_tick(Some(2));
            }
            *cycle = rep.fault_pin.transitions - last;
            last = rep.fault_pin.transitions;
        }
        // 3 toggles (2 x 2 - 1) plus the forced-on edge per cycle.
        assert_eq!(toggles_per_cycle[0], toggles_per_cycle[1]);
        assert!(toggles_per_cycle[0] >= 3);
    }

    #[test]
    fn test_idle_resumes_on_next_cycle_boundary() {
        let mut rep = reporter();

        // Arm and drain one pattern.
        for _ in 0..(2 * TIMING.long_ticks + 1) {
            rep.on_tick(Some(1));
        }
        let after_pattern = rep.fault_pin.transitions;
        assert!(after_pattern > 0);

        // Latch cleared: no new pattern arms on later boundaries.
        for _ in 0..(4 * TIMING.long_ticks) {
            rep.on_tick(None);
        }
        assert_eq!(rep.fault_pin.transitions, after_pattern);
    }

    #[test]
    fn test_fault_onset_forces_success_off() {
        let mut rep = reporter();
        rep.exchange_matched();
        assert!(rep.success_pin.is_set_high());

        for _ in 0..=TIMING.long_ticks {
            rep.on_tick(Some(1));
        }
        assert!(rep.success_pin.is_set_low());
        assert!(rep.fault_pin.is_set_high());
    }

    #[test]
    fn test_success_toggles_per_match() {
        let mut rep = reporter();
        rep.exchange_matched();
        rep.exchange_matched();
        rep.exchange_matched();
        assert!(rep.success_pin.is_set_high());
        assert_eq!(rep.success_pin.transitions, 3);
    }
}
