//! # Calibrated Busy-Work
//!
//! The synthetic load tasks must burn a known number of ticks of processor
//! time without any observable side effect. A raw iteration count would tie
//! that to one core clock, so the spin rate is measured once at startup
//! against the tick counter and the per-activation counts are derived from
//! the target tick budgets in [`crate::config`].

use core::hint;

use crate::io::TickSource;

/// Busy-wait primitive with a measured iterations-per-tick rate.
#[derive(Debug, Clone, Copy)]
pub struct CalibratedSpin {
    iters_per_tick: u32,
}

impl CalibratedSpin {
    /// Measure the spin rate by timing `probe_iters` iterations against the
    /// tick counter. Call once at initialization, before the task set runs.
    ///
    /// A probe too short to span a whole tick calibrates to the full probe
    /// count per tick — coarse, but never a division by zero.
    pub fn calibrate(ticks: &impl TickSource, probe_iters: u32) -> Self {
        let started = ticks.now();
        spin_iters(probe_iters);
        let elapsed = ticks.now().wrapping_sub(started).max(1);
        Self {
            iters_per_tick: (probe_iters / elapsed).max(1),
        }
    }

    /// Build from a known rate. Used by tests and by targets with a
    /// pre-measured constant.
    pub const fn from_rate(iters_per_tick: u32) -> Self {
        Self {
            iters_per_tick: if iters_per_tick == 0 { 1 } else { iters_per_tick },
        }
    }

    /// Burn approximately `ticks` ticks of processor time.
    pub fn consume(&self, ticks: u32) {
        spin_iters(self.iters_per_tick.saturating_mul(ticks));
    }

    #[inline]
    pub const fn iters_per_tick(&self) -> u32 {
        self.iters_per_tick
    }
}

/// The measured loop. `black_box` keeps the accumulator alive so the loop
/// survives optimization at the same cost it was calibrated at.
fn spin_iters(iters: u32) {
    let mut acc: u32 = 0;
    for _ in 0..iters {
        acc = hint::black_box(acc.wrapping_add(1));
    }
    hint::black_box(acc);
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mock::SteppingTicks;

    #[test]
    fn test_calibration_divides_probe_by_elapsed() {
        // The counter advances 25 ticks between the two readings.
        let ticks = SteppingTicks::new(0, 25);
        let spin = CalibratedSpin::calibrate(&ticks, 100_000);
        assert_eq!(spin.iters_per_tick(), 4_000);
    }

    #[test]
    fn test_calibration_with_frozen_counter_does_not_divide_by_zero() {
        let ticks = SteppingTicks::new(7, 0);
        let spin = CalibratedSpin::calibrate(&ticks, 50_000);
        assert_eq!(spin.iters_per_tick(), 50_000);
    }

    #[test]
    fn test_calibration_across_counter_wrap() {
        let ticks = SteppingTicks::new(u32::MAX - 9, 20);
        let spin = CalibratedSpin::calibrate(&ticks, 100_000);
        assert_eq!(spin.iters_per_tick(), 5_000);
    }

    #[test]
    fn test_consume_completes_with_no_side_effects() {
        let spin = CalibratedSpin::from_rate(1_000);
        spin.consume(3);
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let spin = CalibratedSpin::from_rate(0);
        assert_eq!(spin.iters_per_tick(), 1);
    }
}
