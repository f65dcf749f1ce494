//! # Execution Trace Recorder
//!
//! Turns the scheduler's raw switch events into per-task busy time and an
//! overall CPU-load percentage.
//!
//! On switch-in the recorder stamps the incoming identity; on switch-out it
//! forms the busy delta with modular subtraction, credits it to the task's
//! record and to a running system total, then recomputes
//! `load = total_busy × 100 / elapsed_since_start`. The idle identity is
//! excluded from busy time but its switch-out still refreshes the load, so
//! the figure decays while the system idles.
//!
//! Every method is a handful of integer operations — constant time, no
//! blocking, no allocation, no queue access — because the callers sit in the
//! scheduler's switch path.

use crate::registry::TaskRegistry;
use crate::task::{TaskSlot, TraceId};

/// Process-wide trace state: one switch-in mark per task, the running busy
/// total, the counter reading at system start, and the last computed load.
pub struct TraceRecorder {
    in_marks: [Option<u32>; TaskSlot::COUNT],
    total_busy: u64,
    epoch: u32,
    load_pct: u32,
}

impl TraceRecorder {
    pub const fn new() -> Self {
        Self {
            in_marks: [None; TaskSlot::COUNT],
            total_busy: 0,
            epoch: 0,
            load_pct: 0,
        }
    }

    /// Fix the system start timestamp all elapsed-time math is relative to.
    /// The load figure is meaningful until the free-running counter wraps a
    /// full cycle past this point.
    pub fn start(&mut self, now: u32) {
        self.epoch = now;
    }

    /// The identity `id` was switched onto the processor at `now`.
    pub fn switch_in(&mut self, id: TraceId, now: u32) {
        if let TraceId::Task(slot) = id {
            self.in_marks[slot.index()] = Some(now);
        }
    }

    /// The identity `id` was switched off the processor at `now`. Credits
    /// the busy delta (tasks only) and recomputes the load percentage.
    ///
    /// A switch-out without a matching switch-in credits nothing; the load
    /// is still refreshed.
    pub fn switch_out(&mut self, registry: &mut TaskRegistry, id: TraceId, now: u32) {
        if let TraceId::Task(slot) = id {
            if let Some(mark) = self.in_marks[slot.index()].take() {
                let delta = now.wrapping_sub(mark);
                registry.record_mut(slot).add_busy(delta);
                self.total_busy += delta as u64;
            }
        }

        let elapsed = now.wrapping_sub(self.epoch) as u64;
        if elapsed > 0 {
            self.load_pct = (self.total_busy.saturating_mul(100) / elapsed).min(u32::MAX as u64) as u32;
        }
    }

    /// Last computed CPU load, in whole percent.
    #[inline]
    pub const fn load_percent(&self) -> u32 {
        self.load_pct
    }

    /// Busy time accumulated across all tasks since start.
    #[inline]
    pub const fn total_busy(&self) -> u64 {
        self.total_busy
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
