//! # Task Model
//!
//! Defines the fixed task set: each of the six periodic tasks has a
//! [`TaskSlot`] identity, a [`TaskRecord`] carrying its timing history, and a
//! [`TaskSpec`] row in the declarative registration table.
//!
//! The set is closed at compile time. There is no dynamic task creation or
//! destruction; records live for the whole powered lifetime of the system and
//! their miss counters and busy time only ever grow.

use crate::config::{
    EDGE_MONITOR_DEADLINE, EDGE_MONITOR_PERIOD, LOAD_LONG_DEADLINE, LOAD_LONG_PERIOD,
    LOAD_SHORT_DEADLINE, LOAD_SHORT_PERIOD, QUEUE_DRAIN_DEADLINE, QUEUE_DRAIN_PERIOD,
    STATUS_TX_DEADLINE, STATUS_TX_PERIOD,
};

// ---------------------------------------------------------------------------
// Task identity
// ---------------------------------------------------------------------------

/// Identity of one task in the fixed six-task set. Doubles as the index into
/// every per-task array (records, switch-in marks, observation pins).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSlot {
    /// Edge monitor on discrete input A.
    EdgeMonitorA,
    /// Edge monitor on discrete input B.
    EdgeMonitorB,
    /// Periodic status transmitter.
    StatusTx,
    /// Drains the message queue into the serial sink.
    QueueDrain,
    /// Short-period synthetic load (10-tick period).
    LoadShort,
    /// Long-period synthetic load (100-tick period).
    LoadLong,
}

impl TaskSlot {
    /// Number of tasks in the set.
    pub const COUNT: usize = 6;

    /// All slots, in registration order.
    pub const ALL: [TaskSlot; TaskSlot::COUNT] = [
        TaskSlot::EdgeMonitorA,
        TaskSlot::EdgeMonitorB,
        TaskSlot::StatusTx,
        TaskSlot::QueueDrain,
        TaskSlot::LoadShort,
        TaskSlot::LoadLong,
    ];

    /// Index into per-task arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Release period in scheduler ticks.
    pub const fn period(self) -> u32 {
        match self {
            TaskSlot::EdgeMonitorA | TaskSlot::EdgeMonitorB => EDGE_MONITOR_PERIOD,
            TaskSlot::StatusTx => STATUS_TX_PERIOD,
            TaskSlot::QueueDrain => QUEUE_DRAIN_PERIOD,
            TaskSlot::LoadShort => LOAD_SHORT_PERIOD,
            TaskSlot::LoadLong => LOAD_LONG_PERIOD,
        }
    }

    /// Relative deadline in scheduler ticks, measured from release to the
    /// end of that activation's work.
    pub const fn deadline(self) -> u32 {
        match self {
            TaskSlot::EdgeMonitorA | TaskSlot::EdgeMonitorB => EDGE_MONITOR_DEADLINE,
            TaskSlot::StatusTx => STATUS_TX_DEADLINE,
            TaskSlot::QueueDrain => QUEUE_DRAIN_DEADLINE,
            TaskSlot::LoadShort => LOAD_SHORT_DEADLINE,
            TaskSlot::LoadLong => LOAD_LONG_DEADLINE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TaskSlot::EdgeMonitorA => "edge_monitor_a",
            TaskSlot::EdgeMonitorB => "edge_monitor_b",
            TaskSlot::StatusTx => "status_tx",
            TaskSlot::QueueDrain => "queue_drain",
            TaskSlot::LoadShort => "load_short",
            TaskSlot::LoadLong => "load_long",
        }
    }
}

/// Identity seen by the switch-event hooks: one of the six tasks, or the
/// distinguished idle context. Idle drives its own observation mark but never
/// accumulates busy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceId {
    Task(TaskSlot),
    Idle,
}

// ---------------------------------------------------------------------------
// Per-task timing record
// ---------------------------------------------------------------------------

/// Timing history of one task. Created once at initialization and never
/// destroyed.
///
/// The activation fields are written only through that task's own activation
/// bracket; `busy_ticks` is written only by the trace recorder on switch
/// events attributed to this slot. Both the miss counter and the busy time
/// are monotonically non-decreasing.
#[derive(Debug, Clone, Copy)]
pub struct TaskRecord {
    slot: TaskSlot,
    period: u32,
    deadline: u32,
    last_activation_start: u32,
    last_activation_end: u32,
    busy_ticks: u64,
    deadline_misses: u32,
}

impl TaskRecord {
    pub const fn new(slot: TaskSlot) -> Self {
        Self {
            slot,
            period: slot.period(),
            deadline: slot.deadline(),
            last_activation_start: 0,
            last_activation_end: 0,
            busy_ticks: 0,
            deadline_misses: 0,
        }
    }

    /// Record one completed activation bracketed by `start` and `end` tick
    /// stamps. Increments the miss counter by exactly one when the measured
    /// body time exceeds the relative deadline, by zero otherwise; an
    /// activation landing exactly on the deadline meets it.
    ///
    /// The elapsed time is formed with modular subtraction, so a bracket
    /// spanning a single tick-counter wrap is still measured correctly.
    pub fn apply_activation(&mut self, start: u32, end: u32) {
        self.last_activation_start = start;
        self.last_activation_end = end;
        if end.wrapping_sub(start) > self.deadline {
            self.deadline_misses += 1;
        }
    }

    /// Credit `delta` counts of processor time to this task. Called by the
    /// trace recorder on switch-out.
    #[inline]
    pub fn add_busy(&mut self, delta: u32) {
        self.busy_ticks += delta as u64;
    }

    #[inline]
    pub const fn slot(&self) -> TaskSlot {
        self.slot
    }

    #[inline]
    pub const fn period(&self) -> u32 {
        self.period
    }

    #[inline]
    pub const fn deadline(&self) -> u32 {
        self.deadline
    }

    #[inline]
    pub const fn deadline_misses(&self) -> u32 {
        self.deadline_misses
    }

    #[inline]
    pub const fn busy_ticks(&self) -> u64 {
        self.busy_ticks
    }

    #[inline]
    pub const fn last_activation(&self) -> (u32, u32) {
        (self.last_activation_start, self.last_activation_end)
    }
}

// ---------------------------------------------------------------------------
// Declarative registration table entry
// ---------------------------------------------------------------------------

/// Entry point invoked by the scheduler on every release of the task. The
/// opaque `arg` given at registration is passed back on each call.
pub type TaskEntry = fn(arg: usize);

/// One row of the declarative task table handed to the scheduler at startup.
/// Period and deadline come from the slot, so the table cannot disagree with
/// the timing the records enforce.
#[derive(Clone, Copy)]
pub struct TaskSpec {
    pub slot: TaskSlot,
    pub name: &'static str,
    pub entry: TaskEntry,
    pub arg: usize,
    pub stack_words: usize,
    /// Advisory only; dispatch order is deadline-driven.
    pub priority_hint: u8,
}

impl TaskSpec {
    #[inline]
    pub const fn period(&self) -> u32 {
        self.slot.period()
    }

    #[inline]
    pub const fn deadline(&self) -> u32 {
        self.slot.deadline()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
