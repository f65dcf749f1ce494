//! # Configuration
//!
//! Compile-time constants governing the task set, the message queue, and the
//! timing instrumentation. All limits are fixed at compile time — no dynamic
//! allocation anywhere in the crate.

/// Scheduler tick frequency in Hz. Periods and deadlines below are expressed
/// in these ticks.
pub const TICK_HZ: u32 = 1000;

/// Core clock frequency in Hz (STM32F4 on the 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Capacity of the shared message queue, in descriptors. A send against a
/// full queue fails without blocking and the producer drops the message.
pub const MSG_QUEUE_CAPACITY: usize = 20;

/// Period and relative deadline of each edge-monitor task, in ticks.
pub const EDGE_MONITOR_PERIOD: u32 = 50;
pub const EDGE_MONITOR_DEADLINE: u32 = 50;

/// Period and relative deadline of the status transmitter, in ticks.
pub const STATUS_TX_PERIOD: u32 = 100;
pub const STATUS_TX_DEADLINE: u32 = 100;

/// Period and relative deadline of the queue-drain task, in ticks. The
/// deadline covers the whole drain loop of one activation, not one message.
pub const QUEUE_DRAIN_PERIOD: u32 = 20;
pub const QUEUE_DRAIN_DEADLINE: u32 = 20;

/// Periods and relative deadlines of the two synthetic load tasks, in ticks.
pub const LOAD_SHORT_PERIOD: u32 = 10;
pub const LOAD_SHORT_DEADLINE: u32 = 10;
pub const LOAD_LONG_PERIOD: u32 = 100;
pub const LOAD_LONG_DEADLINE: u32 = 100;

/// Busy-work target of each synthetic load activation, in ticks. The actual
/// iteration counts are derived at startup by [`crate::load::CalibratedSpin`];
/// these targets are portable, the iteration counts are not.
pub const LOAD_SHORT_WORK_TICKS: u32 = 5;
pub const LOAD_LONG_WORK_TICKS: u32 = 12;

/// Iterations executed while measuring the spin rate at startup. Long enough
/// to span several ticks at the slowest supported core clock.
pub const SPIN_PROBE_ITERS: u32 = 100_000;

/// Default stack budget handed to the scheduler per task, in words.
pub const TASK_STACK_WORDS: usize = 128;

/// Advisory priority hint passed at registration. Dispatch order is decided
/// by the scheduler from absolute deadlines; this value is not consulted for
/// ordering.
pub const TASK_PRIORITY_HINT: u8 = 2;

/// Interval between diagnostic log lines emitted by the firmware, in ticks.
pub const DIAG_REPORT_PERIOD: u32 = 1000;
