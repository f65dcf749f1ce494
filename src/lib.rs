//! # tickwatch
//!
//! A deadline-monitored periodic task set for a preemptive, deadline-ordered
//! scheduler on a single-core Cortex-M controller. Six fixed tasks sample two
//! discrete inputs, emit a periodic status string, relay pending messages to
//! a serial sink, and emulate background load — while every activation is
//! checked against its relative deadline and every context switch feeds a
//! CPU-utilization trace.
//!
//! The scheduling algorithm itself, the register-level drivers, and the
//! kernel bootstrap are external collaborators, consumed through the narrow
//! seams in [`registry`] and [`io`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Periodic Task Bodies (tasks.rs)          │
//! │  EdgeMonitor ×2 · StatusTransmitter · QueueDrain ·       │
//! │  SyntheticLoad ×2 · instrumented activation bracket      │
//! ├───────────────────────────┬──────────────────────────────┤
//! │  Message Queue (queue.rs) │  Task Registry (registry.rs) │
//! │  ─ bounded FIFO, cap 20   │  ─ TaskRecord per slot       │
//! │  ─ zero-timeout send/recv │  ─ deadline-miss counters    │
//! │  ─ critical-section facade│  ─ SchedulerPort + table     │
//! ├───────────────────────────┴──────────────────────────────┤
//! │     Execution Trace (trace.rs) + Hooks (hooks.rs)        │
//! │  switch-in/out timestamps → per-task busy time → load %  │
//! ├──────────────────────────────────────────────────────────┤
//! │   Driver Interfaces (io.rs) · Calibrated Spin (load.rs)  │
//! │   pins · serial sink · tick sources · host mocks         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Data flows producers → queue → drain → serial. The two instrumentation
//! paths (deadline bracket per activation, busy time per switch event) are
//! orthogonal to the data path and never alter its outcome.
//!
//! ## Memory Model
//!
//! - **No heap**: the queue, records, and trace state are statically
//!   allocated; bounded collections come from `heapless`
//! - **Critical sections**: `cortex_m::interrupt::free` around every shared
//!   access from task context
//! - **Switch path**: lock-free, constant-time hook bodies
//!
//! All timing math is unsigned and modular, so durations stay correct across
//! a single wrap of either counter.

#![no_std]

pub mod config;
pub mod hooks;
pub mod io;
pub mod load;
pub mod queue;
pub mod registry;
pub mod sync;
pub mod task;
pub mod tasks;
pub mod trace;
