//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstraction for the Cortex-M port. The
//! shared message queue and the task registry are only touched from task
//! context through one of these sections, which is what makes their
//! enqueue/dequeue and record updates atomic with respect to preemption.
//!
//! The scheduler's switch-path hooks deliberately do **not** use this: they
//! already run with the switch serialized and must stay lock-free.

use cortex_m::interrupt;

/// Execute a closure with interrupts masked.
///
/// Keep the enclosed work short — a queue descriptor copy or a single record
/// update. Long sections stretch the latency of every deadline in the system.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
