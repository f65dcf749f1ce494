//! # Task Registry
//!
//! Owns the [`TaskRecord`] of every task in the fixed set and is the single
//! scheduler-visible home for their timing state. Task bodies report their
//! activation brackets here; the trace recorder credits busy time here; any
//! diagnostic consumer reads the counters back through the same accessors.
//! Nothing else holds a reference to a record.
//!
//! The module also carries the registration seam: a declarative table of
//! [`TaskSpec`] rows is handed to the external scheduler through
//! [`SchedulerPort`], one call per task, in table order.

use core::ptr::addr_of_mut;

use crate::sync;
use crate::task::{TaskRecord, TaskSlot, TaskSpec};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// All six task records, indexed by [`TaskSlot`]. Records are created here at
/// initialization and live for the whole uptime of the system.
pub struct TaskRegistry {
    records: [TaskRecord; TaskSlot::COUNT],
}

impl TaskRegistry {
    pub const fn new() -> Self {
        Self {
            records: [
                TaskRecord::new(TaskSlot::EdgeMonitorA),
                TaskRecord::new(TaskSlot::EdgeMonitorB),
                TaskRecord::new(TaskSlot::StatusTx),
                TaskRecord::new(TaskSlot::QueueDrain),
                TaskRecord::new(TaskSlot::LoadShort),
                TaskRecord::new(TaskSlot::LoadLong),
            ],
        }
    }

    #[inline]
    pub fn record(&self, slot: TaskSlot) -> &TaskRecord {
        &self.records[slot.index()]
    }

    #[inline]
    pub fn record_mut(&mut self, slot: TaskSlot) -> &mut TaskRecord {
        &mut self.records[slot.index()]
    }

    #[inline]
    pub fn records(&self) -> &[TaskRecord; TaskSlot::COUNT] {
        &self.records
    }
}

// ---------------------------------------------------------------------------
// Global instance
// ---------------------------------------------------------------------------

/// The process-wide registry.
///
/// Task-context access goes through the critical-section functions below.
/// The switch-path hooks use [`registry_raw`] instead: they already run with
/// the switch serialized and must not mask interrupts again.
static mut REGISTRY: TaskRegistry = TaskRegistry::new();

/// Raw access for the scheduler's switch path.
///
/// # Safety
/// Callers must be executing in the context-switch path (or with interrupts
/// otherwise masked) so that no task-context accessor can run concurrently.
#[inline]
pub(crate) unsafe fn registry_raw() -> *mut TaskRegistry {
    addr_of_mut!(REGISTRY)
}

/// Record one completed activation bracket for `slot`. Updates the record's
/// start/end stamps and, on an overrun, its miss counter.
pub fn note_activation(slot: TaskSlot, start: u32, end: u32) {
    sync::critical_section(|_| unsafe {
        (*addr_of_mut!(REGISTRY)).record_mut(slot).apply_activation(start, end);
    });
}

/// Read one task's monotonic deadline-miss counter.
pub fn deadline_misses(slot: TaskSlot) -> u32 {
    sync::critical_section(|_| unsafe {
        (*addr_of_mut!(REGISTRY)).record(slot).deadline_misses()
    })
}

/// Run a closure over the registry from task context.
pub fn with_registry<R>(f: impl FnOnce(&TaskRegistry) -> R) -> R {
    sync::critical_section(|_| unsafe { f(&*addr_of_mut!(REGISTRY)) })
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Failure to register the task set. The only fatal condition in this
/// subsystem: the caller parks the core instead of degrading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// The scheduler could not allocate a control structure or stack for the
    /// task being registered.
    Exhausted,
}

/// The consumed scheduler interface. The platform scheduler releases each
/// registered task once per its period and dispatches by earliest absolute
/// deadline; the registration priority hint is advisory only.
pub trait SchedulerPort {
    fn register_periodic_task(&mut self, spec: &TaskSpec) -> Result<(), RegisterError>;
}

/// Hand the declarative task table to the scheduler, in table order. Stops
/// at the first failure; partial registration is not unwound, since the
/// caller halts on error anyway.
pub fn register_task_set<P: SchedulerPort>(
    port: &mut P,
    table: &[TaskSpec],
) -> Result<(), RegisterError> {
    for spec in table {
        port.register_periodic_task(spec)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    #[test]
    fn test_new_registry_has_one_clean_record_per_slot() {
        let reg = TaskRegistry::new();
        for slot in TaskSlot::ALL {
            let rec = reg.record(slot);
            assert_eq!(rec.slot(), slot);
            assert_eq!(rec.deadline_misses(), 0);
            assert_eq!(rec.busy_ticks(), 0);
            assert_eq!(rec.period(), slot.period());
        }
    }

    #[test]
    fn test_record_mut_targets_the_right_slot() {
        let mut reg = TaskRegistry::new();
        reg.record_mut(TaskSlot::QueueDrain).apply_activation(0, 100);
        assert_eq!(reg.record(TaskSlot::QueueDrain).deadline_misses(), 1);
        for slot in TaskSlot::ALL {
            if slot != TaskSlot::QueueDrain {
                assert_eq!(reg.record(slot).deadline_misses(), 0);
            }
        }
    }

    struct CollectingPort {
        registered: Vec<&'static str, { TaskSlot::COUNT }>,
        fail_after: Option<usize>,
    }

    impl SchedulerPort for CollectingPort {
        fn register_periodic_task(&mut self, spec: &TaskSpec) -> Result<(), RegisterError> {
            if let Some(limit) = self.fail_after {
                if self.registered.len() >= limit {
                    return Err(RegisterError::Exhausted);
                }
            }
            self.registered.push(spec.name).unwrap();
            Ok(())
        }
    }

    fn noop(_arg: usize) {}

    fn table() -> [TaskSpec; TaskSlot::COUNT] {
        TaskSlot::ALL.map(|slot| TaskSpec {
            slot,
            name: slot.name(),
            entry: noop,
            arg: slot.index(),
            stack_words: 128,
            priority_hint: 2,
        })
    }

    #[test]
    fn test_register_task_set_registers_in_table_order() {
        let mut port = CollectingPort { registered: Vec::new(), fail_after: None };
        register_task_set(&mut port, &table()).unwrap();
        let names: Vec<_, { TaskSlot::COUNT }> =
            TaskSlot::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(port.registered, names);
    }

    #[test]
    fn test_registration_stops_on_exhaustion() {
        let mut port = CollectingPort { registered: Vec::new(), fail_after: Some(2) };
        assert_eq!(register_task_set(&mut port, &table()), Err(RegisterError::Exhausted));
        assert_eq!(port.registered.len(), 2, "no further registrations after the failure");
    }
}
