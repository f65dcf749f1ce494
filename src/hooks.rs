//! # Scheduler Hooks
//!
//! The crate's face toward the scheduler's switch path. The port layer wires
//! [`on_switch_in`] / [`on_switch_out`] around every context switch and
//! [`on_tick`] into the tick interrupt; this module fans the events out to
//! the global [`TraceRecorder`], the task registry, and the observation-pin
//! observer.
//!
//! The switch entry points run in the switch path itself: they are O(1),
//! never block, never allocate, never touch the message queue, and access
//! the globals directly instead of opening a nested critical section — the
//! switch is already serialized when they run. Task-context consumers read
//! the same state through [`snapshot`], which does mask interrupts.

use core::ptr::addr_of_mut;

use crate::io::{Level, SwitchObserver};
use crate::registry;
use crate::sync;
use crate::task::{TaskSlot, TraceId};
use crate::trace::TraceRecorder;

static mut RECORDER: TraceRecorder = TraceRecorder::new();
static mut OBSERVER: Option<&'static mut dyn SwitchObserver> = None;

/// Install the observation-pin observer and fix the trace epoch. Call once
/// at startup, before the scheduler starts switching.
pub fn init(observer: &'static mut dyn SwitchObserver, now: u32) {
    sync::critical_section(|_| unsafe {
        (*addr_of_mut!(RECORDER)).start(now);
        *addr_of_mut!(OBSERVER) = Some(observer);
    });
}

/// The scheduler switched `id` onto the processor at counter value `now`.
pub fn on_switch_in(id: TraceId, now: u32) {
    unsafe {
        (*addr_of_mut!(RECORDER)).switch_in(id, now);
        if let Some(observer) = (*addr_of_mut!(OBSERVER)).as_mut() {
            observer.context_mark(id, Level::High);
        }
    }
}

/// The scheduler switched `id` off the processor at counter value `now`.
/// Credits the busy delta and refreshes the CPU-load figure.
pub fn on_switch_out(id: TraceId, now: u32) {
    unsafe {
        let registry = &mut *registry::registry_raw();
        (*addr_of_mut!(RECORDER)).switch_out(registry, id, now);
        if let Some(observer) = (*addr_of_mut!(OBSERVER)).as_mut() {
            observer.context_mark(id, Level::Low);
        }
    }
}

/// One scheduler tick elapsed: pulse the tick observation pin.
pub fn on_tick() {
    unsafe {
        if let Some(observer) = (*addr_of_mut!(OBSERVER)).as_mut() {
            observer.tick_pulse();
        }
    }
}

/// Read-only copy of the instrumentation state, for diagnostic consumers.
#[derive(Debug, Clone, Copy)]
pub struct TraceSnapshot {
    pub load_percent: u32,
    pub deadline_misses: [u32; TaskSlot::COUNT],
    pub busy_ticks: [u64; TaskSlot::COUNT],
}

/// Copy the counters out from task context.
pub fn snapshot() -> TraceSnapshot {
    sync::critical_section(|_| unsafe {
        let reg = &*registry::registry_raw();
        let recorder = &*addr_of_mut!(RECORDER);
        let mut snap = TraceSnapshot {
            load_percent: recorder.load_percent(),
            deadline_misses: [0; TaskSlot::COUNT],
            busy_ticks: [0; TaskSlot::COUNT],
        };
        for slot in TaskSlot::ALL {
            snap.deadline_misses[slot.index()] = reg.record(slot).deadline_misses();
            snap.busy_ticks[slot.index()] = reg.record(slot).busy_ticks();
        }
        snap
    })
}
