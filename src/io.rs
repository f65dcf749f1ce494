//! # Driver Interfaces
//!
//! Narrow interfaces over the externally provided drivers: discrete inputs
//! and outputs, the serial sink the drain task forwards into, and the two
//! time bases (scheduler ticks for deadlines, a free-running counter for the
//! execution trace).
//!
//! The firmware image implements these over the vendor HAL; the [`mock`]
//! module implements them over plain memory so every task body and the whole
//! instrumentation path can be exercised on the host.

use crate::task::TraceId;

/// Logic level of a discrete input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// A discrete input sampled by the edge monitors.
pub trait InputPin {
    fn read(&mut self) -> Level;
}

/// A discrete output. Used for the per-task observation pins that bracket
/// activation bodies for logic-analyzer capture.
pub trait OutputPin {
    fn set(&mut self, level: Level);

    fn set_high(&mut self) {
        self.set(Level::High);
    }

    fn set_low(&mut self) {
        self.set(Level::Low);
    }
}

/// Byte sink for drained messages. One call forwards one message payload,
/// length preserved exactly.
pub trait SerialSink {
    fn write(&mut self, bytes: &[u8]);
}

/// A monotonically advancing 32-bit counter. Durations derived from it use
/// unsigned modular subtraction, so readings stay meaningful across a single
/// wrap of the counter.
pub trait TickSource {
    fn now(&self) -> u32;
}

/// Visibility hooks driven from the scheduler's switch path: one context mark
/// per task identity (including the idle identity) and a pulse per tick.
/// Implementations must be O(1) and must not block — they run inside the
/// context switch.
pub trait SwitchObserver {
    /// The identity `id` entered (`High`) or left (`Low`) the processor.
    fn context_mark(&mut self, id: TraceId, level: Level);

    /// One scheduler tick elapsed; pulse the tick pin high-then-low.
    fn tick_pulse(&mut self);
}

/// In-memory stand-ins for the driver interfaces, used by the host tests.
pub mod mock {
    use super::{InputPin, Level, OutputPin, SerialSink, TickSource};
    use core::cell::Cell;
    use heapless::Vec;

    /// Input pin replaying a scripted sequence of levels, one per read.
    /// Holds the last scripted level once the script runs out.
    pub struct ScriptedInput {
        script: Vec<Level, 16>,
        cursor: usize,
        pub reads: usize,
    }

    impl ScriptedInput {
        pub fn new(levels: &[Level]) -> Self {
            let mut script = Vec::new();
            for &l in levels {
                script.push(l).ok();
            }
            Self {
                script,
                cursor: 0,
                reads: 0,
            }
        }
    }

    impl InputPin for ScriptedInput {
        fn read(&mut self) -> Level {
            self.reads += 1;
            let level = self.script[self.cursor.min(self.script.len() - 1)];
            if self.cursor + 1 < self.script.len() {
                self.cursor += 1;
            }
            level
        }
    }

    /// Output pin recording its level and the number of rising transitions.
    pub struct RecordedOutput {
        pub level: Level,
        pub rises: usize,
    }

    impl RecordedOutput {
        pub fn new() -> Self {
            Self {
                level: Level::Low,
                rises: 0,
            }
        }
    }

    impl OutputPin for RecordedOutput {
        fn set(&mut self, level: Level) {
            if self.level == Level::Low && level == Level::High {
                self.rises += 1;
            }
            self.level = level;
        }
    }

    /// Serial sink capturing the forwarded byte stream and the length of
    /// every individual write, so tests can check both content and framing.
    pub struct CapturedSerial {
        pub data: Vec<u8, 256>,
        pub chunks: Vec<usize, 32>,
    }

    impl CapturedSerial {
        pub fn new() -> Self {
            Self {
                data: Vec::new(),
                chunks: Vec::new(),
            }
        }
    }

    impl SerialSink for CapturedSerial {
        fn write(&mut self, bytes: &[u8]) {
            self.data.extend_from_slice(bytes).ok();
            self.chunks.push(bytes.len()).ok();
        }
    }

    /// Counter advancing by a fixed step on every read. Gives calibration
    /// and duration tests a deterministic passage of time.
    pub struct SteppingTicks {
        now: Cell<u32>,
        step: u32,
    }

    impl SteppingTicks {
        pub fn new(start: u32, step: u32) -> Self {
            Self {
                now: Cell::new(start),
                step,
            }
        }
    }

    impl TickSource for SteppingTicks {
        fn now(&self) -> u32 {
            let t = self.now.get();
            self.now.set(t.wrapping_add(self.step));
            t
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
