//! # Periodic Task Bodies
//!
//! The six activation bodies of the fixed task set. Each type holds exactly
//! the state one task carries between activations and exposes `activate`,
//! the functional work of a single release. The periodic pacing around an
//! activation — observation pin, deadline bracket, wait for the next release
//! — is the scheduler port's business, composed through [`run_activation`].
//!
//! Producers never retry a failed send: a full queue drops the message and
//! the activation completes normally.

use crate::io::{InputPin, Level, OutputPin, SerialSink, TickSource};
use crate::load::CalibratedSpin;
use crate::queue::{Message, MessageBus};
use crate::registry;
use crate::task::TaskSlot;

/// Fixed payloads carried through the queue.
pub const INPUT_A_RISING: &[u8] = b"rising edge on input A\n";
pub const INPUT_A_FALLING: &[u8] = b"falling edge on input A\n";
pub const INPUT_B_RISING: &[u8] = b"rising edge on input B\n";
pub const INPUT_B_FALLING: &[u8] = b"falling edge on input B\n";
pub const STATUS_MESSAGE: &[u8] = b"periodic status\n";

// ---------------------------------------------------------------------------
// Instrumented activation bracket
// ---------------------------------------------------------------------------

/// Run one activation body under the standard bracket: observation pin high
/// for the duration of the body, start/end tick stamps around the functional
/// work only, and the bracket reported to the task's registry record (which
/// is where an overrun becomes a deadline miss).
///
/// The end stamp is taken before anything that waits for the next period, so
/// the measured interval covers the body alone.
pub fn run_activation(
    slot: TaskSlot,
    pin: &mut impl OutputPin,
    ticks: &impl TickSource,
    body: impl FnOnce(),
) {
    pin.set_high();
    let start = ticks.now();
    body();
    let end = ticks.now();
    registry::note_activation(slot, start, end);
    pin.set_low();
}

// ---------------------------------------------------------------------------
// Edge monitor (two instances)
// ---------------------------------------------------------------------------

/// Samples one discrete input once per activation and reports level changes
/// as rising/falling messages.
///
/// The reference level starts at `initial_level` (the firmware passes
/// `High`: pulled-up inputs idle high) and advances on every observed
/// change, whether or not the resulting message fit in the queue.
pub struct EdgeMonitor<I: InputPin> {
    input: I,
    last_level: Level,
    rising: Message,
    falling: Message,
}

impl<I: InputPin> EdgeMonitor<I> {
    pub fn new(
        input: I,
        initial_level: Level,
        rising: &'static [u8],
        falling: &'static [u8],
    ) -> Self {
        Self {
            input,
            last_level: initial_level,
            rising: Message::new(rising),
            falling: Message::new(falling),
        }
    }

    /// One activation: exactly one sample, at most one send.
    pub fn activate(&mut self, bus: &mut impl MessageBus) {
        let level = self.input.read();
        if level != self.last_level {
            let msg = match level {
                Level::High => self.rising,
                Level::Low => self.falling,
            };
            // Full queue: the edge report is dropped, no retry.
            let _ = bus.send(msg);
            self.last_level = level;
        }
    }
}

// ---------------------------------------------------------------------------
// Status transmitter
// ---------------------------------------------------------------------------

/// Unconditionally offers one fixed status message per activation.
pub struct StatusTransmitter {
    message: Message,
}

impl StatusTransmitter {
    pub const fn new(payload: &'static [u8]) -> Self {
        Self {
            message: Message::new(payload),
        }
    }

    pub fn activate(&mut self, bus: &mut impl MessageBus) {
        // Full queue: this period's status is dropped, no retry.
        let _ = bus.send(self.message);
    }
}

// ---------------------------------------------------------------------------
// Queue drain
// ---------------------------------------------------------------------------

/// Empties the queue into the serial sink, one activation at a time.
///
/// Messages are forwarded in arrival order with their exact length. The loop
/// ends on the first empty receive, so an activation that starts with an
/// empty queue does no work at all. Each receive is individually atomic; the
/// serial write happens outside the queue's critical section.
pub struct QueueDrain;

impl QueueDrain {
    pub const fn new() -> Self {
        Self
    }

    pub fn activate(&mut self, bus: &mut impl MessageBus, serial: &mut impl SerialSink) {
        while let Some(msg) = bus.receive() {
            serial.write(msg.bytes());
        }
    }
}

// ---------------------------------------------------------------------------
// Synthetic load (two instances)
// ---------------------------------------------------------------------------

/// Burns a calibrated amount of processor time to create contention for the
/// timing-sensitive tasks. No queue interaction, no observable side effect
/// besides the elapsed cycles.
pub struct SyntheticLoad {
    spin: CalibratedSpin,
    work_ticks: u32,
}

impl SyntheticLoad {
    pub const fn new(spin: CalibratedSpin, work_ticks: u32) -> Self {
        Self { spin, work_ticks }
    }

    pub fn activate(&mut self) {
        self.spin.consume(self.work_ticks);
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MSG_QUEUE_CAPACITY;
    use crate::io::mock::{CapturedSerial, ScriptedInput};
    use crate::queue::{MessageQueue, SendError};

    fn monitor_a(script: &[Level], initial: Level) -> EdgeMonitor<ScriptedInput> {
        EdgeMonitor::new(ScriptedInput::new(script), initial, INPUT_A_RISING, INPUT_A_FALLING)
    }

    #[test]
    fn test_pulse_yields_rising_then_falling() {
        // Input held low, pulsed high for one activation, returned low.
        let mut q = MessageQueue::new();
        let mut mon = monitor_a(&[Level::Low, Level::High, Level::Low], Level::Low);

        mon.activate(&mut q);
        mon.activate(&mut q);
        mon.activate(&mut q);

        assert_eq!(q.len(), 2, "one pulse is exactly two transitions");
        assert_eq!(q.receive().unwrap().bytes(), INPUT_A_RISING);
        assert_eq!(q.receive().unwrap().bytes(), INPUT_A_FALLING);
    }

    #[test]
    fn test_steady_input_sends_nothing() {
        let mut q = MessageQueue::new();
        let mut mon = monitor_a(&[Level::High; 4], Level::High);
        for _ in 0..4 {
            mon.activate(&mut q);
        }
        assert!(q.is_empty());
    }

    #[test]
    fn test_one_message_per_transition_with_correct_classification() {
        let script = [
            Level::Low,  // no change
            Level::High, // rising
            Level::High, // no change
            Level::Low,  // falling
            Level::High, // rising
        ];
        let mut q = MessageQueue::new();
        let mut mon = monitor_a(&script, Level::Low);
        for _ in 0..script.len() {
            mon.activate(&mut q);
        }

        assert_eq!(q.len(), 3, "three transitions, three messages");
        assert_eq!(q.receive().unwrap().bytes(), INPUT_A_RISING);
        assert_eq!(q.receive().unwrap().bytes(), INPUT_A_FALLING);
        assert_eq!(q.receive().unwrap().bytes(), INPUT_A_RISING);
    }

    #[test]
    fn test_monitor_samples_exactly_once_per_activation() {
        let mut q = MessageQueue::new();
        let mut mon = monitor_a(&[Level::Low, Level::High, Level::Low], Level::Low);
        for _ in 0..3 {
            mon.activate(&mut q);
        }
        assert_eq!(mon.input.reads, 3);
    }

    #[test]
    fn test_edge_report_dropped_when_queue_is_full() {
        let mut q = MessageQueue::new();
        for _ in 0..MSG_QUEUE_CAPACITY {
            q.send(Message::new(STATUS_MESSAGE)).unwrap();
        }

        let mut mon = monitor_a(&[Level::High, Level::Low], Level::Low);
        mon.activate(&mut q);

        assert_eq!(q.len(), MSG_QUEUE_CAPACITY);
        while let Some(msg) = q.receive() {
            assert_eq!(msg.bytes(), STATUS_MESSAGE, "the dropped edge must not appear");
        }
    }

    #[test]
    fn test_monitor_state_advances_even_when_the_report_is_dropped() {
        let mut q = MessageQueue::new();
        for _ in 0..MSG_QUEUE_CAPACITY {
            q.send(Message::new(STATUS_MESSAGE)).unwrap();
        }

        // Rising edge lands on a full queue; the level still becomes the new
        // reference, so draining before the next activation yields no
        // spurious report for the same edge.
        let mut mon = monitor_a(&[Level::High, Level::High], Level::Low);
        mon.activate(&mut q);
        while q.receive().is_some() {}
        mon.activate(&mut q);

        assert!(q.is_empty());
    }

    #[test]
    fn test_transmitter_sends_its_fixed_message_each_activation() {
        let mut q = MessageQueue::new();
        let mut tx = StatusTransmitter::new(STATUS_MESSAGE);
        tx.activate(&mut q);
        tx.activate(&mut q);

        assert_eq!(q.len(), 2);
        assert_eq!(q.receive().unwrap().bytes(), STATUS_MESSAGE);
        assert_eq!(q.receive().unwrap().bytes(), STATUS_MESSAGE);
    }

    #[test]
    fn test_transmitter_against_saturated_queue_changes_nothing() {
        let mut q = MessageQueue::new();
        for _ in 0..MSG_QUEUE_CAPACITY {
            q.send(Message::new(INPUT_B_RISING)).unwrap();
        }
        assert_eq!(q.send(Message::new(STATUS_MESSAGE)), Err(SendError::Full));

        let mut tx = StatusTransmitter::new(STATUS_MESSAGE);
        tx.activate(&mut q);

        assert_eq!(q.len(), MSG_QUEUE_CAPACITY);
        assert_eq!(q.receive().unwrap().bytes(), INPUT_B_RISING);
    }

    #[test]
    fn test_send_failure_itself_is_not_a_deadline_miss() {
        use crate::task::{TaskRecord, TaskSlot};

        let mut q = MessageQueue::new();
        for _ in 0..MSG_QUEUE_CAPACITY {
            q.send(Message::new(INPUT_A_RISING)).unwrap();
        }

        let mut rec = TaskRecord::new(TaskSlot::StatusTx);
        let mut tx = StatusTransmitter::new(STATUS_MESSAGE);
        tx.activate(&mut q);
        rec.apply_activation(0, 1);

        assert_eq!(q.len(), MSG_QUEUE_CAPACITY);
        assert_eq!(rec.deadline_misses(), 0, "a dropped send must not count as a miss");
    }

    #[test]
    fn test_drain_forwards_all_pending_in_fifo_order() {
        let mut q = MessageQueue::new();
        let pending = [
            INPUT_A_RISING,
            STATUS_MESSAGE,
            INPUT_B_FALLING,
            INPUT_A_FALLING,
            STATUS_MESSAGE,
        ];
        for payload in pending {
            q.send(Message::new(payload)).unwrap();
        }

        let mut serial = CapturedSerial::new();
        QueueDrain::new().activate(&mut q, &mut serial);

        assert!(q.is_empty(), "one activation must empty the queue");
        assert_eq!(serial.chunks.len(), pending.len(), "one write per message");
        let mut expected: heapless::Vec<u8, 256> = heapless::Vec::new();
        for payload in pending {
            expected.extend_from_slice(payload).unwrap();
        }
        assert_eq!(serial.data, expected);
        for (chunk, payload) in serial.chunks.iter().zip(pending) {
            assert_eq!(*chunk, payload.len(), "lengths must be preserved exactly");
        }
    }

    #[test]
    fn test_drain_on_empty_queue_writes_nothing() {
        let mut q = MessageQueue::new();
        let mut serial = CapturedSerial::new();
        QueueDrain::new().activate(&mut q, &mut serial);
        assert!(serial.chunks.is_empty());
    }

    #[test]
    fn test_synthetic_load_touches_no_queue() {
        let mut load = SyntheticLoad::new(CalibratedSpin::from_rate(100), 2);
        load.activate();
    }
}
