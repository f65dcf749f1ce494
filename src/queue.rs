//! # Message Queue
//!
//! Bounded FIFO of message descriptors between the three producer tasks
//! (two edge monitors, the status transmitter) and the single drain task.
//!
//! Descriptors are queued by copy; the payload bytes they reference are not.
//! All operations are zero-timeout: a send against a full queue fails and the
//! producer drops the message, a receive from an empty queue returns `None`
//! and ends the drain loop. Neither path ever suspends the caller.
//!
//! Production access goes through the [`SharedQueue`] facade, which wraps
//! every descriptor copy in a critical section so enqueue/dequeue are atomic
//! with respect to preemption. Task bodies add no locking of their own.

use core::ptr::addr_of_mut;

use heapless::Deque;

use crate::config::MSG_QUEUE_CAPACITY;
use crate::sync;

// ---------------------------------------------------------------------------
// Message descriptor
// ---------------------------------------------------------------------------

/// One queued message: a borrowed payload plus its length (carried by the
/// slice).
///
/// Producers keep their payloads in static storage and re-point a descriptor
/// at them each period. A producer that routes a descriptor at *mutable*
/// storage must not rewrite it until the drain task has forwarded the
/// previous activation's message, or the consumer can observe stale bytes —
/// that hazard is documented here, not prevented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    bytes: &'static [u8],
}

impl Message {
    pub const fn new(bytes: &'static [u8]) -> Self {
        Self { bytes }
    }

    #[inline]
    pub const fn bytes(&self) -> &'static [u8] {
        self.bytes
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Failure of a zero-timeout send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The queue holds `MSG_QUEUE_CAPACITY` descriptors; nothing was
    /// enqueued and the existing contents are untouched.
    Full,
}

// ---------------------------------------------------------------------------
// Bounded FIFO
// ---------------------------------------------------------------------------

/// Fixed-capacity FIFO of [`Message`] descriptors.
///
/// Invariants: the occupied count stays within `[0, MSG_QUEUE_CAPACITY]`,
/// and a failed send mutates neither the count nor the order of what is
/// already queued.
pub struct MessageQueue {
    fifo: Deque<Message, MSG_QUEUE_CAPACITY>,
}

impl MessageQueue {
    pub const fn new() -> Self {
        Self { fifo: Deque::new() }
    }

    /// Zero-timeout send. Appends at the tail or reports [`SendError::Full`].
    pub fn send(&mut self, msg: Message) -> Result<(), SendError> {
        self.fifo.push_back(msg).map_err(|_| SendError::Full)
    }

    /// Zero-timeout receive. Pops the head, or returns `None` when empty —
    /// the normal end of a drain loop, not an error.
    pub fn receive(&mut self) -> Option<Message> {
        self.fifo.pop_front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        MSG_QUEUE_CAPACITY
    }
}

// ---------------------------------------------------------------------------
// Producer/consumer seam
// ---------------------------------------------------------------------------

/// What a task body needs from the messaging layer. Implemented directly by
/// [`MessageQueue`] for host tests and by [`SharedQueue`] for the firmware,
/// where each call is one critical section.
pub trait MessageBus {
    fn send(&mut self, msg: Message) -> Result<(), SendError>;
    fn receive(&mut self) -> Option<Message>;
}

impl MessageBus for MessageQueue {
    fn send(&mut self, msg: Message) -> Result<(), SendError> {
        MessageQueue::send(self, msg)
    }

    fn receive(&mut self) -> Option<Message> {
        MessageQueue::receive(self)
    }
}

/// The one queue instance shared by the task set.
static mut SHARED: MessageQueue = MessageQueue::new();

/// Handle to the shared queue. Every operation masks interrupts for the
/// duration of one descriptor copy, which serializes concurrent producers
/// and makes delivery order equal the order in which sends succeeded.
#[derive(Clone, Copy)]
pub struct SharedQueue;

impl SharedQueue {
    /// Occupied-count snapshot, for diagnostics.
    pub fn len(&self) -> usize {
        sync::critical_section(|_| unsafe { (*addr_of_mut!(SHARED)).len() })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageBus for SharedQueue {
    fn send(&mut self, msg: Message) -> Result<(), SendError> {
        sync::critical_section(|_| unsafe { (*addr_of_mut!(SHARED)).send(msg) })
    }

    fn receive(&mut self) -> Option<Message> {
        sync::critical_section(|_| unsafe { (*addr_of_mut!(SHARED)).receive() })
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    static PAYLOAD_A: &[u8] = b"payload a\n";
    static PAYLOAD_B: &[u8] = b"payload b\n";
    static PAYLOAD_C: &[u8] = b"payload c\n";

    #[test]
    fn test_fifo_order_preserved() {
        let mut q = MessageQueue::new();
        q.send(Message::new(PAYLOAD_A)).unwrap();
        q.send(Message::new(PAYLOAD_B)).unwrap();
        q.send(Message::new(PAYLOAD_C)).unwrap();

        assert_eq!(q.receive().unwrap().bytes(), PAYLOAD_A);
        assert_eq!(q.receive().unwrap().bytes(), PAYLOAD_B);
        assert_eq!(q.receive().unwrap().bytes(), PAYLOAD_C);
        assert!(q.receive().is_none());
    }

    #[test]
    fn test_interleaved_producers_drain_in_send_order() {
        // Three producers interleave; delivery must match the order the
        // sends succeeded, with no cross-producer reordering.
        let mut q = MessageQueue::new();
        let sequence = [PAYLOAD_A, PAYLOAD_C, PAYLOAD_A, PAYLOAD_B, PAYLOAD_C, PAYLOAD_B];
        for payload in sequence {
            q.send(Message::new(payload)).unwrap();
        }
        for payload in sequence {
            assert_eq!(q.receive().unwrap().bytes(), payload);
        }
    }

    #[test]
    fn test_occupied_count_never_exceeds_capacity() {
        let mut q = MessageQueue::new();
        for _ in 0..MSG_QUEUE_CAPACITY {
            q.send(Message::new(PAYLOAD_A)).unwrap();
        }
        assert_eq!(q.len(), MSG_QUEUE_CAPACITY);

        assert_eq!(q.send(Message::new(PAYLOAD_B)), Err(SendError::Full));
        assert_eq!(q.len(), MSG_QUEUE_CAPACITY, "a failed send must not change the count");
    }

    #[test]
    fn test_failed_send_leaves_ordering_untouched() {
        let mut q = MessageQueue::new();
        q.send(Message::new(PAYLOAD_A)).unwrap();
        for _ in 1..MSG_QUEUE_CAPACITY {
            q.send(Message::new(PAYLOAD_B)).unwrap();
        }
        assert_eq!(q.send(Message::new(PAYLOAD_C)), Err(SendError::Full));

        assert_eq!(q.receive().unwrap().bytes(), PAYLOAD_A, "head must be unchanged");
        let mut tail_count = 0;
        while let Some(msg) = q.receive() {
            assert_eq!(msg.bytes(), PAYLOAD_B, "rejected message must not appear");
            tail_count += 1;
        }
        assert_eq!(tail_count, MSG_QUEUE_CAPACITY - 1);
    }

    #[test]
    fn test_send_succeeds_after_room_is_made() {
        let mut q = MessageQueue::new();
        for _ in 0..MSG_QUEUE_CAPACITY {
            q.send(Message::new(PAYLOAD_A)).unwrap();
        }
        assert!(q.send(Message::new(PAYLOAD_B)).is_err());
        q.receive().unwrap();
        assert!(q.send(Message::new(PAYLOAD_B)).is_ok());
        assert_eq!(q.len(), MSG_QUEUE_CAPACITY);
    }

    #[test]
    fn test_receive_on_empty_is_a_loop_terminator() {
        let mut q = MessageQueue::new();
        assert!(q.receive().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn test_descriptor_carries_exact_length() {
        let msg = Message::new(PAYLOAD_A);
        assert_eq!(msg.len(), PAYLOAD_A.len());
        assert!(!msg.is_empty());
    }
}
