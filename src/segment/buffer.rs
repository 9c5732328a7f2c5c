//! Lock-free single-producer/single-consumer segment queue.
//!
//! The calculator (foreground) is the only producer and the dispatch
//! interrupt is the only consumer. `head == tail` is ambiguous between empty
//! and full, so a separate `full` flag — set only by the producer, cleared
//! only by the consumer — disambiguates. Capacity is a power of two so the
//! index wrap is a single bitmask.
//!
//! The producer-side index mutation in [`SegmentBuffer::commit`] runs inside
//! a critical section so the interrupt never observes a torn head/full pair.
//! [`SegmentBuffer::discard`] runs in interrupt context and needs no
//! protection of its own.

use super::MotionSegment;

/// Fixed-capacity ring buffer of motion segments.
pub struct SegmentBuffer<const N: usize> {
    slots: [MotionSegment; N],
    /// Next write slot.
    head: usize,
    /// Next read slot.
    tail: usize,
    /// Disambiguates head == tail.
    full: bool,
}

impl<const N: usize> SegmentBuffer<N> {
    const CAPACITY_IS_POWER_OF_TWO: () = assert!(N.is_power_of_two());

    /// Create an empty buffer.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CAPACITY_IS_POWER_OF_TWO;
        Self {
            slots: [MotionSegment::EMPTY; N],
            head: 0,
            tail: 0,
            full: false,
        }
    }

    /// Queue capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether the queue holds no committed segments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail && !self.full
    }

    /// Whether the queue has no free slot.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Number of committed segments.
    ///
    /// Best-effort snapshot: not synchronized against concurrent interrupt
    /// activity.
    pub fn len(&self) -> usize {
        if self.full {
            N
        } else {
            self.head.wrapping_sub(self.tail) & (N - 1)
        }
    }

    /// Return the next free slot for the producer to fill, or `None` if the
    /// queue is full.
    ///
    /// The slot is not visible to the consumer until [`SegmentBuffer::commit`]
    /// is called; its `ready` flag is cleared here so a stale segment can
    /// never leak through.
    pub fn try_enqueue(&mut self) -> Option<&mut MotionSegment> {
        if self.full {
            return None;
        }
        let slot = &mut self.slots[self.head];
        slot.ready = false;
        Some(slot)
    }

    /// Publish the slot handed out by the last [`SegmentBuffer::try_enqueue`].
    ///
    /// Producer context only. Must not be called without a preceding
    /// successful `try_enqueue`.
    pub fn commit(&mut self) {
        critical_section::with(|_| {
            self.head = (self.head + 1) & (N - 1);
            if self.head == self.tail {
                self.full = true;
            }
        });
    }

    /// Current tail segment, or `None` if the queue is empty.
    ///
    /// The segment stays in the queue until [`SegmentBuffer::discard`].
    pub fn peek(&self) -> Option<&MotionSegment> {
        if self.is_empty() {
            None
        } else {
            Some(&self.slots[self.tail])
        }
    }

    /// Mutable access to the tail segment (the dispatcher clears its `ready`
    /// flag before discarding it).
    pub fn peek_mut(&mut self) -> Option<&mut MotionSegment> {
        if self.is_empty() {
            None
        } else {
            Some(&mut self.slots[self.tail])
        }
    }

    /// Drop the tail segment, freeing its slot for the producer.
    ///
    /// Consumer context only. Must not be called on an empty queue.
    pub fn discard(&mut self) {
        self.tail = (self.tail + 1) & (N - 1);
        self.full = false;
    }
}

impl<const N: usize> Default for SegmentBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
