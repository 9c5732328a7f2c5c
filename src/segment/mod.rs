//! Precomputed motion segments and their queue.
//!
//! A segment is everything the dispatch interrupt needs to start one block's
//! motion: per-axis speeds and acceleration already rescaled into device
//! units, absolute target positions, and the segment's duration in timer
//! ticks. All of the expensive arithmetic happens in the calculator so the
//! interrupt does nothing but register writes.

mod buffer;
pub(crate) mod calculator;

pub use buffer::SegmentBuffer;

use crate::axis::Axis;

/// One ready-to-dispatch motion segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionSegment {
    /// Per-axis acceleration/deceleration, device units.
    pub accel: [u32; Axis::COUNT],

    /// Per-axis initial speed, device units.
    pub initial_speed: [u32; Axis::COUNT],

    /// Per-axis cruise speed, device units.
    pub nominal_speed: [u32; Axis::COUNT],

    /// Per-axis final speed, device units.
    pub final_speed: [u32; Axis::COUNT],

    /// Per-axis absolute target position, steps.
    pub target: [i32; Axis::COUNT],

    /// Whether this segment moves the Z axis. When false, the dispatcher
    /// skips Z register writes entirely.
    pub moves_z: bool,

    /// Segment duration in dispatch timer ticks.
    pub duration: u32,

    /// Set by the calculator only after every other field is populated; the
    /// dispatcher never touches a segment whose `ready` flag is false.
    pub ready: bool,
}

impl MotionSegment {
    /// An empty, not-ready segment.
    pub const EMPTY: MotionSegment = MotionSegment {
        accel: [0; Axis::COUNT],
        initial_speed: [0; Axis::COUNT],
        nominal_speed: [0; Axis::COUNT],
        final_speed: [0; Axis::COUNT],
        target: [0; Axis::COUNT],
        moves_z: false,
        duration: 0,
        ready: false,
    };
}

impl Default for MotionSegment {
    fn default() -> Self {
        Self::EMPTY
    }
}
