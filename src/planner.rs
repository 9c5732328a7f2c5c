//! Upstream planner interface.
//!
//! The trajectory planner lives outside this crate. It hands over one
//! kinematic block at a time; the segment calculator consumes it exactly
//! once and tells the planner to discard it.

use crate::axis::Axis;

/// One unit of motion from the upstream planner.
///
/// Step counts and rates are in planner units (steps and steps per second);
/// the segment calculator rescales them into device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KinematicBlock {
    /// Per-axis step counts for this block (magnitudes; signs are in
    /// `direction_bits`).
    pub steps: [u32; Axis::COUNT],

    /// Number of step events for the dominant axis.
    pub step_event_count: u32,

    /// Step rate at the start of the block, steps/s.
    pub initial_rate: u32,

    /// Cruise step rate, steps/s.
    pub nominal_rate: u32,

    /// Step rate at the end of the block, steps/s.
    pub final_rate: u32,

    /// Acceleration in steps/s².
    pub acceleration_steps_per_s2: u32,

    /// Per-axis direction bits; a set bit means negative motion.
    pub direction_bits: u8,

    /// Step event index at which acceleration ends.
    pub accelerate_until: u32,

    /// Step event index at which deceleration begins.
    pub decelerate_after: u32,
}

impl KinematicBlock {
    /// Step count for one axis.
    #[inline]
    pub fn steps_for(&self, axis: Axis) -> u32 {
        self.steps[axis.index()]
    }

    /// Whether this block moves the given axis in the negative direction.
    #[inline]
    pub fn is_negative(&self, axis: Axis) -> bool {
        self.direction_bits & axis.bit() != 0
    }
}

/// Collaborator contract for the upstream motion planner.
pub trait MotionPlanner {
    /// Non-destructive peek at the planner's current block.
    ///
    /// Returns `None` when the planner has nothing ready. The same block is
    /// returned until [`MotionPlanner::discard_current_block`] is called.
    fn current_block(&mut self) -> Option<KinematicBlock>;

    /// Advance the planner's queue past the current block.
    fn discard_current_block(&mut self);
}
