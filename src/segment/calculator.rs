//! Per-axis rescaling and duration arithmetic for the segment calculator.
//!
//! Rates arrive from the planner in steps-per-event units for the dominant
//! axis. Each axis gets its share through a Q16 fixed-point ratio:
//!
//! ```text
//! scale      = (axis_steps << 16) / step_event_count        (Q16)
//! accel      = ((scale >> 7) * block_accel) >> 16
//! speed      = (scale * block_rate) >> 16
//! ```
//!
//! All of it is 32-bit unsigned arithmetic and the intermediate products are
//! allowed to wrap; the dispatcher's real-time budget assumes integer math,
//! so this stays fixed point rather than floating point. Degenerate input
//! (zero acceleration, zero nominal rate) is absorbed by clamps, never
//! reported.

use crate::planner::KinematicBlock;

/// Dispatch timer ticks per second (16 MHz core, prescaler 8).
pub const TICKS_PER_SECOND: f64 = 2_000_000.0;

/// Ratio between the chip's internal ramp timebase and real time.
pub const RAMP_TIME_FACTOR: f64 = 1.048576;

/// Floor applied to a rescaled acceleration of zero, so an axis always
/// retains enough braking capability.
pub const MIN_SEGMENT_ACCEL: u32 = 1000;

/// Floor applied to final speed, so a segment never commands a dead stop
/// that would lurch the next one.
pub const FINAL_SPEED_FLOOR: u32 = 10;

/// Per-axis clamping rule for the rescaled profile.
#[derive(Debug, Clone, Copy)]
pub struct AxisRule {
    /// Upper bound on final speed, device units. `None` leaves it unbounded.
    pub final_speed_ceiling: Option<u32>,
}

/// Rescaled per-axis profile in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisProfile {
    /// Acceleration/deceleration.
    pub accel: u32,
    /// Speed at segment start.
    pub initial_speed: u32,
    /// Cruise speed.
    pub nominal_speed: u32,
    /// Speed at segment end.
    pub final_speed: u32,
}

/// Rescale one axis's share of a block into device units.
///
/// `steps` must be the nonzero step count of the axis; zero-step axes carry
/// the previous segment's profile forward instead of being rescaled.
pub fn scale_axis(steps: u32, block: &KinematicBlock, rule: &AxisRule) -> AxisProfile {
    let scale = steps.wrapping_shl(16) / block.step_event_count;

    let mut accel = (scale >> 7).wrapping_mul(block.acceleration_steps_per_s2) >> 16;
    if accel == 0 {
        accel = MIN_SEGMENT_ACCEL;
    }

    let mut initial_speed = scale.wrapping_mul(block.initial_rate) >> 16;
    let nominal_speed = scale.wrapping_mul(block.nominal_rate) >> 16;

    // Never command an initial speed the device cannot sustain
    if nominal_speed < initial_speed {
        initial_speed = nominal_speed;
    }

    let mut final_speed = scale.wrapping_mul(block.final_rate) >> 16;
    if final_speed < FINAL_SPEED_FLOOR {
        final_speed = FINAL_SPEED_FLOOR;
    }
    if let Some(ceiling) = rule.final_speed_ceiling {
        if final_speed > ceiling {
            final_speed = ceiling;
        }
    }

    AxisProfile {
        accel,
        initial_speed,
        nominal_speed,
        final_speed,
    }
}

/// Total segment duration in dispatch timer ticks.
///
/// Sum of the three kinematic phases — ramp up, cruise, ramp down — scaled
/// into timer ticks and corrected for the chip's internal ramp timebase.
pub fn segment_duration(block: &KinematicBlock) -> u32 {
    let accel = block.acceleration_steps_per_s2.max(1) as f64;
    let nominal = block.nominal_rate.max(1) as f64;

    // I - Acceleration phase
    let mut ticks =
        block.nominal_rate.saturating_sub(block.initial_rate) as f64 / accel * TICKS_PER_SECOND;

    // II - Plateau / constant speed phase (if any)
    if block.decelerate_after > block.accelerate_until {
        ticks += (block.decelerate_after - block.accelerate_until) as f64 / nominal
            * TICKS_PER_SECOND;
    }

    // III - Deceleration phase
    ticks +=
        block.nominal_rate.saturating_sub(block.final_rate) as f64 / accel * TICKS_PER_SECOND;

    (ticks * RAMP_TIME_FACTOR) as u32
}
