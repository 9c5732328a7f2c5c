//! Dispatch interrupt: hands finished segments to the driver chips.
//!
//! The timer interrupt does no arithmetic beyond the countdown bookkeeping.
//! Everything expensive happened in [`MotionController::calculate`]; here
//! the front segment is burst-written to the chips in a fixed register
//! order and the timer is re-armed for the segment's duration.

use embedded_hal::delay::DelayNs;

use crate::axis::Axis;
use crate::bus::Bus;
use crate::error::Result;
use crate::registers;
use crate::segment::MotionSegment;
use crate::timer::DispatchTimer;

use super::MotionController;

/// Ticks until the next queue check when the interrupt finds no segment.
const UNDERRUN_RECHECK_TICKS: u32 = 2000;

/// Largest single timer period, ticks.
const TIMER_RANGE: u32 = 0xFFFF;

/// Minimum margin between the counter and the compare point. A re-arm
/// closer than this could be missed by a counter already past it.
const REARM_GUARD: u32 = 100;

/// Counter preload for a near-immediate interrupt (100 ticks out).
const IMMEDIATE_REARM: u16 = 0xFF9C;

impl<B, T, D, const N: usize> MotionController<B, T, D, N>
where
    B: Bus,
    T: DispatchTimer,
    D: DelayNs,
{
    /// Timer interrupt body. Call from the dispatch timer's compare-match
    /// handler, and from nowhere else.
    ///
    /// When the countdown for the running segment has elapsed, the front
    /// queue entry is written out if it is ready; otherwise a short
    /// underrun recheck period is scheduled. Either way the timer is
    /// re-armed before returning.
    ///
    /// # Errors
    ///
    /// Propagates bus errors from the segment burst write. The countdown
    /// is left at zero in that case, so the next interrupt retries the
    /// same segment.
    pub fn isr(&mut self) -> Result<()> {
        if self.countdown == 0 {
            match self.buffer.peek().copied() {
                Some(segment) if segment.ready => {
                    self.write_segment(&segment)?;
                    self.countdown = segment.duration;
                    if let Some(slot) = self.buffer.peek_mut() {
                        slot.ready = false;
                    }
                    self.buffer.discard();
                }
                _ => {
                    // Queue empty or front still being written: idle-poll
                    self.countdown = UNDERRUN_RECHECK_TICKS;
                }
            }
        }
        self.rearm();
        Ok(())
    }

    /// Burst-write one segment. Register order is fixed: ramp limits for
    /// every moving axis, then start/stop speeds, then targets with Z
    /// first so the slowest axis begins moving soonest. Axes with no Z
    /// motion skip the Z writes entirely.
    fn write_segment(&mut self, segment: &MotionSegment) -> Result<()> {
        self.write_ramp(segment, Axis::X)?;
        self.write_ramp(segment, Axis::Y)?;
        if segment.moves_z {
            self.write_ramp(segment, Axis::Z)?;
        }
        self.write_ramp(segment, Axis::E)?;

        self.write_transition_speeds(segment, Axis::X)?;
        self.write_transition_speeds(segment, Axis::Y)?;
        if segment.moves_z {
            self.write_transition_speeds(segment, Axis::Z)?;
        }
        self.write_transition_speeds(segment, Axis::E)?;

        if segment.moves_z {
            self.write_target(segment, Axis::Z)?;
        }
        self.write_target(segment, Axis::X)?;
        self.write_target(segment, Axis::Y)?;
        self.write_target(segment, Axis::E)?;
        Ok(())
    }

    fn write_ramp(&mut self, segment: &MotionSegment, axis: Axis) -> Result<()> {
        let i = axis.index();
        self.bus
            .write_register(registers::VMAX, segment.nominal_speed[i], axis)?;
        self.bus
            .write_register(registers::AMAX, segment.accel[i], axis)?;
        self.bus
            .write_register(registers::DMAX, segment.accel[i], axis)?;
        Ok(())
    }

    fn write_transition_speeds(&mut self, segment: &MotionSegment, axis: Axis) -> Result<()> {
        let i = axis.index();
        self.bus
            .write_register(registers::VSTART, segment.initial_speed[i], axis)?;
        self.bus
            .write_register(registers::VSTOP, segment.final_speed[i], axis)?;
        Ok(())
    }

    fn write_target(&mut self, segment: &MotionSegment, axis: Axis) -> Result<()> {
        self.bus
            .write_register(registers::XTARGET, segment.target[axis.index()] as u32, axis)?;
        Ok(())
    }

    /// Re-arm the 16-bit timer for the remaining countdown.
    ///
    /// Countdowns longer than one timer period are split: the counter is
    /// reset and a full period is consumed per interrupt until the
    /// remainder fits. The final period accounts for ticks already elapsed
    /// since the compare match.
    fn rearm(&mut self) {
        if self.countdown >= TIMER_RANGE {
            self.countdown -= TIMER_RANGE;
            self.timer.set_count(1);
        } else {
            let elapsed = u32::from(self.timer.count());
            if self.countdown > elapsed + REARM_GUARD {
                self.timer
                    .set_count((TIMER_RANGE - self.countdown + elapsed) as u16);
            } else {
                // Deadline already passed or too close: fire almost now
                self.timer.set_count(IMMEDIATE_REARM);
            }
            self.countdown = 0;
        }
    }
}
