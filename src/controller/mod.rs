//! Motion controller: owns all shared motion state.
//!
//! One `MotionController` owns the bus, the dispatch timer, the segment
//! queue, the per-axis position counters, and the carry-forward snapshot of
//! the most recently computed segment. The calculator and the dispatch
//! interrupt are methods on it rather than free-floating statics, which
//! makes the single-writer-per-axis discipline explicit.
//!
//! Two execution contexts touch a controller: the cooperative foreground
//! (`calculate`, `home_axis`, `set_position`) and the timer interrupt
//! (`isr`). Foreground mutations of state the interrupt also reads happen
//! inside `critical_section` closures, kept to pure index/counter
//! arithmetic.

mod dispatch;
mod homing;

use embedded_hal::delay::DelayNs;

use crate::axis::Axis;
use crate::bus::Bus;
use crate::config::SystemConfig;
use crate::endstop::{EndstopSide, EndstopStatus};
use crate::error::{DriverError, Error, Result};
use crate::planner::MotionPlanner;
use crate::registers::{self, ramp_mode, ramp_stat};
use crate::segment::calculator::{scale_axis, segment_duration, AxisRule};
use crate::segment::{MotionSegment, SegmentBuffer};
use crate::timer::DispatchTimer;

/// Compare value loaded at init for a quick first interrupt (~122 Hz).
const STARTUP_COMPARE: u16 = 0x4000;

/// Standstill current hold delay programmed at init.
const IHOLD_DELAY: u8 = 7;

/// Motion controller for four driver chips.
///
/// Generic over:
/// - `B`: register bus (must implement [`Bus`])
/// - `T`: dispatch timer (must implement [`DispatchTimer`])
/// - `D`: delay provider for homing settle times (must implement `DelayNs`)
/// - `N`: segment queue capacity (power of two)
pub struct MotionController<B, T, D, const N: usize>
where
    B: Bus,
    T: DispatchTimer,
    D: DelayNs,
{
    pub(crate) bus: B,
    pub(crate) timer: T,
    pub(crate) delay: D,
    pub(crate) config: SystemConfig,

    /// Queue between the calculator and the dispatch interrupt.
    pub(crate) buffer: SegmentBuffer<N>,

    /// Absolute per-axis position, steps. Written by the calculator,
    /// `set_position`, and nothing else.
    pub(crate) position: [i32; Axis::COUNT],

    /// Per-axis direction multipliers from the last block (+1/-1).
    pub(crate) direction: [i8; Axis::COUNT],

    /// Most recently computed per-axis values; zero-step axes in a new
    /// block carry these forward instead of reprogramming the driver.
    pub(crate) snapshot: MotionSegment,

    /// Remaining ticks until the current segment ends. Owned by the
    /// interrupt context once `init` has run.
    pub(crate) countdown: u32,

    initialized: bool,
}

impl<B, T, D, const N: usize> MotionController<B, T, D, N>
where
    B: Bus,
    T: DispatchTimer,
    D: DelayNs,
{
    /// Create a controller. No hardware is touched until [`Self::init`].
    pub fn new(bus: B, timer: T, delay: D, config: SystemConfig) -> Self {
        Self {
            bus,
            timer,
            delay,
            config,
            buffer: SegmentBuffer::new(),
            position: [0; Axis::COUNT],
            direction: [1; Axis::COUNT],
            snapshot: MotionSegment::EMPTY,
            countdown: 0,
            initialized: false,
        }
    }

    /// One-time driver and timer bring-up.
    ///
    /// Programs each axis driver into its operating configuration and arms
    /// the dispatch timer. Must run before any [`Self::calculate`] or
    /// [`Self::isr`] activity.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyInitialized`] on a second call; this
    /// sequence is not re-entrant.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::Driver(DriverError::AlreadyInitialized));
        }

        for axis in Axis::ALL {
            self.init_axis(axis)?;
        }

        self.timer.start(STARTUP_COMPARE);
        self.initialized = true;
        Ok(())
    }

    fn init_axis(&mut self, axis: Axis) -> Result<()> {
        let cfg = self.config.axis(axis);
        let current = registers::ihold_irun(cfg.hold_current, cfg.run_current, IHOLD_DELAY);
        let gconf = registers::GCONF_STEALTH | cfg.direction_bit();
        let sw_register = cfg.sw_register();

        self.bus
            .write_register(registers::IHOLD_IRUN, current, axis)?;
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::POSITIONING, axis)?;
        // Single-stage ramp: A1/D1 out of the way, AMAX and VMAX only
        self.bus.write_register(registers::V1, 0x0, axis)?;
        self.bus.write_register(registers::D1, 0x10, axis)?;
        self.bus.write_register(registers::AMAX, 0xFFFF, axis)?;
        self.bus.write_register(registers::VMAX, 0xFFFF, axis)?;
        self.bus
            .write_register(registers::CHOPCONF, registers::CHOPCONF_OPERATING, axis)?;
        self.bus.write_register(registers::GCONF, gconf, axis)?;
        self.bus
            .write_register(registers::SW_MODE, sw_register, axis)?;
        Ok(())
    }

    /// Precompute the next motion segment from the planner's current block.
    ///
    /// Non-blocking and idempotent: returns `false` without side effects
    /// when the segment queue is full or the planner has no block ready.
    /// Call repeatedly from the foreground polling loop.
    pub fn calculate<P: MotionPlanner>(&mut self, planner: &mut P) -> bool {
        if self.buffer.is_full() {
            return false;
        }
        let Some(block) = planner.current_block() else {
            return false;
        };

        let mut segment = MotionSegment::EMPTY;

        for axis in Axis::ALL {
            let i = axis.index();
            let steps = block.steps_for(axis);

            if steps == 0 {
                // No motion on this axis: keep the driver coasting on its
                // last commanded profile instead of reprogramming it to
                // zero, which would stall it mid-travel.
                segment.accel[i] = self.snapshot.accel[i];
                segment.initial_speed[i] = self.snapshot.initial_speed[i];
                segment.nominal_speed[i] = self.snapshot.nominal_speed[i];
                segment.final_speed[i] = self.snapshot.final_speed[i];
                segment.target[i] = self.snapshot.target[i];
                continue;
            }

            let rule = AxisRule {
                final_speed_ceiling: self.config.axis(axis).final_speed_ceiling,
            };
            let profile = scale_axis(steps, &block, &rule);
            segment.accel[i] = profile.accel;
            segment.initial_speed[i] = profile.initial_speed;
            segment.nominal_speed[i] = profile.nominal_speed;
            segment.final_speed[i] = profile.final_speed;

            let delta = steps as i32;
            let sign: i8 = if block.is_negative(axis) { -1 } else { 1 };
            critical_section::with(|_| {
                self.direction[i] = sign;
                self.position[i] += delta * sign as i32;
                segment.target[i] = self.position[i];
            });

            if axis == Axis::Z {
                segment.moves_z = true;
            }
        }

        segment.duration = segment_duration(&block);
        // Calculations finished: publish for the interrupt
        segment.ready = true;

        if let Some(slot) = self.buffer.try_enqueue() {
            *slot = segment;
            self.buffer.commit();
        } else {
            // Single producer: cannot happen after the is_full check
            return false;
        }

        self.snapshot = segment;
        planner.discard_current_block();
        true
    }

    /// Overwrite one axis's absolute position.
    ///
    /// Updates the shared counter and snapshot, then reprograms the driver's
    /// actual/target registers around a hold-mode toggle. A no-op when the
    /// axis is already at the requested position. Never call in the middle
    /// of a move.
    pub fn set_position(&mut self, axis: Axis, value: i32) -> Result<()> {
        let i = axis.index();
        if self.position[i] == value {
            return Ok(());
        }

        critical_section::with(|_| -> Result<()> {
            self.position[i] = value;
            self.snapshot.target[i] = value;

            self.bus
                .write_register(registers::RAMPMODE, ramp_mode::HOLD, axis)?;
            self.bus
                .write_register(registers::XTARGET, value as u32, axis)?;
            self.bus
                .write_register(registers::XACTUAL, value as u32, axis)?;
            self.bus
                .write_register(registers::RAMPMODE, ramp_mode::POSITIONING, axis)?;
            Ok(())
        })
    }

    /// Overwrite all four axis positions (canonical axis order).
    pub fn set_position_all(&mut self, positions: [i32; Axis::COUNT]) -> Result<()> {
        for axis in Axis::ALL {
            self.set_position(axis, positions[axis.index()])?;
        }
        Ok(())
    }

    /// Current absolute position of an axis, steps.
    #[inline]
    pub fn position(&self, axis: Axis) -> i32 {
        self.position[axis.index()]
    }

    /// Direction multiplier (+1/-1) of the last block that moved the axis.
    #[inline]
    pub fn direction(&self, axis: Axis) -> i8 {
        self.direction[axis.index()]
    }

    /// Number of queued segments. Best-effort snapshot.
    #[inline]
    pub fn queued_segments(&self) -> usize {
        self.buffer.len()
    }

    /// Remaining ticks of the segment being dispatched. Diagnostic only.
    #[inline]
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Whether [`Self::init`] has completed.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Query an endstop by reading the axis's ramp status flags.
    ///
    /// Diagnostic only; motion control never branches on this.
    pub fn endstop_status(&mut self, axis: Axis, side: EndstopSide) -> Result<EndstopStatus> {
        let status = self.bus.read_register(registers::RAMP_STAT, axis)?;
        let mask = match side {
            EndstopSide::Min => ramp_stat::STATUS_STOP_L,
            EndstopSide::Max => ramp_stat::STATUS_STOP_R,
        };
        Ok(if status & mask != 0 {
            EndstopStatus::Hit
        } else {
            EndstopStatus::Open
        })
    }

    /// Release the hardware resources.
    pub fn release(self) -> (B, T, D) {
        (self.bus, self.timer, self.delay)
    }
}
