//! Homing: establish an axis's zero reference.
//!
//! Two sub-protocols, chosen per axis by configuration: switch homing
//! drives into a wired reference switch, StallGuard homing detects the
//! mechanical stop from motor load with no switch at all. Both run the
//! same shape: velocity-mode approach, wait for standstill, latch zero,
//! retract at reduced speed, settle.
//!
//! Homing is foreground-only and blocking. The caller must make sure no
//! segments are queued for the axis and the driver stage is powered.

use embedded_hal::delay::DelayNs;

use crate::axis::Axis;
use crate::bus::Bus;
use crate::config::AxisConfig;
use crate::error::Result;
use crate::registers::{self, ramp_mode, ramp_stat};
use crate::timer::DispatchTimer;

use super::MotionController;

/// Acceleration used for the stall-homing approach. Low enough that the
/// ramp generator never outruns the stalled motor.
const STALL_HOMING_AMAX: u32 = 100;

/// Settle time after switch-homing moves, milliseconds.
const SWITCH_SETTLE_MS: u32 = 200;

/// Delay before polling for standstill in stall homing, so the motor is
/// past its own start transient when stall detection goes live.
const STALL_SPINUP_MS: u32 = 20;

/// Derived homing numbers for one axis.
#[derive(Debug, Clone, Copy)]
struct HomingParams {
    /// Retract target after the touch, steps.
    retract: i32,
    /// Approach speed, steps per second.
    speed: u32,
    /// Retract speed, steps per second.
    bump_speed: u32,
    /// SW_MODE word arming the axis's wired switch.
    sw_register: u32,
    /// GCONF direction bit for this axis.
    direction_bit: u32,
    /// StallGuard threshold when the axis homes sensorless.
    stall_threshold: Option<i8>,
}

impl HomingParams {
    fn derive(config: &AxisConfig, feedrate_mm_s: f32) -> Self {
        let speed = (feedrate_mm_s * config.steps_per_mm) as u32;
        Self {
            retract: (config.home_bump_mm * config.steps_per_mm) as i32,
            speed,
            bump_speed: speed / u32::from(config.homing_bump_divisor.max(1)),
            sw_register: config.sw_register(),
            direction_bit: config.direction_bit(),
            stall_threshold: config.stallguard.map(|sg| sg.threshold),
        }
    }
}

/// Velocity threshold below which stall detection triggers a stop.
///
/// The chip compares TSTEP (clocks per step) against TCOOLTHRS, so the
/// configured approach speed is converted into the time domain, with a 10%
/// margin so detection is armed just above the nominal approach speed.
fn stall_trigger_threshold(speed: u32) -> u32 {
    let period = 16_777_216 / speed.max(1) / 16;
    (period as f32 * 1.10) as u32
}

impl<B, T, D, const N: usize> MotionController<B, T, D, N>
where
    B: Bus,
    T: DispatchTimer,
    D: DelayNs,
{
    /// Home one axis at the given feedrate.
    ///
    /// Blocks until the axis sits retracted at its zero reference. The
    /// `idle` closure runs on every poll iteration while waiting for the
    /// motor to reach standstill; use it to keep watchdogs and host
    /// communication alive.
    ///
    /// # Errors
    ///
    /// Propagates bus errors. The axis is left in whatever state the
    /// failed transfer reached; the caller should re-home.
    pub fn home_axis<F>(&mut self, axis: Axis, feedrate_mm_s: f32, mut idle: F) -> Result<()>
    where
        F: FnMut(),
    {
        let params = HomingParams::derive(self.config.axis(axis), feedrate_mm_s);
        match params.stall_threshold {
            Some(threshold) => self.home_stall(axis, &params, threshold, &mut idle),
            None => self.home_switch(axis, &params, &mut idle),
        }
    }

    fn home_switch<F>(&mut self, axis: Axis, params: &HomingParams, idle: &mut F) -> Result<()>
    where
        F: FnMut(),
    {
        // Approach: velocity mode into the switch, hardware stops the ramp
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::VELOCITY_NEG, axis)?;
        self.bus
            .write_register(registers::VMAX, params.speed, axis)?;
        self.bus
            .write_register(registers::SW_MODE, params.sw_register, axis)?;
        self.wait_for_standstill(axis, idle)?;

        // Touched: latch zero with the switch disarmed, then retract
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::HOLD, axis)?;
        self.bus.write_register(registers::XACTUAL, 0, axis)?;
        self.bus.write_register(registers::XTARGET, 0, axis)?;
        self.bus.write_register(registers::SW_MODE, 0, axis)?;
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::POSITIONING, axis)?;
        self.bus
            .write_register(registers::VMAX, params.bump_speed, axis)?;
        self.bus.write_register(registers::DMAX, 0xFFFF, axis)?;
        self.bus
            .write_register(registers::XTARGET, params.retract as u32, axis)?;
        self.delay.delay_ms(SWITCH_SETTLE_MS);
        self.wait_for_standstill(axis, idle)?;

        // Retracted: re-arm the switch and make the retract point zero
        self.bus
            .write_register(registers::SW_MODE, params.sw_register, axis)?;
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::HOLD, axis)?;
        self.bus.write_register(registers::XACTUAL, 0, axis)?;
        self.bus.write_register(registers::XTARGET, 0, axis)?;
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::POSITIONING, axis)?;

        self.mark_homed(axis);
        Ok(())
    }

    fn home_stall<F>(
        &mut self,
        axis: Axis,
        params: &HomingParams,
        threshold: i8,
        idle: &mut F,
    ) -> Result<()>
    where
        F: FnMut(),
    {
        // Stall sensing needs classic chopper mode, a calibrated threshold,
        // and a velocity floor below which detection is inhibited
        self.bus.write_register(registers::SW_MODE, 0, axis)?;
        self.bus.write_register(
            registers::GCONF,
            registers::GCONF_SPREADCYCLE | params.direction_bit,
            axis,
        )?;
        self.bus.write_register(
            registers::COOLCONF,
            registers::coolconf_sgt(threshold),
            axis,
        )?;
        self.bus.write_register(
            registers::TCOOLTHRS,
            stall_trigger_threshold(params.speed),
            axis,
        )?;
        self.bus
            .write_register(registers::SW_MODE, registers::sw_mode::SG_STOP, axis)?;
        self.bus
            .write_register(registers::AMAX, STALL_HOMING_AMAX, axis)?;

        // Approach until the mechanics stall the motor
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::VELOCITY_NEG, axis)?;
        self.bus
            .write_register(registers::VMAX, params.speed, axis)?;
        self.delay.delay_ms(STALL_SPINUP_MS);
        self.wait_for_standstill(axis, idle)?;

        // Stalled against the stop: latch zero and retract
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::HOLD, axis)?;
        self.bus.write_register(registers::XACTUAL, 0, axis)?;
        self.bus.write_register(registers::XTARGET, 0, axis)?;
        self.bus.write_register(registers::SW_MODE, 0, axis)?;
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::POSITIONING, axis)?;
        self.bus
            .write_register(registers::VMAX, params.bump_speed, axis)?;
        self.bus.write_register(registers::DMAX, 0xFFFF, axis)?;
        self.bus
            .write_register(registers::XTARGET, params.retract as u32, axis)?;
        self.delay.delay_ms(STALL_SPINUP_MS);
        self.wait_for_standstill(axis, idle)?;

        // Back to smooth stepping, retract point becomes zero
        self.bus.write_register(registers::SW_MODE, 0, axis)?;
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::HOLD, axis)?;
        self.bus.write_register(
            registers::GCONF,
            registers::GCONF_STEALTH | params.direction_bit,
            axis,
        )?;
        self.bus.write_register(registers::XACTUAL, 0, axis)?;
        self.bus.write_register(registers::XTARGET, 0, axis)?;
        self.bus
            .write_register(registers::RAMPMODE, ramp_mode::POSITIONING, axis)?;
        self.delay.delay_ms(SWITCH_SETTLE_MS);

        self.mark_homed(axis);
        Ok(())
    }

    /// Reset the shared position state for a freshly homed axis.
    fn mark_homed(&mut self, axis: Axis) {
        let i = axis.index();
        critical_section::with(|_| {
            self.position[i] = 0;
            self.snapshot.target[i] = 0;
        });
    }

    fn wait_for_standstill<F>(&mut self, axis: Axis, idle: &mut F) -> Result<()>
    where
        F: FnMut(),
    {
        while self.bus.read_register(registers::RAMP_STAT, axis)? & ramp_stat::VZERO == 0 {
            idle();
        }
        Ok(())
    }
}
