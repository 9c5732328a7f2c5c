//! TMC5130 register map.
//!
//! Only the registers this driver touches. Addresses and bit positions are
//! from the TMC5130A datasheet.

/// Write-access bit, OR'd into the address byte of a write datagram.
pub const WRITE_ACCESS: u8 = 0x80;

/// General configuration.
pub const GCONF: u8 = 0x00;
/// Motor run/hold current and hold delay.
pub const IHOLD_IRUN: u8 = 0x10;
/// Lower velocity threshold for CoolStep/StallGuard operation.
pub const TCOOLTHRS: u8 = 0x14;
/// Ramp mode selection.
pub const RAMPMODE: u8 = 0x20;
/// Actual position.
pub const XACTUAL: u8 = 0x21;
/// Start velocity of the ramp.
pub const VSTART: u8 = 0x23;
/// First acceleration stage.
pub const A1: u8 = 0x24;
/// Velocity threshold between acceleration stages.
pub const V1: u8 = 0x25;
/// Main acceleration.
pub const AMAX: u8 = 0x26;
/// Target/cruise velocity.
pub const VMAX: u8 = 0x27;
/// Main deceleration.
pub const DMAX: u8 = 0x28;
/// First deceleration stage.
pub const D1: u8 = 0x2A;
/// Stop velocity of the ramp.
pub const VSTOP: u8 = 0x2B;
/// Target position; writing it starts a positioning move.
pub const XTARGET: u8 = 0x2D;
/// Reference switch and StallGuard stop configuration.
pub const SW_MODE: u8 = 0x34;
/// Ramp and reference switch status flags.
pub const RAMP_STAT: u8 = 0x35;
/// Chopper configuration.
pub const CHOPCONF: u8 = 0x6C;
/// CoolStep and StallGuard configuration.
pub const COOLCONF: u8 = 0x6D;

/// RAMPMODE values.
pub mod ramp_mode {
    /// Positioning mode: moves toward XTARGET.
    pub const POSITIONING: u32 = 0;
    /// Velocity mode, positive direction.
    pub const VELOCITY_POS: u32 = 1;
    /// Velocity mode, negative direction (toward the endstop).
    pub const VELOCITY_NEG: u32 = 2;
    /// Hold mode: velocity remains at zero.
    pub const HOLD: u32 = 3;
}

/// SW_MODE bits.
pub mod sw_mode {
    /// Enable stop on the left reference switch.
    pub const STOP_L_ENABLE: u32 = 1 << 0;
    /// Enable stop on the right reference switch.
    pub const STOP_R_ENABLE: u32 = 1 << 1;
    /// Invert left switch polarity (active low).
    pub const POL_STOP_L: u32 = 1 << 2;
    /// Invert right switch polarity (active low).
    pub const POL_STOP_R: u32 = 1 << 3;
    /// Enable stop on StallGuard event.
    pub const SG_STOP: u32 = 1 << 10;
}

/// RAMP_STAT bits.
pub mod ramp_stat {
    /// Left reference switch status.
    pub const STATUS_STOP_L: u32 = 1 << 0;
    /// Right reference switch status.
    pub const STATUS_STOP_R: u32 = 1 << 1;
    /// Actual velocity is zero.
    pub const VZERO: u32 = 1 << 10;
}

/// GCONF word with StealthChop (en_pwm_mode) enabled. OR in the shaft bit
/// for direction inversion.
pub const GCONF_STEALTH: u32 = 0x1084;
/// GCONF word with StealthChop disabled, required for StallGuard homing.
pub const GCONF_SPREADCYCLE: u32 = 0x1080;
/// Shaft bit: inverts motor direction.
pub const GCONF_SHAFT: u32 = 1 << 4;

/// Operating chopper configuration (TOFF, TBL, microstep resolution).
pub const CHOPCONF_OPERATING: u32 = 0x1401_01D5;

/// Pack the IHOLD_IRUN register from current scales and hold delay.
#[inline]
pub const fn ihold_irun(ihold: u8, irun: u8, iholddelay: u8) -> u32 {
    (ihold as u32 & 0x1F) | ((irun as u32 & 0x1F) << 8) | ((iholddelay as u32 & 0x0F) << 16)
}

/// Pack a StallGuard threshold into the COOLCONF sgt field.
#[inline]
pub const fn coolconf_sgt(threshold: i8) -> u32 {
    ((threshold as u32) & 0x7F) << 16
}
