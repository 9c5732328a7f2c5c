//! Per-axis driver configuration from TOML.

use serde::Deserialize;

use crate::registers::{sw_mode, GCONF_SHAFT};

/// Which reference switch input the axis homes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchPosition {
    /// Left (minimum) reference switch.
    Left,
    /// Right (maximum) reference switch.
    Right,
}

/// Endstop switch wiring for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EndstopSwitch {
    /// Which switch input is wired.
    pub position: SwitchPosition,

    /// Whether the switch is active low.
    #[serde(default)]
    pub active_low: bool,
}

impl EndstopSwitch {
    /// Compose the SW_MODE word enabling this switch.
    pub fn sw_register(&self) -> u32 {
        match self.position {
            SwitchPosition::Left => {
                let mut word = sw_mode::STOP_L_ENABLE;
                if self.active_low {
                    word |= sw_mode::POL_STOP_L;
                }
                word
            }
            SwitchPosition::Right => {
                let mut word = sw_mode::STOP_R_ENABLE;
                if self.active_low {
                    word |= sw_mode::POL_STOP_R;
                }
                word
            }
        }
    }
}

/// StallGuard (sensorless homing) configuration for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StallGuardConfig {
    /// Stall detection threshold; lower values mean higher sensitivity.
    pub threshold: i8,
}

/// Complete configuration for one axis driver.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Motor run current scale (0..=31).
    pub run_current: u8,

    /// Standstill current scale (0..=31).
    pub hold_current: u8,

    /// Invert motor direction.
    #[serde(default)]
    pub invert_direction: bool,

    /// Full steps per millimetre of axis travel.
    pub steps_per_mm: f32,

    /// Retract distance after the first endstop touch, millimetres.
    #[serde(default = "default_home_bump_mm")]
    pub home_bump_mm: f32,

    /// Divisor applied to the homing speed for the retract move.
    #[serde(default = "default_bump_divisor")]
    pub homing_bump_divisor: u8,

    /// Endstop switch wiring, if the axis has a physical switch.
    #[serde(default)]
    pub endstop: Option<EndstopSwitch>,

    /// StallGuard settings; when present, homing uses stall detection
    /// instead of the switch.
    #[serde(default)]
    pub stallguard: Option<StallGuardConfig>,

    /// Upper bound on a segment's final speed, device units. The reference
    /// profile sets this on the Z and extruder axes.
    #[serde(default)]
    pub final_speed_ceiling: Option<u32>,
}

fn default_home_bump_mm() -> f32 {
    2.0
}

fn default_bump_divisor() -> u8 {
    2
}

impl AxisConfig {
    /// SW_MODE word for this axis's endstop, or zero when no switch is wired.
    pub fn sw_register(&self) -> u32 {
        self.endstop.map(|e| e.sw_register()).unwrap_or(0)
    }

    /// GCONF direction (shaft) bit.
    #[inline]
    pub fn direction_bit(&self) -> u32 {
        if self.invert_direction {
            GCONF_SHAFT
        } else {
            0
        }
    }
}
