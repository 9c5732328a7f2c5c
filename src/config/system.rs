//! System configuration - root configuration structure.

use serde::Deserialize;

use crate::axis::Axis;

use super::axis::AxisConfig;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Per-axis driver configurations.
    pub axes: AxesConfig,
}

/// The four axis configurations.
#[derive(Debug, Clone, Deserialize)]
pub struct AxesConfig {
    /// X axis.
    pub x: AxisConfig,
    /// Y axis.
    pub y: AxisConfig,
    /// Z axis.
    pub z: AxisConfig,
    /// Extruder axis.
    pub e: AxisConfig,
}

impl SystemConfig {
    /// Configuration for one axis.
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.axes.x,
            Axis::Y => &self.axes.y,
            Axis::Z => &self.axes.z,
            Axis::E => &self.axes.e,
        }
    }
}
