//! Configuration validation.

use crate::axis::Axis;
use crate::error::{ConfigError, Error, Result};

use super::axis::AxisConfig;
use super::SystemConfig;

/// Validate a system configuration.
///
/// Checks:
/// - Current scales fit the 5-bit register fields
/// - Steps-per-mm values are positive
/// - Bump divisors are nonzero
/// - StallGuard thresholds fit the 7-bit signed register field
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for axis in Axis::ALL {
        validate_axis(axis, config.axis(axis))?;
    }
    Ok(())
}

fn validate_axis(axis: Axis, config: &AxisConfig) -> Result<()> {
    if config.run_current > 31 {
        return Err(Error::Config(ConfigError::InvalidCurrentScale(
            config.run_current,
        )));
    }
    if config.hold_current > 31 {
        return Err(Error::Config(ConfigError::InvalidCurrentScale(
            config.hold_current,
        )));
    }

    if !(config.steps_per_mm > 0.0) {
        return Err(Error::Config(ConfigError::InvalidStepsPerMm(
            heapless::String::try_from(axis.name()).unwrap_or_default(),
        )));
    }

    if config.homing_bump_divisor == 0 {
        return Err(Error::Config(ConfigError::InvalidBumpDivisor(0)));
    }

    if let Some(sg) = &config.stallguard {
        if sg.threshold < -64 || sg.threshold > 63 {
            return Err(Error::Config(ConfigError::InvalidStallThreshold(
                sg.threshold,
            )));
        }
    }

    Ok(())
}
