//! Configuration module for stepper-coprocessor.
//!
//! Provides types for loading and validating per-axis driver configuration
//! from TOML files (with `std` feature) or pre-parsed data.

mod axis;
#[cfg(feature = "std")]
mod loader;
mod system;
mod validation;

pub use axis::{AxisConfig, EndstopSwitch, StallGuardConfig, SwitchPosition};
pub use system::{AxesConfig, SystemConfig};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
