//! # stepper-coprocessor
//!
//! Motion control for TMC5130-class stepper drivers with on-chip ramp
//! generation, over embedded-hal 1.0 SPI.
//!
//! The drivers do the step/dir timing themselves; this crate feeds them.
//! Planner blocks are converted ahead of time into per-axis register
//! segments (a cheap fixed-point pass), queued, and burst-written to the
//! chips from a periodic timer interrupt. The interrupt itself does no
//! arithmetic beyond a countdown.
//!
//! ## Features
//!
//! - **Configuration-driven**: Per-axis currents, endstops and homing in TOML
//! - **embedded-hal 1.0**: Uses `SpiBus` + `OutputPin` for the register bus
//! - **no_std compatible**: Core library works without standard library
//! - **Decoupled pipeline**: Foreground calculator, interrupt dispatcher,
//!   lock-free segment queue between them
//! - **Switch and sensorless homing**: Wired endstops or StallGuard per axis
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_coprocessor::{MotionController, SpiTransport};
//!
//! // Load per-axis configuration from TOML
//! let config = stepper_coprocessor::load_config("axes.toml")?;
//!
//! // One SPI bus, one chip-select per axis (X, Y, Z, E)
//! let bus = SpiTransport::new(spi, [cs_x, cs_y, cs_z, cs_e], delay);
//! let mut controller: MotionController<_, _, _, 16> =
//!     MotionController::new(bus, timer, delay2, config);
//! controller.init()?;
//!
//! // Foreground loop: keep the segment queue fed
//! controller.calculate(&mut planner);
//!
//! // Timer compare-match handler:
//! controller.isr()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod axis;
pub mod bus;
pub mod config;
pub mod controller;
pub mod endstop;
pub mod error;
pub mod planner;
pub mod registers;
pub mod segment;
pub mod timer;

// Re-exports for ergonomic API
pub use axis::Axis;
pub use bus::{Bus, SpiTransport};
pub use config::{validate_config, AxisConfig, SystemConfig};
pub use controller::MotionController;
pub use endstop::{probe_endstop, EndstopSide, EndstopStatus};
pub use error::{Error, Result};
pub use planner::{KinematicBlock, MotionPlanner};
pub use segment::{MotionSegment, SegmentBuffer};
pub use timer::DispatchTimer;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
