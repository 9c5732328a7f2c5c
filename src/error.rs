//! Error types for stepper-coprocessor.
//!
//! Provides unified error handling across configuration, bus transport, and
//! driver lifecycle. Motion arithmetic itself never fails: degenerate
//! kinematic input is handled by clamping, not by errors.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-coprocessor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Register bus transfer error
    Bus(BusError),
    /// Driver lifecycle error
    Driver(DriverError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid current scale (must be 0-31)
    InvalidCurrentScale(u8),
    /// Invalid steps-per-mm (must be > 0)
    InvalidStepsPerMm(heapless::String<8>),
    /// Invalid homing bump divisor (must be >= 1)
    InvalidBumpDivisor(u8),
    /// StallGuard threshold out of range (-64..=63)
    InvalidStallThreshold(i8),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Register bus errors.
///
/// The wire protocol has no error reporting of its own; these cover the
/// host-side SPI peripheral and GPIO pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// SPI transfer failed
    Transfer,
    /// GPIO pin operation failed
    Pin,
}

/// Driver lifecycle errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// `init()` was called more than once
    AlreadyInitialized,
    /// Operation requires `init()` to have been called
    NotInitialized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Bus(e) => write!(f, "Bus error: {}", e),
            Error::Driver(e) => write!(f, "Driver error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidCurrentScale(v) => {
                write!(f, "Invalid current scale: {}. Must be 0-31", v)
            }
            ConfigError::InvalidStepsPerMm(axis) => {
                write!(f, "Invalid steps_per_mm for axis {}. Must be > 0", axis)
            }
            ConfigError::InvalidBumpDivisor(v) => {
                write!(f, "Invalid homing bump divisor: {}. Must be >= 1", v)
            }
            ConfigError::InvalidStallThreshold(v) => {
                write!(f, "Invalid StallGuard threshold: {}. Must be -64..=63", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Transfer => write!(f, "SPI transfer failed"),
            BusError::Pin => write!(f, "GPIO pin operation failed"),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::AlreadyInitialized => write!(f, "Driver already initialized"),
            DriverError::NotInitialized => write!(f, "Driver not initialized"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Error::Bus(e)
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::Driver(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for BusError {}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}
