//! Endstop status reporting.
//!
//! With ramp generation running on the driver chips, endstops act on
//! motion in hardware; software only ever reads their state for
//! diagnostics (`M119`-style reporting). The chip-side query lives on
//! [`MotionController::endstop_status`]; the free function here covers
//! switches wired to plain MCU pins instead of the driver.
//!
//! [`MotionController::endstop_status`]: crate::MotionController::endstop_status

use embedded_hal::digital::InputPin;

use crate::error::{BusError, Error, Result};

/// Which end of the axis travel a switch sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndstopSide {
    /// Minimum (left) end.
    Min,
    /// Maximum (right) end.
    Max,
}

/// Observed state of an endstop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndstopStatus {
    /// Switch triggered.
    Hit,
    /// Switch not triggered.
    Open,
}

impl EndstopStatus {
    /// `true` when the switch is triggered.
    #[inline]
    pub fn is_hit(self) -> bool {
        matches!(self, EndstopStatus::Hit)
    }
}

/// Sample a switch wired to an MCU input pin.
///
/// `inverted` flips the electrical reading for active-low wiring.
///
/// # Errors
///
/// Returns [`BusError::Pin`] when the pin read fails.
pub fn probe_endstop<P: InputPin>(pin: &mut P, inverted: bool) -> Result<EndstopStatus> {
    let high = pin.is_high().map_err(|_| Error::Bus(BusError::Pin))?;
    Ok(if high != inverted {
        EndstopStatus::Hit
    } else {
        EndstopStatus::Open
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn test_probe_active_high() {
        let mut pin = PinMock::new(&[Transaction::get(State::High)]);
        assert_eq!(probe_endstop(&mut pin, false).unwrap(), EndstopStatus::Hit);
        pin.done();
    }

    #[test]
    fn test_probe_inverted() {
        let mut pin = PinMock::new(&[Transaction::get(State::High)]);
        assert_eq!(probe_endstop(&mut pin, true).unwrap(), EndstopStatus::Open);
        pin.done();
    }

    #[test]
    fn test_is_hit() {
        assert!(EndstopStatus::Hit.is_hit());
        assert!(!EndstopStatus::Open.is_hit());
    }
}
