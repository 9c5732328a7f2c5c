//! Logical axis identifiers.
//!
//! Each axis maps 1:1 to a driver chip and its chip-select line.

/// Logical machine axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z (vertical) axis.
    Z,
    /// Extruder axis.
    E,
}

impl Axis {
    /// Number of axes driven by the coprocessor.
    pub const COUNT: usize = 4;

    /// All axes in canonical order.
    pub const ALL: [Axis; Axis::COUNT] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Array index for per-axis state.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::E => 3,
        }
    }

    /// Bit mask for this axis in a direction-bits byte.
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Axis name for display/debugging.
    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::E => "E",
        }
    }
}

impl core::fmt::Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
