//! Dispatch timer interface.
//!
//! The dispatcher paces segments with a 16-bit hardware timer whose compare
//! interrupt calls [`crate::MotionController::isr`]. Segment durations
//! routinely exceed the 16-bit range, so the dispatcher keeps a 32-bit
//! software countdown and rearms the counter across multiple firings.

/// Hardware timer behind the dispatch interrupt.
///
/// Implementors are expected to run the timer in clear-on-compare mode at
/// 2 MHz (e.g. a 16 MHz clock with a divide-by-8 prescaler) so that one tick
/// matches the calculator's duration unit.
pub trait DispatchTimer {
    /// One-time setup: configure compare mode and prescaler, load the given
    /// compare value, zero the counter, and enable the compare interrupt.
    fn start(&mut self, compare: u16);

    /// Current counter value.
    fn count(&self) -> u16;

    /// Overwrite the counter value.
    ///
    /// The dispatcher sets the counter close to the compare point to choose
    /// when the next interrupt fires.
    fn set_count(&mut self, value: u16);
}
