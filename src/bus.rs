//! Register bus transport.
//!
//! The driver chips sit on a shared synchronous serial bus with one
//! chip-select line per axis. Every exchange is a five-byte frame: an
//! address byte followed by a 32-bit value, most significant byte first on
//! the wire. The chip returns the value of the *previously* addressed
//! register in the same frame it is given a new address, so a read is two
//! back-to-back frames with a short gap between them.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::axis::Axis;
use crate::error::{BusError, Result};
use crate::registers::{GCONF, WRITE_ACCESS};

/// Register access for the four axis drivers.
///
/// The sole hardware-facing surface of the crate. Implementations must
/// guarantee that no other axis's select line changes during a transfer.
pub trait Bus {
    /// Read a 32-bit register from the given axis's driver.
    fn read_register(&mut self, address: u8, axis: Axis) -> Result<u32>;

    /// Write a 32-bit register on the given axis's driver.
    ///
    /// Returns the status byte clocked back during the address phase.
    fn write_register(&mut self, address: u8, data: u32, axis: Axis) -> Result<u8>;

    /// Read the status byte without changing any register.
    fn read_status(&mut self, axis: Axis) -> Result<u8>;
}

/// Default inter-frame gap for reads, in nanoseconds.
///
/// The minimum required gap is hardware specific; this default corresponds
/// to a few CPU cycles on a 16 MHz controller. Tune with
/// [`SpiTransport::with_read_gap_ns`].
pub const DEFAULT_READ_GAP_NS: u32 = 200;

/// SPI implementation of [`Bus`] using embedded-hal 1.0 traits.
///
/// Generic over:
/// - `SPI`: the shared bus (must implement `SpiBus<u8>`)
/// - `CS`: chip-select pin type (one per axis, must implement `OutputPin`)
/// - `D`: delay provider for the read inter-frame gap (must implement `DelayNs`)
pub struct SpiTransport<SPI, CS, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    spi: SPI,
    cs: [CS; Axis::COUNT],
    delay: D,
    read_gap_ns: u32,
}

impl<SPI, CS, D> SpiTransport<SPI, CS, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    /// Create a transport from the SPI bus and per-axis chip-select pins.
    ///
    /// Pins are in canonical axis order (X, Y, Z, E) and must already be
    /// configured as outputs, deasserted (high).
    pub fn new(spi: SPI, cs: [CS; Axis::COUNT], delay: D) -> Self {
        Self {
            spi,
            cs,
            delay,
            read_gap_ns: DEFAULT_READ_GAP_NS,
        }
    }

    /// Set the inter-frame gap used by register reads.
    pub fn with_read_gap_ns(mut self, gap_ns: u32) -> Self {
        self.read_gap_ns = gap_ns;
        self
    }

    /// Release the SPI bus and chip-select pins.
    pub fn release(self) -> (SPI, [CS; Axis::COUNT], D) {
        (self.spi, self.cs, self.delay)
    }

    fn select(&mut self, axis: Axis) -> Result<()> {
        self.cs[axis.index()]
            .set_low()
            .map_err(|_| BusError::Pin)?;
        Ok(())
    }

    fn deselect(&mut self, axis: Axis) -> Result<()> {
        self.cs[axis.index()]
            .set_high()
            .map_err(|_| BusError::Pin)?;
        Ok(())
    }

    /// One framed five-byte full-duplex exchange.
    fn frame(&mut self, axis: Axis, buf: &mut [u8; 5]) -> Result<()> {
        self.select(axis)?;
        let transferred = self
            .spi
            .transfer_in_place(buf)
            .and_then(|()| self.spi.flush())
            .map_err(|_| BusError::Transfer);
        // Deassert even if the transfer failed
        let deselected = self.deselect(axis);
        transferred?;
        deselected
    }
}

impl<SPI, CS, D> Bus for SpiTransport<SPI, CS, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    fn read_register(&mut self, address: u8, axis: Axis) -> Result<u32> {
        // First frame addresses the register; the data it returns belongs to
        // whatever was addressed before and is discarded.
        let mut buf = [address, 0, 0, 0, 0];
        self.frame(axis, &mut buf)?;

        self.delay.delay_ns(self.read_gap_ns);

        // Second frame retrieves the value, MSB first.
        let mut buf = [address, 0, 0, 0, 0];
        self.frame(axis, &mut buf)?;

        Ok(u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]))
    }

    fn write_register(&mut self, address: u8, data: u32, axis: Axis) -> Result<u8> {
        let value = data.to_be_bytes();
        let mut buf = [
            address | WRITE_ACCESS,
            value[0],
            value[1],
            value[2],
            value[3],
        ];
        self.frame(axis, &mut buf)?;

        Ok(buf[0])
    }

    fn read_status(&mut self, axis: Axis) -> Result<u8> {
        // Address any register; only the status byte of the reply matters.
        let mut buf = [GCONF, 0, 0, 0, 0];
        self.frame(axis, &mut buf)?;
        Ok(buf[0])
    }
}
