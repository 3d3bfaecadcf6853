//! I2C controller abstractions
//!
//! The transaction engine in `phylax-core` is a state machine over abstract
//! phase boundaries. Which register bits gate the address, data, and stop
//! phases is vendor-specific, so that knowledge lives entirely behind
//! [`I2cPhy`].

/// Transfer direction on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Controller transmits to the target
    Write,
    /// Controller receives from the target
    Read,
}

/// Bus-level transfer failure, delivered through the error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Target did not acknowledge its address or a data byte
    Nack,
    /// Lost bus arbitration to another controller
    ArbitrationLost,
    /// Bus timeout (SCL held low too long)
    Timeout,
    /// Event or error interrupt raised with no matching driver state;
    /// the controller and driver have lost agreement on the bus state
    Desync,
}

/// Per-phase I2C controller contract.
///
/// One transfer is driven as: `start` → phase-boundary events for address,
/// each data byte, and stop. The controller raises exactly one event
/// interrupt per phase boundary; any additional intra-phase interrupts the
/// hardware produces (e.g. a start-bit-sent stage) are serviced inside
/// [`phase_event`](I2cPhy::phase_event) and hidden from the engine.
pub trait I2cPhy {
    /// Drive the start condition and address byte for a new transfer.
    fn start(&mut self, address: u8, direction: Direction);

    /// Service a raised event interrupt.
    ///
    /// Returns `true` when the event is a phase boundary the engine must
    /// act on, `false` when it was internal plumbing already handled here.
    /// Must also perform whatever flag clearing the hardware requires;
    /// an unacknowledged event re-raises the vector.
    fn phase_event(&mut self) -> bool;

    /// Queue one byte for transmission in the current data phase.
    fn write_byte(&mut self, byte: u8);

    /// Latch the byte received at the current data phase boundary.
    fn read_byte(&mut self) -> u8;

    /// Drive the stop condition after the final data byte.
    fn stop(&mut self);

    /// Identify and clear the fault behind an error interrupt.
    ///
    /// Reports one of [`BusError::Nack`], [`BusError::ArbitrationLost`],
    /// or [`BusError::Timeout`]; `Desync` is the engine's to raise, never
    /// the phy's. Also invoked when the error line raises with nothing in
    /// flight: the flags must be cleared regardless, the reported kind is
    /// then discarded.
    fn take_error(&mut self) -> BusError;
}

/// I2C bus configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };
}
