//! Independent watchdog abstractions
//!
//! The watchdog is an externally clocked hardware timer that forces a full
//! system reset unless software proves liveness by refreshing it. It keeps
//! counting through processor faults, which is the whole point: a firmware
//! stuck in a fail-stop loop refreshes nothing and gets reset.

/// A started hardware watchdog that accepts refreshes.
///
/// Configuration (timeout, clocking) happens once at initialization before
/// any handle reaches the supervisory core; this trait deliberately exposes
/// nothing but the refresh.
pub trait WatchdogHandle {
    /// Reload the watchdog counter, postponing the reset by one timeout.
    fn refresh(&mut self);
}

/// Watchdog configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogConfig {
    /// Reset timeout in milliseconds
    pub timeout_ms: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self { timeout_ms: 1_000 }
    }
}
