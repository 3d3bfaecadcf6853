//! Watchdog supervision glue
//!
//! The hardware watchdog is a dead-man's switch: it cannot say why a reset
//! happened, only demand periodic proof that the firmware is alive. This
//! module binds a started watchdog to its feed discipline.

use phylax_hal::watchdog::{WatchdogConfig, WatchdogHandle};

/// Binds a hardware watchdog to the interval healthy code must feed it at.
pub struct WatchdogSupervisor<W: WatchdogHandle> {
    hw: W,
    config: WatchdogConfig,
}

impl<W: WatchdogHandle> WatchdogSupervisor<W> {
    /// Take ownership of a started watchdog.
    pub fn new(hw: W, config: WatchdogConfig) -> Self {
        Self { hw, config }
    }

    /// Supply the liveness proof.
    ///
    /// Healthy application code must call this at least once per
    /// [`refresh_interval_ms`](Self::refresh_interval_ms); a firmware stuck
    /// in a fault halt or a blocking callback stops calling and is reset
    /// after the hardware timeout.
    pub fn refresh(&mut self) {
        self.hw.refresh();
    }

    /// Feed period with margin: half the hardware timeout.
    pub fn refresh_interval_ms(&self) -> u32 {
        self.config.timeout_ms / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingDog<'a>(&'a mut u32);

    impl WatchdogHandle for CountingDog<'_> {
        fn refresh(&mut self) {
            *self.0 += 1;
        }
    }

    #[test]
    fn test_refresh_reaches_hardware() {
        let mut feeds = 0;
        {
            let mut supervisor = WatchdogSupervisor::new(
                CountingDog(&mut feeds),
                WatchdogConfig { timeout_ms: 1_000 },
            );
            supervisor.refresh();
            supervisor.refresh();
        }
        assert_eq!(feeds, 2);
    }

    #[test]
    fn test_refresh_interval_halves_timeout() {
        let mut feeds = 0;
        let supervisor = WatchdogSupervisor::new(
            CountingDog(&mut feeds),
            WatchdogConfig { timeout_ms: 800 },
        );
        assert_eq!(supervisor.refresh_interval_ms(), 400);
    }
}
