//! Periodic timer abstractions
//!
//! The general-purpose timer raises one interrupt per elapsed period. The
//! only hardware knowledge the dispatcher needs is how to acknowledge that
//! interrupt; everything else is register-level detail behind this trait.

/// A hardware timer that raises a periodic update interrupt.
pub trait PeriodicTimer {
    /// Acknowledge the pending update interrupt in hardware.
    ///
    /// Must be called before the interrupt handler returns: an uncleared
    /// update flag re-raises the vector immediately and starves every
    /// lower-priority interrupt.
    fn clear_pending(&mut self);
}

/// Periodic timer configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    /// Update period in milliseconds
    pub period_ms: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { period_ms: 10 }
    }
}

impl TimerConfig {
    /// 1 kHz update rate
    pub const FAST_1KHZ: Self = Self { period_ms: 1 };

    /// 100 Hz update rate
    pub const SLOW_100HZ: Self = Self { period_ms: 10 };
}
