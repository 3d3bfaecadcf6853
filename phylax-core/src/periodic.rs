//! Periodic task dispatcher
//!
//! Reacts to the general-purpose timer's update interrupt by running one
//! application callback per period. There is no catch-up: a missed period is
//! absorbed into the next one.

use phylax_hal::timer::PeriodicTimer;

/// Dispatches the timer update interrupt to an application callback.
///
/// The callback runs in interrupt context and must not block; while it
/// runs, every interrupt of equal or lower priority is starved. That is a
/// contract on the callback, not something this layer can police.
pub struct PeriodicDispatcher<T, C>
where
    T: PeriodicTimer,
    C: FnMut(),
{
    timer: T,
    callback: C,
}

impl<T, C> PeriodicDispatcher<T, C>
where
    T: PeriodicTimer,
    C: FnMut(),
{
    /// Bind a started timer to its per-period callback.
    pub fn new(timer: T, callback: C) -> Self {
        Self { timer, callback }
    }

    /// Handle one timer update interrupt.
    ///
    /// The pending flag is cleared before the callback runs: the clear is
    /// the mandatory hardware handshake, and an uncleared flag re-raises
    /// this vector forever.
    pub fn on_interrupt(&mut self) {
        self.timer.clear_pending();
        (self.callback)();
    }
}
