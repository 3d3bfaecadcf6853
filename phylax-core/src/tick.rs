//! Millisecond time base
//!
//! A single counter advanced from the system-timer interrupt and read from
//! everywhere else. Wraparound at `u32::MAX` is defined behavior: elapsed
//! time must always be computed with [`TickCount::elapsed_since`], never by
//! comparing raw values.

use portable_atomic::{AtomicU32, Ordering};

/// A point on the millisecond time base, modulo 2^32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickCount(pub u32);

impl TickCount {
    /// The counter's reset value.
    pub const ZERO: Self = Self(0);

    /// Milliseconds elapsed since `earlier`, correct across wraparound.
    pub const fn elapsed_since(self, earlier: Self) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// The tick `ms` milliseconds after this one, modulo 2^32.
    pub const fn wrapping_add(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}

/// The tick counter.
///
/// Single-writer discipline: [`on_tick`](TickCounter::on_tick) is called
/// only from the system-timer interrupt; [`now`](TickCounter::now) is safe
/// from any context. The counter is 32 bits wide so reads are atomic on the
/// target without a retry loop.
pub struct TickCounter(AtomicU32);

impl TickCounter {
    /// Create a counter at zero.
    pub const fn new() -> Self {
        Self::starting_at(TickCount::ZERO)
    }

    /// Create a counter at an arbitrary point on the time base.
    pub const fn starting_at(start: TickCount) -> Self {
        Self(AtomicU32::new(start.0))
    }

    /// Advance the time base by exactly one millisecond.
    ///
    /// Runs in the highest regularly-scheduled interrupt priority context
    /// the firmware uses; it must stay this short.
    pub fn on_tick(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Current tick count.
    pub fn now(&self) -> TickCount {
        TickCount(self.0.load(Ordering::Relaxed))
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}
