//! Fail-stop fault containment
//!
//! Past a processor-level fault the architectural state is untrustworthy,
//! so the only safe move is to stop forward progress entirely and let the
//! independent watchdog force a clean hardware reset. No cleanup, no
//! logging, no resume.

use portable_atomic::{AtomicU8, Ordering};

/// Processor fault classes with dedicated vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultClass {
    /// Non-maskable interrupt (also carries clock-security notifications)
    Nmi,
    /// Hard fault
    HardFault,
    /// Memory-management fault
    MemManage,
    /// Bus fault
    BusFault,
    /// Usage fault
    UsageFault,
}

impl FaultClass {
    const fn as_raw(self) -> u8 {
        match self {
            FaultClass::Nmi => 1,
            FaultClass::HardFault => 2,
            FaultClass::MemManage => 3,
            FaultClass::BusFault => 4,
            FaultClass::UsageFault => 5,
        }
    }

    const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(FaultClass::Nmi),
            2 => Some(FaultClass::HardFault),
            3 => Some(FaultClass::MemManage),
            4 => Some(FaultClass::BusFault),
            5 => Some(FaultClass::UsageFault),
            _ => None,
        }
    }
}

/// One-way terminal fault marker.
///
/// Set once by the first fault vector to fire and never cleared; nothing
/// reads it to make decisions (the system halts). Its lifecycle ends at the
/// watchdog-forced hardware reset.
pub struct FaultState(AtomicU8);

impl FaultState {
    /// Create an unfaulted marker.
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Latch `class` if no fault has been recorded yet.
    ///
    /// Returns `true` if this call recorded the fault; a later fault class
    /// never overwrites the first.
    pub fn record(&self, class: FaultClass) -> bool {
        self.0
            .compare_exchange(0, class.as_raw(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether any fault has been recorded.
    pub fn is_faulted(&self) -> bool {
        self.0.load(Ordering::Acquire) != 0
    }

    /// The first fault recorded, if any.
    pub fn current(&self) -> Option<FaultClass> {
        FaultClass::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Record `class` and stop forward progress permanently.
    ///
    /// This is the body of every fault vector: an infinite, non-returning
    /// spin. Recovery is the watchdog's job, not ours.
    pub fn halt(&self, class: FaultClass) -> ! {
        self.record(class);
        loop {
            core::hint::spin_loop();
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}
