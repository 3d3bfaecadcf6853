//! Board-agnostic supervisory core for the Phylax firmware
//!
//! This crate contains the interrupt/fault/time layer logic that does not
//! depend on specific hardware implementations:
//!
//! - Millisecond tick counter (the firmware's only time source)
//! - Periodic task dispatcher for the general-purpose timer interrupt
//! - I2C transaction state machine driven by the event/error vectors
//! - Fail-stop fault containment
//! - Watchdog supervision glue
//!
//! Everything here runs in interrupt context on the target; handlers do
//! minimal, non-blocking work and return. Hardware access goes through the
//! `phylax-hal` traits, which is what makes this crate host-testable.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod fault;
pub mod i2c;
pub mod periodic;
pub mod tick;
pub mod watchdog;
