//! Phylax Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the supervisory core
//! is written against. The core never touches a peripheral register; it
//! drives these traits, and a chip-specific implementation (STM32F1 today)
//! supplies the register-level behavior.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Interrupt vectors (phylax-firmware)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  phylax-core (state machines)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  phylax-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Register-level impls (STM32F1, mocks)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cPhy`] - Per-phase I2C controller contract
//! - [`timer::PeriodicTimer`] - Periodic timer interrupt handshake
//! - [`watchdog::WatchdogHandle`] - Independent watchdog refresh

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod timer;
pub mod watchdog;

// Re-export key traits at crate root for convenience
pub use i2c::I2cPhy;
pub use timer::PeriodicTimer;
pub use watchdog::WatchdogHandle;
