//! Interrupt and exception vectors
//!
//! The compile-time vector table: `#[exception]` for processor-level
//! vectors, `#[interrupt]` for the peripherals. Handler state lives in
//! static cells with single-writer discipline - each cell is mutated only
//! from its own vector (or the one-shot install call at init, before the
//! vector is unmasked).

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use cortex_m_rt::exception;
use stm32f1xx_hal::pac::interrupt;

use phylax_core::fault::{FaultClass, FaultState};
use phylax_core::i2c::I2cEngine;
use phylax_core::periodic::PeriodicDispatcher;
use phylax_core::tick::TickCounter;

use crate::board::{self, Tim2Periodic};
use crate::bus::{BusHooks, I2c2Phy};

/// The firmware's only time source. Written by SysTick, read anywhere.
pub static TICKS: TickCounter = TickCounter::new();

/// Terminal fault marker. Set once by a fault vector, cleared by reset.
pub static FAULTS: FaultState = FaultState::new();

pub type Periodic = PeriodicDispatcher<Tim2Periodic, fn()>;
static PERIODIC: Mutex<RefCell<Option<Periodic>>> = Mutex::new(RefCell::new(None));

pub type Bus = I2cEngine<I2c2Phy, BusHooks>;
pub static I2C_BUS: Mutex<RefCell<Option<Bus>>> = Mutex::new(RefCell::new(None));

/// Install the periodic dispatcher before unmasking TIM2.
pub fn install_periodic(dispatcher: Periodic) {
    cortex_m::interrupt::free(|cs| {
        PERIODIC.borrow(cs).replace(Some(dispatcher));
    });
}

/// Install the bus engine before unmasking the I2C2 vectors.
pub fn install_bus(bus: Bus) {
    cortex_m::interrupt::free(|cs| {
        I2C_BUS.borrow(cs).replace(Some(bus));
    });
}

/// System timer: advance the time base by one millisecond.
#[exception]
fn SysTick() {
    TICKS.on_tick();
}

/// Periodic task timer.
#[interrupt]
fn TIM2() {
    cortex_m::interrupt::free(|cs| {
        if let Some(dispatcher) = PERIODIC.borrow(cs).borrow_mut().as_mut() {
            dispatcher.on_interrupt();
        }
    });
}

/// I2C2 event (phase completed) interrupt.
#[interrupt]
fn I2C2_EV() {
    cortex_m::interrupt::free(|cs| {
        if let Some(bus) = I2C_BUS.borrow(cs).borrow_mut().as_mut() {
            bus.on_event_interrupt();
        }
    });
}

/// I2C2 error interrupt.
#[interrupt]
fn I2C2_ER() {
    cortex_m::interrupt::free(|cs| {
        if let Some(bus) = I2C_BUS.borrow(cs).borrow_mut().as_mut() {
            bus.on_error_interrupt();
        }
    });
}

/// Non-maskable interrupt. The clock security system is multiplexed onto
/// this vector, so acknowledge it before parking.
#[exception]
fn NonMaskableInt() {
    board::acknowledge_css();
    FAULTS.halt(FaultClass::Nmi);
}

#[exception]
unsafe fn HardFault(_frame: &cortex_m_rt::ExceptionFrame) -> ! {
    FAULTS.halt(FaultClass::HardFault)
}

#[exception]
fn MemoryManagement() {
    FAULTS.halt(FaultClass::MemManage);
}

#[exception]
fn BusFault() {
    FAULTS.halt(FaultClass::BusFault);
}

#[exception]
fn UsageFault() {
    FAULTS.halt(FaultClass::UsageFault);
}
