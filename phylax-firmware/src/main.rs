//! Phylax - Interrupt supervision core firmware
//!
//! Firmware binary for STM32F103-based boards. Owns the millisecond time
//! base, dispatches the periodic timer and I2C controller interrupts into
//! the board-agnostic core, fail-stops on processor faults, and feeds the
//! independent watchdog from the main loop.
//!
//! Named after the Greek "phylax" (φύλαξ) meaning "watchman".

#![no_std]
#![no_main]

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use defmt::{info, warn};
use stm32f1xx_hal::{pac, prelude::*};
use {defmt_rtt as _, panic_probe as _};

use phylax_core::i2c::I2cEngine;
use phylax_core::periodic::PeriodicDispatcher;
use phylax_core::watchdog::WatchdogSupervisor;
use phylax_hal::i2c::I2cConfig;
use phylax_hal::timer::TimerConfig;
use phylax_hal::watchdog::WatchdogConfig;
use stm32f1xx_hal::watchdog::IndependentWatchdog;

use crate::board::{IwdgHandle, Tim2Periodic};
use crate::bus::{BusHooks, I2c2Phy};

mod board;
mod bus;
mod vectors;

/// Time base rate: one tick per millisecond.
const TICK_HZ: u32 = 1_000;

/// Boot-time bus probe target.
const PROBE_ADDRESS: u8 = 0x50;

/// Main entry point
#[entry]
fn main() -> ! {
    info!("Phylax firmware starting...");

    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clock tree: HSE 8 MHz crystal up to 72 MHz sysclk, APB1 at its
    // 36 MHz limit.
    let mut flash = dp.FLASH.constrain();
    let rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .use_hse(8.MHz())
        .sysclk(72.MHz())
        .pclk1(36.MHz())
        .freeze(&mut flash.acr);
    info!("Clocks locked: sysclk {} Hz", clocks.sysclk().raw());

    // Crystal failure must reach the NMI fault path.
    board::enable_css();

    // SysTick at 1 kHz drives the time base.
    let mut syst = cp.SYST;
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(clocks.sysclk().raw() / TICK_HZ - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();

    // PC13 heartbeat LED, toggled by the periodic task.
    let mut gpioc = dp.GPIOC.split();
    let led = gpioc.pc13.into_push_pull_output(&mut gpioc.crh);
    board::install_led(led);

    // TIM2 periodic task at 100 Hz.
    let timer = Tim2Periodic::start(dp.TIM2.counter_ms(&clocks), TimerConfig::SLOW_100HZ);
    vectors::install_periodic(PeriodicDispatcher::new(timer, board::heartbeat as fn()));

    // I2C2 on PB10 (SCL) / PB11 (SDA).
    let mut gpiob = dp.GPIOB.split();
    let _scl = gpiob.pb10.into_alternate_open_drain(&mut gpiob.crh);
    let _sda = gpiob.pb11.into_alternate_open_drain(&mut gpiob.crh);
    let phy = I2c2Phy::new(dp.I2C2, I2cConfig::STANDARD, clocks.pclk1().raw());
    vectors::install_bus(I2cEngine::new(phy, BusHooks));

    // Handlers have their state; open the vectors.
    unsafe {
        NVIC::unmask(pac::Interrupt::TIM2);
        NVIC::unmask(pac::Interrupt::I2C2_EV);
        NVIC::unmask(pac::Interrupt::I2C2_ER);
    }
    info!("Vectors unmasked");

    // Probe the bus once so a wiring fault shows up at boot instead of on
    // first use.
    cortex_m::interrupt::free(|cs| {
        if let Some(bus) = vectors::I2C_BUS.borrow(cs).borrow_mut().as_mut() {
            if let Err(e) = bus.begin_read(PROBE_ADDRESS, 1) {
                warn!("bus probe rejected: {}", e);
            }
        }
    });

    // Watchdog last: from here on, stalling longer than the timeout means
    // a reset.
    let config = WatchdogConfig { timeout_ms: 1_000 };
    let mut dog = IndependentWatchdog::new(dp.IWDG);
    dog.start(config.timeout_ms.millis());
    let mut supervisor = WatchdogSupervisor::new(IwdgHandle::new(dog), config);

    info!(
        "Supervision core running, watchdog fed every {} ms",
        supervisor.refresh_interval_ms()
    );

    let feed_every = supervisor.refresh_interval_ms();
    let mut last_feed = vectors::TICKS.now();
    loop {
        let now = vectors::TICKS.now();
        if now.elapsed_since(last_feed) >= feed_every {
            supervisor.refresh();
            last_feed = now;
        }
        cortex_m::asm::wfi();
    }
}
