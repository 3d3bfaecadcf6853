//! Board glue: heartbeat LED, clock security, timer and watchdog handles

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use phylax_hal::timer::{PeriodicTimer, TimerConfig};
use phylax_hal::watchdog::WatchdogHandle;
use stm32f1xx_hal::gpio::{Output, Pin, PushPull};
use stm32f1xx_hal::pac;
use stm32f1xx_hal::timer::{CounterMs, Event};
use stm32f1xx_hal::watchdog::IndependentWatchdog;

/// PC13 status LED (active low on the common F103 boards).
pub type HeartbeatLed = Pin<'C', 13, Output<PushPull>>;

/// Owned by the periodic callback; written once at init.
static HEARTBEAT_LED: Mutex<RefCell<Option<HeartbeatLed>>> = Mutex::new(RefCell::new(None));

/// Hand the LED to the periodic callback.
pub fn install_led(led: HeartbeatLed) {
    cortex_m::interrupt::free(|cs| {
        HEARTBEAT_LED.borrow(cs).replace(Some(led));
    });
}

/// Periodic task: toggle the heartbeat LED.
pub fn heartbeat() {
    cortex_m::interrupt::free(|cs| {
        if let Some(led) = HEARTBEAT_LED.borrow(cs).borrow_mut().as_mut() {
            led.toggle();
        }
    });
}

/// Arm the clock security system. A crystal failure then lands on the NMI
/// vector, which is handled as a fault.
pub fn enable_css() {
    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.cr.modify(|_, w| w.csson().set_bit());
}

/// Acknowledge a clock security event. Must happen before the NMI handler
/// parks, or the pending flag re-raises the vector during the spin.
pub fn acknowledge_css() {
    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.cir.write(|w| w.cssc().set_bit());
}

/// TIM2 as the periodic task timer.
pub struct Tim2Periodic(CounterMs<pac::TIM2>);

impl Tim2Periodic {
    /// Start TIM2 at the configured period with the update interrupt on.
    pub fn start(mut counter: CounterMs<pac::TIM2>, config: TimerConfig) -> Self {
        use stm32f1xx_hal::prelude::*;

        // The period always fits a 32-bit ms counter; start cannot fail.
        counter.start(config.period_ms.millis()).ok();
        counter.listen(Event::Update);
        Self(counter)
    }
}

impl PeriodicTimer for Tim2Periodic {
    fn clear_pending(&mut self) {
        self.0.clear_interrupt(Event::Update);
    }
}

/// IWDG as the independent watchdog.
pub struct IwdgHandle(IndependentWatchdog);

impl IwdgHandle {
    pub fn new(dog: IndependentWatchdog) -> Self {
        Self(dog)
    }
}

impl WatchdogHandle for IwdgHandle {
    fn refresh(&mut self) {
        self.0.feed();
    }
}
