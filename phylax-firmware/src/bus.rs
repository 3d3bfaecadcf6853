//! Register-level I2C2 phy for the STM32F1
//!
//! Maps the abstract phase boundaries of `phylax_core::i2c` onto the F1
//! bus controller. The controller raises more interrupts than there are
//! phases (a start-bit stage before the address goes out, byte-transfer
//! flags that overlap the stop condition); everything that is not a phase
//! boundary is serviced here and hidden from the engine.

use defmt::{debug, warn};
use phylax_core::i2c::TransferHooks;
use phylax_hal::i2c::{BusError, Direction, I2cConfig, I2cPhy};
use stm32f1xx_hal::pac;

/// I2C2 controller in interrupt-driven master mode.
pub struct I2c2Phy {
    i2c: pac::I2C2,
    address: u8,
    direction: Direction,
    /// Stop condition queued; the next event is the stop boundary.
    stopping: bool,
}

impl I2c2Phy {
    /// Configure I2C2 for master mode at the requested SCL frequency.
    ///
    /// Pin multiplexing (PB10/PB11 alternate open-drain) must already be
    /// done; this only touches the controller itself.
    pub fn new(i2c: pac::I2C2, config: I2cConfig, pclk1_hz: u32) -> Self {
        // Un-gate the peripheral clock.
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.i2c2en().set_bit());
        cortex_m::asm::dsb();

        let freq_mhz = (pclk1_hz / 1_000_000) as u8;
        i2c.cr2.modify(|_, w| unsafe { w.freq().bits(freq_mhz) });

        // Standard-mode clock divider, datasheet minimum of 4.
        let ccr = (pclk1_hz / (2 * config.frequency)).max(4) as u16;
        i2c.ccr.write(|w| unsafe { w.ccr().bits(ccr) });
        i2c.trise.write(|w| unsafe { w.trise().bits(freq_mhz + 1) });

        i2c.cr1.modify(|_, w| w.pe().set_bit());

        // Event, buffer and error interrupts stay enabled; the engine
        // decides what each one means.
        i2c.cr2
            .modify(|_, w| w.itevten().set_bit().itbufen().set_bit().iterren().set_bit());

        Self {
            i2c,
            address: 0,
            direction: Direction::Write,
            stopping: false,
        }
    }
}

impl I2cPhy for I2c2Phy {
    fn start(&mut self, address: u8, direction: Direction) {
        self.address = address;
        self.direction = direction;
        self.stopping = false;
        self.i2c.cr1.modify(|_, w| w.ack().set_bit().start().set_bit());
    }

    fn phase_event(&mut self) -> bool {
        let sr1 = self.i2c.sr1.read();

        if sr1.sb().bit_is_set() {
            // Start condition is out; send the address byte. SB clears on
            // this SR1 read followed by the DR write. Not a phase boundary.
            let dir_bit = matches!(self.direction, Direction::Read) as u8;
            self.i2c
                .dr
                .write(|w| unsafe { w.dr().bits((self.address << 1) | dir_bit) });
            return false;
        }

        if sr1.addr().bit_is_set() {
            // Address acknowledged. ADDR clears on the SR1/SR2 read pair.
            let _ = self.i2c.sr2.read();
            return true;
        }

        if self.stopping {
            // The transfer flag still set behind a queued stop condition
            // is the stop boundary. Quiet the buffer interrupt until the
            // next transfer starts it again.
            self.stopping = false;
            self.i2c.cr2.modify(|_, w| w.itbufen().clear_bit());
            return true;
        }

        // RxNE/TxE/BTF: one data-phase boundary. The flag clears on the DR
        // access the engine performs in response.
        sr1.rx_ne().bit_is_set() || sr1.tx_e().bit_is_set() || sr1.btf().bit_is_set()
    }

    fn write_byte(&mut self, byte: u8) {
        self.i2c.dr.write(|w| unsafe { w.dr().bits(byte) });
    }

    fn read_byte(&mut self) -> u8 {
        self.i2c.dr.read().dr().bits()
    }

    fn stop(&mut self) {
        self.stopping = true;
        self.i2c.cr2.modify(|_, w| w.itbufen().set_bit());
        self.i2c.cr1.modify(|_, w| w.stop().set_bit());
    }

    fn take_error(&mut self) -> BusError {
        let sr1 = self.i2c.sr1.read();

        let error = if sr1.arlo().bit_is_set() {
            BusError::ArbitrationLost
        } else if sr1.timeout().bit_is_set() || sr1.berr().bit_is_set() {
            // Misplaced start/stop is surfaced as a timeout-class fault.
            BusError::Timeout
        } else {
            BusError::Nack
        };

        // Clear every error flag and release the bus.
        self.i2c.sr1.modify(|_, w| {
            w.af()
                .clear_bit()
                .arlo()
                .clear_bit()
                .berr()
                .clear_bit()
                .timeout()
                .clear_bit()
        });
        self.i2c.cr1.modify(|_, w| w.stop().set_bit());
        self.stopping = false;

        error
    }
}

/// Application side of the bus: log outcomes.
///
/// A real application replaces this with its device protocol handling; the
/// supervision core only dispatches to it.
pub struct BusHooks;

impl TransferHooks for BusHooks {
    fn on_complete(&mut self, direction: Direction, data: &[u8]) {
        // Fires once per transaction from interrupt context; kept off
        // the default log level.
        debug!("i2c transfer complete: {} bytes, {}", data.len(), direction);
    }

    fn on_error(&mut self, error: BusError) {
        warn!("i2c transfer failed: {}", error);
    }
}
