//! I2C transaction engine
//!
//! The bus controller surfaces completion and failure as two independent
//! interrupt lines, so this is a true state machine rather than a byte
//! counter: every phase transition validates the phase it is leaving, and a
//! phase boundary that arrives with nothing in flight is itself a fault
//! (desynchronization), never silently dropped.
//!
//! One transaction at a time: the busy check in [`I2cEngine::begin_write`] /
//! [`I2cEngine::begin_read`] is the mutual-exclusion gate. Rejection is
//! immediate; nothing in this module blocks.

use heapless::Vec;
use phylax_hal::i2c::{BusError, Direction, I2cPhy};

/// Default byte capacity of the transaction buffer.
pub const MAX_TRANSFER: usize = 32;

/// Where the engine stands in the current transaction.
///
/// Success path: `Idle → Address → Data → Stop → Idle`. A bus error exits
/// any non-Idle phase straight back to `Idle` after the error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No transaction in flight; ready for a new request
    Idle,
    /// Start condition sent, waiting for the address acknowledgment
    Address,
    /// Moving data bytes, one phase boundary per byte
    Data,
    /// Final byte moved, waiting for the stop condition to complete
    Stop,
}

/// Caller-misuse error returned synchronously from a request call.
///
/// Neither variant changes engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// A transaction is already in flight on this controller
    BusBusy,
    /// Zero-length request, or length exceeds the engine's buffer capacity
    InvalidArgument,
}

/// Application callbacks for transaction completion.
///
/// This is the engine's single upward registration point. Both hooks run in
/// interrupt context and must not block.
pub trait TransferHooks {
    /// The transaction reached the end of its stop phase. For reads `data`
    /// holds the received bytes; for writes, the bytes that were sent. The
    /// length always equals the length originally requested.
    fn on_complete(&mut self, direction: Direction, data: &[u8]);

    /// The transaction failed, or a phase boundary arrived with nothing in
    /// flight ([`BusError::Desync`]). The engine is back at `Idle` when
    /// this runs; the failed transaction is not retried here.
    fn on_error(&mut self, error: BusError);
}

/// One in-flight request.
struct Transfer<const N: usize> {
    direction: Direction,
    buffer: Vec<u8, N>,
    /// Requested length; for reads the buffer grows toward it.
    len: usize,
    /// Bytes already moved across the bus.
    index: usize,
}

/// Interrupt-driven transaction state machine over an [`I2cPhy`].
///
/// Advanced exclusively by [`on_event_interrupt`](Self::on_event_interrupt)
/// and [`on_error_interrupt`](Self::on_error_interrupt); the only other
/// entry point is the non-reentrant request call that starts a transaction.
pub struct I2cEngine<P, H, const N: usize = MAX_TRANSFER>
where
    P: I2cPhy,
    H: TransferHooks,
{
    phy: P,
    hooks: H,
    phase: Phase,
    transfer: Option<Transfer<N>>,
}

impl<P, H, const N: usize> I2cEngine<P, H, N>
where
    P: I2cPhy,
    H: TransferHooks,
{
    /// Create an idle engine over a configured phy.
    pub fn new(phy: P, hooks: H) -> Self {
        Self {
            phy,
            hooks,
            phase: Phase::Idle,
            transfer: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a transaction is in flight.
    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Access the phy, e.g. for bus recovery outside a transaction.
    pub fn phy_mut(&mut self) -> &mut P {
        &mut self.phy
    }

    /// Access the registered hooks.
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Start a write of `data` to `address`.
    ///
    /// Rejected with [`RequestError::BusBusy`] while a transaction is in
    /// flight (the in-flight state is untouched) and with
    /// [`RequestError::InvalidArgument`] for empty or oversized data.
    pub fn begin_write(&mut self, address: u8, data: &[u8]) -> Result<(), RequestError> {
        self.check_ready(data.len())?;

        let mut buffer = Vec::new();
        // Length was validated against N above.
        let _ = buffer.extend_from_slice(data);
        self.launch(address, Direction::Write, buffer, data.len());
        Ok(())
    }

    /// Start a read of `len` bytes from `address`.
    ///
    /// Same rejection rules as [`begin_write`](Self::begin_write). The
    /// received bytes are delivered to the success hook.
    pub fn begin_read(&mut self, address: u8, len: usize) -> Result<(), RequestError> {
        self.check_ready(len)?;
        self.launch(address, Direction::Read, Vec::new(), len);
        Ok(())
    }

    fn check_ready(&self, len: usize) -> Result<(), RequestError> {
        if self.phase != Phase::Idle {
            return Err(RequestError::BusBusy);
        }
        if len == 0 || len > N {
            return Err(RequestError::InvalidArgument);
        }
        Ok(())
    }

    fn launch(&mut self, address: u8, direction: Direction, buffer: Vec<u8, N>, len: usize) {
        self.transfer = Some(Transfer {
            direction,
            buffer,
            len,
            index: 0,
        });
        self.phase = Phase::Address;
        self.phy.start(address, direction);
    }

    /// Handle one event (completion) interrupt.
    ///
    /// Exactly one phase boundary per call once the phy has filtered its
    /// intra-phase plumbing. Reaching the end of the stop phase returns the
    /// engine to `Idle` and fires the success hook exactly once.
    pub fn on_event_interrupt(&mut self) {
        if self.phase == Phase::Idle {
            // Nothing in flight; the controller disagrees with us about
            // the bus state. The phy still gets to service the flag,
            // otherwise the vector re-raises forever.
            let _ = self.phy.phase_event();
            self.hooks.on_error(BusError::Desync);
            return;
        }

        if !self.phy.phase_event() {
            return;
        }

        match self.phase {
            // Handled by the early return above.
            Phase::Idle => {}
            Phase::Address => {
                // Address acknowledged; begin moving data.
                self.phase = Phase::Data;
                if let Some(transfer) = self.transfer.as_mut() {
                    if transfer.direction == Direction::Write {
                        self.phy.write_byte(transfer.buffer[transfer.index]);
                        transfer.index += 1;
                    }
                    // Reads need no action here: the controller clocks the
                    // first byte in and raises the next boundary itself.
                }
            }
            Phase::Data => self.advance_data(),
            Phase::Stop => {
                // Stop condition completed; the transaction is done.
                self.phase = Phase::Idle;
                if let Some(transfer) = self.transfer.take() {
                    self.hooks.on_complete(transfer.direction, &transfer.buffer);
                }
            }
        }
    }

    /// One data-phase boundary: a byte acknowledged (write) or received
    /// (read). Issues the stop sequence after the final byte.
    fn advance_data(&mut self) {
        let Some(transfer) = self.transfer.as_mut() else {
            return;
        };

        match transfer.direction {
            Direction::Write => {
                if transfer.index < transfer.len {
                    self.phy.write_byte(transfer.buffer[transfer.index]);
                    transfer.index += 1;
                } else {
                    // Last byte acknowledged.
                    self.phy.stop();
                    self.phase = Phase::Stop;
                }
            }
            Direction::Read => {
                let byte = self.phy.read_byte();
                let _ = transfer.buffer.push(byte);
                transfer.index += 1;
                if transfer.index == transfer.len {
                    self.phy.stop();
                    self.phase = Phase::Stop;
                }
            }
        }
    }

    /// Handle one error interrupt.
    ///
    /// From any non-Idle phase: abort the transaction, report the bus fault
    /// through the error hook exactly once, and return to `Idle` so a new
    /// request is accepted immediately. With nothing in flight the error
    /// line itself is the anomaly, reported as [`BusError::Desync`].
    pub fn on_error_interrupt(&mut self) {
        if self.phase == Phase::Idle {
            // Same flag-clearing obligation as the event path; the
            // reported kind is discarded because nothing was in flight.
            let _ = self.phy.take_error();
            self.hooks.on_error(BusError::Desync);
            return;
        }

        let error = self.phy.take_error();
        self.transfer = None;
        self.phase = Phase::Idle;
        self.hooks.on_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec as StdVec;

    /// Operations the engine drove into the phy.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum PhyOp {
        Start(u8, Direction),
        WriteByte(u8),
        ReadByte,
        Stop,
    }

    #[derive(Default)]
    struct MockPhy {
        ops: StdVec<PhyOp>,
        incoming: VecDeque<u8>,
        error: Option<BusError>,
        /// Event interrupts the engine let the phy service.
        events_serviced: usize,
        /// Error interrupts the engine let the phy clear.
        errors_serviced: usize,
    }

    impl I2cPhy for MockPhy {
        fn start(&mut self, address: u8, direction: Direction) {
            self.ops.push(PhyOp::Start(address, direction));
        }

        fn phase_event(&mut self) -> bool {
            self.events_serviced += 1;
            true
        }

        fn write_byte(&mut self, byte: u8) {
            self.ops.push(PhyOp::WriteByte(byte));
        }

        fn read_byte(&mut self) -> u8 {
            self.ops.push(PhyOp::ReadByte);
            self.incoming.pop_front().unwrap_or(0)
        }

        fn stop(&mut self) {
            self.ops.push(PhyOp::Stop);
        }

        fn take_error(&mut self) -> BusError {
            self.errors_serviced += 1;
            self.error.take().unwrap_or(BusError::Nack)
        }
    }

    /// Phy whose next event is intra-phase plumbing, not a boundary.
    struct FilteringPhy {
        inner: MockPhy,
        swallow_next: bool,
    }

    impl I2cPhy for FilteringPhy {
        fn start(&mut self, address: u8, direction: Direction) {
            self.inner.start(address, direction);
        }

        fn phase_event(&mut self) -> bool {
            !core::mem::replace(&mut self.swallow_next, false)
        }

        fn write_byte(&mut self, byte: u8) {
            self.inner.write_byte(byte);
        }

        fn read_byte(&mut self) -> u8 {
            self.inner.read_byte()
        }

        fn stop(&mut self) {
            self.inner.stop();
        }

        fn take_error(&mut self) -> BusError {
            self.inner.take_error()
        }
    }

    #[derive(Default)]
    struct Recorder {
        completions: StdVec<(Direction, StdVec<u8>)>,
        errors: StdVec<BusError>,
    }

    #[derive(Clone, Default)]
    struct SharedRecorder(Rc<RefCell<Recorder>>);

    impl TransferHooks for SharedRecorder {
        fn on_complete(&mut self, direction: Direction, data: &[u8]) {
            self.0
                .borrow_mut()
                .completions
                .push((direction, data.to_vec()));
        }

        fn on_error(&mut self, error: BusError) {
            self.0.borrow_mut().errors.push(error);
        }
    }

    type TestEngine = I2cEngine<MockPhy, SharedRecorder, 8>;

    fn engine() -> (TestEngine, SharedRecorder) {
        let recorder = SharedRecorder::default();
        (I2cEngine::new(MockPhy::default(), recorder.clone()), recorder)
    }

    #[test]
    fn test_three_byte_write_success_path() {
        let (mut engine, recorder) = engine();

        engine.begin_write(0x50, &[0x0a, 0x0b, 0x0c]).unwrap();
        assert_eq!(engine.phase(), Phase::Address);

        // Address ack, three data acks, stop ack.
        engine.on_event_interrupt();
        assert_eq!(engine.phase(), Phase::Data);
        engine.on_event_interrupt();
        engine.on_event_interrupt();
        engine.on_event_interrupt();
        assert_eq!(engine.phase(), Phase::Stop);
        engine.on_event_interrupt();
        assert_eq!(engine.phase(), Phase::Idle);

        let rec = recorder.0.borrow();
        assert_eq!(
            rec.completions,
            [(Direction::Write, vec![0x0a, 0x0b, 0x0c])]
        );
        assert!(rec.errors.is_empty());

        assert_eq!(
            engine.phy_mut().ops,
            [
                PhyOp::Start(0x50, Direction::Write),
                PhyOp::WriteByte(0x0a),
                PhyOp::WriteByte(0x0b),
                PhyOp::WriteByte(0x0c),
                PhyOp::Stop,
            ]
        );
    }

    #[test]
    fn test_read_fills_buffer_to_requested_length() {
        let (mut engine, recorder) = engine();
        engine.phy_mut().incoming.extend([0x11, 0x22]);

        engine.begin_read(0x29, 2).unwrap();

        engine.on_event_interrupt(); // address ack
        engine.on_event_interrupt(); // byte 0
        engine.on_event_interrupt(); // byte 1 -> stop issued
        assert_eq!(engine.phase(), Phase::Stop);
        engine.on_event_interrupt(); // stop complete

        let rec = recorder.0.borrow();
        assert_eq!(rec.completions, [(Direction::Read, vec![0x11, 0x22])]);
        assert!(rec.errors.is_empty());
    }

    #[test]
    fn test_busy_rejection_leaves_transfer_untouched() {
        let (mut engine, recorder) = engine();

        engine.begin_write(0x50, &[1, 2, 3]).unwrap();
        engine.on_event_interrupt(); // address ack

        assert_eq!(engine.begin_write(0x51, &[9]), Err(RequestError::BusBusy));
        assert_eq!(engine.begin_read(0x51, 1), Err(RequestError::BusBusy));
        assert_eq!(engine.phase(), Phase::Data);

        // The in-flight write still completes with its own bytes.
        engine.on_event_interrupt();
        engine.on_event_interrupt();
        engine.on_event_interrupt();
        engine.on_event_interrupt();

        let rec = recorder.0.borrow();
        assert_eq!(rec.completions, [(Direction::Write, vec![1, 2, 3])]);
    }

    #[test]
    fn test_zero_length_and_oversized_requests_rejected() {
        let (mut engine, _recorder) = engine();

        assert_eq!(
            engine.begin_write(0x50, &[]),
            Err(RequestError::InvalidArgument)
        );
        assert_eq!(engine.begin_read(0x50, 0), Err(RequestError::InvalidArgument));
        assert_eq!(
            engine.begin_read(0x50, 9), // capacity is 8
            Err(RequestError::InvalidArgument)
        );
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_nack_during_read_reports_once_and_frees_bus() {
        let (mut engine, recorder) = engine();

        engine.begin_read(0x29, 2).unwrap();
        engine.on_event_interrupt(); // address ack
        engine.phy_mut().error = Some(BusError::Nack);
        engine.on_error_interrupt();

        {
            let rec = recorder.0.borrow();
            assert_eq!(rec.errors, [BusError::Nack]);
            assert!(rec.completions.is_empty());
        }
        assert_eq!(engine.phase(), Phase::Idle);

        // Controller accepts a new request immediately.
        assert_eq!(engine.begin_write(0x50, &[1]), Ok(()));
    }

    #[test]
    fn test_error_exits_every_non_idle_phase() {
        for boundaries in 0..3 {
            let (mut engine, recorder) = engine();

            engine.begin_write(0x50, &[1]).unwrap();
            for _ in 0..boundaries {
                engine.on_event_interrupt();
            }

            engine.phy_mut().error = Some(BusError::ArbitrationLost);
            engine.on_error_interrupt();

            assert_eq!(engine.phase(), Phase::Idle);
            let rec = recorder.0.borrow();
            assert_eq!(rec.errors, [BusError::ArbitrationLost]);
            assert!(rec.completions.is_empty());
        }
    }

    #[test]
    fn test_second_error_with_nothing_pending_is_desync() {
        let (mut engine, recorder) = engine();

        engine.begin_write(0x50, &[1]).unwrap();
        engine.phy_mut().error = Some(BusError::Timeout);
        engine.on_error_interrupt();
        engine.on_error_interrupt(); // nothing in flight anymore

        let rec = recorder.0.borrow();
        assert_eq!(rec.errors, [BusError::Timeout, BusError::Desync]);
    }

    #[test]
    fn test_event_while_idle_is_desync() {
        let (mut engine, recorder) = engine();

        engine.on_event_interrupt();

        let rec = recorder.0.borrow();
        assert_eq!(rec.errors, [BusError::Desync]);
        assert!(rec.completions.is_empty());
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_stray_event_while_idle_still_services_phy() {
        let (mut engine, recorder) = engine();

        engine.on_event_interrupt();

        // The flag behind the vector must be acknowledged even with
        // nothing in flight, or the interrupt re-raises forever.
        assert_eq!(engine.phy_mut().events_serviced, 1);
        assert_eq!(recorder.0.borrow().errors, [BusError::Desync]);
    }

    #[test]
    fn test_stray_error_while_idle_still_clears_phy_flags() {
        let (mut engine, recorder) = engine();

        engine.on_error_interrupt();

        assert_eq!(engine.phy_mut().errors_serviced, 1);
        let rec = recorder.0.borrow();
        assert_eq!(rec.errors, [BusError::Desync]);
        assert!(rec.completions.is_empty());
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_intra_phase_event_does_not_advance() {
        let recorder = SharedRecorder::default();
        let phy = FilteringPhy {
            inner: MockPhy::default(),
            swallow_next: true,
        };
        let mut engine: I2cEngine<_, _, 8> = I2cEngine::new(phy, recorder.clone());

        engine.begin_write(0x50, &[7]).unwrap();

        engine.on_event_interrupt(); // plumbing, swallowed by the phy
        assert_eq!(engine.phase(), Phase::Address);

        engine.on_event_interrupt(); // real address ack
        assert_eq!(engine.phase(), Phase::Data);
    }

    #[test]
    fn test_success_callback_fires_exactly_once() {
        let (mut engine, recorder) = engine();

        engine.begin_write(0x50, &[1, 2]).unwrap();
        for _ in 0..4 {
            engine.on_event_interrupt();
        }
        assert_eq!(recorder.0.borrow().completions.len(), 1);

        // Any further event is a desync, not a repeat completion.
        engine.on_event_interrupt();
        let rec = recorder.0.borrow();
        assert_eq!(rec.completions.len(), 1);
        assert_eq!(rec.errors, [BusError::Desync]);
    }
}
