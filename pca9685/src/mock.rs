//! Recording bus used by the unit tests

use std::cell::RefCell;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::bus::{Bus, BusError, OpenBus};
use crate::registers::PCA9685_MODE1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transaction {
    Read(u8),
    Write(u8, u8),
    Close,
}

#[derive(Debug)]
pub struct MockState {
    pub bus: u8,
    pub address: u16,
    pub registers: [u8; 256],
    pub log: Vec<Transaction>,
    pub fail_on: Option<u8>,
    pub closed: bool,
    opened_at: Instant,
    settle: Duration,
}

/// Cloning shares the underlying state so a test can keep a handle for inspection
#[derive(Debug, Clone)]
pub struct MockBus(Arc<Mutex<MockState>>);

thread_local! {
    static LAST_OPENED: RefCell<Option<MockBus>> = RefCell::new(None);
}

impl MockBus {
    /// A bus that accepts accesses immediately
    pub fn new() -> Self {
        Self::with_settle(Duration::ZERO)
    }

    /// A bus that rejects every access issued before `settle` has passed since creation
    pub fn with_settle(settle: Duration) -> Self {
        let mut registers = [0; 256];
        // Power on value: SLEEP | ALLCALL
        registers[PCA9685_MODE1 as usize] = 0x11;

        MockBus(Arc::new(Mutex::new(MockState {
            bus: 0,
            address: 0,
            registers,
            log: Vec::new(),
            fail_on: None,
            closed: false,
            opened_at: Instant::now(),
            settle,
        })))
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        match self.0.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn log(&self) -> Vec<Transaction> {
        self.state().log.clone()
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.log()
            .into_iter()
            .filter_map(|transaction| match transaction {
                Transaction::Write(register, value) => Some((register, value)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }

    pub fn set_register(&self, register: u8, value: u8) {
        self.state().registers[register as usize] = value;
    }

    pub fn fail_on(&self, register: u8) {
        self.state().fail_on = Some(register);
    }

    /// The bus most recently created through `OpenBus::open` on this thread
    pub fn last_opened() -> Option<MockBus> {
        LAST_OPENED.with(|last| last.borrow().clone())
    }

    fn check(state: &MockState, register: u8) -> Result<(), BusError> {
        if state.closed {
            return Err(BusError::Closed);
        }
        if state.opened_at.elapsed() < state.settle {
            return Err(BusError::Fault(format!(
                "register {register:#04x} accessed before the {:?} settle time",
                state.settle
            )));
        }
        if state.fail_on == Some(register) {
            return Err(BusError::Fault(format!("NACK on register {register:#04x}")));
        }

        Ok(())
    }
}

impl Bus for MockBus {
    fn read_register(&mut self, address: u16, register: u8) -> Result<u8, BusError> {
        let mut state = self.state();
        Self::check(&state, register)?;
        state.address = address;
        state.log.push(Transaction::Read(register));

        Ok(state.registers[register as usize])
    }

    fn write_register(&mut self, address: u16, register: u8, value: u8) -> Result<(), BusError> {
        let mut state = self.state();
        Self::check(&state, register)?;
        state.address = address;
        state.log.push(Transaction::Write(register, value));
        state.registers[register as usize] = value;

        Ok(())
    }

    fn close(&mut self) -> Result<(), BusError> {
        let mut state = self.state();
        if state.closed {
            return Err(BusError::Closed);
        }
        state.closed = true;
        state.log.push(Transaction::Close);

        Ok(())
    }
}

impl OpenBus for MockBus {
    fn open(bus: u8, address: u16) -> Result<Self, BusError> {
        let mock = MockBus::with_settle(crate::device::SETTLE_DELAY);
        {
            let mut state = mock.state();
            state.bus = bus;
            state.address = address;
        }
        LAST_OPENED.with(|last| *last.borrow_mut() = Some(mock.clone()));

        Ok(mock)
    }
}

/// A bus that can never be claimed
#[derive(Debug)]
pub struct Unplugged;

impl Bus for Unplugged {
    fn read_register(&mut self, _address: u16, _register: u8) -> Result<u8, BusError> {
        Err(BusError::Closed)
    }

    fn write_register(&mut self, _address: u16, _register: u8, _value: u8) -> Result<(), BusError> {
        Err(BusError::Closed)
    }

    fn close(&mut self) -> Result<(), BusError> {
        Err(BusError::Closed)
    }
}

impl OpenBus for Unplugged {
    fn open(bus: u8, _address: u16) -> Result<Self, BusError> {
        Err(BusError::Fault(format!("no device on bus {bus}")))
    }
}

/// Records the observer callbacks
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub reads: Vec<(u8, u8)>,
    pub writes: Vec<(u8, u8)>,
    pub pwms: Vec<(u8, u16, u16)>,
}

impl crate::observer::Observer for RecordingObserver {
    fn on_read(&mut self, register: u8, value: u8) {
        self.reads.push((register, value));
    }

    fn on_write(&mut self, register: u8, value: u8) {
        self.writes.push((register, value));
    }

    fn on_pwm(&mut self, channel: u8, on: u16, off: u16) {
        self.pwms.push((channel, on, off));
    }
}
