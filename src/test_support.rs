//! Test support utilities - only compiled in test builds.

#![allow(unsafe_code)]

use core::{cell::RefCell, convert::Infallible};
use std::{rc::Rc, vec::Vec};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, OutputPin, PinState},
};

use crate::{bus::ShiftBus, lock::ChainLock, storage::ShiftOut};

/// Standard test configuration: two chips, 16 outputs, begun.
pub fn test_shift_out() -> ShiftOut<2, RecordingBus> {
    let out = ShiftOut::from_bus(RecordingBus::default());
    out.begin().unwrap();
    out
}

/// Error raised by [`RecordingBus`] once its operation budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// Bus that records every latched frame as the bytes shifted between the
/// latch going low and going high again.
#[derive(Debug)]
pub struct RecordingBus {
    frames: Vec<Vec<u8>>,
    pending: Vec<u8>,
    latch: PinState,
    idle_count: usize,
    ops_left: Option<usize>,
    panic_next_shift: bool,
}

impl Default for RecordingBus {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            pending: Vec::new(),
            latch: PinState::Low,
            idle_count: 0,
            ops_left: None,
            panic_next_shift: false,
        }
    }
}

impl RecordingBus {
    /// Bus that accepts `ops` operations and fails every one after that.
    pub fn failing_after(ops: usize) -> Self {
        let mut bus = Self::default();
        bus.fail_after(ops);
        bus
    }

    pub fn fail_after(&mut self, ops: usize) {
        self.ops_left = Some(ops);
    }

    /// Makes the next shifted byte panic, as a misbehaving bus driver might.
    pub fn panic_on_next_shift(&mut self) {
        self.panic_next_shift = true;
    }

    pub fn recover(&mut self) {
        self.ops_left = None;
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.clone()
    }

    pub fn last_frame(&self) -> Option<&[u8]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn latch_high(&self) -> bool {
        self.latch == PinState::High
    }

    pub fn idle_count(&self) -> usize {
        self.idle_count
    }

    fn spend(&mut self) -> Result<(), BusFault> {
        match &mut self.ops_left {
            Some(0) => Err(BusFault),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ShiftBus for RecordingBus {
    type Error = BusFault;

    fn idle(&mut self) -> Result<(), BusFault> {
        self.spend()?;
        self.idle_count += 1;
        Ok(())
    }

    fn set_latch(&mut self, state: PinState) -> Result<(), BusFault> {
        self.spend()?;
        match (self.latch, state) {
            (_, PinState::Low) => self.pending.clear(),
            (PinState::Low, PinState::High) => {
                self.frames.push(core::mem::take(&mut self.pending));
            }
            (PinState::High, PinState::High) => {}
        }
        self.latch = state;
        Ok(())
    }

    fn shift_byte_lsb_first(&mut self, byte: u8) -> Result<(), BusFault> {
        if core::mem::take(&mut self.panic_next_shift) {
            panic!("bus driver panicked mid-shift");
        }
        self.spend()?;
        self.pending.push(byte);
        Ok(())
    }
}

/// Line of the 3-wire interface a traced level change happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Latch,
    Data,
    Clock,
}

/// Shared log of level changes across the three traced pins.
#[derive(Debug, Clone, Default)]
pub struct TraceLog(Rc<RefCell<Vec<(Line, PinState)>>>);

impl TraceLog {
    pub fn events(&self) -> Vec<(Line, PinState)> {
        self.0.borrow().clone()
    }

    pub fn last(&self, line: Line) -> Option<PinState> {
        self.0
            .borrow()
            .iter()
            .rev()
            .find(|(l, _)| *l == line)
            .map(|&(_, state)| state)
    }

    pub fn latch_edges(&self) -> Vec<PinState> {
        self.0
            .borrow()
            .iter()
            .filter(|(l, _)| *l == Line::Latch)
            .map(|&(_, state)| state)
            .collect()
    }

    /// Data level seen by the register at each rising clock edge.
    pub fn sampled_bits(&self) -> Vec<bool> {
        let mut data = PinState::Low;
        let mut bits = Vec::new();
        for &(line, state) in self.0.borrow().iter() {
            match (line, state) {
                (Line::Data, _) => data = state,
                (Line::Clock, PinState::High) => bits.push(data == PinState::High),
                _ => {}
            }
        }
        bits
    }

    /// Sampled bits regrouped into bytes, least-significant bit first.
    pub fn sampled_bytes(&self) -> Vec<u8> {
        self.sampled_bits()
            .chunks(8)
            .map(|bits| {
                bits.iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << i))
            })
            .collect()
    }

    fn push(&self, line: Line, state: PinState) {
        self.0.borrow_mut().push((line, state));
    }
}

/// Output pin writing its level changes to a [`TraceLog`].
pub struct TracePin {
    line: Line,
    log: TraceLog,
}

impl ErrorType for TracePin {
    type Error = Infallible;
}

impl OutputPin for TracePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.push(self.line, PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.push(self.line, PinState::High);
        Ok(())
    }
}

/// Latch, data and clock pins sharing one log.
pub fn trace_pins(log: &TraceLog) -> (TracePin, TracePin, TracePin) {
    let pin = |line| TracePin {
        line,
        log: log.clone(),
    };
    (pin(Line::Latch), pin(Line::Data), pin(Line::Clock))
}

/// Delay that only counts what it was asked to wait.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    calls: usize,
    total_ns: u64,
}

impl RecordingDelay {
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn total_ms(&self) -> u32 {
        (self.total_ns / 1_000_000) as u32
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

/// Delay backed by `std::thread::sleep`, for lock timing on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

/// Lock that is never available, as if another context held it forever.
pub struct RefusingLock;

unsafe impl ChainLock for RefusingLock {
    fn try_acquire(&self, _timeout_ticks: u32) -> bool {
        false
    }

    fn release(&self) {}
}
