#![allow(unsafe_code)]

use core::cell::Cell;

use embedded_hal::delay::DelayNs;

use crate::types::DEFAULT_LOCK_TICK_US;

/// Mutual exclusion guarding the cache-plus-push critical section.
///
/// # Safety
/// After `try_acquire` returns `true`, every other `try_acquire` on the same
/// lock must return `false` until `release` is called. [`ShiftOut`](crate::ShiftOut)
/// hands out `&mut` access to its cache and bus on the strength of this.
pub unsafe trait ChainLock {
    /// Tries to take the lock, waiting at most `timeout_ticks` ticks.
    fn try_acquire(&self, timeout_ticks: u32) -> bool;
    /// Gives the lock back. Only called by the current holder.
    fn release(&self);
}

/// Lock for single-context use.
///
/// Never waits. It only refuses re-entrant access, and it is not `Sync`, so a
/// controller using it cannot be shared between threads or tasks.
#[derive(Debug, Default)]
pub struct NoLock {
    held: Cell<bool>,
}

impl NoLock {
    pub const fn new() -> Self {
        Self {
            held: Cell::new(false),
        }
    }
}

unsafe impl ChainLock for NoLock {
    fn try_acquire(&self, _timeout_ticks: u32) -> bool {
        !self.held.replace(true)
    }

    fn release(&self) {
        self.held.set(false);
    }
}

/// Lock built on the platform's `critical-section` implementation.
///
/// One tick is `tick_us` microseconds, waited on the supplied delay between
/// attempts to flip the held flag. The critical section itself only lasts a
/// few instructions, so the shifting runs with interrupts enabled.
///
/// The delay is cloned for every wait, so it should be a cheap handle such as
/// a HAL's `Delay` or a timer reference.
#[derive(Debug)]
pub struct CriticalSectionLock<D> {
    held: critical_section::Mutex<Cell<bool>>,
    delay: D,
    tick_us: u32,
}

impl<D> CriticalSectionLock<D> {
    /// Lock waiting [`DEFAULT_LOCK_TICK_US`] per tick on `delay`.
    pub const fn new(delay: D) -> Self {
        Self {
            held: critical_section::Mutex::new(Cell::new(false)),
            delay,
            tick_us: DEFAULT_LOCK_TICK_US,
        }
    }

    /// Sets the length of one tick.
    pub fn with_tick_us(mut self, tick_us: u32) -> Self {
        self.tick_us = tick_us;
        self
    }
}

unsafe impl<D: DelayNs + Clone> ChainLock for CriticalSectionLock<D> {
    fn try_acquire(&self, timeout_ticks: u32) -> bool {
        let mut delay = self.delay.clone();
        for tick in 0..=timeout_ticks {
            let taken = critical_section::with(|cs| !self.held.borrow(cs).replace(true));
            if taken {
                return true;
            }
            if tick < timeout_ticks {
                delay.delay_us(self.tick_us);
            }
        }
        false
    }

    fn release(&self) {
        critical_section::with(|cs| self.held.borrow(cs).set(false));
    }
}
