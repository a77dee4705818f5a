#![allow(unsafe_code)]

use core::cell::UnsafeCell;

use embedded_hal::{
    delay::DelayNs,
    digital::{OutputPin, PinState},
};

use crate::{
    ShiftOutError,
    bus::{GpioBus, ShiftBus},
    helpers::{chip_bit, width},
    lock::{ChainLock, NoLock},
    table::OutputTable,
    types::{ChipBit, DEFAULT_LOCK_TIMEOUT_TICKS, SELF_TEST_STEP_MS},
};

/// Releases the chain lock when dropped, so a panicking bus cannot leave it held.
struct Held<'a, L: ChainLock>(&'a L);

impl<L: ChainLock> Drop for Held<'_, L> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// Cached image plus the bus it is latched through.
struct Chain<const CHIPS: usize, B> {
    table: OutputTable<CHIPS>,
    bus: B,
}

impl<const CHIPS: usize, B: ShiftBus> Chain<CHIPS, B> {
    /// Applies `f` to a copy of the image, pushes the copy and only then
    /// stores it, so a failed push leaves the cache on the last latched image.
    fn update<R>(
        &mut self,
        f: impl FnOnce(&mut OutputTable<CHIPS>) -> R,
    ) -> Result<R, ShiftOutError<B::Error>> {
        let mut next = self.table;
        let out = f(&mut next);
        next.push(&mut self.bus).map_err(ShiftOutError::Bus)?;
        self.table = next;
        Ok(out)
    }
}

/// Driver for `CHIPS` daisy-chained 74HC595-class shift registers.
///
/// Every logical pin `0..CHIPS * 8` is cached; each change re-shifts the
/// whole chain and latches it, since the registers have no random access.
///
/// # Type Parameters
/// - `CHIPS`: number of chained registers
/// - `B`: bus the chain is wired to, usually [`GpioBus`]
/// - `L`: lock guarding cache and bus; [`NoLock`] keeps the driver
///   single-context, a real lock such as
///   [`CriticalSectionLock`](crate::CriticalSectionLock) makes it `Sync`
pub struct ShiftOut<const CHIPS: usize, B, L = NoLock> {
    chain: UnsafeCell<Chain<CHIPS, B>>,
    lock: L,
    timeout_ticks: u32,
}

/// [`ShiftOut`] bit-banged over three GPIO pins.
pub type GpioShiftOut<const CHIPS: usize, LATCH, DATA, CLK, L = NoLock> =
    ShiftOut<CHIPS, GpioBus<LATCH, DATA, CLK>, L>;

// SAFETY: the cache and bus are only reached while `lock` is held, and a
// `ChainLock` grants that to one context at a time.
unsafe impl<const CHIPS: usize, B: Send, L: ChainLock + Sync> Sync for ShiftOut<CHIPS, B, L> {}

impl<const CHIPS: usize, B, L> core::fmt::Debug for ShiftOut<CHIPS, B, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShiftOut")
            .field("chips", &CHIPS)
            .field("timeout_ticks", &self.timeout_ticks)
            .finish_non_exhaustive()
    }
}

impl<const CHIPS: usize, LATCH, DATA, CLK, E> ShiftOut<CHIPS, GpioBus<LATCH, DATA, CLK>, NoLock>
where
    LATCH: OutputPin<Error = E>,
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
{
    /// Binds the latch, data and clock pins. Call [`begin`](Self::begin) next.
    pub fn new(latch: LATCH, data: DATA, clock: CLK) -> Self {
        Self::from_bus(GpioBus::new(latch, data, clock))
    }
}

impl<const CHIPS: usize, B: ShiftBus> ShiftOut<CHIPS, B, NoLock> {
    pub fn from_bus(bus: B) -> Self {
        const {
            assert!(
                width::<CHIPS>() <= u16::MAX as usize + 1,
                "chain has more outputs than a u16 pin index can address"
            )
        };
        Self {
            chain: UnsafeCell::new(Chain {
                table: OutputTable::new(),
                bus,
            }),
            lock: NoLock::new(),
            timeout_ticks: DEFAULT_LOCK_TIMEOUT_TICKS,
        }
    }
}

impl<const CHIPS: usize, B: ShiftBus, L: ChainLock> ShiftOut<CHIPS, B, L> {
    /// Number of logical pins in the chain.
    pub const WIDTH: usize = width::<CHIPS>();

    /// Swaps the lock guarding this driver, keeping cache and bus.
    pub fn with_lock<L2: ChainLock>(self, lock: L2) -> ShiftOut<CHIPS, B, L2> {
        ShiftOut {
            chain: UnsafeCell::new(self.chain.into_inner()),
            lock,
            timeout_ticks: self.timeout_ticks,
        }
    }

    /// Sets how many ticks an operation waits for the lock before giving up.
    pub fn with_timeout(mut self, timeout_ticks: u32) -> Self {
        self.timeout_ticks = timeout_ticks;
        self
    }

    /// Exclusive access to the bus. Nothing is shifted.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.chain.get_mut().bus
    }

    pub fn into_bus(self) -> B {
        self.chain.into_inner().bus
    }

    /// Drives data and clock low and latches an all-low image into every
    /// chip, clearing the cache.
    pub fn begin(&self) -> Result<(), ShiftOutError<B::Error>> {
        self.with_chain(|chain| {
            chain.bus.idle().map_err(ShiftOutError::Bus)?;
            chain.update(|table| *table = OutputTable::new())
        })
    }

    /// Sets one output and latches the whole chain.
    ///
    /// Fails with [`ShiftOutError::OutOfRange`] before touching the lock or
    /// the bus, and with [`ShiftOutError::GuardTimeout`] without changing
    /// anything.
    pub fn write(&self, pin: u16, state: PinState) -> Result<(), ShiftOutError<B::Error>> {
        let at = Self::locate(pin)?;
        self.with_chain(|chain| chain.update(|table| table.set(at, state)))
    }

    /// Returns the cached state of one output.
    ///
    /// 595-class registers cannot be read back; this is the last latched value.
    pub fn read(&self, pin: u16) -> Result<PinState, ShiftOutError<B::Error>> {
        let at = Self::locate(pin)?;
        self.with_chain(|chain| Ok(chain.table.get(at)))
    }

    pub fn low(&self, pin: u16) -> Result<(), ShiftOutError<B::Error>> {
        self.write(pin, PinState::Low)
    }

    pub fn high(&self, pin: u16) -> Result<(), ShiftOutError<B::Error>> {
        self.write(pin, PinState::High)
    }

    /// Flips one output in a single critical section and returns its new state.
    pub fn toggle(&self, pin: u16) -> Result<PinState, ShiftOutError<B::Error>> {
        let at = Self::locate(pin)?;
        self.with_chain(|chain| chain.update(|table| table.toggle(at)))
    }

    pub fn set_all_low(&self) -> Result<(), ShiftOutError<B::Error>> {
        self.with_chain(|chain| chain.update(|table| table.fill(PinState::Low)))
    }

    pub fn set_all_high(&self) -> Result<(), ShiftOutError<B::Error>> {
        self.with_chain(|chain| chain.update(|table| table.fill(PinState::High)))
    }

    pub fn toggle_all(&self) -> Result<(), ShiftOutError<B::Error>> {
        self.with_chain(|chain| chain.update(|table| table.invert()))
    }

    /// Packed cache, one byte per chip, chip 0 first.
    pub fn snapshot(&self) -> Result<[u8; CHIPS], ShiftOutError<B::Error>> {
        self.with_chain(|chain| Ok(chain.table.bytes()))
    }

    /// Walks every output for wiring checks.
    ///
    /// All low, then each pin high in turn, then each pin low in turn, pausing
    /// [`SELF_TEST_STEP_MS`] after every step.
    pub fn self_test<D: DelayNs>(&self, delay: &mut D) -> Result<(), ShiftOutError<B::Error>> {
        self.self_test_with_step(delay, SELF_TEST_STEP_MS)
    }

    pub fn self_test_with_step<D: DelayNs>(
        &self,
        delay: &mut D,
        step_ms: u32,
    ) -> Result<(), ShiftOutError<B::Error>> {
        self.set_all_low()?;
        delay.delay_ms(step_ms);

        for state in [PinState::High, PinState::Low] {
            // `from_bus` rejects chains wider than the u16 pin range
            for pin in 0..Self::WIDTH {
                self.write(pin as u16, state)?;
                delay.delay_ms(step_ms);
            }
        }
        Ok(())
    }

    fn locate(pin: u16) -> Result<ChipBit, ShiftOutError<B::Error>> {
        chip_bit::<CHIPS>(pin).ok_or(ShiftOutError::OutOfRange)
    }

    fn with_chain<R>(
        &self,
        f: impl FnOnce(&mut Chain<CHIPS, B>) -> Result<R, ShiftOutError<B::Error>>,
    ) -> Result<R, ShiftOutError<B::Error>> {
        if !self.lock.try_acquire(self.timeout_ticks) {
            return Err(ShiftOutError::GuardTimeout);
        }
        let _held = Held(&self.lock);
        // SAFETY: the lock is held until `_held` drops, and `f` cannot reach
        // `self` again.
        let chain = unsafe { &mut *self.chain.get() };
        f(chain)
    }
}
