//! A `no_std`, no-alloc driver for daisy-chained 74HC595-class shift registers.
//!
//! Every output of every chip in the chain is exposed as a logical pin with a
//! cached state. Because serial-in/parallel-out registers have no random
//! access, every change re-shifts the whole chain and latches it.
//!
//! # Features
//!
//! - **Zero heap allocation** - The cache is a fixed array sized by the chip count
//! - **Cache and hardware stay in step** - A new image is only cached once it is latched
//! - **Pluggable locking** - Single-context by default, `Sync` with a real lock
//! - **Bounded waits** - A busy lock makes the call fail instead of blocking
//!
//! # Chain layout
//!
//! ```text
//!  host ──▶ chip 0 ──▶ chip 1 ──▶ ... ──▶ chip N-1
//!          pins 0-7   pins 8-15           pins 8(N-1)..8N
//! ```
//!
//! Bytes are shifted furthest chip first, each byte least-significant bit
//! first, then the latch rises and all outputs change at once. Pin `8c + b`
//! is bit `b` of chip `c`'s byte.
//!
//! # Example
//!
//! ```rust
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{ErrorType, OutputPin, PinState};
//! use shift_out::prelude::*;
//!
//! // Stand-in for a HAL output pin
//! struct Pin;
//! impl ErrorType for Pin {
//!     type Error = Infallible;
//! }
//! impl OutputPin for Pin {
//!     fn set_low(&mut self) -> Result<(), Infallible> { Ok(()) }
//!     fn set_high(&mut self) -> Result<(), Infallible> { Ok(()) }
//! }
//!
//! // Stand-in for a HAL delay handle
//! #[derive(Clone)]
//! struct Delay;
//! impl DelayNs for Delay {
//!     fn delay_ns(&mut self, _ns: u32) {}
//! }
//!
//! // Two chained chips: pins 0..16
//! let leds: GpioShiftOut<2, _, _, _> = ShiftOut::new(Pin, Pin, Pin);
//! leds.begin().unwrap();
//!
//! leds.high(3).unwrap();
//! leds.toggle(12).unwrap();
//! assert_eq!(leds.read(3), Ok(PinState::High));
//! assert_eq!(leds.snapshot(), Ok([0x08, 0x10]));
//! assert_eq!(leds.high(16), Err(ShiftOutError::OutOfRange));
//!
//! // Shared between contexts: swap in a real lock, 1 ms ticks by default
//! let leds = leds.with_lock(CriticalSectionLock::new(Delay));
//! leds.set_all_high().unwrap();
//! ```

#![deny(unsafe_code)]
#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod error;
pub mod helpers;
pub mod lock;
pub mod storage;
pub(crate) mod table;
pub mod types;

#[cfg(test)]
mod test_support;

pub use bus::{GpioBus, ShiftBus};
pub use error::ShiftOutError;
pub use lock::{ChainLock, CriticalSectionLock, NoLock};
pub use storage::{GpioShiftOut, ShiftOut};
pub use types::{
    ChipBit, DEFAULT_LOCK_TICK_US, DEFAULT_LOCK_TIMEOUT_TICKS, OUTPUTS_PER_CHIP,
    SELF_TEST_STEP_MS,
};

pub mod prelude {
    pub use super::{
        ChainLock, CriticalSectionLock, GpioBus, GpioShiftOut, NoLock, ShiftBus, ShiftOut,
        ShiftOutError,
    };
}
