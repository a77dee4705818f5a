use bitmaps::Bitmap;
use embedded_hal::digital::PinState;

use crate::{bus::ShiftBus, types::ChipBit};

/// Cached output image, one 8-bit map per chip.
///
/// Bit `b` of a chip's map is bit `b` of the byte shifted out for that chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OutputTable<const CHIPS: usize> {
    chips: [Bitmap<8>; CHIPS],
}

impl<const CHIPS: usize> OutputTable<CHIPS> {
    pub(crate) fn new() -> Self {
        Self {
            chips: [Bitmap::new(); CHIPS],
        }
    }

    pub(crate) fn get(&self, at: ChipBit) -> PinState {
        PinState::from(self.chips[at.chip].get(at.bit))
    }

    pub(crate) fn set(&mut self, at: ChipBit, state: PinState) {
        self.chips[at.chip].set(at.bit, state == PinState::High);
    }

    /// Flips one output and returns its new state.
    pub(crate) fn toggle(&mut self, at: ChipBit) -> PinState {
        let next = !self.get(at);
        self.set(at, next);
        next
    }

    pub(crate) fn fill(&mut self, state: PinState) {
        let map = match state {
            PinState::Low => Bitmap::new(),
            PinState::High => Bitmap::from_value(u8::MAX),
        };
        self.chips = [map; CHIPS];
    }

    pub(crate) fn invert(&mut self) {
        for chip in self.chips.iter_mut() {
            chip.invert();
        }
    }

    pub(crate) fn byte(&self, chip: usize) -> u8 {
        self.chips[chip].into_value()
    }

    /// Packed bytes, chip 0 first.
    pub(crate) fn bytes(&self) -> [u8; CHIPS] {
        core::array::from_fn(|chip| self.byte(chip))
    }

    /// Shifts the whole image into the chain and latches it.
    ///
    /// The furthest chip goes first so each byte ends up in its own register.
    pub(crate) fn push<B: ShiftBus>(&self, bus: &mut B) -> Result<(), B::Error> {
        bus.set_latch(PinState::Low)?;
        for chip in (0..CHIPS).rev() {
            bus.shift_byte_lsb_first(self.byte(chip))?;
        }
        bus.set_latch(PinState::High)
    }
}
