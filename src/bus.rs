use embedded_hal::digital::{OutputPin, PinState};

/// Serial interface feeding the first register of the chain.
///
/// [`GpioBus`] bit-bangs it over three output pins. Platforms with a native
/// shift-out primitive can implement it directly.
pub trait ShiftBus {
    type Error;

    /// Drives data and clock low.
    fn idle(&mut self) -> Result<(), Self::Error>;

    /// Drives the latch (storage register clock) line.
    ///
    /// Outputs take the shifted bits on the low-to-high transition.
    fn set_latch(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Clocks out one byte, least-significant bit first.
    fn shift_byte_lsb_first(&mut self, byte: u8) -> Result<(), Self::Error>;
}

/// [`ShiftBus`] over plain GPIO output pins.
///
/// The HAL configures the pins as outputs when it hands out [`OutputPin`]s,
/// so all three must share one error type.
#[derive(Debug)]
pub struct GpioBus<LATCH, DATA, CLK> {
    latch: LATCH,
    data: DATA,
    clock: CLK,
}

impl<LATCH, DATA, CLK, E> GpioBus<LATCH, DATA, CLK>
where
    LATCH: OutputPin<Error = E>,
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
{
    pub fn new(latch: LATCH, data: DATA, clock: CLK) -> Self {
        Self { latch, data, clock }
    }

    /// Gives back the pins as `(latch, data, clock)`.
    pub fn release(self) -> (LATCH, DATA, CLK) {
        (self.latch, self.data, self.clock)
    }
}

impl<LATCH, DATA, CLK, E> ShiftBus for GpioBus<LATCH, DATA, CLK>
where
    LATCH: OutputPin<Error = E>,
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
{
    type Error = E;

    fn idle(&mut self) -> Result<(), E> {
        self.data.set_low()?;
        self.clock.set_low()
    }

    fn set_latch(&mut self, state: PinState) -> Result<(), E> {
        self.latch.set_state(state)
    }

    fn shift_byte_lsb_first(&mut self, byte: u8) -> Result<(), E> {
        for bit in 0..8 {
            self.data.set_state(PinState::from(byte & (1 << bit) != 0))?;
            self.clock.set_high()?;
            self.clock.set_low()?;
        }
        Ok(())
    }
}
