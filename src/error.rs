/// Errors that can occur while driving the shift-register chain.
///
/// `E` is the error type of the underlying [`ShiftBus`](crate::ShiftBus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftOutError<E> {
    /// Pin index is not below the number of chained outputs.
    OutOfRange,
    /// The chain lock could not be acquired within the configured timeout.
    GuardTimeout,
    /// The bus failed while shifting or latching; the cached image was kept.
    Bus(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for ShiftOutError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ShiftOutError::OutOfRange => write!(f, "pin index exceeds chained outputs"),
            ShiftOutError::GuardTimeout => write!(f, "timed out acquiring chain lock"),
            ShiftOutError::Bus(e) => write!(f, "shift bus error: {e:?}"),
        }
    }
}
