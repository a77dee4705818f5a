/// Number of parallel outputs on every chip in the chain.
pub const OUTPUTS_PER_CHIP: usize = 8;

/// Bounded wait used when acquiring the chain lock, in lock ticks.
pub const DEFAULT_LOCK_TIMEOUT_TICKS: u32 = 10;

/// Length of one [`CriticalSectionLock`](crate::CriticalSectionLock) tick,
/// matching a 1 kHz RTOS tick.
pub const DEFAULT_LOCK_TICK_US: u32 = 1_000;

/// Pause between steps of [`ShiftOut::self_test`](crate::ShiftOut::self_test).
pub const SELF_TEST_STEP_MS: u32 = 500;

/// Position of a logical pin inside the chain.
///
/// Chip 0 holds pins `0..8`, chip 1 holds `8..16` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipBit {
    /// Index of the chip, 0 being the one nearest the host.
    pub chip: usize,
    /// Output of that chip, `0..8`.
    pub bit: usize,
}
