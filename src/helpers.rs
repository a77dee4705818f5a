//! Pin addressing helpers.
//!
//! Useful when a caller keeps its own pin maps (for example a table of LED
//! names) and wants to validate them against a chain of `CHIPS` registers.

use crate::types::{ChipBit, OUTPUTS_PER_CHIP};

/// Splits a logical pin into its chip and output index.
///
/// Returns `None` if `pin` is not below `CHIPS * 8`. Pins never wrap.
///
/// # Example
/// ```
/// use shift_out::helpers::chip_bit;
/// use shift_out::ChipBit;
///
/// assert_eq!(chip_bit::<2>(0), Some(ChipBit { chip: 0, bit: 0 }));
/// assert_eq!(chip_bit::<2>(11), Some(ChipBit { chip: 1, bit: 3 }));
/// assert_eq!(chip_bit::<2>(16), None);
/// ```
pub fn chip_bit<const CHIPS: usize>(pin: u16) -> Option<ChipBit> {
    let pin = pin as usize;
    if pin >= width::<CHIPS>() {
        return None;
    }

    Some(ChipBit {
        chip: pin / OUTPUTS_PER_CHIP,
        bit: pin % OUTPUTS_PER_CHIP,
    })
}

/// Total number of logical pins in a chain of `CHIPS` registers.
pub const fn width<const CHIPS: usize>() -> usize {
    CHIPS * OUTPUTS_PER_CHIP
}

#[test]
fn chip_bit_edge_cases() {
    // First and last pin of each chip
    assert_eq!(chip_bit::<3>(7), Some(ChipBit { chip: 0, bit: 7 }));
    assert_eq!(chip_bit::<3>(8), Some(ChipBit { chip: 1, bit: 0 }));
    assert_eq!(chip_bit::<3>(23), Some(ChipBit { chip: 2, bit: 7 }));

    // One past the end, and far past it
    assert_eq!(chip_bit::<3>(24), None);
    assert_eq!(chip_bit::<3>(u16::MAX), None);

    // Empty chain has no pins
    assert_eq!(chip_bit::<0>(0), None);
}

#[test]
fn chip_bit_covers_every_pin_once() {
    let mut seen = [[false; OUTPUTS_PER_CHIP]; 4];
    for pin in 0..width::<4>() as u16 {
        let at = chip_bit::<4>(pin).unwrap();
        assert!(at.bit < OUTPUTS_PER_CHIP);
        assert!(!seen[at.chip][at.bit]);
        seen[at.chip][at.bit] = true;
    }
    assert!(seen.iter().flatten().all(|&s| s));
}
