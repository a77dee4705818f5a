//! Critical section example: a main loop and a simulated ISR sharing one chain
//!
//! This example demonstrates:
//! - Upgrading the controller to a `CriticalSectionLock`
//! - Sharing it by reference between two contexts
//! - Bounded lock waits measured in real time through a `DelayNs`
//! - Printing every latched frame as the chain would see it

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;
use shift_out::prelude::*;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Host bus that prints each frame when the latch rises.
#[derive(Default)]
struct ConsoleBus {
    pending: Vec<u8>,
}

impl ShiftBus for ConsoleBus {
    type Error = Infallible;

    fn idle(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_latch(&mut self, state: PinState) -> Result<(), Infallible> {
        match state {
            PinState::Low => self.pending.clear(),
            PinState::High => println!("    latched {:02X?}", self.pending),
        }
        Ok(())
    }

    fn shift_byte_lsb_first(&mut self, byte: u8) -> Result<(), Infallible> {
        self.pending.push(byte);
        Ok(())
    }
}

/// Lock tick backed by the host scheduler.
#[derive(Clone, Copy)]
struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

// Two chips: pins 0..8 belong to the main loop, 8..16 to the ISR
type Leds = ShiftOut<2, ConsoleBus, CriticalSectionLock<SleepDelay>>;

fn main() {
    println!("=== Critical Section Example ===\n");

    let leds: Leds = ShiftOut::from_bus(ConsoleBus::default())
        .with_lock(CriticalSectionLock::new(SleepDelay))
        .with_timeout(50);
    leds.begin().unwrap();

    // Simulate an interrupt flag
    let interrupt_pending = AtomicBool::new(false);
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        // ISR simulator
        s.spawn(|| {
            println!("ISR simulator: Started");
            while !done.load(Ordering::Acquire) {
                if interrupt_pending.swap(false, Ordering::AcqRel) {
                    handle_interrupt(&leds);
                }
                thread::sleep(Duration::from_millis(10));
            }
            println!("ISR simulator: Stopped");
        });

        println!("Main loop: Starting\n");
        for cycle in 0..5u16 {
            println!("Main loop: Cycle {cycle}");
            leds.high(cycle).unwrap();

            // Trigger "interrupt"
            interrupt_pending.store(true, Ordering::Release);

            // Simulate other main loop work
            thread::sleep(Duration::from_millis(50));
        }
        done.store(true, Ordering::Release);
    });

    let image = leds.snapshot().unwrap();
    println!("\nFinal image: {image:02X?}");
    assert_eq!(image[0], 0x1F);
    println!("Main loop: Complete - all operations succeeded");
}

// Simulates ISR handler
fn handle_interrupt(leds: &Leds) {
    println!("\n>>> ISR: Toggling heartbeat");
    match leds.toggle(8) {
        Ok(state) => println!("    heartbeat now {state:?}"),
        // Main loop held the lock past the bound; skip this beat
        Err(ShiftOutError::GuardTimeout) => println!("    lock busy, skipped"),
        Err(err) => println!("    bus error: {err}"),
    }
    println!("<<< ISR: Complete\n");
}
