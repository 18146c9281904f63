//! Hardware Initialization Layer
//!
//! Platform services shared by everything that runs before the kernel on
//! SGI IRIS machines. There is no firmware we call back into once the boot
//! image is running: timing, console and reset are collaborators we own.
//!
//! # Architecture
//!
//! ```text
//! PROM jumps to the boot image:
//!   - single core, interrupts off
//!   - no timer we trust, no MMU setup beyond KSEG0/KSEG1
//!
//! This crate provides:
//!   - Calibrated spin delays (loop count fixed per CPU at build time)
//!   - Machine table (register addresses, EEPROM layout per variant)
//!   - Console / Reset collaborator traits
//!   - Static heap (GlobalAlloc over linked_list_allocator)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use irisboot_hwinit::{Delay, Machine, SpinDelay};
//!
//! let delay = SpinDelay::current();
//! delay.delay_us(1_000_000); // ~1s on the configured CPU
//!
//! if let Some(layout) = Machine::CURRENT.eeprom() {
//!     // layout.register is the HPC EEPROM control register
//! }
//! ```
//!
//! # What This Crate Does NOT Do
//!
//! - Device protocols (SCSI, 93Cx6 clocking, disk labels)
//! - Console drivers (the Z8530 lives in the boot image)

#![no_std]
#![allow(dead_code)]

pub mod delay;
pub mod heap;
pub mod platform;
pub mod serial;

pub use delay::{Delay, SpinDelay, ONE_SECOND_US};
pub use heap::{heap_stats, init_heap_with_buffer, init_static_heap, is_heap_initialized, HeapAllocator};
pub use platform::{phys_to_kseg1, EepromLayout, Machine, Platform, Reset};
pub use serial::{Console, NullConsole};
