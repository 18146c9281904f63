//! EEPROM control register access.

use core::ptr;

use irisboot_hwinit::{phys_to_kseg1, Delay};

/// Settle time before every register access.
pub const REGISTER_DELAY_US: u32 = 4;

/// The single byte-wide register the EEPROM lines hang off.
///
/// Writes drive chip select, clock and data-out; reads sample data-in
/// (and ready, on parts that have it).
pub trait SeepromPort {
    fn write(&mut self, value: u8);
    fn read(&mut self) -> u8;
}

impl<T: SeepromPort + ?Sized> SeepromPort for &mut T {
    fn write(&mut self, value: u8) {
        (**self).write(value)
    }

    fn read(&mut self) -> u8 {
        (**self).read()
    }
}

/// Memory-mapped register reached through uncached KSEG1.
pub struct MmioPort<'d, D: ?Sized> {
    reg: *mut u8,
    delay: &'d D,
}

impl<'d, D: Delay + ?Sized> MmioPort<'d, D> {
    /// # Safety
    /// `phys` must be a byte register that is safe to read and write
    /// through its KSEG1 alias for as long as the port lives.
    pub unsafe fn new(phys: u32, delay: &'d D) -> Self {
        Self {
            reg: phys_to_kseg1(phys) as *mut u8,
            delay,
        }
    }

    /// # Safety
    /// `reg` must be valid for volatile byte reads and writes for as long
    /// as the port lives.
    pub unsafe fn from_ptr(reg: *mut u8, delay: &'d D) -> Self {
        Self { reg, delay }
    }

    pub fn address(&self) -> usize {
        self.reg as usize
    }
}

impl<D: Delay + ?Sized> SeepromPort for MmioPort<'_, D> {
    fn write(&mut self, value: u8) {
        self.delay.delay_us(REGISTER_DELAY_US);
        // SAFETY: guaranteed by the constructor contract.
        unsafe { ptr::write_volatile(self.reg, value) }
    }

    fn read(&mut self) -> u8 {
        self.delay.delay_us(REGISTER_DELAY_US);
        // SAFETY: guaranteed by the constructor contract.
        unsafe { ptr::read_volatile(self.reg) }
    }
}
