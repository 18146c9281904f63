//! Calibrated busy-wait delays.
//!
//! # Calibration
//! There is no interval timer we program this early, so every wait is a
//! fixed-iteration decrement loop. The iteration count per microsecond is a
//! property of the CPU/clock pair and is fixed at build time through the
//! machine feature (see [`Machine::delay_loops_per_us`]).
//!
//! # Accuracy
//! Good to within a few percent on the target, which is all the SCSI settle
//! waits and the 93Cx6 clock need. Never use this for wall-clock time.

use crate::platform::Machine;

/// One second, the settle time used by the disk probe and retry paths.
pub const ONE_SECOND_US: u32 = 1_000_000;

/// Delay primitive shared by the disk and EEPROM code.
pub trait Delay {
    /// Spin for at least `us` microseconds.
    fn delay_us(&self, us: u32);
}

impl<D: Delay + ?Sized> Delay for &D {
    #[inline]
    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Instruction-count delay loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinDelay {
    loops_per_us: u32,
}

impl SpinDelay {
    pub const fn new(loops_per_us: u32) -> Self {
        Self { loops_per_us }
    }

    /// Delay calibrated for `machine`.
    pub const fn for_machine(machine: Machine) -> Self {
        Self::new(machine.delay_loops_per_us())
    }

    /// Delay calibrated for the machine this image was built for.
    pub const fn current() -> Self {
        Self::for_machine(Machine::CURRENT)
    }

    pub const fn loops_per_us(&self) -> u32 {
        self.loops_per_us
    }

    /// Loop iterations spent for a `us` microsecond wait.
    ///
    /// Always at least one: the loop body runs before the test.
    pub const fn loops_for(&self, us: u32) -> u32 {
        let n = self.loops_per_us.saturating_mul(us);
        if n == 0 {
            1
        } else {
            n
        }
    }
}

impl Delay for SpinDelay {
    #[inline(never)]
    fn delay_us(&self, us: u32) {
        let mut n = self.loops_for(us);
        loop {
            // black_box keeps the count live so the loop is not folded away
            n = core::hint::black_box(n) - 1;
            if n == 0 {
                break;
            }
            core::hint::spin_loop();
        }
    }
}
