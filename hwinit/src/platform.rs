//! Machine variants and platform collaborators.
//!
//! Everything that differs between the supported IRIS machines is in one
//! table here so the protocol code never branches on the machine itself.
//!
//! ```text
//! ┌──────────────────┬──────────┬────────────┬──────────────────────────┐
//! │ Machine          │ CPU      │ loops / µs │ EEPROM boot file         │
//! ├──────────────────┼──────────┼────────────┼──────────────────────────┤
//! │ Personal IRIS    │ R3000 36 │     21     │ word 52, 50 bytes        │
//! │ IRIS Indigo      │ R4000 100│     50     │ word 136, 48 bytes       │
//! │ Indy             │ R4600 180│     90     │ none                     │
//! └──────────────────┴──────────┴────────────┴──────────────────────────┘
//! ```
//!
//! The machine is chosen at build time with the `indigo-r3k` (default),
//! `indigo-r4k` or `indy` feature.

use crate::delay::Delay;
use crate::serial::Console;

/// HPC1 serial EEPROM control register (Personal IRIS / Indigo).
const HPC1_EEPROM_REG: u32 = 0x1FB8_01BF;

/// KSEG1: unmapped, uncached window onto physical memory.
const KSEG1_BASE: usize = 0xA000_0000;
const PHYS_MASK: u32 = 0x1FFF_FFFF;

/// Translate a physical address into its uncached KSEG1 alias.
pub const fn phys_to_kseg1(phys: u32) -> usize {
    KSEG1_BASE | (phys & PHYS_MASK) as usize
}

/// Supported machine variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    /// Personal IRIS R3000 @ 36 MHz
    IndigoR3k,
    /// IRIS Indigo R4000 @ 100 MHz
    IndigoR4k,
    /// Indy @ 180 MHz
    Indy,
}

/// Where the boot file name lives in the serial EEPROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EepromLayout {
    /// Physical address of the EEPROM control register
    pub register: u32,
    /// First 16-bit word of the boot file name
    pub bootfile_word: u16,
    /// Boot file field length in bytes
    pub bootfile_len: usize,
}

impl Machine {
    #[cfg(feature = "indy")]
    pub const CURRENT: Machine = Machine::Indy;

    #[cfg(all(feature = "indigo-r4k", not(feature = "indy")))]
    pub const CURRENT: Machine = Machine::IndigoR4k;

    #[cfg(not(any(feature = "indigo-r4k", feature = "indy")))]
    pub const CURRENT: Machine = Machine::IndigoR3k;

    pub const fn name(self) -> &'static str {
        match self {
            Machine::IndigoR3k => "Personal IRIS R3000",
            Machine::IndigoR4k => "IRIS Indigo R4000",
            Machine::Indy => "Indy",
        }
    }

    /// Delay loop iterations per microsecond.
    pub const fn delay_loops_per_us(self) -> u32 {
        match self {
            Machine::IndigoR3k => 21,
            Machine::IndigoR4k => 50,
            Machine::Indy => 90,
        }
    }

    /// Z8530 console base (physical).
    pub const fn zs_addr(self) -> u32 {
        match self {
            Machine::IndigoR3k | Machine::IndigoR4k => 0x1FB8_0D10,
            Machine::Indy => 0x1FBD_9830,
        }
    }

    /// WD33C93 address/data register pair (physical).
    pub const fn scsi_regs(self) -> (u32, u32) {
        match self {
            Machine::IndigoR3k | Machine::IndigoR4k => (0x1FB8_0122, 0x1FB8_0126),
            Machine::Indy => (0x1FBC_0003, 0x1FBC_0007),
        }
    }

    /// Serial EEPROM layout, if this machine keeps its boot file there.
    pub const fn eeprom(self) -> Option<EepromLayout> {
        match self {
            Machine::IndigoR3k => Some(EepromLayout {
                register: HPC1_EEPROM_REG,
                bootfile_word: 52,
                bootfile_len: 50,
            }),
            Machine::IndigoR4k => Some(EepromLayout {
                register: HPC1_EEPROM_REG,
                bootfile_word: 136,
                bootfile_len: 48,
            }),
            Machine::Indy => None,
        }
    }
}

/// Hardware reset. Only the boot driver calls this, after a fatal probe.
pub trait Reset {
    fn reboot(&self) -> !;
}

impl<R: Reset + ?Sized> Reset for &R {
    fn reboot(&self) -> ! {
        (**self).reboot()
    }
}

/// Everything the boot driver needs from the machine.
pub trait Platform: Delay + Console + Reset {}

impl<T: Delay + Console + Reset + ?Sized> Platform for T {}
