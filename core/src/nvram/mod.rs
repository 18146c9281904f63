//! Serial EEPROM (NVRAM)
//!
//! The HPC exposes a 93Cx6 Microwire EEPROM through one byte-wide control
//! register. The boot loader only ever reads it, mostly to find the boot
//! file name.
//!
//! ```text
//!   read_bootfile ──► Seeprom ──► SeepromPort ──► MmioPort (KSEG1)
//!                      bit-bang     write/read       volatile byte
//! ```

pub mod bootfile;
pub mod port;
pub mod seeprom;

#[cfg(test)]
mod tests;

pub use bootfile::{read_bootfile, BootFile, MAX_BOOTFILE_LEN};
pub use port::{MmioPort, SeepromPort, REGISTER_DELAY_US};
pub use seeprom::{Seeprom, SeepromChip, SeepromDescriptor, SeepromError};
