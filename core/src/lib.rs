//! IRIS Boot Core Library
//!
//! Boot-time storage for SGI IRIS machines: the SCSI boot disk behind a
//! BSD disklabel, and the 93Cx6 serial EEPROM that names the boot file.
//! Designed to be no_std compatible.

#![no_std]
#![allow(clippy::new_without_default)]
#![allow(clippy::manual_div_ceil)]

extern crate alloc;

pub use irisboot_hwinit as hwinit;

pub mod boot;
pub mod disk;
pub mod logger;
pub mod nvram;
