//! SCSI boot disk
//!
//! Adapts a SCSI unit to the boot loader's block device interface:
//! probe the unit once, read the disklabel, translate partition-relative
//! sectors to device blocks, retry failed transfers.
//!
//! # Layout
//!
//! ```text
//!   DiskHandle ──► DiskSession (boxed, one per open)
//!                    │  label, partition, retry counter
//!                    ▼
//!   DiskUnit  ◄── probe once: TEST UNIT READY, READ CAPACITY
//!                    │
//!                    ▼
//!              ScsiTransport (WD33C93 driver)
//! ```
//!
//! `PartitionBlockIo` exposes an open session through `gpt_disk_io::BlockIo`
//! for filesystem readers.

pub mod block_io;
pub mod error;
pub mod label;
pub mod scsi;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use block_io::PartitionBlockIo;
pub use error::DiskError;
pub use label::{BsdLabelDecoder, DiskLabel, LabelDecoder, LabelError, Partition};
pub use scsi::{block_shift_for, Capacity, ScsiStatus, ScsiTransport};
pub use session::{translate, DiskConfig, DiskHandle, DiskSession, DiskUnit, Transfer};

use irisboot_hwinit::ONE_SECOND_US;

/// Logical sector size.
pub const DEV_BSIZE: usize = 512;

/// Sector holding the disklabel.
pub const LABELSECTOR: u32 = 1;

/// Partition slots in a label.
pub const MAXPARTITIONS: usize = 16;

/// Retries after the first failed transfer.
pub const DISK_RETRY: u8 = 2;

/// Wait between transfer attempts.
pub const RETRY_DELAY_US: u32 = ONE_SECOND_US;

/// Wait before re-testing a unit that reported CHECK CONDITION.
pub const PROBE_SETTLE_US: u32 = ONE_SECOND_US;
