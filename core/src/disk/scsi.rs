//! SCSI transport collaborator.
//!
//! The WD33C93 driver that actually builds CDBs and walks bus phases lives
//! in the boot image. This layer only needs four commands from it, each of
//! which reports the SAM status byte of the command.

use super::DEV_BSIZE;

/// SAM status byte returned at the end of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScsiStatus {
    /// 0x00
    Good,
    /// 0x02: sense data available (unit attention, not ready, ...)
    CheckCondition,
    /// 0x04
    ConditionMet,
    /// 0x08
    Busy,
    /// 0x18
    ReservationConflict,
    /// 0x28
    TaskSetFull,
    /// Anything else, including transport-level failures
    Other(u8),
}

impl ScsiStatus {
    pub const fn from_u8(status: u8) -> Self {
        match status {
            0x00 => Self::Good,
            0x02 => Self::CheckCondition,
            0x04 => Self::ConditionMet,
            0x08 => Self::Busy,
            0x18 => Self::ReservationConflict,
            0x28 => Self::TaskSetFull,
            other => Self::Other(other),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Good => 0x00,
            Self::CheckCondition => 0x02,
            Self::ConditionMet => 0x04,
            Self::Busy => 0x08,
            Self::ReservationConflict => 0x18,
            Self::TaskSetFull => 0x28,
            Self::Other(raw) => raw,
        }
    }

    #[inline]
    pub const fn is_good(self) -> bool {
        matches!(self, Self::Good)
    }
}

/// READ CAPACITY (10) parameter data length.
pub const READ_CAPACITY_LEN: usize = 8;

/// READ CAPACITY (10) response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    /// Address of the last logical block
    pub last_lba: u32,
    /// Device block length in bytes
    pub block_len: u32,
}

impl Capacity {
    /// Decode the big-endian parameter data.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < READ_CAPACITY_LEN {
            return None;
        }
        Some(Self {
            last_lba: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            block_len: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
        })
    }

    /// Device blocks on the unit.
    pub const fn blocks(&self) -> u64 {
        self.last_lba as u64 + 1
    }
}

/// Shift between `DEV_BSIZE` and a device block length.
///
/// Halves `block_len` until it is no larger than `DEV_BSIZE`, counting the
/// halvings. Lengths at or below `DEV_BSIZE` give 0. Each halving
/// truncates, so 2047 and 2049 both give 2.
pub const fn block_shift_for(block_len: u32) -> u32 {
    let mut len = block_len;
    let mut shift = 0;
    while len > DEV_BSIZE as u32 {
        len >>= 1;
        shift += 1;
    }
    shift
}

/// Commands the disk layer issues.
pub trait ScsiTransport {
    /// TEST UNIT READY
    fn test_unit_ready(&mut self) -> ScsiStatus;

    /// READ CAPACITY (10) into `buf`.
    fn read_capacity(&mut self, buf: &mut [u8]) -> ScsiStatus;

    /// READ `count` device blocks starting at `block` into `buf`.
    fn read(&mut self, buf: &mut [u8], block: u64, count: u32) -> ScsiStatus;

    /// WRITE `count` device blocks starting at `block` from `buf`.
    ///
    /// Transports without a write path reject it like a target would
    /// reject an unsupported opcode.
    fn write(&mut self, buf: &[u8], block: u64, count: u32) -> ScsiStatus {
        let _ = (buf, block, count);
        ScsiStatus::CheckCondition
    }
}

impl<T: ScsiTransport + ?Sized> ScsiTransport for &mut T {
    fn test_unit_ready(&mut self) -> ScsiStatus {
        (**self).test_unit_ready()
    }

    fn read_capacity(&mut self, buf: &mut [u8]) -> ScsiStatus {
        (**self).read_capacity(buf)
    }

    fn read(&mut self, buf: &mut [u8], block: u64, count: u32) -> ScsiStatus {
        (**self).read(buf, block, count)
    }

    fn write(&mut self, buf: &[u8], block: u64, count: u32) -> ScsiStatus {
        (**self).write(buf, block, count)
    }
}
