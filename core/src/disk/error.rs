//! Disk layer errors.

use core::fmt;

use super::label::LabelError;
use super::scsi::ScsiStatus;

/// Errors returned by the disk open/strategy/close entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// TEST UNIT READY still failing after the settle retry
    DeviceNotReady(ScsiStatus),
    /// Label sector could not be read
    LabelReadFailed,
    /// Label sector read but rejected by the decoder
    MalformedLabel(LabelError),
    /// Transfer failed after all retries
    IoError,
    /// Partition index outside the label
    InvalidPartition,
    /// Block count does not fit a single command
    RequestTooLarge,
    /// Block address past what a command can encode
    OutOfRange,
    /// Buffer is not a whole number of sectors
    Unaligned,
    /// Handle has no session
    NotOpen,
}

impl DiskError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceNotReady(_) => "device not ready",
            Self::LabelReadFailed => "label read failed",
            Self::MalformedLabel(e) => e.as_str(),
            Self::IoError => "I/O error",
            Self::InvalidPartition => "invalid partition",
            Self::RequestTooLarge => "request too large",
            Self::OutOfRange => "block out of range",
            Self::Unaligned => "buffer not sector aligned",
            Self::NotOpen => "disk not open",
        }
    }

    /// The boot cannot continue without a ready unit.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::DeviceNotReady(_))
    }
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotReady(status) => {
                write!(f, "device not ready (status {:#04x})", status.as_u8())
            }
            other => f.write_str(other.as_str()),
        }
    }
}

impl From<LabelError> for DiskError {
    fn from(e: LabelError) -> Self {
        Self::MalformedLabel(e)
    }
}
