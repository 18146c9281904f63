//! BSD disklabel.
//!
//! The label sits in `LABELSECTOR` and describes up to `MAXPARTITIONS`
//! slices in `DEV_BSIZE` units. IRIS machines are big-endian, so the on-disk
//! `struct disklabel` is decoded big-endian:
//!
//! ```text
//! 0x000  d_magic            0x084  d_magic2
//! 0x004  d_type, d_subtype  0x088  d_checksum
//! 0x008  d_typename[16]     0x08a  d_npartitions
//! 0x018  d_packname[16]     0x08c  d_bbsize
//! 0x028  d_secsize ...      0x090  d_sbsize
//! 0x03c  d_secperunit       0x094  d_partitions[16] (16 bytes each)
//! ```

use core::fmt;

use super::MAXPARTITIONS;

/// `d_magic` / `d_magic2`
pub const DISKMAGIC: u32 = 0x8256_4557;

/// Size of the synthetic whole-device partition.
pub const WHOLE_DISK_SIZE: u32 = 0x7fff_ffff;

const LABEL_HEADER_LEN: usize = 148;
const PARTITION_ENTRY_LEN: usize = 16;

/// On-disk size of a full label.
pub const LABEL_SIZE: usize = LABEL_HEADER_LEN + MAXPARTITIONS * PARTITION_ENTRY_LEN;

// The label may sit anywhere in the sector on a long boundary.
const LABEL_SCAN_STEP: usize = 4;

const OFF_TYPE: usize = 0x04;
const OFF_SUBTYPE: usize = 0x06;
const OFF_TYPENAME: usize = 0x08;
const OFF_PACKNAME: usize = 0x18;
const OFF_SECSIZE: usize = 0x28;
const OFF_NSECTORS: usize = 0x2c;
const OFF_NTRACKS: usize = 0x30;
const OFF_NCYLINDERS: usize = 0x34;
const OFF_SECPERCYL: usize = 0x38;
const OFF_SECPERUNIT: usize = 0x3c;
const OFF_MAGIC2: usize = 0x84;
const OFF_NPARTITIONS: usize = 0x8a;
const OFF_BBSIZE: usize = 0x8c;
const OFF_SBSIZE: usize = 0x90;

/// One partition slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Partition {
    /// Blocks in the partition
    pub size: u32,
    /// First block, relative to the start of the disk
    pub offset: u32,
    /// Filesystem fragment size
    pub fsize: u32,
    pub fstype: u8,
    pub frag: u8,
    pub cpg: u16,
}

/// Geometry and partition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskLabel {
    pub dtype: u16,
    pub subtype: u16,
    pub typename: [u8; 16],
    pub packname: [u8; 16],
    pub secsize: u32,
    pub nsectors: u32,
    pub ntracks: u32,
    pub ncylinders: u32,
    pub secpercyl: u32,
    pub secperunit: u32,
    pub npartitions: u16,
    pub bbsize: u32,
    pub sbsize: u32,
    pub partitions: [Partition; MAXPARTITIONS],
}

impl DiskLabel {
    pub const fn empty() -> Self {
        Self {
            dtype: 0,
            subtype: 0,
            typename: [0; 16],
            packname: [0; 16],
            secsize: 0,
            nsectors: 0,
            ntracks: 0,
            ncylinders: 0,
            secpercyl: 0,
            secperunit: 0,
            npartitions: 0,
            bbsize: 0,
            sbsize: 0,
            partitions: [Partition {
                size: 0,
                offset: 0,
                fsize: 0,
                fstype: 0,
                frag: 0,
                cpg: 0,
            }; MAXPARTITIONS],
        }
    }

    /// Provisional label used until (or instead of) the on-disk one:
    /// partition `part` covers the whole device.
    ///
    /// `part` must be below `MAXPARTITIONS`.
    pub fn whole_device(part: usize) -> Self {
        let mut label = Self::empty();
        label.secsize = super::DEV_BSIZE as u32;
        label.secpercyl = 1;
        label.npartitions = MAXPARTITIONS as u16;
        label.partitions[part].offset = 0;
        label.partitions[part].size = WHOLE_DISK_SIZE;
        label
    }

    pub fn partition(&self, index: usize) -> Option<&Partition> {
        self.partitions.get(index)
    }

    /// Disk type name, up to the first NUL.
    pub fn typename(&self) -> Option<&str> {
        let end = self.typename.iter().position(|&b| b == 0).unwrap_or(16);
        core::str::from_utf8(&self.typename[..end]).ok()
    }
}

impl Default for DiskLabel {
    fn default() -> Self {
        Self::empty()
    }
}

/// Why a label sector was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelError {
    /// No magic found anywhere in the sector
    NoLabel,
    /// Magic found but checksum or partition count is wrong
    Corrupted,
    /// Sector shorter than a label
    ShortSector,
}

impl LabelError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoLabel => "no disk label",
            Self::Corrupted => "disk label corrupted",
            Self::ShortSector => "label sector too short",
        }
    }
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label decoder collaborator.
pub trait LabelDecoder {
    /// Decode `sector` into `label`.
    ///
    /// # Contract
    /// On error `label` must be left exactly as it was.
    fn decode_label(&self, sector: &[u8], label: &mut DiskLabel) -> Result<(), LabelError>;
}

/// Big-endian BSD `struct disklabel` decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsdLabelDecoder;

impl LabelDecoder for BsdLabelDecoder {
    fn decode_label(&self, sector: &[u8], label: &mut DiskLabel) -> Result<(), LabelError> {
        if sector.len() < LABEL_SIZE {
            return Err(LabelError::ShortSector);
        }

        let mut err = LabelError::NoLabel;
        let mut off = 0;
        while off + LABEL_SIZE <= sector.len() {
            let raw = &sector[off..off + LABEL_SIZE];
            if be32(raw, 0) == DISKMAGIC && be32(raw, OFF_MAGIC2) == DISKMAGIC {
                let npartitions = be16(raw, OFF_NPARTITIONS) as usize;
                if npartitions > MAXPARTITIONS || checksum(raw, npartitions) != 0 {
                    err = LabelError::Corrupted;
                } else {
                    *label = parse(raw, npartitions);
                    return Ok(());
                }
            }
            off += LABEL_SCAN_STEP;
        }

        Err(err)
    }
}

/// XOR of the 16-bit words from the start of the label to the end of the
/// last used partition entry. Zero for an intact label.
fn checksum(raw: &[u8], npartitions: usize) -> u16 {
    let end = LABEL_HEADER_LEN + npartitions * PARTITION_ENTRY_LEN;
    raw[..end]
        .chunks_exact(2)
        .fold(0u16, |sum, w| sum ^ u16::from_be_bytes([w[0], w[1]]))
}

fn parse(raw: &[u8], npartitions: usize) -> DiskLabel {
    let mut label = DiskLabel::empty();
    label.dtype = be16(raw, OFF_TYPE);
    label.subtype = be16(raw, OFF_SUBTYPE);
    label.typename.copy_from_slice(&raw[OFF_TYPENAME..OFF_TYPENAME + 16]);
    label.packname.copy_from_slice(&raw[OFF_PACKNAME..OFF_PACKNAME + 16]);
    label.secsize = be32(raw, OFF_SECSIZE);
    label.nsectors = be32(raw, OFF_NSECTORS);
    label.ntracks = be32(raw, OFF_NTRACKS);
    label.ncylinders = be32(raw, OFF_NCYLINDERS);
    label.secpercyl = be32(raw, OFF_SECPERCYL);
    label.secperunit = be32(raw, OFF_SECPERUNIT);
    label.npartitions = npartitions as u16;
    label.bbsize = be32(raw, OFF_BBSIZE);
    label.sbsize = be32(raw, OFF_SBSIZE);

    for (i, part) in label.partitions.iter_mut().take(npartitions).enumerate() {
        let p = LABEL_HEADER_LEN + i * PARTITION_ENTRY_LEN;
        *part = Partition {
            size: be32(raw, p),
            offset: be32(raw, p + 4),
            fsize: be32(raw, p + 8),
            fstype: raw[p + 12],
            frag: raw[p + 13],
            cpg: be16(raw, p + 14),
        };
    }
    label
}

#[inline]
fn be16(raw: &[u8], off: usize) -> u16 {
    u16::from_be_bytes([raw[off], raw[off + 1]])
}

#[inline]
fn be32(raw: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([raw[off], raw[off + 1], raw[off + 2], raw[off + 3]])
}
