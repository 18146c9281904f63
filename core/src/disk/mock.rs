//! Test doubles for the disk layer.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use irisboot_hwinit::{Console, Delay, Reset};

use super::label::{DiskLabel, DISKMAGIC, LABEL_SIZE};
use super::scsi::ScsiStatus;
use super::{DEV_BSIZE, MAXPARTITIONS};

/// Records delays and console output; reboot panics.
#[derive(Default)]
pub struct MockPlatform {
    pub delays: Cell<u32>,
    pub waited_us: Cell<u64>,
    pub lines: RefCell<Vec<String>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, line: &str) -> usize {
        self.lines.borrow().iter().filter(|l| l.as_str() == line).count()
    }
}

impl Delay for MockPlatform {
    fn delay_us(&self, us: u32) {
        self.delays.set(self.delays.get() + 1);
        self.waited_us.set(self.waited_us.get() + us as u64);
    }
}

impl Console for MockPlatform {
    fn puts(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

impl Reset for MockPlatform {
    fn reboot(&self) -> ! {
        panic!("reboot");
    }
}

/// One recorded read or write command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub bytes: usize,
    pub block: u64,
    pub count: u32,
}

/// Scripted SCSI target backed by a byte image addressed in 512-byte blocks.
pub struct MockScsi {
    /// TEST UNIT READY answers, front first; Good once drained
    pub unit_ready: Vec<ScsiStatus>,
    pub tur_calls: usize,
    /// READ CAPACITY data, or None to fail the command
    pub capacity: Option<[u8; 8]>,
    pub capacity_calls: usize,
    /// Let this many data commands through before any failure applies
    pub pass_first: u32,
    /// Fail this many data commands before succeeding
    pub fail_next: u32,
    /// Fail every data command
    pub always_fail: bool,
    pub image: Vec<u8>,
    pub reads: Vec<Command>,
    pub writes: Vec<Command>,
}

impl MockScsi {
    pub fn new() -> Self {
        Self {
            unit_ready: Vec::new(),
            tur_calls: 0,
            capacity: None,
            capacity_calls: 0,
            pass_first: 0,
            fail_next: 0,
            always_fail: false,
            image: alloc::vec![0u8; 64 * DEV_BSIZE],
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    pub fn with_block_len(mut self, last_lba: u32, block_len: u32) -> Self {
        let mut data = [0u8; 8];
        data[..4].copy_from_slice(&last_lba.to_be_bytes());
        data[4..].copy_from_slice(&block_len.to_be_bytes());
        self.capacity = Some(data);
        self
    }

    pub fn with_sector(mut self, block: usize, sector: &[u8]) -> Self {
        let start = block * DEV_BSIZE;
        self.image[start..start + sector.len()].copy_from_slice(sector);
        self
    }

    fn data_status(&mut self) -> ScsiStatus {
        if self.pass_first > 0 {
            self.pass_first -= 1;
            return ScsiStatus::Good;
        }
        if self.always_fail {
            return ScsiStatus::Busy;
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return ScsiStatus::Busy;
        }
        ScsiStatus::Good
    }
}

impl super::ScsiTransport for MockScsi {
    fn test_unit_ready(&mut self) -> ScsiStatus {
        self.tur_calls += 1;
        if self.unit_ready.is_empty() {
            ScsiStatus::Good
        } else {
            self.unit_ready.remove(0)
        }
    }

    fn read_capacity(&mut self, buf: &mut [u8]) -> ScsiStatus {
        self.capacity_calls += 1;
        match self.capacity {
            Some(data) => {
                buf[..8].copy_from_slice(&data);
                ScsiStatus::Good
            }
            None => ScsiStatus::CheckCondition,
        }
    }

    fn read(&mut self, buf: &mut [u8], block: u64, count: u32) -> ScsiStatus {
        self.reads.push(Command { bytes: buf.len(), block, count });
        let status = self.data_status();
        if status.is_good() {
            let start = block as usize * DEV_BSIZE;
            for (i, b) in buf.iter_mut().enumerate() {
                *b = self.image.get(start + i).copied().unwrap_or(0);
            }
        }
        status
    }

    fn write(&mut self, buf: &[u8], block: u64, count: u32) -> ScsiStatus {
        self.writes.push(Command { bytes: buf.len(), block, count });
        let status = self.data_status();
        if status.is_good() {
            let start = block as usize * DEV_BSIZE;
            let end = (start + buf.len()).min(self.image.len());
            if start < end {
                self.image[start..end].copy_from_slice(&buf[..end - start]);
            }
        }
        status
    }
}

/// Big-endian label image placed `offset` bytes into a sector, with a
/// valid checksum.
pub fn encode_label(label: &DiskLabel, offset: usize) -> [u8; DEV_BSIZE] {
    let mut sector = [0u8; DEV_BSIZE];
    let raw = &mut sector[offset..offset + LABEL_SIZE];

    raw[0x00..0x04].copy_from_slice(&DISKMAGIC.to_be_bytes());
    raw[0x04..0x06].copy_from_slice(&label.dtype.to_be_bytes());
    raw[0x06..0x08].copy_from_slice(&label.subtype.to_be_bytes());
    raw[0x08..0x18].copy_from_slice(&label.typename);
    raw[0x18..0x28].copy_from_slice(&label.packname);
    raw[0x28..0x2c].copy_from_slice(&label.secsize.to_be_bytes());
    raw[0x2c..0x30].copy_from_slice(&label.nsectors.to_be_bytes());
    raw[0x30..0x34].copy_from_slice(&label.ntracks.to_be_bytes());
    raw[0x34..0x38].copy_from_slice(&label.ncylinders.to_be_bytes());
    raw[0x38..0x3c].copy_from_slice(&label.secpercyl.to_be_bytes());
    raw[0x3c..0x40].copy_from_slice(&label.secperunit.to_be_bytes());
    raw[0x84..0x88].copy_from_slice(&DISKMAGIC.to_be_bytes());
    raw[0x8a..0x8c].copy_from_slice(&label.npartitions.to_be_bytes());
    raw[0x8c..0x90].copy_from_slice(&label.bbsize.to_be_bytes());
    raw[0x90..0x94].copy_from_slice(&label.sbsize.to_be_bytes());

    let npart = (label.npartitions as usize).min(MAXPARTITIONS);
    for (i, p) in label.partitions.iter().take(npart).enumerate() {
        let o = 0x94 + i * 16;
        raw[o..o + 4].copy_from_slice(&p.size.to_be_bytes());
        raw[o + 4..o + 8].copy_from_slice(&p.offset.to_be_bytes());
        raw[o + 8..o + 12].copy_from_slice(&p.fsize.to_be_bytes());
        raw[o + 12] = p.fstype;
        raw[o + 13] = p.frag;
        raw[o + 14..o + 16].copy_from_slice(&p.cpg.to_be_bytes());
    }

    let end = 0x94 + npart * 16;
    let sum = raw[..end]
        .chunks_exact(2)
        .fold(0u16, |s, w| s ^ u16::from_be_bytes([w[0], w[1]]));
    raw[0x88..0x8a].copy_from_slice(&sum.to_be_bytes());

    sector
}
