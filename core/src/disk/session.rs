//! Disk unit probe and per-open sessions.

use alloc::boxed::Box;

use irisboot_hwinit::{Console, Delay};

use super::error::DiskError;
use super::label::{DiskLabel, LabelDecoder, LabelError, Partition};
use super::scsi::{block_shift_for, Capacity, ScsiStatus, ScsiTransport, READ_CAPACITY_LEN};
use super::{DEV_BSIZE, DISK_RETRY, LABELSECTOR, MAXPARTITIONS, PROBE_SETTLE_US, RETRY_DELAY_US};
use crate::{diag, log_info};

/// Physical device block for a partition-relative sector.
///
/// The partition offset is in `DEV_BSIZE` units and is scaled down to
/// device blocks; the logical block is passed through as-is.
#[inline]
pub const fn translate(logical_block: u32, partition_offset: u32, block_shift: u32) -> u64 {
    logical_block as u64 + (partition_offset >> block_shift) as u64
}

/// Open parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskConfig {
    /// Label partition to open
    pub partition: usize,
}

impl DiskConfig {
    pub const fn new(partition: usize) -> Self {
        Self { partition }
    }
}

/// State shared by every open of one unit.
///
/// Probing happens once; later opens reuse the block shift.
#[derive(Debug, Default)]
pub struct DiskUnit {
    initialized: bool,
    block_shift: u32,
    capacity: Option<Capacity>,
}

impl DiskUnit {
    pub const fn new() -> Self {
        Self {
            initialized: false,
            block_shift: 0,
            capacity: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn block_shift(&self) -> u32 {
        self.block_shift
    }

    pub fn capacity(&self) -> Option<Capacity> {
        self.capacity
    }

    /// Bring the unit up. No-op once it has succeeded.
    ///
    /// A unit answering CHECK CONDITION gets one settle delay and a second
    /// TEST UNIT READY (it is usually still spinning up). Any other failure,
    /// or a second CHECK CONDITION, is `DeviceNotReady`.
    ///
    /// A failed READ CAPACITY is not an error: the unit stays at 512-byte
    /// blocks.
    pub fn probe<T, P>(&mut self, transport: &mut T, platform: &P) -> Result<(), DiskError>
    where
        T: ScsiTransport + ?Sized,
        P: Delay + Console + ?Sized,
    {
        if self.initialized {
            return Ok(());
        }

        let mut status = transport.test_unit_ready();
        if status == ScsiStatus::CheckCondition {
            platform.delay_us(PROBE_SETTLE_US);
            status = transport.test_unit_ready();
        }
        if !status.is_good() {
            diag!(platform, "diskinit abort!");
            diag!(platform, "Boot failed!  Halting...");
            return Err(DiskError::DeviceNotReady(status));
        }

        let mut data = [0u8; READ_CAPACITY_LEN];
        if transport.read_capacity(&mut data).is_good() {
            if let Some(cap) = Capacity::parse(&data) {
                self.block_shift = block_shift_for(cap.block_len);
                self.capacity = Some(cap);
            }
        } else {
            log_info!("diskinit: capacity unavailable, assuming 512-byte blocks");
        }

        self.initialized = true;
        log_info!("diskinit: unit ready");
        Ok(())
    }
}

/// Direction and buffer of one strategy call.
#[derive(Debug)]
pub enum Transfer<'b> {
    Read(&'b mut [u8]),
    Write(&'b [u8]),
}

impl Transfer<'_> {
    pub fn len(&self) -> usize {
        match self {
            Transfer::Read(buf) => buf.len(),
            Transfer::Write(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One open of one partition.
pub struct DiskSession<'p, T, P: ?Sized> {
    transport: T,
    platform: &'p P,
    partition_index: usize,
    retry_count: u8,
    initialized: bool,
    block_shift: u32,
    capacity: Option<Capacity>,
    label: DiskLabel,
    label_error: Option<LabelError>,
}

impl<'p, T, P> DiskSession<'p, T, P>
where
    T: ScsiTransport,
    P: Delay + Console + ?Sized,
{
    /// Open `config.partition` on the unit behind `transport`.
    ///
    /// Probes the unit if nobody has yet, reads `LABELSECTOR` through the
    /// whole-device provisional label and hands it to `decoder`. A sector
    /// that reads fine but does not decode still opens: the provisional
    /// label stays and the decode error is kept for `label_error`.
    pub fn open<L: LabelDecoder + ?Sized>(
        unit: &mut DiskUnit,
        transport: T,
        platform: &'p P,
        decoder: &L,
        config: DiskConfig,
    ) -> Result<Box<Self>, DiskError> {
        if config.partition >= MAXPARTITIONS {
            return Err(DiskError::InvalidPartition);
        }

        let mut session = Box::new(Self {
            transport,
            platform,
            partition_index: config.partition,
            retry_count: 0,
            initialized: false,
            block_shift: 0,
            capacity: None,
            label: DiskLabel::whole_device(config.partition),
            label_error: None,
        });

        unit.probe(&mut session.transport, platform)?;
        session.initialized = unit.is_initialized();
        session.block_shift = unit.block_shift();
        session.capacity = unit.capacity();

        let mut sector = [0u8; DEV_BSIZE];
        match session.strategy(Transfer::Read(&mut sector), LABELSECTOR) {
            Ok(n) if n == DEV_BSIZE => {}
            _ => {
                diag!(platform, "diskstrategy error...");
                return Err(DiskError::LabelReadFailed);
            }
        }

        let mut decoded = session.label.clone();
        match decoder.decode_label(&sector, &mut decoded) {
            Ok(()) => session.label = decoded,
            Err(e) => {
                diag!(platform, "No disklabel...");
                session.label_error = Some(e);
            }
        }

        Ok(session)
    }

    /// Transfer `transfer.len()` bytes at partition-relative `logical_block`.
    ///
    /// A failed command waits `RETRY_DELAY_US` and is reissued unchanged,
    /// up to `DISK_RETRY` times, announcing each retry on the console.
    pub fn strategy(&mut self, mut transfer: Transfer<'_>, logical_block: u32) -> Result<usize, DiskError> {
        let byte_count = transfer.len();
        let offset = self.label.partitions[self.partition_index].offset;
        let block = translate(logical_block, offset, self.block_shift);
        let count = u32::try_from(byte_count >> self.block_shift).map_err(|_| DiskError::RequestTooLarge)?;

        self.retry_count = 0;
        loop {
            let status = match &mut transfer {
                Transfer::Read(buf) => self.transport.read(&mut buf[..], block, count),
                Transfer::Write(buf) => self.transport.write(&buf[..], block, count),
            };
            if status.is_good() {
                return Ok(byte_count);
            }

            self.platform.delay_us(RETRY_DELAY_US);
            self.retry_count += 1;
            if self.retry_count > DISK_RETRY {
                log_info!("diskstrategy: retries exhausted");
                return Err(DiskError::IoError);
            }
            diag!(self.platform, "diskstrategy retry");
        }
    }

    /// Read `buf.len()` bytes at partition-relative `logical_block`.
    pub fn read(&mut self, logical_block: u32, buf: &mut [u8]) -> Result<usize, DiskError> {
        self.strategy(Transfer::Read(buf), logical_block)
    }

    /// Write `buf.len()` bytes at partition-relative `logical_block`.
    pub fn write(&mut self, logical_block: u32, buf: &[u8]) -> Result<usize, DiskError> {
        self.strategy(Transfer::Write(buf), logical_block)
    }

    /// Release the session.
    pub fn close(self: Box<Self>) -> Result<(), DiskError> {
        drop(self);
        Ok(())
    }
}

impl<'p, T, P: ?Sized> DiskSession<'p, T, P> {
    pub fn partition_index(&self) -> usize {
        self.partition_index
    }

    pub fn partition(&self) -> &Partition {
        &self.label.partitions[self.partition_index]
    }

    /// Attempts made by the last strategy call beyond the first.
    pub fn retry_count(&self) -> u8 {
        self.retry_count
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn block_shift(&self) -> u32 {
        self.block_shift
    }

    pub fn capacity(&self) -> Option<Capacity> {
        self.capacity
    }

    pub fn label(&self) -> &DiskLabel {
        &self.label
    }

    /// Why the on-disk label was not used, if it wasn't.
    pub fn label_error(&self) -> Option<DiskError> {
        self.label_error.map(DiskError::MalformedLabel)
    }

    /// Is the session still on the provisional whole-device label?
    pub fn is_provisional(&self) -> bool {
        self.label_error.is_some()
    }
}

/// Open-file slot holding at most one session.
pub struct DiskHandle<'p, T, P: ?Sized> {
    devdata: Option<Box<DiskSession<'p, T, P>>>,
}

impl<'p, T, P: ?Sized> DiskHandle<'p, T, P> {
    pub const fn new() -> Self {
        Self { devdata: None }
    }

    pub fn is_open(&self) -> bool {
        self.devdata.is_some()
    }

    pub fn session(&self) -> Option<&DiskSession<'p, T, P>> {
        self.devdata.as_deref()
    }

    pub fn session_mut(&mut self) -> Option<&mut DiskSession<'p, T, P>> {
        self.devdata.as_deref_mut()
    }
}

impl<'p, T: ScsiTransport, P: Delay + Console + ?Sized> DiskHandle<'p, T, P> {
    /// Open a session into this slot, replacing any previous one.
    pub fn open<L: LabelDecoder + ?Sized>(
        &mut self,
        unit: &mut DiskUnit,
        transport: T,
        platform: &'p P,
        decoder: &L,
        config: DiskConfig,
    ) -> Result<(), DiskError> {
        let session = DiskSession::open(unit, transport, platform, decoder, config)?;
        self.devdata = Some(session);
        Ok(())
    }

    pub fn strategy(&mut self, transfer: Transfer<'_>, logical_block: u32) -> Result<usize, DiskError> {
        self.devdata
            .as_deref_mut()
            .ok_or(DiskError::NotOpen)?
            .strategy(transfer, logical_block)
    }

    /// Release the session. Closing an empty slot is `NotOpen`.
    pub fn close(&mut self) -> Result<(), DiskError> {
        self.devdata.take().ok_or(DiskError::NotOpen)?.close()
    }
}

impl<'p, T, P: ?Sized> Default for DiskHandle<'p, T, P> {
    fn default() -> Self {
        Self::new()
    }
}
