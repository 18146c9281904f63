//! `gpt_disk_io::BlockIo` over an open disk session.
//!
//! Lets filesystem readers that speak `BlockIo` (UFS/FFS loaders, label
//! tools) go through the session's partition translation and retry loop.
//! LBAs are partition-relative `DEV_BSIZE` sectors. On units with larger
//! device blocks they are converted to device blocks before reaching the
//! session, and must start and end on a device block boundary.

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

use irisboot_hwinit::{Console, Delay};

use super::error::DiskError;
use super::label::WHOLE_DISK_SIZE;
use super::scsi::ScsiTransport;
use super::session::{DiskSession, Transfer};
use super::DEV_BSIZE;

/// Sectors per strategy call (64 KiB, one WD33C93 DMA chain).
const MAX_TRANSFER_SECTORS: usize = 128;

/// Borrowed `BlockIo` view of a session.
pub struct PartitionBlockIo<'s, 'p, T, P: ?Sized> {
    session: &'s mut DiskSession<'p, T, P>,
}

impl<'s, 'p, T, P> PartitionBlockIo<'s, 'p, T, P>
where
    T: ScsiTransport,
    P: Delay + Console + ?Sized,
{
    pub fn new(session: &'s mut DiskSession<'p, T, P>) -> Self {
        Self { session }
    }

    /// Device block length in bytes.
    fn device_block_len(&self) -> usize {
        DEV_BSIZE << self.session.block_shift()
    }

    /// Device block holding `start_lba`, checking that both the address
    /// and the transfer length fall on device block boundaries.
    fn device_block(&self, start_lba: Lba, len: usize) -> Result<u32, DiskError> {
        let shift = self.session.block_shift();
        let sectors_per_block = 1u64 << shift;
        if len % self.device_block_len() != 0 || start_lba.0 % sectors_per_block != 0 {
            return Err(DiskError::Unaligned);
        }
        u32::try_from(start_lba.0 >> shift).map_err(|_| DiskError::OutOfRange)
    }

    /// Bytes per strategy call: 64 KiB, or one device block if larger.
    fn chunk_len(&self) -> usize {
        (MAX_TRANSFER_SECTORS * DEV_BSIZE).max(self.device_block_len())
    }
}

impl<'s, 'p, T, P> BlockIo for PartitionBlockIo<'s, 'p, T, P>
where
    T: ScsiTransport,
    P: Delay + Console + ?Sized,
{
    type Error = DiskError;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    /// Partition size from the label. On the provisional whole-device
    /// label the unit capacity is used instead when it is known.
    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        let part = self.session.partition();
        if part.size == WHOLE_DISK_SIZE && part.offset == 0 {
            if let Some(cap) = self.session.capacity() {
                return Ok(cap.blocks() << self.session.block_shift());
            }
        }
        Ok(part.size as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        let mut block = self.device_block(start_lba, dst.len())?;
        let block_len = self.device_block_len();
        let chunk_len = self.chunk_len();

        for chunk in dst.chunks_mut(chunk_len) {
            let blocks = (chunk.len() / block_len) as u32;
            self.session.strategy(Transfer::Read(chunk), block)?;
            block = block.checked_add(blocks).ok_or(DiskError::OutOfRange)?;
        }

        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let mut block = self.device_block(start_lba, src.len())?;
        let block_len = self.device_block_len();
        let chunk_len = self.chunk_len();

        for chunk in src.chunks(chunk_len) {
            let blocks = (chunk.len() / block_len) as u32;
            self.session.strategy(Transfer::Write(chunk), block)?;
            block = block.checked_add(blocks).ok_or(DiskError::OutOfRange)?;
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Transfers complete synchronously.
        Ok(())
    }
}
