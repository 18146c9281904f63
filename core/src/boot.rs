//! Boot driver entry points.
//!
//! What the stand-alone loader calls: open the boot disk (halting the
//! machine if the unit never comes ready) and look up the boot file name.

use irisboot_hwinit::{Delay, EepromLayout, Machine, Platform};

use crate::disk::{DiskConfig, DiskError, DiskHandle, DiskUnit, LabelDecoder, ScsiTransport};
use crate::nvram::{read_bootfile, BootFile, MmioPort, Seeprom, SeepromDescriptor, SeepromError, SeepromPort};
use crate::{diag, log_info};

/// Open the boot partition into `handle`.
///
/// A unit that never becomes ready is fatal: the machine is reset.
/// Every other error is handed back to the caller.
pub fn open_boot_disk<'p, T, P, L>(
    handle: &mut DiskHandle<'p, T, P>,
    unit: &mut DiskUnit,
    transport: T,
    platform: &'p P,
    decoder: &L,
    config: DiskConfig,
) -> Result<(), DiskError>
where
    T: ScsiTransport,
    P: Platform + ?Sized,
    L: LabelDecoder + ?Sized,
{
    match handle.open(unit, transport, platform, decoder, config) {
        Err(e) if e.is_fatal() => platform.reboot(),
        other => other,
    }
}

/// Read the boot file name through `port`.
pub fn bootfile_from_port<P, D>(port: P, delay: &D, layout: &EepromLayout) -> Result<BootFile, SeepromError>
where
    P: SeepromPort,
    D: Delay + ?Sized,
{
    let mut seeprom = Seeprom::new(port, delay, SeepromDescriptor::HPC1);
    let file = read_bootfile(&mut seeprom, layout)?;
    log_info!("bootfile: read from EEPROM");
    Ok(file)
}

/// Boot file name from this machine's EEPROM, if it keeps one there.
///
/// # Safety
/// Must run on `machine`: the EEPROM control register is accessed
/// directly through KSEG1.
pub unsafe fn machine_bootfile<P>(machine: Machine, platform: &P) -> Option<BootFile>
where
    P: Platform + ?Sized,
{
    let layout = machine.eeprom()?;
    let port = MmioPort::new(layout.register, platform);
    match bootfile_from_port(port, platform, &layout) {
        Ok(file) => Some(file),
        Err(_) => {
            diag!(platform, "EEPROM boot file unreadable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::mock::{MockPlatform, MockScsi};
    use crate::disk::{BsdLabelDecoder, ScsiStatus};

    #[test]
    #[should_panic(expected = "reboot")]
    fn test_unready_unit_reboots() {
        let platform = MockPlatform::new();
        let mut scsi = MockScsi::new();
        scsi.unit_ready = alloc::vec![ScsiStatus::CheckCondition, ScsiStatus::CheckCondition];
        let mut unit = DiskUnit::new();
        let mut handle = DiskHandle::new();

        let _ = open_boot_disk(&mut handle, &mut unit, &mut scsi, &platform, &BsdLabelDecoder, DiskConfig::new(0));
    }

    #[test]
    fn test_label_read_failure_is_returned() {
        let platform = MockPlatform::new();
        let mut scsi = MockScsi::new();
        scsi.always_fail = true;
        let mut unit = DiskUnit::new();
        let mut handle = DiskHandle::new();

        let result =
            open_boot_disk(&mut handle, &mut unit, &mut scsi, &platform, &BsdLabelDecoder, DiskConfig::new(0));
        assert_eq!(result, Err(DiskError::LabelReadFailed));
        assert!(!handle.is_open());
    }

    #[test]
    fn test_open_boot_disk() {
        let platform = MockPlatform::new();
        let mut scsi = MockScsi::new();
        let mut unit = DiskUnit::new();
        let mut handle = DiskHandle::new();

        open_boot_disk(&mut handle, &mut unit, &mut scsi, &platform, &BsdLabelDecoder, DiskConfig::new(0)).unwrap();
        assert!(handle.is_open());
        assert_eq!(handle.close(), Ok(()));
    }

    #[test]
    fn test_indy_has_no_eeprom_bootfile() {
        let platform = MockPlatform::new();
        assert!(unsafe { machine_bootfile(Machine::Indy, &platform) }.is_none());
    }
}
