//! Boot file name stored in the serial EEPROM.

use irisboot_hwinit::{Delay, EepromLayout};

use super::port::SeepromPort;
use super::seeprom::{Seeprom, SeepromError};

/// Longest boot file field on any supported machine.
pub const MAX_BOOTFILE_LEN: usize = 64;

/// NUL-terminated name as stored, high byte of each word first.
#[derive(Clone, PartialEq, Eq)]
pub struct BootFile {
    bytes: [u8; MAX_BOOTFILE_LEN],
    len: usize,
}

impl BootFile {
    /// Unpack up to `max_len` bytes from `words`, stopping at the first NUL.
    pub fn from_words(words: &[u16], max_len: usize) -> Self {
        let mut bytes = [0u8; MAX_BOOTFILE_LEN];
        let limit = max_len.min(MAX_BOOTFILE_LEN);
        let mut len = 0;

        for b in words.iter().flat_map(|w| w.to_be_bytes()).take(limit) {
            if b == 0 {
                break;
            }
            bytes[len] = b;
            len += 1;
        }

        Self { bytes, len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl core::fmt::Debug for BootFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "BootFile({:?})", s),
            None => write!(f, "BootFile({:?})", self.as_bytes()),
        }
    }
}

/// Read the boot file field described by `layout`.
pub fn read_bootfile<P, D>(seeprom: &mut Seeprom<'_, P, D>, layout: &EepromLayout) -> Result<BootFile, SeepromError>
where
    P: SeepromPort,
    D: Delay + ?Sized,
{
    let len = layout.bootfile_len.min(MAX_BOOTFILE_LEN);
    let mut words = [0u16; MAX_BOOTFILE_LEN / 2];
    let words = &mut words[..(len + 1) / 2];

    seeprom.read_into(layout.bootfile_word, words)?;
    Ok(BootFile::from_words(words, len))
}
