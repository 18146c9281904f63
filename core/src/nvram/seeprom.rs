//! Bit-banged 93C46 / 93C56 / 93C66 serial EEPROM reader.
//!
//! Microwire framing, one 16-bit word per command:
//!
//! ```text
//!   CS  ____/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾\_____
//!   CK  ____/‾\_/‾\_/‾\_/‾\_ ... _/‾\_/‾\_/‾\_ ... _/‾\_/‾\_____/‾\_
//!   DO        1   1   0   A(n-1)..A0
//!   DI                                    0  D15 ...  D0
//! ```
//!
//! Every control write is followed by a clock settle (a fixed delay, or a
//! ready poll on parts that expose one).

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use irisboot_hwinit::Delay;

use super::port::SeepromPort;

/// Supported parts, by address width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeepromChip {
    /// 93C46: 64 words
    C46,
    /// 93C56 / 93C66: 256 words
    C56_66,
}

impl SeepromChip {
    pub const fn address_bits(self) -> u32 {
        match self {
            SeepromChip::C46 => 6,
            SeepromChip::C56_66 => 8,
        }
    }

    pub const fn words(self) -> usize {
        1 << self.address_bits()
    }
}

/// How the EEPROM lines map onto the control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeepromDescriptor {
    pub chip: SeepromChip,
    /// Mode select bits held during every access
    pub ms: u8,
    /// Ready bit, 0 if the part has none
    pub rdy: u8,
    /// Chip select
    pub cs: u8,
    /// Clock
    pub ck: u8,
    /// Host -> EEPROM data
    pub dout: u8,
    /// EEPROM -> host data
    pub di: u8,
}

impl SeepromDescriptor {
    /// HPC1 wiring (Personal IRIS, Indigo).
    pub const HPC1: Self = Self {
        chip: SeepromChip::C56_66,
        ms: 0,
        rdy: 0,
        cs: 0x02,
        ck: 0x04,
        dout: 0x08,
        di: 0x10,
    };

    pub const fn with_chip(self, chip: SeepromChip) -> Self {
        Self { chip, ..self }
    }
}

/// Start bit plus READ opcode.
const READ_OPCODE: [bool; 3] = [true, true, false];

/// Data bits clocked per read, including the leading dummy 0.
const READ_BITS: u32 = 17;

/// Settle time after a control write when the part has no ready line.
const CLOCK_DELAY_US: u32 = 4;

/// Ready polls before giving up on a slow clock edge.
const READY_SPINS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeepromError {
    /// Requested words run past the end of the part
    AddressOutOfRange,
}

impl SeepromError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SeepromError::AddressOutOfRange => "EEPROM address out of range",
        }
    }
}

impl fmt::Display for SeepromError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// EEPROM reader over a control register.
pub struct Seeprom<'d, P, D: ?Sized> {
    port: P,
    delay: &'d D,
    desc: SeepromDescriptor,
}

impl<'d, P: SeepromPort, D: Delay + ?Sized> Seeprom<'d, P, D> {
    pub fn new(port: P, delay: &'d D, desc: SeepromDescriptor) -> Self {
        Self { port, delay, desc }
    }

    pub fn descriptor(&self) -> &SeepromDescriptor {
        &self.desc
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// Read `count` words starting at word `start`.
    pub fn read_range(&mut self, start: u16, count: usize) -> Result<Vec<u16>, SeepromError> {
        let mut words = vec![0u16; count];
        self.read_into(start, &mut words)?;
        Ok(words)
    }

    /// Fill `buf` with the words starting at `start`.
    ///
    /// The range is checked up front; nothing is clocked out if any word
    /// lies past the end of the part.
    pub fn read_into(&mut self, start: u16, buf: &mut [u16]) -> Result<(), SeepromError> {
        let start = start as usize;
        let end = start
            .checked_add(buf.len())
            .ok_or(SeepromError::AddressOutOfRange)?;
        if end > self.desc.chip.words() {
            return Err(SeepromError::AddressOutOfRange);
        }

        for (addr, word) in (start..end).zip(buf.iter_mut()) {
            *word = self.read_word(addr as u32);
        }
        Ok(())
    }

    fn read_word(&mut self, addr: u32) -> u16 {
        let mut bus = Bus {
            port: &mut self.port,
            delay: self.delay,
            desc: self.desc,
            control: 0,
        };

        bus.select();
        for bit in READ_OPCODE {
            bus.send(bit);
        }
        for i in (0..self.desc.chip.address_bits()).rev() {
            bus.send(addr & (1 << i) != 0);
        }
        let word = bus.receive();
        bus.deselect();
        word
    }
}

/// One command cycle. `control` is the shadow of the last level written
/// with the clock low.
struct Bus<'a, P, D: ?Sized> {
    port: &'a mut P,
    delay: &'a D,
    desc: SeepromDescriptor,
    control: u8,
}

impl<P: SeepromPort, D: Delay + ?Sized> Bus<'_, P, D> {
    fn out(&mut self, value: u8) {
        self.port.write(value);
        self.clock_settle();
    }

    fn clock_settle(&mut self) {
        let rdy = self.desc.rdy;
        if rdy == 0 {
            self.delay.delay_us(CLOCK_DELAY_US);
            return;
        }

        let mut spins = READY_SPINS;
        while self.port.read() & rdy == 0 && spins > 0 {
            spins -= 1;
        }
        // clear clock
        let _ = self.port.read();
    }

    /// Raise chip select for one clock.
    fn select(&mut self) {
        self.control = self.desc.ms ^ self.desc.cs;
        self.out(self.control ^ self.desc.ck);
    }

    fn send(&mut self, bit: bool) {
        if bit {
            self.control ^= self.desc.dout;
        }
        self.out(self.control);
        self.out(self.control ^ self.desc.ck);
        if bit {
            self.control ^= self.desc.dout;
        }
    }

    /// Clock in a leading 0 and then D15..D0; the dummy bit falls off the
    /// top of the word.
    fn receive(&mut self) -> u16 {
        let mut word: u16 = 0;
        for _ in 0..READ_BITS {
            self.out(self.control);
            word <<= 1;
            if self.port.read() & self.desc.di != 0 {
                word |= 1;
            }
            self.out(self.control ^ self.desc.ck);
        }
        word
    }

    /// Drop chip select and leave the clock low.
    fn deselect(&mut self) {
        self.control = self.desc.ms;
        self.out(self.control);
        self.out(self.control ^ self.desc.ck);
        self.out(self.control);
    }
}
