//! Reader tests against a simulated 93Cx6 on a fake control register.

use alloc::vec;
use alloc::vec::Vec;
use core::cell::Cell;

use irisboot_hwinit::{Delay, Machine};

use super::*;

#[derive(Default)]
struct TickDelay {
    calls: Cell<u32>,
}

impl Delay for TickDelay {
    fn delay_us(&self, _us: u32) {
        self.calls.set(self.calls.get() + 1);
    }
}

/// Microwire slave: samples DO on rising CK while CS is high, answers READ
/// with a dummy 0 followed by the addressed word, MSB first.
struct SimChip {
    desc: SeepromDescriptor,
    words: Vec<u16>,
    ready: bool,
    reg: u8,
    selected: bool,
    skip_edge: bool,
    shift_in: Vec<bool>,
    out: Option<(u16, u32)>,
    /// DO bits sampled per command
    commands: Vec<Vec<bool>>,
    writes: usize,
    reads: usize,
}

impl SimChip {
    fn new(desc: SeepromDescriptor) -> Self {
        Self {
            desc,
            words: vec![0; desc.chip.words()],
            ready: true,
            reg: 0,
            selected: false,
            skip_edge: false,
            shift_in: Vec::new(),
            out: None,
            commands: Vec::new(),
            writes: 0,
            reads: 0,
        }
    }

    fn command_len(&self) -> usize {
        3 + self.desc.chip.address_bits() as usize
    }

    fn clock(&mut self, value: u8) {
        if self.skip_edge {
            self.skip_edge = false;
        } else if self.out.is_some() {
            if let Some((_, pos)) = &mut self.out {
                *pos += 1;
            }
        } else {
            self.shift_in.push(value & self.desc.dout != 0);
            if self.shift_in.len() == self.command_len() && self.shift_in[..3] == [true, true, false] {
                let addr = self.shift_in[3..]
                    .iter()
                    .fold(0usize, |a, &b| (a << 1) | b as usize);
                self.out = Some((self.words[addr], 0));
            }
        }
    }
}

impl SeepromPort for SimChip {
    fn write(&mut self, value: u8) {
        self.writes += 1;
        let cs = value & self.desc.cs != 0;
        let rising = value & self.desc.ck != 0 && self.reg & self.desc.ck == 0;

        if cs && !self.selected {
            self.selected = true;
            self.skip_edge = true;
            self.shift_in.clear();
            self.out = None;
        } else if !cs && self.selected {
            self.selected = false;
            let sampled = core::mem::take(&mut self.shift_in);
            self.commands.push(sampled);
        }

        if self.selected && rising {
            self.clock(value);
        }
        self.reg = value;
    }

    fn read(&mut self) -> u8 {
        self.reads += 1;
        let mut value = self.reg & !self.desc.di;
        if let Some((word, pos)) = self.out {
            if (1..=16).contains(&pos) && (word >> (16 - pos)) & 1 != 0 {
                value |= self.desc.di;
            }
        }
        if self.ready {
            value |= self.desc.rdy;
        }
        value
    }
}

#[test]
fn test_read_command_bit_order() {
    let desc = SeepromDescriptor::HPC1.with_chip(SeepromChip::C46);
    let mut chip = SimChip::new(desc);
    let delay = TickDelay::default();

    Seeprom::new(&mut chip, &delay, desc).read_range(5, 1).unwrap();

    let (t, f) = (true, false);
    assert_eq!(chip.commands, vec![vec![t, t, f, f, f, f, t, f, t]]);
}

#[test]
fn test_reads_pattern_word() {
    let desc = SeepromDescriptor::HPC1;
    let mut chip = SimChip::new(desc);
    chip.words[0x42] = 0x5555;
    chip.words[0x43] = 0x8001;
    let delay = TickDelay::default();

    let words = Seeprom::new(&mut chip, &delay, desc).read_range(0x42, 2).unwrap();
    assert_eq!(words, vec![0x5555, 0x8001]);
}

#[test]
fn test_repeat_reads_match() {
    let desc = SeepromDescriptor::HPC1;
    let mut chip = SimChip::new(desc);
    for (i, w) in chip.words.iter_mut().enumerate() {
        *w = (i as u16).wrapping_mul(0x9E37) ^ 0xA5A5;
    }
    let delay = TickDelay::default();
    let mut seeprom = Seeprom::new(&mut chip, &delay, desc);

    let first = seeprom.read_range(10, 8).unwrap();
    let second = seeprom.read_range(10, 8).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0], 10u16.wrapping_mul(0x9E37) ^ 0xA5A5);
}

#[test]
fn test_one_settle_per_control_write() {
    let desc = SeepromDescriptor::HPC1.with_chip(SeepromChip::C46);
    let mut chip = SimChip::new(desc);
    let delay = TickDelay::default();

    Seeprom::new(&mut chip, &delay, desc).read_range(0, 1).unwrap();

    // select + 9 command bits + 17 data bits + deselect
    let writes = 1 + 2 * 9 + 2 * 17 + 3;
    assert_eq!(chip.writes, writes);
    assert_eq!(delay.calls.get() as usize, writes);
    // only the data samples read the register
    assert_eq!(chip.reads, 17);
    // chip select and clock left low
    assert_eq!(chip.reg, 0);
}

#[test]
fn test_ready_poll_gives_up() {
    let desc = SeepromDescriptor { rdy: 0x01, ..SeepromDescriptor::HPC1.with_chip(SeepromChip::C46) };
    let mut chip = SimChip::new(desc);
    chip.ready = false;
    chip.words[7] = 0x1234;
    let delay = TickDelay::default();

    let words = Seeprom::new(&mut chip, &delay, desc).read_range(7, 1).unwrap();
    assert_eq!(words, vec![0x1234]);

    // each write: 1001 status polls plus the clock-clearing read
    let writes = 1 + 2 * 9 + 2 * 17 + 3;
    assert_eq!(chip.reads, writes * 1002 + 17);
    assert_eq!(delay.calls.get(), 0);
}

#[test]
fn test_ready_poll_returns_when_ready() {
    let desc = SeepromDescriptor { rdy: 0x01, ..SeepromDescriptor::HPC1 };
    let mut chip = SimChip::new(desc);
    chip.words[200] = 0xBEEF;
    let delay = TickDelay::default();

    let words = Seeprom::new(&mut chip, &delay, desc).read_range(200, 1).unwrap();
    assert_eq!(words, vec![0xBEEF]);
    let writes = 1 + 2 * 11 + 2 * 17 + 3;
    assert_eq!(chip.reads, writes * 2 + 17);
}

#[test]
fn test_out_of_range_touches_nothing() {
    let desc = SeepromDescriptor::HPC1.with_chip(SeepromChip::C46);
    let mut chip = SimChip::new(desc);
    let delay = TickDelay::default();
    let mut seeprom = Seeprom::new(&mut chip, &delay, desc);

    assert_eq!(seeprom.read_range(60, 5), Err(SeepromError::AddressOutOfRange));
    assert_eq!(seeprom.read_range(60, 4).map(|w| w.len()), Ok(4));
    drop(seeprom);
    assert_eq!(chip.commands.len(), 4);
}

#[test]
fn test_empty_read() {
    let desc = SeepromDescriptor::HPC1;
    let mut chip = SimChip::new(desc);
    let delay = TickDelay::default();

    assert_eq!(Seeprom::new(&mut chip, &delay, desc).read_range(256, 0), Ok(vec![]));
    assert_eq!(chip.writes, 0);
}

#[test]
fn test_read_bootfile() {
    let desc = SeepromDescriptor::HPC1;
    let mut chip = SimChip::new(desc);
    let name = b"dksc(0,1,0)/netbsd\0";
    for (i, pair) in name.chunks(2).enumerate() {
        let hi = pair[0];
        let lo = pair.get(1).copied().unwrap_or(0);
        chip.words[136 + i] = u16::from_be_bytes([hi, lo]);
    }
    let delay = TickDelay::default();
    let mut seeprom = Seeprom::new(&mut chip, &delay, desc);

    let layout = Machine::IndigoR4k.eeprom().unwrap();
    let file = read_bootfile(&mut seeprom, &layout).unwrap();
    assert_eq!(file.as_str(), Some("dksc(0,1,0)/netbsd"));
    drop(seeprom);
    // 48-byte field
    assert_eq!(chip.commands.len(), 24);
}

#[test]
fn test_bootfile_past_small_part() {
    let desc = SeepromDescriptor::HPC1.with_chip(SeepromChip::C46);
    let mut chip = SimChip::new(desc);
    let delay = TickDelay::default();
    let mut seeprom = Seeprom::new(&mut chip, &delay, desc);

    let layout = Machine::IndigoR3k.eeprom().unwrap();
    assert_eq!(read_bootfile(&mut seeprom, &layout), Err(SeepromError::AddressOutOfRange));
}

/// Data-in alternates 1,0,1,0... on successive reads.
struct AlternatingPort {
    di: u8,
    next: bool,
}

impl SeepromPort for AlternatingPort {
    fn write(&mut self, _value: u8) {}

    fn read(&mut self) -> u8 {
        let bit = self.next;
        self.next = !self.next;
        if bit {
            self.di
        } else {
            0
        }
    }
}

#[test]
fn test_alternating_data_line() {
    let desc = SeepromDescriptor::HPC1;
    let port = AlternatingPort { di: desc.di, next: true };
    let delay = TickDelay::default();

    // 17 samples 1,0,1,...,1: the leading 1 falls off the word
    let words = Seeprom::new(port, &delay, desc).read_range(0, 1).unwrap();
    assert_eq!(words, vec![0x5555]);
}

#[test]
fn test_range_matches_single_reads() {
    let desc = SeepromDescriptor::HPC1;
    let mut chip = SimChip::new(desc);
    chip.words[2] = 0x0102;
    chip.words[3] = 0x0304;
    chip.words[4] = 0x0506;
    let delay = TickDelay::default();
    let mut seeprom = Seeprom::new(&mut chip, &delay, desc);

    let range = seeprom.read_range(2, 3).unwrap();
    let mut singles = Vec::new();
    for k in 2..5 {
        singles.extend(seeprom.read_range(k, 1).unwrap());
    }
    assert_eq!(range, singles);
    assert_eq!(range, vec![0x0102, 0x0304, 0x0506]);
}
