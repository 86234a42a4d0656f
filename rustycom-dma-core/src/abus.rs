use log::trace;

use crate::mmap::{self, *};
use crate::rom::Rom;

const WRAM_SIZE: usize = 128 * 1024;
const BBUS_SIZE: usize = 256;

/// Byte-addressable view of the 24bit A-bus as seen by the DMA unit
pub trait Bus {
    fn read8(&mut self, addr: u32) -> u8;
    fn write8(&mut self, addr: u32, value: u8);
}

/// Main bus with WRAM, LoROM and the B-bus ports
///
/// PPU and APU are not emulated, their ports latch the last written value and every B-bus
/// write is recorded in order.
pub struct ABus {
    wram: Box<[u8]>,
    rom: Rom,
    bbus: Box<[u8]>,
    bbus_writes: Vec<(u8, u8)>,
    // WRAM access
    wm_add_l: u8,
    wm_add_m: u8,
    wm_add_h: u8,
}

impl ABus {
    pub fn new(rom_bytes: Vec<u8>) -> ABus {
        ABus {
            wram: Box::new([0; WRAM_SIZE]),
            rom: Rom::new(rom_bytes),
            bbus: Box::new([0; BBUS_SIZE]),
            bbus_writes: Vec::new(),
            wm_add_l: 0x00,
            wm_add_m: 0x00,
            wm_add_h: 0x00,
        }
    }

    pub fn new_empty_rom() -> ABus {
        ABus {
            rom: Rom::new_empty(),
            ..ABus::new(Vec::new())
        }
    }

    pub fn wram(&self) -> &[u8] { &self.wram }

    pub fn rom(&self) -> &Rom { &self.rom }

    /// Returns the last value written to B-bus `port`
    pub fn bbus_port(&self, port: u8) -> u8 { self.bbus[port as usize] }

    /// B-bus writes as (port, value) in the order they happened
    pub fn bbus_writes(&self) -> &[(u8, u8)] { &self.bbus_writes }

    pub fn take_bbus_writes(&mut self) -> Vec<(u8, u8)> { std::mem::take(&mut self.bbus_writes) }

    /// Writes `bytes` starting at `addr`, wrapping inside the bank
    pub fn load(&mut self, addr: u32, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.write8(mmap::bank_wrapping_add(addr, i as u16), b);
        }
    }

    /// Clears WRAM, the port latches and the WRAM port address. ROM is kept.
    pub fn reset(&mut self) {
        self.wram.iter_mut().for_each(|b| *b = 0);
        self.bbus.iter_mut().for_each(|b| *b = 0);
        self.bbus_writes.clear();
        self.wm_add_l = 0x00;
        self.wm_add_m = 0x00;
        self.wm_add_h = 0x00;
    }

    fn wm_addr(&self) -> usize {
        (((self.wm_add_h & 0x1) as usize) << 16)
            | ((self.wm_add_m as usize) << 8)
            | (self.wm_add_l as usize)
    }

    fn increment_wm_addr(&mut self) {
        let next = (self.wm_addr() + 1) % WRAM_SIZE;
        self.wm_add_l = next as u8;
        self.wm_add_m = (next >> 8) as u8;
        self.wm_add_h = (next >> 16) as u8;
    }

    fn read_sys(&mut self, addr: u16) -> u8 {
        match addr {
            WRAM_MIRR_FIRST..=WRAM_MIRR_LAST => self.wram[addr as usize],
            WMDATA => {
                let value = self.wram[self.wm_addr()];
                self.increment_wm_addr();
                value
            }
            BBUS_FIRST..=BBUS_LAST => self.bbus[(addr - BBUS_FIRST) as usize],
            _ => {
                trace!("System area read ${:04X}: open bus", addr);
                0
            }
        }
    }

    fn write_sys(&mut self, addr: u16, value: u8) {
        match addr {
            WRAM_MIRR_FIRST..=WRAM_MIRR_LAST => self.wram[addr as usize] = value,
            BBUS_FIRST..=BBUS_LAST => {
                let port = (addr - BBUS_FIRST) as u8;
                self.bbus[port as usize] = value;
                self.bbus_writes.push((port, value));
                match addr {
                    WMDATA => {
                        let wram_addr = self.wm_addr();
                        self.wram[wram_addr] = value;
                        self.increment_wm_addr();
                    }
                    WMADDL => self.wm_add_l = value,
                    WMADDM => self.wm_add_m = value,
                    WMADDH => self.wm_add_h = value,
                    _ => (),
                }
            }
            _ => trace!("System area write ${:04X} = ${:02X} dropped", addr, value),
        }
    }
}

impl Bus for ABus {
    fn read8(&mut self, addr: u32) -> u8 {
        let bank = (addr >> 16) as u8;
        let bank_addr = addr as u16;
        match bank {
            WRAM_FIRST_BANK..=WRAM_LAST_BANK => {
                self.wram[((bank - WRAM_FIRST_BANK) as usize) << 16 | bank_addr as usize]
            }
            WS1_SYSLR_FIRST_BANK..=WS1_SYSLR_LAST_BANK
            | WS2_SYSLR_FIRST_BANK..=WS2_SYSLR_LAST_BANK => match bank_addr {
                SYS_FIRST..=SYS_LAST => self.read_sys(bank_addr),
                LOROM_FIRST..=LOROM_LAST => self.rom.read_lo_rom8(bank, bank_addr),
            },
            _ => match bank_addr {
                LOROM_FIRST..=LOROM_LAST => self.rom.read_lo_rom8(bank, bank_addr),
                _ => 0,
            },
        }
    }

    fn write8(&mut self, addr: u32, value: u8) {
        let bank = (addr >> 16) as u8;
        let bank_addr = addr as u16;
        match bank {
            WRAM_FIRST_BANK..=WRAM_LAST_BANK => {
                self.wram[((bank - WRAM_FIRST_BANK) as usize) << 16 | bank_addr as usize] = value
            }
            WS1_SYSLR_FIRST_BANK..=WS1_SYSLR_LAST_BANK
            | WS2_SYSLR_FIRST_BANK..=WS2_SYSLR_LAST_BANK => match bank_addr {
                SYS_FIRST..=SYS_LAST => self.write_sys(bank_addr, value),
                LOROM_FIRST..=LOROM_LAST => self.rom.write_lo_rom8(bank, bank_addr, value),
            },
            _ => match bank_addr {
                LOROM_FIRST..=LOROM_LAST => self.rom.write_lo_rom8(bank, bank_addr, value),
                _ => (),
            },
        }
    }
}
