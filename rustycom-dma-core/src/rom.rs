use log::warn;

use crate::mmap;

/// Size of one LoROM bank as seen on the A-bus
const LOROM_BANK_SIZE: usize = 0x8000;

/// LoROM cartridge image, mapped to $8000-$FFFF of every non-WRAM bank
pub struct Rom {
    rom: Box<[u8]>,
}

impl Rom {
    pub fn new(rom_bytes: Vec<u8>) -> Rom {
        Rom {
            rom: rom_bytes.into_boxed_slice(),
        }
    }

    pub fn new_empty() -> Rom {
        Rom {
            rom: Vec::new().into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize { self.rom.len() }

    pub fn is_empty(&self) -> bool { self.rom.is_empty() }

    /// Reads from LoROM, mirroring images smaller than the address space.
    /// An empty image reads as open bus.
    pub fn read_lo_rom8(&self, bank: u8, bank_addr: u16) -> u8 {
        if self.rom.is_empty() {
            return 0;
        }
        let offset = (bank_addr - mmap::LOROM_FIRST) as usize;
        let index = ((bank & 0x7F) as usize) * LOROM_BANK_SIZE + offset;
        self.rom[index % self.rom.len()]
    }

    pub fn write_lo_rom8(&mut self, bank: u8, bank_addr: u16, value: u8) {
        warn!(
            "Write value ${0:02X} to LoROM at addr ${1:02X}:{2:04X} dropped",
            value, bank, bank_addr
        );
    }
}
