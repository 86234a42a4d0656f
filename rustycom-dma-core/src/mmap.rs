// Memory map
pub const WS1_SYSLR_FIRST_BANK: u8 = 0x00;
pub const WS1_SYSLR_LAST_BANK: u8 = 0x3F;

pub const WRAM_FIRST_BANK: u8 = 0x7E;
pub const WRAM_LAST_BANK: u8 = 0x7F;

pub const WS2_SYSLR_FIRST_BANK: u8 = 0x80;
pub const WS2_SYSLR_LAST_BANK: u8 = 0xBF;

// Map of the shared system and LoROM -banks
pub const SYS_FIRST: u16 = 0x0000;
pub const SYS_LAST: u16 = 0x7FFF;
pub const LOROM_FIRST: u16 = 0x8000;
pub const LOROM_LAST: u16 = 0xFFFF;

// System area map
pub const WRAM_MIRR_FIRST: u16 = 0x0000;
pub const WRAM_MIRR_LAST: u16 = 0x1FFF;
pub const PPU_IO_FIRST: u16 = 0x2100;
pub const PPU_IO_LAST: u16 = 0x213F;
pub const APU_IO_FIRST: u16 = 0x2140;
pub const APU_IO_LAST: u16 = 0x217F;
pub const WMDATA: u16 = 0x2180; // R/W
pub const WMADDL: u16 = 0x2181; // W
pub const WMADDM: u16 = 0x2182; // W
pub const WMADDH: u16 = 0x2183; // W
pub const BBUS_FIRST: u16 = 0x2100;
pub const BBUS_LAST: u16 = 0x21FF;
// CPU W
pub const MDMAEN: u16 = 0x420B;
pub const HDMAEN: u16 = 0x420C;
// CPU DMA R/W
pub const DMA_FIRST: u16 = 0x4300;
pub const DMA_LAST: u16 = 0x43FF;

/// B-bus port of the WRAM data register, the one DMA can't use against WRAM itself
pub const WMDATA_PORT: u8 = (WMDATA - BBUS_FIRST) as u8;

/// Returns the full 24bit address of `bank_addr` in `bank`
pub fn full_addr(bank: u8, bank_addr: u16) -> u32 { ((bank as u32) << 16) | bank_addr as u32 }

/// Returns the A-bus address a B-bus `port` is visible at
pub fn bbus_addr(port: u8) -> u32 { (BBUS_FIRST | port as u16) as u32 }

pub fn bank_wrapping_add(addr: u32, offset: u16) -> u32 {
    (addr & 0xFF0000) | ((addr as u16).wrapping_add(offset) as u32)
}
