use log::trace;

use crate::abus::Bus;
use crate::mmap;

/// Bytes moved per active HDMA line for each transfer mode
const HDMA_LENGTHS: [usize; 8] = [1, 2, 2, 4, 4, 4, 2, 4];

/// Fixed cost of starting a channel and of each transfer read, in master cycles
pub const DMA_CYCLES: u64 = 8;

/// Returns the offset from the channel's B-bus address for byte `index` of a transfer
///
/// Mode 4 walks consecutive ports, the others alternate between one or two ports.
pub fn bbus_offset(mode: u8, index: usize) -> u8 {
    match mode & 0x7 {
        1 | 5 => (index & 0x1) as u8,
        3 | 7 => ((index >> 1) & 0x1) as u8,
        4 => index as u8,
        _ => 0,
    }
}

/// Returns the number of bytes an HDMA line moves in `mode`
pub fn hdma_length(mode: u8) -> usize { HDMA_LENGTHS[(mode & 0x7) as usize] }

/// Checks if DMA is allowed to access `addr` through the A-bus
///
/// B-bus ports and the CPU's own registers, DMA page included, are off limits.
pub fn valid_a(addr: u32) -> bool {
    if addr & 0x40FF00 == 0x2100 {
        return false;
    }
    if addr & 0x40FE00 == 0x4000 {
        return false;
    }
    if addr & 0x40FFE0 == 0x4200 {
        return false;
    }
    addr & 0x40FF80 != 0x4300
}

/// Checks if `addr` hits WRAM, either through its own banks or the low mirror
fn is_wram(addr: u32) -> bool { addr & 0xFE0000 == 0x7E0000 || addr & 0x40E000 == 0x0000 }

/// Checks that no channel in `later` still has HDMA work this frame
fn chain_finished(later: &[Channel]) -> bool { later.iter().all(|c| !c.hdma_is_active()) }

/// One of the eight DMA channels in Ricoh 5A22
#[derive(Clone, Copy, Default)]
pub struct Channel {
    /// General DMA armed through MDMAEN
    pub enable: bool,
    /// HDMA armed through HDMAEN
    pub hdma_enable: bool,
    /// `false` for A->B, `true` for B->A
    pub direction: bool,
    /// HDMA table holds pointers instead of data
    pub indirect: bool,
    /// A-bus address stays put during general DMA
    pub fixed_transfer: bool,
    /// A-bus address decrements during general DMA
    pub reverse_transfer: bool,
    pub unused: bool,
    pub transfer_mode: u8,
    /// B-bus port, $21xx
    pub target_address: u8,
    pub source_address: u16,
    pub source_bank: u8,
    /// Bytes left for general DMA
    pub transfer_size: u16,
    pub indirect_bank: u8,
    pub indirect_address: u16,
    /// Current position in the HDMA table
    pub hdma_address: u16,
    /// Lines left for the current table entry, bit 7 is the repeat flag
    pub line_counter: u8,
    pub hdma_completed: bool,
    pub hdma_do_transfer: bool,
    /// Backing byte of $43xB and $43xF
    pub unknown: u8,
}

impl Channel {
    pub fn new() -> Channel { Channel::default() }

    pub fn hdma_is_active(&self) -> bool { self.hdma_enable && !self.hdma_completed }

    /// Composes the $43x0 parameter byte
    pub fn read_control(&self) -> u8 {
        self.transfer_mode
            | (self.fixed_transfer as u8) << 3
            | (self.reverse_transfer as u8) << 4
            | (self.unused as u8) << 5
            | (self.indirect as u8) << 6
            | (self.direction as u8) << 7
    }

    pub fn write_control(&mut self, value: u8) {
        self.transfer_mode = value & 0x7;
        self.fixed_transfer = value & 0x08 != 0;
        self.reverse_transfer = value & 0x10 != 0;
        self.unused = value & 0x20 != 0;
        self.indirect = value & 0x40 != 0;
        self.direction = value & 0x80 != 0;
    }

    /// Runs the general purpose transfer if the channel is armed
    ///
    /// A zero size moves nothing. The channel disarms itself in either case.
    pub fn run_general_dma<B: Bus>(&mut self, bus: &mut B, cycles: &mut u64) {
        if !self.enable {
            return;
        }

        *cycles += DMA_CYCLES;

        let mut index = 0;
        // Cancellation point between bytes
        while self.enable && self.transfer_size > 0 {
            let addr = mmap::full_addr(self.source_bank, self.source_address);
            self.transfer(bus, cycles, addr, index);
            index += 1;
            self.step_source_address();
            self.transfer_size -= 1;
        }

        self.enable = false;
    }

    fn step_source_address(&mut self) {
        if self.fixed_transfer {
            return;
        }
        self.source_address = if self.reverse_transfer {
            self.source_address.wrapping_sub(1)
        } else {
            self.source_address.wrapping_add(1)
        };
    }

    /// Starts the frame for this channel, `later` being the channels after it in the chain
    ///
    /// A channel already running HDMA is left alone. Others get their table pointer loaded from
    /// the source address and fetch the first entry.
    pub fn hdma_setup<B: Bus>(&mut self, bus: &mut B, later: &[Channel]) {
        self.hdma_do_transfer = true;
        if self.hdma_enable {
            return;
        }
        self.hdma_init(bus, later);
    }

    /// Restarts the table of an HDMA enabled channel, clearing last frame's completion
    ///
    /// Channels without HDMA only have their transient flags reset.
    pub fn hdma_restart<B: Bus>(&mut self, bus: &mut B, later: &[Channel]) {
        self.hdma_completed = false;
        self.hdma_do_transfer = true;
        if !self.hdma_enable {
            return;
        }
        self.hdma_init(bus, later);
    }

    fn hdma_init<B: Bus>(&mut self, bus: &mut B, later: &[Channel]) {
        self.enable = false;
        self.hdma_address = self.source_address;
        self.line_counter = 0;
        self.hdma_reload(bus, later);
    }

    fn hdma_reload<B: Bus>(&mut self, bus: &mut B, later: &[Channel]) {
        if self.line_counter & 0x7F != 0 {
            return;
        }

        self.line_counter = self.read_table(bus);
        self.hdma_completed = self.line_counter == 0;
        self.hdma_do_transfer = !self.hdma_completed;
        trace!(
            "HDMA entry ${:02X} at ${:02X}:{:04X}",
            self.line_counter,
            self.source_bank,
            self.hdma_address.wrapping_sub(1)
        );

        if self.indirect {
            // Nothing left to fetch the pointer for
            if self.hdma_completed && chain_finished(later) {
                return;
            }
            let low = self.read_table(bus) as u16;
            let high = self.read_table(bus) as u16;
            self.indirect_address = (high << 8) | low;
        }
    }

    /// Table bytes go straight to the bus, uncharged and ungated
    fn read_table<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let addr = mmap::full_addr(self.source_bank, self.hdma_address);
        self.hdma_address = self.hdma_address.wrapping_add(1);
        bus.read8(addr)
    }

    /// Ticks the line counter after the transfer pass of a scanline
    pub fn hdma_advance<B: Bus>(&mut self, bus: &mut B, later: &[Channel]) {
        if !self.hdma_is_active() {
            return;
        }
        self.line_counter = self.line_counter.wrapping_sub(1);
        self.hdma_do_transfer = self.line_counter & 0x80 != 0;
        self.hdma_reload(bus, later);
    }

    /// Moves one line's worth of data
    ///
    /// Direct tables carry the data right after the line count so it is read through
    /// `hdma_address`.
    pub fn hdma_transfer<B: Bus>(&mut self, bus: &mut B, cycles: &mut u64) {
        if !self.hdma_is_active() {
            return;
        }
        // HDMA takes over a running general DMA
        self.enable = false;
        if !self.hdma_do_transfer {
            return;
        }

        for index in 0..hdma_length(self.transfer_mode) {
            let addr = if self.indirect {
                let addr = mmap::full_addr(self.indirect_bank, self.indirect_address);
                self.indirect_address = self.indirect_address.wrapping_add(1);
                addr
            } else {
                let addr = mmap::full_addr(self.source_bank, self.hdma_address);
                self.hdma_address = self.hdma_address.wrapping_add(1);
                addr
            };
            self.transfer(bus, cycles, addr, index);
        }
    }

    fn transfer<B: Bus>(&mut self, bus: &mut B, cycles: &mut u64, addr_a: u32, index: usize) {
        let port = self
            .target_address
            .wrapping_add(bbus_offset(self.transfer_mode, index));
        // WRAM can't be both ends of the transfer
        let valid = port != mmap::WMDATA_PORT || !is_wram(addr_a);
        if !self.direction {
            let value = read_a(bus, cycles, addr_a);
            write_b(bus, port, value, valid);
        } else {
            let value = read_b(bus, cycles, port, valid);
            write_a(bus, addr_a, value);
        }
    }
}

fn read_a<B: Bus>(bus: &mut B, cycles: &mut u64, addr: u32) -> u8 {
    *cycles += DMA_CYCLES;
    if valid_a(addr) {
        bus.read8(addr)
    } else {
        0
    }
}

fn read_b<B: Bus>(bus: &mut B, cycles: &mut u64, port: u8, valid: bool) -> u8 {
    *cycles += DMA_CYCLES;
    if valid {
        bus.read8(mmap::bbus_addr(port))
    } else {
        0
    }
}

fn write_a<B: Bus>(bus: &mut B, addr: u32, value: u8) {
    if valid_a(addr) {
        bus.write8(addr, value);
    }
}

fn write_b<B: Bus>(bus: &mut B, port: u8, value: u8, valid: bool) {
    if valid {
        bus.write8(mmap::bbus_addr(port), value);
    }
}
