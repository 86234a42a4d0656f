use log::debug;

use crate::abus::{ABus, Bus};
use crate::dma::{Dma, HdmaSetupMode};
use crate::mmap::*;

pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VISIBLE_SCANLINES: u16 = 224;
/// Line where HDMA tables are (re)initialized
pub const HDMA_SETUP_SCANLINE: u16 = 0;

/// Abstraction around the DMA unit and the bus it drives
///
/// Stands in for the timing core: steps scanlines, routes CPU register accesses and keeps the
/// cycle count and irq lock the DMA unit reports into.
pub struct Snes {
    pub abus: ABus,
    pub dma: Dma,
    dma_cycles: u64,
    irq_lock: bool,
    scanline: u16,
    frame: u64,
}

impl Snes {
    /// Initializes new instance with given ROM
    pub fn new(rom_bytes: Vec<u8>) -> Snes {
        Snes {
            abus: ABus::new(rom_bytes),
            dma: Dma::new(),
            dma_cycles: 0,
            irq_lock: false,
            scanline: 0,
            frame: 0,
        }
    }

    /// Returns channels, memory and counters to their power-on state
    pub fn reset(&mut self) {
        self.abus.reset();
        self.dma.reset();
        self.dma_cycles = 0;
        self.irq_lock = false;
        self.scanline = 0;
        self.frame = 0;
    }

    /// Master cycles spent on DMA and HDMA since reset
    pub fn dma_cycles(&self) -> u64 { self.dma_cycles }

    pub fn irq_lock(&self) -> bool { self.irq_lock }

    pub fn set_hdma_setup_mode(&mut self, mode: HdmaSetupMode) { self.dma.set_setup_mode(mode); }

    /// Acknowledges the irq lock, as the interrupt logic would after holding off
    pub fn clear_irq_lock(&mut self) { self.irq_lock = false; }

    pub fn scanline(&self) -> u16 { self.scanline }

    pub fn frame(&self) -> u64 { self.frame }

    pub fn cpu_read8(&mut self, addr: u32) -> u8 {
        match cpu_reg(addr) {
            Some(MDMAEN) => self.dma.read_mdma_en(),
            Some(HDMAEN) => self.dma.read_hdma_en(),
            Some(reg @ DMA_FIRST..=DMA_LAST) => self.dma.read(reg, 0x00),
            _ => self.abus.read8(addr),
        }
    }

    /// Writes `value` to `addr`, starting general DMA right away on MDMAEN
    pub fn cpu_write8(&mut self, addr: u32, value: u8) {
        match cpu_reg(addr) {
            Some(MDMAEN) => {
                self.dma.write_mdma_en(value);
                if value != 0 {
                    self.dma
                        .dma_run(&mut self.abus, &mut self.dma_cycles, &mut self.irq_lock);
                }
            }
            Some(HDMAEN) => self.dma.write_hdma_en(value),
            Some(reg @ DMA_FIRST..=DMA_LAST) => self.dma.write(reg, value),
            _ => self.abus.write8(addr, value),
        }
    }

    /// Runs HDMA duties of the current scanline and moves to the next one
    ///
    /// Setup happens every frame, lines only run while some channel has HDMA work left.
    pub fn run_scanline(&mut self) {
        if self.scanline == HDMA_SETUP_SCANLINE {
            self.dma
                .hdma_setup(&mut self.abus, &mut self.dma_cycles, &mut self.irq_lock);
        }
        if self.scanline < VISIBLE_SCANLINES && !self.dma.hdma_is_finished() {
            self.dma
                .hdma_run(&mut self.abus, &mut self.dma_cycles, &mut self.irq_lock);
        }

        self.scanline += 1;
        if self.scanline == SCANLINES_PER_FRAME {
            self.scanline = 0;
            self.frame += 1;
            debug!("Frame {} done, {} DMA cycles", self.frame, self.dma_cycles);
        }
    }

    /// Runs until the start of the next frame
    pub fn run_frame(&mut self) {
        loop {
            self.run_scanline();
            if self.scanline == 0 {
                break;
            }
        }
    }
}

/// Returns the system area address if `addr` hits the CPU's own registers
fn cpu_reg(addr: u32) -> Option<u16> {
    let bank = (addr >> 16) as u8;
    let bank_addr = addr as u16;
    match bank {
        WS1_SYSLR_FIRST_BANK..=WS1_SYSLR_LAST_BANK | WS2_SYSLR_FIRST_BANK..=WS2_SYSLR_LAST_BANK => {
            match bank_addr {
                MDMAEN | HDMAEN | DMA_FIRST..=DMA_LAST => Some(bank_addr),
                _ => None,
            }
        }
        _ => None,
    }
}
