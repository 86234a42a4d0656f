mod channel;

pub use self::channel::{bbus_offset, hdma_length, valid_a, Channel, DMA_CYCLES};

use log::{debug, trace};

use crate::abus::Bus;

pub const CHANNEL_COUNT: usize = 8;

/// How the per-frame HDMA setup treats channels that have HDMA enabled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HdmaSetupMode {
    /// Enabled channels keep running, only idle ones load their table
    Guarded,
    /// Enabled channels restart their table every frame and idle ones are skipped
    Hardware,
}

impl Default for HdmaSetupMode {
    fn default() -> Self { HdmaSetupMode::Guarded }
}

/// Models the DMA and HDMA controller in Ricoh 5A22
///
/// Channels run in index order and the later ones in the chain are consulted when an indirect
/// HDMA channel finishes. Cycles spent and the irq lock are handed in by the timing core on each
/// run.
pub struct Dma {
    channels: [Channel; CHANNEL_COUNT],
    setup_mode: HdmaSetupMode,
}

impl Dma {
    /// Initializes a new instance with all channels idle
    pub fn new() -> Dma {
        Dma {
            channels: [Channel::new(); CHANNEL_COUNT],
            setup_mode: HdmaSetupMode::default(),
        }
    }

    /// Returns every channel to its power-on state, the setup mode is kept
    pub fn reset(&mut self) {
        self.channels = [Channel::new(); CHANNEL_COUNT];
    }

    pub fn setup_mode(&self) -> HdmaSetupMode { self.setup_mode }

    pub fn set_setup_mode(&mut self, mode: HdmaSetupMode) { self.setup_mode = mode; }

    pub fn channel(&self, index: usize) -> &Channel { &self.channels[index] }

    pub fn channel_mut(&mut self, index: usize) -> &mut Channel { &mut self.channels[index] }

    pub fn channels(&self) -> &[Channel] { &self.channels }

    /// Composes MDMAEN from the channels' general DMA enables
    pub fn read_mdma_en(&self) -> u8 {
        self.channels
            .iter()
            .enumerate()
            .fold(0, |acc, (i, c)| acc | ((c.enable as u8) << i))
    }

    /// Arms general DMA on the channels whose bits are set in `value`
    ///
    /// Transfer is started separately with `dma_run`.
    pub fn write_mdma_en(&mut self, value: u8) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            channel.enable = value & (1 << i) != 0;
        }
    }

    pub fn read_hdma_en(&self) -> u8 {
        self.channels
            .iter()
            .enumerate()
            .fold(0, |acc, (i, c)| acc | ((c.hdma_enable as u8) << i))
    }

    pub fn write_hdma_en(&mut self, value: u8) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            channel.hdma_enable = value & (1 << i) != 0;
        }
    }

    /// Reads channel register at `addr`, unmapped ports return `open_bus`
    pub fn read(&self, addr: u16, open_bus: u8) -> u8 {
        if addr & 0xFF80 != DMA_PAGE {
            trace!("DMA read ${:04X}: Unused region", addr);
            return open_bus;
        }
        let channel = &self.channels[((addr >> 4) & 0x7) as usize];
        match addr & 0x000F {
            DMAPX => channel.read_control(),
            BBADX => channel.target_address,
            A1TXL => channel.source_address as u8,
            A1TXH => (channel.source_address >> 8) as u8,
            A1BX => channel.source_bank,
            DASXL => channel.transfer_size as u8,
            DASXH => (channel.transfer_size >> 8) as u8,
            DASBX => channel.indirect_bank,
            A2AXL => channel.hdma_address as u8,
            A2AXH => (channel.hdma_address >> 8) as u8,
            NTRLX => channel.line_counter,
            UNUSEDX | MIRRX => channel.unknown,
            _ => {
                trace!("DMA read ${:04X}: Unused port", addr);
                open_bus
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        if addr & 0xFF80 != DMA_PAGE {
            trace!("DMA write ${:04X}: Unused region", addr);
            return;
        }
        let channel = &mut self.channels[((addr >> 4) & 0x7) as usize];
        match addr & 0x000F {
            DMAPX => channel.write_control(value),
            BBADX => channel.target_address = value,
            A1TXL => channel.source_address = (channel.source_address & 0xFF00) | value as u16,
            A1TXH => {
                channel.source_address = ((value as u16) << 8) | (channel.source_address & 0x00FF)
            }
            A1BX => channel.source_bank = value,
            DASXL => channel.transfer_size = (channel.transfer_size & 0xFF00) | value as u16,
            DASXH => {
                channel.transfer_size = ((value as u16) << 8) | (channel.transfer_size & 0x00FF)
            }
            DASBX => channel.indirect_bank = value,
            A2AXL => channel.hdma_address = (channel.hdma_address & 0xFF00) | value as u16,
            A2AXH => {
                channel.hdma_address = ((value as u16) << 8) | (channel.hdma_address & 0x00FF)
            }
            NTRLX => channel.line_counter = value,
            UNUSEDX | MIRRX => channel.unknown = value,
            _ => trace!("DMA write ${:04X}: Unused port", addr),
        }
    }

    /// Checks if every channel is done with HDMA for this frame
    pub fn hdma_is_finished(&self) -> bool { self.channels.iter().all(|c| !c.hdma_is_active()) }

    /// Runs general DMA on all armed channels
    pub fn dma_run<B: Bus>(&mut self, bus: &mut B, cycles: &mut u64, irq_lock: &mut bool) {
        *cycles += DMA_CYCLES;
        for (i, channel) in self.channels.iter_mut().enumerate() {
            if channel.enable {
                debug!(
                    "DMA{} ${:02X}:{:04X} {} $21{:02X}, mode {}, {} bytes",
                    i,
                    channel.source_bank,
                    channel.source_address,
                    if channel.direction { "<-" } else { "->" },
                    channel.target_address,
                    channel.transfer_mode,
                    channel.transfer_size
                );
            }
            channel.run_general_dma(bus, cycles);
        }
        *irq_lock = true;
    }

    /// Runs the HDMA transfers of one scanline
    ///
    /// All channels transfer before any of them advances its table.
    pub fn hdma_run<B: Bus>(&mut self, bus: &mut B, cycles: &mut u64, irq_lock: &mut bool) {
        *cycles += DMA_CYCLES;
        for channel in self.channels.iter_mut() {
            channel.hdma_transfer(bus, cycles);
        }
        for i in 0..CHANNEL_COUNT {
            let (head, later) = self.channels.split_at_mut(i + 1);
            head[i].hdma_advance(bus, later);
        }
        *irq_lock = true;
    }

    /// Initializes HDMA for a new frame
    pub fn hdma_setup<B: Bus>(&mut self, bus: &mut B, cycles: &mut u64, irq_lock: &mut bool) {
        *cycles += DMA_CYCLES;
        for i in 0..CHANNEL_COUNT {
            let (head, later) = self.channels.split_at_mut(i + 1);
            match self.setup_mode {
                HdmaSetupMode::Guarded => head[i].hdma_setup(bus, later),
                HdmaSetupMode::Hardware => head[i].hdma_restart(bus, later),
            }
        }
        *irq_lock = true;
    }
}

impl Default for Dma {
    fn default() -> Self { Dma::new() }
}

const DMA_PAGE: u16 = 0x4300;

// Port types
const DMAPX: u16 = 0x0000;
const BBADX: u16 = 0x0001;
const A1TXL: u16 = 0x0002;
const A1TXH: u16 = 0x0003;
const A1BX: u16 = 0x0004;
const DASXL: u16 = 0x0005;
const DASXH: u16 = 0x0006;
const DASBX: u16 = 0x0007;
const A2AXL: u16 = 0x0008;
const A2AXH: u16 = 0x0009;
const NTRLX: u16 = 0x000A;
const UNUSEDX: u16 = 0x000B;
const MIRRX: u16 = 0x000F;

#[cfg(test)]
pub(crate) mod test_bus {
    use std::collections::HashMap;

    use crate::abus::Bus;

    /// Sparse memory that records every access made through `Bus`
    pub struct TestBus {
        mem: HashMap<u32, u8>,
        pub reads: Vec<u32>,
        pub writes: Vec<(u32, u8)>,
    }

    impl TestBus {
        pub fn new() -> TestBus {
            TestBus {
                mem: HashMap::new(),
                reads: Vec::new(),
                writes: Vec::new(),
            }
        }

        /// Sets memory without recording writes
        pub fn load(&mut self, addr: u32, bytes: &[u8]) {
            for (i, &b) in bytes.iter().enumerate() {
                self.mem.insert(addr + i as u32, b);
            }
        }
    }

    impl Bus for TestBus {
        fn read8(&mut self, addr: u32) -> u8 {
            self.reads.push(addr);
            *self.mem.get(&addr).unwrap_or(&0)
        }

        fn write8(&mut self, addr: u32, value: u8) {
            self.writes.push((addr, value));
            self.mem.insert(addr, value);
        }
    }
}
