use nanoserde::DeJson;
use rustycom_dma_core::{dma::HdmaSetupMode, snes::Snes};

use std::fs;

/// Bytes put straight into memory before the writes run
#[derive(DeJson)]
pub struct Preload {
    pub addr: String,
    pub bytes: Vec<u8>,
}

/// CPU write, addresses are 24bit hex like "$00420B"
#[derive(DeJson)]
pub struct RegWrite {
    pub addr: String,
    pub value: u8,
}

/// Register setup to run the DMA unit against
#[derive(DeJson)]
pub struct Script {
    #[nserde(default)]
    pub rom_path: String,
    #[nserde(default)]
    pub preload: Vec<Preload>,
    #[nserde(default)]
    pub writes: Vec<RegWrite>,
    /// Overrides the configured frame count
    #[nserde(default)]
    pub frames: Option<u32>,
    /// Restart enabled HDMA tables every frame instead of leaving running channels alone
    #[nserde(default)]
    pub hardware_hdma_setup: bool,
}

impl Script {
    pub fn load(path: &str) -> Result<Script, String> {
        let json =
            fs::read_to_string(path).map_err(|why| format!("Reading {} failed: {}", path, why))?;
        Script::from_json(&json).map_err(|why| format!("{}: {}", path, why))
    }

    pub fn from_json(json: &str) -> Result<Script, String> {
        Script::deserialize_json(json).map_err(|why| format!("Parsing script failed: {:?}", why))
    }

    pub fn rom_bytes(&self) -> Result<Vec<u8>, String> {
        if self.rom_path.is_empty() {
            return Ok(Vec::new());
        }
        fs::read(&self.rom_path).map_err(|why| format!("Reading {} failed: {}", self.rom_path, why))
    }

    /// Loads memory and performs the register writes in order
    pub fn apply(&self, snes: &mut Snes) -> Result<(), String> {
        if self.hardware_hdma_setup {
            snes.set_hdma_setup_mode(HdmaSetupMode::Hardware);
        }
        for preload in &self.preload {
            snes.abus.load(parse_addr(&preload.addr)?, &preload.bytes);
        }
        for write in &self.writes {
            snes.cpu_write8(parse_addr(&write.addr)?, write.value);
        }
        Ok(())
    }
}

/// Parses a 24bit hex address with an optional "$" or "0x" prefix
pub fn parse_addr(addr: &str) -> Result<u32, String> {
    let trimmed = addr.trim();
    let digits = trimmed
        .strip_prefix('$')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);
    match u32::from_str_radix(digits, 16) {
        Ok(value) if value <= 0xFFFFFF => Ok(value),
        Ok(_) => Err(format!("Address {} is wider than 24 bits", addr)),
        Err(why) => Err(format!("Invalid address {}: {}", addr, why)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses() {
        assert_eq!(Ok(0x00420B), parse_addr("$00420B"));
        assert_eq!(Ok(0x7E1000), parse_addr("0x7E1000"));
        assert_eq!(Ok(0x2118), parse_addr(" 2118 "));
        assert!(parse_addr("$1000000").is_err());
        assert!(parse_addr("$42OB").is_err());
    }

    #[test]
    fn apply_runs_dma() {
        let script = Script::from_json(
            r#"{
                "preload": [{ "addr": "$7E0000", "bytes": [1, 2, 3] }],
                "writes": [
                    { "addr": "$004301", "value": 34 },
                    { "addr": "$004304", "value": 126 },
                    { "addr": "$004305", "value": 3 },
                    { "addr": "$00420B", "value": 1 }
                ]
            }"#,
        )
        .unwrap();
        assert!(script.frames.is_none());
        assert!(!script.hardware_hdma_setup);
        assert!(script.rom_bytes().unwrap().is_empty());

        let mut snes = Snes::new(Vec::new());
        script.apply(&mut snes).unwrap();
        assert_eq!(&[(0x22, 1), (0x22, 2), (0x22, 3)], snes.abus.bbus_writes());
        assert_eq!(8 + 8 + 3 * 8, snes.dma_cycles());
    }

    #[test]
    fn gradient_demo() {
        let script = Script::from_json(include_str!("../../demos/hdma_gradient.json")).unwrap();
        let mut snes = Snes::new(Vec::new());
        script.apply(&mut snes).unwrap();
        assert_eq!(0x03, snes.dma.read_hdma_en());
        assert_eq!(HdmaSetupMode::Hardware, snes.dma.setup_mode());

        snes.run_frame();
        let writes = snes.abus.take_bbus_writes();
        let coldata: Vec<u8> = writes
            .iter()
            .filter(|&&(port, _)| port == 0x32)
            .map(|&(_, value)| value)
            .collect();
        assert_eq!(vec![0xE0, 0xE4, 0xE8, 0xEC], coldata);
        // Indirect channel writes both halves of the scroll every line for 16 lines
        assert_eq!(32, writes.iter().filter(|&&(port, _)| port == 0x0D).count());
        assert!(snes.dma.hdma_is_finished());
    }

    #[test]
    fn apply_rejects_bad_address() {
        let script =
            Script::from_json(r#"{ "writes": [{ "addr": "nope", "value": 0 }], "frames": 2 }"#)
                .unwrap();
        assert_eq!(Some(2), script.frames);
        let mut snes = Snes::new(Vec::new());
        assert!(script.apply(&mut snes).is_err());
    }
}
