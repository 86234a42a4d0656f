pub mod abus;
pub mod dma;
pub mod mmap;
pub mod rom;
pub mod snes;
