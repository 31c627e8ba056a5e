#![doc = r#"
PPU memory submodule

Responsibilities
- Own the 2 KiB nametable VRAM, 32-byte palette RAM and 256-byte OAM.
- Resolve the 14-bit PPU address space:
  * $0000-$1FFF pattern tables, forwarded to the `PpuBus` (mapper CHR)
  * $2000-$3EFF nametables, folded onto 2 KiB by the active mirroring mode
  * $3F00-$3FFF palette RAM, 32 entries mirrored; $3F10/$3F14/$3F18/$3F1C
    alias $3F00/$3F04/$3F08/$3F0C
- OAM DMA copy starting at an arbitrary OAMADDR with wraparound.

Mirroring table (logical nametable 0..3 -> physical 1 KiB page)
- Horizontal:          0 0 1 1
- Vertical:            0 1 0 1
- Single-screen lower: 0 0 0 0
- Single-screen upper: 1 1 1 1
"#]

use crate::cartridge::Mirroring;
use crate::ppu_bus::PpuBus;

const NAMETABLE_SIZE: usize = 0x400;

/// Fold a nametable address ($2000-$3EFF) onto the 2 KiB physical VRAM.
pub fn nametable_index(addr: u16, mirroring: Mirroring) -> usize {
    let rel = (addr as usize).wrapping_sub(0x2000) % 0x1000;
    let table = rel / NAMETABLE_SIZE;
    let page = match mirroring {
        Mirroring::Horizontal => [0, 0, 1, 1][table],
        Mirroring::Vertical => [0, 1, 0, 1][table],
        Mirroring::SingleScreenLower => 0,
        Mirroring::SingleScreenUpper => 1,
    };
    page * NAMETABLE_SIZE + rel % NAMETABLE_SIZE
}

/// Palette RAM slot for a palette address ($3F00-$3FFF).
pub fn palette_index(addr: u16) -> usize {
    let index = (addr as usize) % 32;
    if index >= 16 && index % 4 == 0 {
        index - 16
    } else {
        index
    }
}

#[derive(Clone)]
pub struct PpuMemory {
    vram: [u8; 2 * NAMETABLE_SIZE],
    palette: [u8; 32],
    oam: [u8; 256],
}

impl Default for PpuMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl PpuMemory {
    pub fn new() -> Self {
        Self {
            vram: [0; 2 * NAMETABLE_SIZE],
            palette: [0; 32],
            oam: [0; 256],
        }
    }

    /// Read the PPU address space (address masked to 14 bits).
    pub fn read<B: PpuBus>(&self, addr: u16, bus: &B) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => bus.chr_read(addr),
            0x2000..=0x3EFF => self.vram[nametable_index(addr, bus.mirroring())],
            _ => self.palette[palette_index(addr)],
        }
    }

    /// Write the PPU address space (address masked to 14 bits).
    pub fn write<B: PpuBus>(&mut self, addr: u16, value: u8, bus: &mut B) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => bus.chr_write(addr, value),
            0x2000..=0x3EFF => self.vram[nametable_index(addr, bus.mirroring())] = value,
            _ => self.palette[palette_index(addr)] = value,
        }
    }

    /// Palette RAM entry `index` (0..32, aliasing applied).
    #[inline]
    pub fn palette_entry(&self, index: u8) -> u8 {
        self.palette[palette_index(index as u16)]
    }

    #[inline]
    pub fn oam(&self, index: u8) -> u8 {
        self.oam[index as usize]
    }

    #[inline]
    pub fn set_oam(&mut self, index: u8, value: u8) {
        self.oam[index as usize] = value;
    }

    /// Copy 256 bytes into OAM starting at `start`, wrapping within OAM.
    pub fn oam_dma(&mut self, page: &[u8; 256], start: u8) {
        let mut ptr = start;
        for &b in page {
            self.oam[ptr as usize] = b;
            ptr = ptr.wrapping_add(1);
        }
    }

    /// Raw nametable VRAM (2 KiB, physical layout).
    pub fn vram(&self) -> &[u8] {
        &self.vram
    }
}
