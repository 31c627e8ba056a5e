/*!
Mapper subsystem: the closed set of cartridge boards the emulator drives.

Purpose:
- Translate CPU $4020..=$FFFF and PPU $0000..=$1FFF accesses into cartridge
  PRG/CHR offsets, applying whatever bank switching the board performs.
- Report the nametable mirroring currently in effect.
- Observe PPU timing (`step`) so scanline-counting boards can raise IRQs.

The set of boards is fixed (NROM, UxROM, MMC3), so `Mapper` is an enum and
every entry point is a `match`; adding a board means adding a variant.
Each variant owns the `Cartridge` it maps.
*/

use crate::cartridge::{Cartridge, CartridgeError, MapperKind, Mirroring};
use crate::mappers::{Mmc3, Nrom, Uxrom};
use crate::ppu::PpuPosition;

#[derive(Debug, Clone)]
pub enum Mapper {
    Nrom(Nrom),
    Uxrom(Uxrom),
    Mmc3(Mmc3),
}

impl Mapper {
    /// Build the board named by the cartridge header.
    pub fn new(cart: Cartridge) -> Self {
        match cart.mapper_kind() {
            MapperKind::Nrom => Mapper::Nrom(Nrom::new(cart)),
            MapperKind::Uxrom => Mapper::Uxrom(Uxrom::new(cart)),
            MapperKind::Mmc3 => Mapper::Mmc3(Mmc3::new(cart)),
        }
    }

    /// iNES mapper number.
    pub fn id(&self) -> u8 {
        self.cartridge().mapper_id()
    }

    pub fn cartridge(&self) -> &Cartridge {
        match self {
            Mapper::Nrom(m) => m.cartridge(),
            Mapper::Uxrom(m) => m.cartridge(),
            Mapper::Mmc3(m) => m.cartridge(),
        }
    }

    /// CPU read at $4020..=$FFFF. Reads have no side effects on any board.
    pub fn cpu_read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Nrom(m) => m.cpu_read(addr),
            Mapper::Uxrom(m) => m.cpu_read(addr),
            Mapper::Mmc3(m) => m.cpu_read(addr),
        }
    }

    /// CPU write at $4020..=$FFFF (PRG RAM or bank registers).
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match self {
            Mapper::Nrom(m) => m.cpu_write(addr, value),
            Mapper::Uxrom(m) => m.cpu_write(addr, value),
            Mapper::Mmc3(m) => m.cpu_write(addr, value),
        }
    }

    /// PPU pattern table read at $0000..=$1FFF.
    pub fn ppu_read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Nrom(m) => m.ppu_read(addr),
            Mapper::Uxrom(m) => m.ppu_read(addr),
            Mapper::Mmc3(m) => m.ppu_read(addr),
        }
    }

    /// PPU pattern table write at $0000..=$1FFF.
    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        match self {
            Mapper::Nrom(m) => m.ppu_write(addr, value),
            Mapper::Uxrom(m) => m.ppu_write(addr, value),
            Mapper::Mmc3(m) => m.ppu_write(addr, value),
        }
    }

    /// Observe one PPU cycle. Returns true when the board asserts IRQ.
    pub fn step(&mut self, position: PpuPosition) -> bool {
        match self {
            Mapper::Mmc3(m) => m.step(position),
            Mapper::Nrom(_) | Mapper::Uxrom(_) => false,
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        match self {
            Mapper::Mmc3(m) => m.mirroring(),
            Mapper::Nrom(_) | Mapper::Uxrom(_) => self.cartridge().mirroring(),
        }
    }

    /// Return bank registers and IRQ state to power-on values.
    pub fn reset(&mut self) {
        match self {
            Mapper::Nrom(_) => {}
            Mapper::Uxrom(m) => m.reset(),
            Mapper::Mmc3(m) => m.reset(),
        }
        log::debug!("mapper {} reset", self.id());
    }
}

/// Shared CHR read used by every board: a cart without CHR memory reads as 0.
pub(crate) fn chr_or_zero(cart: &Cartridge, offset: usize) -> u8 {
    cart.read_chr(offset).unwrap_or_else(|e| {
        report_chr_fault(cart, offset, &e);
        0
    })
}

/// Shared CHR write: CHR ROM and CHR-less carts drop the write.
pub(crate) fn chr_write_or_drop(cart: &mut Cartridge, offset: usize, value: u8) {
    match cart.write_chr(offset, value) {
        Ok(()) => {}
        // CHR ROM ignores writes
        Err(CartridgeError::ChrNotWritable) => {
            log::trace!("dropped CHR ROM write at {offset:#06X}");
        }
        Err(e) => report_chr_fault(cart, offset, &e),
    }
}

fn report_chr_fault(cart: &Cartridge, offset: usize, error: &CartridgeError) {
    if cart.note_chr_fault() {
        log::warn!("CHR access at {offset:#06X} failed: {error}; further faults are not reported");
    }
}
