/*!
ppu_bus: Trait abstraction decoupling the PPU from whoever owns cartridge
memory.

The PPU owns nametable VRAM, palette RAM and OAM itself. The only things it
needs from the outside world are:
- pattern table access at 0x0000-0x1FFF (CHR ROM/RAM, banked by the mapper)
- the current nametable mirroring arrangement (fixed by the header or driven
  at runtime by mappers such as MMC3)

Accepting a trait instead of the concrete `Mapper` keeps PPU unit tests free
of cartridge construction; see `crate::test_utils::MockChr`.
*/

use crate::cartridge::Mirroring;
use crate::mapper::Mapper;

/// Cartridge-side view the PPU reads pattern data and mirroring through.
pub trait PpuBus {
    /// Read a pattern table byte. `addr` is within 0x0000-0x1FFF.
    fn chr_read(&self, addr: u16) -> u8;

    /// Write a pattern table byte (CHR RAM carts only; others ignore it).
    fn chr_write(&mut self, addr: u16, value: u8);

    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;
}

impl PpuBus for Mapper {
    #[inline]
    fn chr_read(&self, addr: u16) -> u8 {
        self.ppu_read(addr)
    }

    #[inline]
    fn chr_write(&mut self, addr: u16, value: u8) {
        self.ppu_write(addr, value);
    }

    #[inline]
    fn mirroring(&self) -> Mirroring {
        Mapper::mirroring(self)
    }
}
