/*
NROM (Mapper 0) implementation.

Characteristics:
- PRG: 16 KiB (NROM-128, mirrored into $C000-$FFFF) or 32 KiB (NROM-256) at $8000-$FFFF.
- PRG RAM at $6000-$7FFF when the cartridge provides it.
- CHR: fixed 8 KiB (ROM, or RAM when the header reports none).
- Mirroring: from the iNES header.
- No bank registers, no IRQ.
*/

use crate::cartridge::Cartridge;
use crate::mapper::{chr_or_zero, chr_write_or_drop};

#[derive(Debug, Clone)]
pub struct Nrom {
    cart: Cartridge,
}

impl Nrom {
    pub fn new(cart: Cartridge) -> Self {
        Self { cart }
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    pub fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.cart.read_prg_ram((addr - 0x6000) as usize),
            // Offsets wrap at the ROM size, which mirrors NROM-128.
            0x8000..=0xFFFF => self.cart.read_prg_rom((addr - 0x8000) as usize),
            _ => 0,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        if let 0x6000..=0x7FFF = addr {
            self.cart.write_prg_ram((addr - 0x6000) as usize, value);
        }
    }

    pub fn ppu_read(&self, addr: u16) -> u8 {
        chr_or_zero(&self.cart, (addr & 0x1FFF) as usize)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        chr_write_or_drop(&mut self.cart, (addr & 0x1FFF) as usize, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_ines, build_nrom_with_prg};

    #[test]
    fn nrom_128_mirrors_upper_half() {
        let rom = build_nrom_with_prg(&[0x11, 0x22, 0x33], 1, 1, None);
        let m = Nrom::new(Cartridge::from_ines_bytes(&rom).expect("parse"));
        assert_eq!(m.cpu_read(0x8000), 0x11);
        assert_eq!(m.cpu_read(0xC000), 0x11);
        assert_eq!(m.cpu_read(0xC002), 0x33);
    }

    #[test]
    fn nrom_256_maps_directly() {
        let mut rom = build_ines(2, 1, 0, 0, 1, None);
        rom[16] = 0x01;
        rom[16 + 0x4000] = 0x02;
        let m = Nrom::new(Cartridge::from_ines_bytes(&rom).expect("parse"));
        assert_eq!(m.cpu_read(0x8000), 0x01);
        assert_eq!(m.cpu_read(0xC000), 0x02);
    }

    #[test]
    fn prg_ram_and_chr_ram_are_writable() {
        let rom = build_ines(1, 0, 0, 0, 1, None);
        let mut m = Nrom::new(Cartridge::from_ines_bytes(&rom).expect("parse"));
        m.cpu_write(0x6004, 0x5A);
        assert_eq!(m.cpu_read(0x6004), 0x5A);
        m.ppu_write(0x1FFF, 0x42);
        assert_eq!(m.ppu_read(0x1FFF), 0x42);
        // ROM writes are ignored
        m.cpu_write(0x8000, 0x00);
        assert_eq!(m.cpu_read(0x8000), 0xAA);
    }
}
