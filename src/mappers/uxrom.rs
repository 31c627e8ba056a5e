/*
UxROM (Mapper 2) implementation.

Characteristics:
- PRG: 16 KiB switchable bank at $8000-$BFFF; the last 16 KiB bank is fixed at $C000-$FFFF.
- Bank select: any write to $8000-$FFFF; the low nibble picks the bank
  (modulo the number of banks present).
- CHR: fixed 8 KiB, usually CHR RAM.
- Mirroring: from the iNES header. No IRQ.

Reset Behavior:
- Switchable bank returns to 0.
*/

use crate::cartridge::Cartridge;
use crate::mapper::{chr_or_zero, chr_write_or_drop};

const BANK_SIZE: usize = 0x4000;

#[derive(Debug, Clone)]
pub struct Uxrom {
    cart: Cartridge,
    bank: usize,
    bank_count: usize,
}

impl Uxrom {
    pub fn new(cart: Cartridge) -> Self {
        let bank_count = (cart.prg_rom_len() / BANK_SIZE).max(1);
        Self {
            cart,
            bank: 0,
            bank_count,
        }
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    pub fn reset(&mut self) {
        self.bank = 0;
    }

    pub fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.cart.read_prg_ram((addr - 0x6000) as usize),
            0x8000..=0xBFFF => self
                .cart
                .read_prg_rom(self.bank * BANK_SIZE + (addr - 0x8000) as usize),
            0xC000..=0xFFFF => self
                .cart
                .read_prg_rom((self.bank_count - 1) * BANK_SIZE + (addr - 0xC000) as usize),
            _ => 0,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.cart.write_prg_ram((addr - 0x6000) as usize, value),
            0x8000..=0xFFFF => {
                self.bank = (value & 0x0F) as usize % self.bank_count;
                log::trace!("UxROM bank -> {}", self.bank);
            }
            _ => {}
        }
    }

    pub fn ppu_read(&self, addr: u16) -> u8 {
        chr_or_zero(&self.cart, (addr & 0x1FFF) as usize)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        chr_write_or_drop(&mut self.cart, (addr & 0x1FFF) as usize, value);
    }
}
