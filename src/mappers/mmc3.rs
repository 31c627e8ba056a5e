/*!
MMC3 (Mapper 4) implementation

Banking:
- Bank select ($8000 even) / bank data ($8001 odd) registers R0..R7
- PRG: two switchable 8K banks (R6, R7) + fixed second-last + fixed last.
  Bank select bit 6 swaps which of $8000 / $C000 holds R6 and which the
  second-last bank.
- CHR: two 2K banks (R0, R1, low bit ignored) + four 1K banks (R2..R5).
  Bank select bit 7 swaps the 2K half ($0000) with the 1K half ($1000).

Control:
- $A000 even: mirroring (bit 0: 0 = Vertical, 1 = Horizontal)
- $A001 odd: PRG RAM enable (bit 7) and write protect (bit 6)
- $C000 even: IRQ reload value; $C001 odd: request reload on next clock
- $E000 even: disable IRQ and acknowledge; $E001 odd: enable IRQ

IRQ:
- The counter is clocked once per rendered scanline (PPU cycle 260 of lines
  0-239 and the pre-render line) while background or sprites are enabled.
- A clock first reloads the counter if it is zero or a reload was requested,
  then decrements it. Reaching zero with IRQ enabled asserts the IRQ, so a
  reload value R fires once every R scanlines.

Notes:
- Disabled PRG RAM reads as 0x00 and preserves contents.
- Write-protected PRG RAM ignores writes.
*/

use crate::cartridge::{Cartridge, Mirroring};
use crate::mapper::{chr_or_zero, chr_write_or_drop};
use crate::ppu::PpuPosition;

const PRG_BANK: usize = 0x2000;
const CHR_BANK: usize = 0x0400;

/// PPU cycle on which the scanline counter is clocked.
const IRQ_CLOCK_CYCLE: u16 = 260;

#[derive(Debug, Clone)]
pub struct Mmc3 {
    cart: Cartridge,

    // Bank registers R0..R7
    registers: [u8; 8],
    bank_select: u8,
    prg_swap: bool,
    chr_inversion: bool,
    prg_bank_count: usize,

    mirroring: Mirroring,
    prg_ram_enabled: bool,
    prg_ram_write_protect: bool,

    // -----------------------
    // IRQ state
    // -----------------------
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mmc3 {
    pub fn new(cart: Cartridge) -> Self {
        let prg_bank_count = (cart.prg_rom_len() / PRG_BANK).max(1);
        let mirroring = cart.mirroring();
        let mut m = Self {
            cart,
            registers: [0; 8],
            bank_select: 0,
            prg_swap: false,
            chr_inversion: false,
            prg_bank_count,
            mirroring,
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        };
        m.reset();
        m
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    pub fn reset(&mut self) {
        self.registers = [0, 2, 4, 5, 6, 7, 0, 1];
        self.bank_select = 0;
        self.prg_swap = false;
        self.chr_inversion = false;
        self.mirroring = self.cart.mirroring();
        self.prg_ram_enabled = true;
        self.prg_ram_write_protect = false;

        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq_pending = false;
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// IRQ asserted and not yet acknowledged through $E000.
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    pub fn irq_counter(&self) -> u8 {
        self.irq_counter
    }

    // -------------------------------------------------------------------
    // Bank translation
    // -------------------------------------------------------------------

    /// Physical 8K PRG bank mapped into CPU window `slot` ($8000 + slot * $2000).
    fn prg_bank(&self, slot: usize) -> usize {
        let last = self.prg_bank_count - 1;
        let second_last = self.prg_bank_count.saturating_sub(2);
        let r6 = (self.registers[6] & 0x3F) as usize;
        let r7 = (self.registers[7] & 0x3F) as usize;
        let bank = match (slot, self.prg_swap) {
            (0, false) | (2, true) => r6,
            (0, true) | (2, false) => second_last,
            (1, _) => r7,
            _ => last,
        };
        bank % self.prg_bank_count
    }

    /// Physical 1K CHR bank mapped into PPU window `slot` ($0000 + slot * $400).
    fn chr_bank(&self, slot: usize) -> usize {
        // Inversion swaps the 4K halves, which flips bit 2 of the slot.
        let slot = if self.chr_inversion { slot ^ 4 } else { slot };
        let bank = match slot {
            0 => self.registers[0] & 0xFE,
            1 => self.registers[0] | 0x01,
            2 => self.registers[1] & 0xFE,
            3 => self.registers[1] | 0x01,
            n => self.registers[n - 2],
        };
        bank as usize
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let addr = (addr & 0x1FFF) as usize;
        self.chr_bank(addr / CHR_BANK) * CHR_BANK + (addr % CHR_BANK)
    }

    // -------------------------------------------------------------------
    // CPU side
    // -------------------------------------------------------------------

    pub fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled {
                    self.cart.read_prg_ram((addr - 0x6000) as usize)
                } else {
                    0
                }
            }
            0x8000..=0xFFFF => {
                let rel = (addr - 0x8000) as usize;
                let bank = self.prg_bank(rel / PRG_BANK);
                self.cart.read_prg_rom(bank * PRG_BANK + rel % PRG_BANK)
            }
            _ => 0,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        let even = (addr & 1) == 0;
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled && !self.prg_ram_write_protect {
                    self.cart.write_prg_ram((addr - 0x6000) as usize, value);
                }
            }
            0x8000..=0x9FFF if even => {
                self.bank_select = value & 0x07;
                self.prg_swap = (value & 0x40) != 0;
                self.chr_inversion = (value & 0x80) != 0;
            }
            0x8000..=0x9FFF => {
                self.registers[self.bank_select as usize] = value;
                log::trace!("MMC3 R{} <- {:#04X}", self.bank_select, value);
            }
            0xA000..=0xBFFF if even => {
                self.mirroring = if (value & 1) == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                };
            }
            0xA000..=0xBFFF => {
                self.prg_ram_enabled = (value & 0x80) != 0;
                self.prg_ram_write_protect = (value & 0x40) != 0;
            }
            0xC000..=0xDFFF if even => self.irq_latch = value,
            0xC000..=0xDFFF => self.irq_reload = true,
            0xE000..=0xFFFF if even => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            0xE000..=0xFFFF => self.irq_enabled = true,
            _ => {}
        }
    }

    // -------------------------------------------------------------------
    // PPU side
    // -------------------------------------------------------------------

    pub fn ppu_read(&self, addr: u16) -> u8 {
        chr_or_zero(&self.cart, self.chr_offset(addr))
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        let offset = self.chr_offset(addr);
        chr_write_or_drop(&mut self.cart, offset, value);
    }

    /// Observe one PPU cycle; returns true when this cycle raises an IRQ.
    pub fn step(&mut self, position: PpuPosition) -> bool {
        let rendered_line = position.scanline < 240 || position.scanline == 261;
        if !position.rendering_enabled || position.cycle != IRQ_CLOCK_CYCLE || !rendered_line {
            return false;
        }
        self.clock_scanline()
    }

    fn clock_scanline(&mut self) -> bool {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        }
        self.irq_counter = self.irq_counter.saturating_sub(1);
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_banked_ines;

    // 8 x 16K PRG = 16 banks of 8K; 8 x 8K CHR = 64 banks of 1K.
    fn mmc3() -> Mmc3 {
        let rom = build_banked_ines(4, 8, 8, 0, (0xE000, 0xE000, 0xE000));
        Mmc3::new(Cartridge::from_ines_bytes(&rom).expect("parse"))
    }

    fn select(m: &mut Mmc3, reg: u8, mode_bits: u8, value: u8) {
        m.cpu_write(0x8000, reg | mode_bits);
        m.cpu_write(0x8001, value);
    }

    fn line(scanline: u16, rendering_enabled: bool) -> PpuPosition {
        PpuPosition {
            scanline,
            cycle: IRQ_CLOCK_CYCLE,
            rendering_enabled,
        }
    }

    #[test]
    fn prg_mode_0_layout() {
        let mut m = mmc3();
        select(&mut m, 6, 0, 3);
        select(&mut m, 7, 0, 5);
        assert_eq!(m.cpu_read(0x8000), 3);
        assert_eq!(m.cpu_read(0xA000), 5);
        assert_eq!(m.cpu_read(0xC000), 14);
        // Last bank holds the vectors at its tail; check its start.
        assert_eq!(m.cpu_read(0xE000), 15);
    }

    #[test]
    fn prg_mode_1_swaps_8000_and_c000() {
        let mut m = mmc3();
        select(&mut m, 6, 0x40, 3);
        select(&mut m, 7, 0x40, 5);
        assert_eq!(m.cpu_read(0x8000), 14);
        assert_eq!(m.cpu_read(0xA000), 5);
        assert_eq!(m.cpu_read(0xC000), 3);
        assert_eq!(m.cpu_read(0xE000), 15);
    }

    #[test]
    fn chr_banks_normal_and_inverted() {
        let mut m = mmc3();
        select(&mut m, 0, 0, 9); // 2K bank, low bit ignored -> 8, 9
        select(&mut m, 1, 0, 20); // 20, 21
        select(&mut m, 2, 0, 30);
        select(&mut m, 3, 0, 31);
        select(&mut m, 4, 0, 32);
        select(&mut m, 5, 0, 33);
        let normal: Vec<u8> = (0..8).map(|s| m.ppu_read(s * 0x400)).collect();
        assert_eq!(normal, vec![8, 9, 20, 21, 30, 31, 32, 33]);

        m.cpu_write(0x8000, 0x80);
        let inverted: Vec<u8> = (0..8).map(|s| m.ppu_read(s * 0x400)).collect();
        assert_eq!(inverted, vec![30, 31, 32, 33, 8, 9, 20, 21]);
    }

    #[test]
    fn mirroring_control() {
        let mut m = mmc3();
        m.cpu_write(0xA000, 0);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
        m.cpu_write(0xA000, 1);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn prg_ram_protect_and_disable() {
        let mut m = mmc3();
        m.cpu_write(0x6000, 0x12);
        assert_eq!(m.cpu_read(0x6000), 0x12);

        m.cpu_write(0xA001, 0xC0); // enabled, write-protected
        m.cpu_write(0x6000, 0x34);
        assert_eq!(m.cpu_read(0x6000), 0x12);

        m.cpu_write(0xA001, 0x00); // disabled
        assert_eq!(m.cpu_read(0x6000), 0x00);

        m.cpu_write(0xA001, 0x80);
        assert_eq!(m.cpu_read(0x6000), 0x12);
    }

    #[test]
    fn irq_fires_every_reload_scanlines() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 4);
        m.cpu_write(0xC001, 0);
        m.cpu_write(0xE001, 0);

        let fired: Vec<u16> = (0..240u16).filter(|&l| m.step(line(l, true))).collect();
        let expected: Vec<u16> = (0..240u16).filter(|l| (l + 1) % 4 == 0).collect();
        assert_eq!(fired, expected);
        assert!(m.irq_pending());
    }

    #[test]
    fn irq_ignores_other_cycles_and_vblank_lines() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 1);
        m.cpu_write(0xE001, 0);
        let off_cycle = PpuPosition {
            scanline: 10,
            cycle: 259,
            rendering_enabled: true,
        };
        assert!(!m.step(off_cycle));
        assert!(!m.step(line(245, true)));
        assert!(m.step(line(261, true)));
    }

    #[test]
    fn irq_silent_when_rendering_or_irq_disabled() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 2);
        m.cpu_write(0xE001, 0);
        assert!((0..240u16).all(|l| !m.step(line(l, false))));

        m.cpu_write(0xE000, 0);
        assert!((0..240u16).all(|l| !m.step(line(l, true))));
        assert!(!m.irq_pending());
    }

    #[test]
    fn reload_request_takes_effect_on_next_clock() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 10);
        m.cpu_write(0xE001, 0);
        m.step(line(0, true));
        assert_eq!(m.irq_counter(), 9);

        m.cpu_write(0xC000, 3);
        m.cpu_write(0xC001, 0);
        m.step(line(1, true));
        assert_eq!(m.irq_counter(), 2);
    }

    #[test]
    fn acknowledge_clears_pending() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 1);
        m.cpu_write(0xE001, 0);
        assert!(m.step(line(0, true)));
        assert!(m.irq_pending());
        m.cpu_write(0xE000, 0);
        assert!(!m.irq_pending());
    }
}
