#![doc = r#"
PPU registers module

Purpose
- CPU-visible register semantics for $2000-$2007 (mirrored through $3FFF).

Notes
- Every write latches its value; PPUSTATUS returns those bits in its low 5
  bits, and write-only registers read back the latched value.
- PPUCTRL writes copy the nametable select into T bits 10-11 and request an
  NMI if NMI is enabled while vblank is already set.
- PPUSCROLL and PPUADDR share the W toggle with PPUSTATUS reads resetting it.
- PPUDATA reads below $3F00 return the internal buffer and refill it;
  palette reads return immediately and refill the buffer from the nametable
  byte underneath ($2F00-$2FFF). Both directions increment V by 1 or 32.
"#]

use super::{CTRL_NMI, Ppu};
use crate::ppu_bus::PpuBus;

impl Ppu {
    pub(in crate::ppu) fn read_register_inner<B: PpuBus>(&mut self, addr: u16, bus: &B) -> u8 {
        match addr & 0x7 {
            2 => {
                let mut status = self.last_write & 0x1F;
                status |= (self.sprite_overflow as u8) << 5;
                status |= (self.sprite_zero_hit as u8) << 6;
                status |= (self.vblank as u8) << 7;
                self.vblank = false;
                self.w = false;
                status
            }
            4 => self.memory.oam(self.oam_addr),
            7 => {
                let addr = self.v & 0x3FFF;
                let value = self.memory.read(addr, bus);
                let out = if addr < 0x3F00 {
                    std::mem::replace(&mut self.read_buffer, value)
                } else {
                    self.read_buffer = self.memory.read(addr - 0x1000, bus);
                    value
                };
                self.v = self.v.wrapping_add(self.vram_increment()) & 0x7FFF;
                out
            }
            _ => self.last_write,
        }
    }

    pub(in crate::ppu) fn write_register_inner<B: PpuBus>(
        &mut self,
        addr: u16,
        value: u8,
        bus: &mut B,
    ) {
        self.last_write = value;
        match addr & 0x7 {
            0 => {
                let was_enabled = self.nmi_enabled();
                self.ctrl = value;
                self.t = (self.t & 0xF3FF) | (((value & 0x03) as u16) << 10);
                if !was_enabled && value & CTRL_NMI != 0 && self.vblank {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = value,
            2 => {}
            3 => self.oam_addr = value,
            4 => {
                self.memory.set_oam(self.oam_addr, value);
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            5 => {
                if !self.w {
                    self.t = (self.t & 0xFFE0) | (value >> 3) as u16;
                    self.x = value & 0x07;
                } else {
                    self.t = (self.t & 0x8FFF) | (((value & 0x07) as u16) << 12);
                    self.t = (self.t & 0xFC1F) | (((value & 0xF8) as u16) << 2);
                }
                self.w = !self.w;
            }
            6 => {
                if !self.w {
                    self.t = (self.t & 0x80FF) | (((value & 0x3F) as u16) << 8);
                } else {
                    self.t = (self.t & 0xFF00) | value as u16;
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            _ => {
                self.memory.write(self.v & 0x3FFF, value, bus);
                self.v = self.v.wrapping_add(self.vram_increment()) & 0x7FFF;
            }
        }
    }
}
