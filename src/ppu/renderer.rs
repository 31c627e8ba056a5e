#![doc = r#"
PPU renderer module

Responsibilities
- Per-dot work for the dot `step` just advanced to (`process_dot`).
- Background fetch pipeline: every 8 dots fetch nametable, attribute and
  the two pattern bytes, then append 8 pixels to the 64-bit tile register.
- Scroll counter maintenance on V: coarse X / fine Y increments and the
  horizontal / vertical T->V copies.
- Pixel composition of background and sprite layers into the frame buffer.

Timing (rendering enabled, visible and pre-render lines)
- Dots 1-256 and 321-336: shift the tile register, fetch on dot % 8 in
  {1, 3, 5, 7}, store on dot % 8 == 0 followed by coarse X increment.
- Dot 256: fine Y increment. Dot 257: copy horizontal bits T->V and
  evaluate sprites for the next line.
- Pre-render dots 280-304: copy vertical bits T->V.
- 241:1 sets vblank (and requests NMI); 261:1 clears vblank, sprite-0 hit
  and overflow.

Tile register layout
- Each pixel is 4 bits: attribute palette (2 bits) then pattern (2 bits).
  The upper 32 bits are the tile being drawn, the lower 32 the next one.
"#]

use super::*;

impl Ppu {
    pub(in crate::ppu) fn process_dot<B: PpuBus>(&mut self, bus: &B) {
        let cycle = self.cycle;
        let visible_line = self.scanline < NES_HEIGHT as u16;
        let pre_line = self.scanline == PRE_RENDER_SCANLINE;
        let render_line = visible_line || pre_line;
        let visible_cycle = (1..=256).contains(&cycle);
        let prefetch_cycle = (321..=336).contains(&cycle);
        let fetch_cycle = visible_cycle || prefetch_cycle;

        if self.rendering_enabled() {
            if visible_line && visible_cycle {
                self.render_pixel();
            }
            if render_line && fetch_cycle {
                self.tile_data <<= 4;
                match cycle % 8 {
                    1 => self.fetch_nametable_byte(bus),
                    3 => self.fetch_attribute_bits(bus),
                    5 => self.pattern_low = self.fetch_pattern_byte(bus, 0),
                    7 => self.pattern_high = self.fetch_pattern_byte(bus, 8),
                    0 => {
                        self.store_tile_data();
                        self.increment_x();
                    }
                    _ => {}
                }
            }
            if pre_line && (280..=304).contains(&cycle) {
                self.copy_y();
            }
            if render_line {
                if cycle == 256 {
                    self.increment_y();
                }
                if cycle == 257 {
                    self.copy_x();
                }
            }
            if cycle == 257 {
                if visible_line {
                    self.evaluate_sprites(bus);
                } else {
                    self.sprites.count = 0;
                }
            }
        }

        if self.scanline == VBLANK_SCANLINE && cycle == 1 {
            self.vblank = true;
            if self.nmi_enabled() {
                self.nmi_pending = true;
            }
        }
        if pre_line && cycle == 1 {
            self.vblank = false;
            self.sprite_zero_hit = false;
            self.sprite_overflow = false;
        }
    }

    // -----------------------------------------------------------------
    // Background fetches
    // -----------------------------------------------------------------

    fn fetch_nametable_byte<B: PpuBus>(&mut self, bus: &B) {
        let addr = 0x2000 | (self.v & 0x0FFF);
        self.nametable_byte = self.memory.read(addr, bus);
    }

    fn fetch_attribute_bits<B: PpuBus>(&mut self, bus: &B) {
        let v = self.v;
        let addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
        let shift = ((v >> 4) & 4) | (v & 2);
        self.attribute_bits = ((self.memory.read(addr, bus) >> shift) & 0x03) << 2;
    }

    fn fetch_pattern_byte<B: PpuBus>(&self, bus: &B, plane: u16) -> u8 {
        let fine_y = (self.v >> 12) & 0x07;
        let addr = self.background_table() + self.nametable_byte as u16 * 16 + fine_y + plane;
        self.memory.read(addr, bus)
    }

    fn store_tile_data(&mut self) {
        let mut low = self.pattern_low;
        let mut high = self.pattern_high;
        let mut data: u32 = 0;
        for _ in 0..8 {
            let p1 = (low & 0x80) >> 7;
            let p2 = (high & 0x80) >> 6;
            low <<= 1;
            high <<= 1;
            data = (data << 4) | (self.attribute_bits | p1 | p2) as u32;
        }
        self.tile_data |= data as u64;
    }

    // -----------------------------------------------------------------
    // Scroll counters
    // -----------------------------------------------------------------

    fn increment_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }
        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= 0x0800;
        } else if coarse_y == 31 {
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    fn copy_x(&mut self) {
        self.v = (self.v & 0xFBE0) | (self.t & 0x041F);
    }

    fn copy_y(&mut self) {
        self.v = (self.v & 0x841F) | (self.t & 0x7BE0);
    }

    // -----------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------

    fn background_pixel(&self) -> u8 {
        if self.mask & MASK_BACKGROUND == 0 {
            return 0;
        }
        let data = (self.tile_data >> 32) as u32 >> ((7 - self.x as u32) * 4);
        (data & 0x0F) as u8
    }

    fn render_pixel(&mut self) {
        let x = (self.cycle - 1) as usize;
        let y = self.scanline as usize;

        let mut background = self.background_pixel();
        let (slot, mut sprite) = self.sprite_pixel().unwrap_or((0, 0));
        if x < 8 && self.mask & MASK_LEFT_BACKGROUND == 0 {
            background = 0;
        }
        if x < 8 && self.mask & MASK_LEFT_SPRITES == 0 {
            sprite = 0;
        }

        let bg_opaque = background % 4 != 0;
        let sprite_opaque = sprite % 4 != 0;
        let color = match (bg_opaque, sprite_opaque) {
            (false, false) => 0,
            (false, true) => sprite | 0x10,
            (true, false) => background,
            (true, true) => {
                if self.sprites.indexes[slot] == 0 && x < 255 {
                    self.sprite_zero_hit = true;
                }
                if self.sprites.priorities[slot] == 0 {
                    sprite | 0x10
                } else {
                    background
                }
            }
        };

        let mut index = self.memory.palette_entry(color);
        if self.mask & MASK_GRAYSCALE != 0 {
            index &= 0x30;
        }
        self.frame_buffer[y * NES_WIDTH + x] = palette_rgb(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Mirroring;
    use crate::test_utils::MockChr;

    fn run_until(ppu: &mut Ppu, bus: &MockChr, scanline: u16, cycle: u16) {
        while !(ppu.scanline() == scanline && ppu.cycle() == cycle) {
            ppu.step(bus);
        }
    }

    #[test]
    fn increment_x_wraps_into_next_nametable() {
        let mut ppu = Ppu::new();
        ppu.v = 31;
        ppu.increment_x();
        assert_eq!(ppu.v, 0x0400);
        ppu.increment_x();
        assert_eq!(ppu.v, 0x0401);
    }

    #[test]
    fn increment_y_fine_then_coarse() {
        let mut ppu = Ppu::new();
        ppu.v = 0x6000; // fine Y 6
        ppu.increment_y();
        assert_eq!(ppu.v, 0x7000);
        ppu.increment_y(); // fine Y overflows into coarse Y 1
        assert_eq!(ppu.v, 0x0020);

        ppu.v = 0x7000 | (29 << 5);
        ppu.increment_y();
        assert_eq!(ppu.v, 0x0800, "row 29 wraps and switches vertical nametable");

        ppu.v = 0x7000 | (31 << 5);
        ppu.increment_y();
        assert_eq!(ppu.v, 0x0000, "row 31 wraps without switching");
    }

    #[test]
    fn copies_move_only_their_bits() {
        let mut ppu = Ppu::new();
        ppu.t = 0x7FFF;
        ppu.v = 0;
        ppu.copy_x();
        assert_eq!(ppu.v, 0x041F);
        ppu.v = 0;
        ppu.copy_y();
        assert_eq!(ppu.v, 0x7BE0);
    }

    #[test]
    fn attribute_quadrant_selects_palette() {
        let mut bus = MockChr::new(Mirroring::Horizontal);
        let mut ppu = Ppu::new();
        // Attribute byte for the top-left 32x32 block: quadrants 3,2,1,0 (BR,BL,TR,TL)
        ppu.memory.write(0x23C0, 0b11_10_01_00, &mut bus);

        ppu.v = 0; // coarse X 0, coarse Y 0 -> top-left
        ppu.fetch_attribute_bits(&bus);
        assert_eq!(ppu.attribute_bits, 0 << 2);
        ppu.v = 2; // coarse X 2 -> top-right
        ppu.fetch_attribute_bits(&bus);
        assert_eq!(ppu.attribute_bits, 1 << 2);
        ppu.v = 2 << 5; // coarse Y 2 -> bottom-left
        ppu.fetch_attribute_bits(&bus);
        assert_eq!(ppu.attribute_bits, 2 << 2);
        ppu.v = (2 << 5) | 2;
        ppu.fetch_attribute_bits(&bus);
        assert_eq!(ppu.attribute_bits, 3 << 2);
    }

    #[test]
    fn background_tile_reaches_frame_buffer() {
        let mut bus = MockChr::new(Mirroring::Horizontal);
        // Tile 1: low plane all ones, high plane zero -> pattern value 1 everywhere
        for row in 0..8 {
            bus.chr[16 + row] = 0xFF;
        }
        let mut ppu = Ppu::new();
        // Nametable: first tile uses tile 1, rest tile 0 (transparent)
        ppu.write_register(0x2006, 0x20, &mut bus);
        ppu.write_register(0x2006, 0x00, &mut bus);
        ppu.write_register(0x2007, 0x01, &mut bus);
        // Palette: backdrop 0x0F, bg palette 0 color 1 = 0x16
        ppu.write_register(0x2006, 0x3F, &mut bus);
        ppu.write_register(0x2006, 0x00, &mut bus);
        ppu.write_register(0x2007, 0x0F, &mut bus);
        ppu.write_register(0x2007, 0x16, &mut bus);
        // Show background including the left column, scroll 0
        ppu.write_register(0x2000, 0x00, &mut bus);
        ppu.write_register(0x2005, 0x00, &mut bus);
        ppu.write_register(0x2005, 0x00, &mut bus);
        ppu.write_register(0x2001, 0x0A, &mut bus);

        // Let the pre-render line prime V and the pipeline, then draw line 0.
        run_until(&mut ppu, &bus, PRE_RENDER_SCANLINE, 0);
        run_until(&mut ppu, &bus, 1, 0);

        let frame = ppu.frame_buffer();
        assert_eq!(frame[0], palette_rgb(0x16));
        assert_eq!(frame[7], palette_rgb(0x16));
        assert_eq!(frame[8], palette_rgb(0x0F));
    }

    #[test]
    fn grayscale_masks_color_index() {
        let mut bus = MockChr::new(Mirroring::Horizontal);
        let mut ppu = Ppu::new();
        ppu.write_register(0x2006, 0x3F, &mut bus);
        ppu.write_register(0x2006, 0x00, &mut bus);
        ppu.write_register(0x2007, 0x16, &mut bus);
        ppu.write_register(0x2001, 0x0B, &mut bus);
        run_until(&mut ppu, &bus, 0, 10);
        assert_eq!(ppu.frame_buffer()[5], palette_rgb(0x10));
    }
}
