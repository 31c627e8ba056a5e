#![doc = r#"
PPU sprite helpers

Responsibilities
- Evaluate OAM at dot 257 of each visible line: up to 8 sprites whose rows
  cover the line are latched (in OAM order) with their pattern row already
  fetched; more than 8 sets the sprite overflow flag.
- Produce the sprite pixel for the current dot, first opaque slot wins.

Pattern fetch
- 8x8 sprites use the PPUCTRL sprite table; 8x16 sprites take the table
  from bit 0 of the tile index and use the even/odd tile pair.
- Vertical flip mirrors the row, horizontal flip reverses pixel order.
- Latched rows are 8 pixels x 4 bits (palette 2 bits + pattern 2 bits),
  leftmost pixel in the top nibble.
"#]

use super::*;

/// Sprites selected for the line currently being drawn.
#[derive(Clone, Debug, Default)]
pub(crate) struct ScanlineSprites {
    pub(crate) count: usize,
    pub(crate) patterns: [u32; 8],
    pub(crate) positions: [u8; 8],
    pub(crate) priorities: [u8; 8],
    pub(crate) indexes: [u8; 8],
}

impl Ppu {
    pub(in crate::ppu) fn evaluate_sprites<B: PpuBus>(&mut self, bus: &B) {
        let height = self.sprite_height() as i32;
        let mut count = 0;
        for i in 0..64u8 {
            let base = i * 4;
            let y = self.memory.oam(base) as i32;
            let attributes = self.memory.oam(base + 2);
            let x = self.memory.oam(base + 3);
            let row = self.scanline as i32 - y;
            if !(0..height).contains(&row) {
                continue;
            }
            if count < 8 {
                self.sprites.patterns[count] = self.fetch_sprite_pattern(bus, i, row as u16);
                self.sprites.positions[count] = x;
                self.sprites.priorities[count] = (attributes >> 5) & 1;
                self.sprites.indexes[count] = i;
            }
            count += 1;
        }
        if count > 8 {
            count = 8;
            self.sprite_overflow = true;
        }
        self.sprites.count = count;
    }

    fn fetch_sprite_pattern<B: PpuBus>(&self, bus: &B, index: u8, row: u16) -> u32 {
        let base = index * 4;
        let mut tile = self.memory.oam(base + 1) as u16;
        let attributes = self.memory.oam(base + 2);
        let mut row = row;
        let table = if self.sprite_height() == 8 {
            if attributes & 0x80 != 0 {
                row = 7 - row;
            }
            self.sprite_table()
        } else {
            if attributes & 0x80 != 0 {
                row = 15 - row;
            }
            let table = (tile & 1) * 0x1000;
            tile &= 0xFE;
            if row > 7 {
                tile += 1;
                row -= 8;
            }
            table
        };
        let addr = table + tile * 16 + row;
        let mut low = self.memory.read(addr, bus);
        let mut high = self.memory.read(addr + 8, bus);
        let palette = (attributes & 0x03) << 2;
        let mirrored = attributes & 0x40 != 0;

        let mut data: u32 = 0;
        for _ in 0..8 {
            let (p1, p2) = if mirrored {
                let bits = (low & 1, (high & 1) << 1);
                low >>= 1;
                high >>= 1;
                bits
            } else {
                let bits = ((low & 0x80) >> 7, (high & 0x80) >> 6);
                low <<= 1;
                high <<= 1;
                bits
            };
            data = (data << 4) | (palette | p1 | p2) as u32;
        }
        data
    }

    /// (slot, 4-bit color) of the first opaque sprite covering the current dot.
    pub(in crate::ppu) fn sprite_pixel(&self) -> Option<(usize, u8)> {
        if self.mask & MASK_SPRITES == 0 {
            return None;
        }
        let x = self.cycle as i32 - 1;
        (0..self.sprites.count).find_map(|slot| {
            let offset = x - self.sprites.positions[slot] as i32;
            if !(0..8).contains(&offset) {
                return None;
            }
            let color = (self.sprites.patterns[slot] >> ((7 - offset) * 4)) as u8 & 0x0F;
            (color % 4 != 0).then_some((slot, color))
        })
    }
}
