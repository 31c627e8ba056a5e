/*!
Picture Processing Unit.

Provides:
- CPU-visible register interface ($2000..$2007, see `registers.rs`)
- Nametable VRAM, palette RAM and OAM with mirroring rules (`memory.rs`)
- Dot-level timing: 262 scanlines x 341 cycles, vblank + NMI signaling and
  the odd-frame skip of the last pre-render cycle
- Background pipeline driven by the internal V/T/X/W scroll registers
  (`renderer.rs`)
- Per-scanline sprite evaluation and composition (`sprite.rs`)
- A 256x240 packed RGB (0x00RRGGBB) frame published to a `FrameListener`
  whenever the frame counter advances

STRUCTURE:
- `Ppu` holds all state; submodules add inherent methods on it.
- `step` advances to the next dot and then performs that dot's work. After a
  call, `position()` names the dot that was just processed.
- Pattern data and mirroring come from a `PpuBus` (the mapper in the running
  system, a mock in tests).
*/

pub(crate) mod memory;
pub(crate) mod registers;
pub(crate) mod renderer;
pub(crate) mod sprite;

pub use memory::{PpuMemory, nametable_index, palette_index};

use crate::ppu_bus::PpuBus;
use sprite::ScanlineSprites;

/// Screen width in pixels.
pub const NES_WIDTH: usize = 256;
/// Screen height in pixels.
pub const NES_HEIGHT: usize = 240;
/// Dots per scanline.
pub const CYCLES_PER_SCANLINE: u16 = 341;
/// Scanlines per frame, including vblank and pre-render.
pub const SCANLINES_PER_FRAME: u16 = 262;
/// Scanline on whose cycle 1 vblank begins.
pub const VBLANK_SCANLINE: u16 = 241;
/// Pre-render scanline (sometimes numbered -1).
pub const PRE_RENDER_SCANLINE: u16 = 261;

/// Canonical (approximate) NES master palette (RGB).
const NES_PALETTE: [[u8; 3]; 64] = [
    [0x75, 0x75, 0x75],
    [0x27, 0x1B, 0x8F],
    [0x00, 0x00, 0xAB],
    [0x47, 0x00, 0x9F],
    [0x8F, 0x00, 0x77],
    [0xAB, 0x00, 0x13],
    [0xA7, 0x00, 0x00],
    [0x7F, 0x0B, 0x00],
    [0x43, 0x2F, 0x00],
    [0x00, 0x47, 0x00],
    [0x00, 0x51, 0x00],
    [0x00, 0x3F, 0x17],
    [0x1B, 0x3F, 0x5F],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xBC, 0xBC, 0xBC],
    [0x00, 0x73, 0xEF],
    [0x23, 0x3B, 0xEF],
    [0x83, 0x00, 0xF3],
    [0xBF, 0x00, 0xBF],
    [0xE7, 0x00, 0x5B],
    [0xDB, 0x2B, 0x00],
    [0xCB, 0x4F, 0x0F],
    [0x8B, 0x73, 0x00],
    [0x00, 0x97, 0x00],
    [0x00, 0xAB, 0x00],
    [0x00, 0x93, 0x3B],
    [0x00, 0x83, 0x8B],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0x3F, 0xBF, 0xFF],
    [0x5F, 0x97, 0xFF],
    [0xA7, 0x8B, 0xFD],
    [0xF7, 0x7B, 0xFF],
    [0xFF, 0x77, 0xB7],
    [0xFF, 0x77, 0x63],
    [0xFF, 0x9B, 0x3B],
    [0xF3, 0xBF, 0x3F],
    [0x83, 0xD3, 0x13],
    [0x4F, 0xDF, 0x4B],
    [0x58, 0xF8, 0x98],
    [0x00, 0xEB, 0xDB],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0xAB, 0xE7, 0xFF],
    [0xC7, 0xD7, 0xFF],
    [0xD7, 0xCB, 0xFF],
    [0xFF, 0xC7, 0xFF],
    [0xFF, 0xC7, 0xDB],
    [0xFF, 0xBF, 0xB3],
    [0xFF, 0xDB, 0xAB],
    [0xFF, 0xE7, 0xA3],
    [0xE3, 0xFF, 0xA3],
    [0xAB, 0xF3, 0xBF],
    [0xB3, 0xFF, 0xCF],
    [0x9F, 0xFF, 0xF3],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
];

/// Packed 0x00RRGGBB color for a master palette index (only the low 6 bits count).
#[inline]
pub fn palette_rgb(index: u8) -> u32 {
    let [r, g, b] = NES_PALETTE[(index & 0x3F) as usize];
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Receives every completed frame as 256x240 packed RGB pixels, row-major.
pub trait FrameListener {
    fn frame_ready(&mut self, frame: &[u32]);
}

impl<F: FnMut(&[u32])> FrameListener for F {
    fn frame_ready(&mut self, frame: &[u32]) {
        self(frame)
    }
}

/// Where the PPU is in its frame, as seen by mappers that count scanlines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PpuPosition {
    pub scanline: u16,
    pub cycle: u16,
    pub rendering_enabled: bool,
}

// PPUCTRL bits
const CTRL_INCREMENT_32: u8 = 0x04;
const CTRL_SPRITE_TABLE: u8 = 0x08;
const CTRL_BACKGROUND_TABLE: u8 = 0x10;
const CTRL_SPRITE_16: u8 = 0x20;
const CTRL_NMI: u8 = 0x80;

// PPUMASK bits
const MASK_GRAYSCALE: u8 = 0x01;
const MASK_LEFT_BACKGROUND: u8 = 0x02;
const MASK_LEFT_SPRITES: u8 = 0x04;
const MASK_BACKGROUND: u8 = 0x08;
const MASK_SPRITES: u8 = 0x10;

pub struct Ppu {
    // CPU-visible register state
    ctrl: u8,     // $2000
    mask: u8,     // $2001
    oam_addr: u8, // $2003
    vblank: bool,
    sprite_zero_hit: bool,
    sprite_overflow: bool,
    last_write: u8,
    read_buffer: u8,

    // Internal scroll registers
    v: u16,
    t: u16,
    x: u8,
    w: bool,

    memory: PpuMemory,

    // Timing
    scanline: u16,
    cycle: u16,
    frame: u64,
    nmi_pending: bool,

    // Background pipeline latches and the 8-pixel x 4-bit shift register pair
    nametable_byte: u8,
    attribute_bits: u8,
    pattern_low: u8,
    pattern_high: u8,
    tile_data: u64,

    sprites: ScanlineSprites,

    frame_buffer: Vec<u32>,
    listener: Option<Box<dyn FrameListener>>,
}

// Debug implemented manually: the listener and buffers are not useful to print
impl std::fmt::Debug for Ppu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ppu")
            .field("ctrl", &self.ctrl)
            .field("mask", &self.mask)
            .field("v", &self.v)
            .field("t", &self.t)
            .field("x", &self.x)
            .field("w", &self.w)
            .field("scanline", &self.scanline)
            .field("cycle", &self.cycle)
            .field("frame", &self.frame)
            .field("vblank", &self.vblank)
            .finish()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            oam_addr: 0,
            vblank: false,
            sprite_zero_hit: false,
            sprite_overflow: false,
            last_write: 0,
            read_buffer: 0,
            v: 0,
            t: 0,
            x: 0,
            w: false,
            memory: PpuMemory::new(),
            scanline: 0,
            cycle: 0,
            frame: 0,
            nmi_pending: false,
            nametable_byte: 0,
            attribute_bits: 0,
            pattern_low: 0,
            pattern_high: 0,
            tile_data: 0,
            sprites: ScanlineSprites::default(),
            frame_buffer: vec![0; NES_WIDTH * NES_HEIGHT],
            listener: None,
        }
    }

    /// Return registers, timing and memory to power-on state. The frame
    /// listener stays registered.
    pub fn reset(&mut self) {
        self.ctrl = 0;
        self.mask = 0;
        self.oam_addr = 0;
        self.vblank = false;
        self.sprite_zero_hit = false;
        self.sprite_overflow = false;
        self.last_write = 0;
        self.read_buffer = 0;
        self.v = 0;
        self.t = 0;
        self.x = 0;
        self.w = false;
        self.memory = PpuMemory::new();
        self.scanline = 0;
        self.cycle = 0;
        self.frame = 0;
        self.nmi_pending = false;
        self.nametable_byte = 0;
        self.attribute_bits = 0;
        self.pattern_low = 0;
        self.pattern_high = 0;
        self.tile_data = 0;
        self.sprites = ScanlineSprites::default();
        self.frame_buffer.fill(0);
        log::debug!("PPU reset");
    }

    pub fn set_frame_listener(&mut self, listener: Box<dyn FrameListener>) {
        self.listener = Some(listener);
    }

    pub fn clear_frame_listener(&mut self) {
        self.listener = None;
    }

    /// Advance to the next dot and perform its work.
    pub fn step<B: PpuBus>(&mut self, bus: &B) {
        self.advance();
        self.process_dot(bus);
    }

    fn advance(&mut self) {
        if self.rendering_enabled()
            && self.frame % 2 == 1
            && self.scanline == PRE_RENDER_SCANLINE
            && self.cycle == 339
        {
            self.cycle = 0;
            self.scanline = 0;
            self.finish_frame();
            return;
        }
        self.cycle += 1;
        if self.cycle == CYCLES_PER_SCANLINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.finish_frame();
            }
        }
    }

    fn finish_frame(&mut self) {
        self.frame += 1;
        if let Some(listener) = self.listener.as_mut() {
            listener.frame_ready(&self.frame_buffer);
        }
    }

    // -----------------------------------------------------------------
    // Register-level API
    // -----------------------------------------------------------------

    /// CPU read of $2000..=$3FFF (mirrored every 8 bytes).
    pub fn read_register<B: PpuBus>(&mut self, addr: u16, bus: &B) -> u8 {
        self.read_register_inner(addr, bus)
    }

    /// CPU write of $2000..=$3FFF (mirrored every 8 bytes).
    pub fn write_register<B: PpuBus>(&mut self, addr: u16, value: u8, bus: &mut B) {
        self.write_register_inner(addr, value, bus);
    }

    /// OAM DMA: copy a 256-byte page into OAM starting at OAMADDR.
    pub fn oam_dma(&mut self, page: &[u8; 256]) {
        self.memory.oam_dma(page, self.oam_addr);
    }

    /// NMI requested since the last call.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn position(&self) -> PpuPosition {
        PpuPosition {
            scanline: self.scanline,
            cycle: self.cycle,
            rendering_enabled: self.rendering_enabled(),
        }
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn cycle(&self) -> u16 {
        self.cycle
    }

    /// Frames completed since reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn frame_buffer(&self) -> &[u32] {
        &self.frame_buffer
    }

    pub fn memory(&self) -> &PpuMemory {
        &self.memory
    }

    pub fn vblank(&self) -> bool {
        self.vblank
    }

    pub fn sprite_zero_hit(&self) -> bool {
        self.sprite_zero_hit
    }

    pub fn sprite_overflow(&self) -> bool {
        self.sprite_overflow
    }

    /// Current VRAM address (loopy V).
    pub fn vram_addr(&self) -> u16 {
        self.v
    }

    /// Temporary VRAM address (loopy T).
    pub fn temp_addr(&self) -> u16 {
        self.t
    }

    pub fn fine_x(&self) -> u8 {
        self.x
    }

    pub fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_BACKGROUND | MASK_SPRITES) != 0
    }

    fn nmi_enabled(&self) -> bool {
        self.ctrl & CTRL_NMI != 0
    }

    fn vram_increment(&self) -> u16 {
        if self.ctrl & CTRL_INCREMENT_32 != 0 { 32 } else { 1 }
    }

    fn sprite_height(&self) -> u16 {
        if self.ctrl & CTRL_SPRITE_16 != 0 { 16 } else { 8 }
    }

    fn background_table(&self) -> u16 {
        if self.ctrl & CTRL_BACKGROUND_TABLE != 0 { 0x1000 } else { 0 }
    }

    fn sprite_table(&self) -> u16 {
        if self.ctrl & CTRL_SPRITE_TABLE != 0 { 0x1000 } else { 0 }
    }
}
