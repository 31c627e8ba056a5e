//! Shared test utilities for building minimal iNES (v1) ROM images and
//! ready-to-run buses.
//!
//! These helpers de-duplicate iNES construction logic across tests in the
//! CPU, Bus, PPU, mapper and Cartridge modules.
//!
//! Notes on iNES header fields used here:
//! - bytes[0..4] = b"NES\x1A"
//! - byte 4 = PRG ROM size in 16 KiB units
//! - byte 5 = CHR ROM size in 8 KiB units (0 => CHR RAM allocated by the loader)
//! - byte 6 = Flags 6 (mirroring, battery, trainer, mapper low nibble)
//! - byte 7 = Flags 7 (NES 2.0 indicator, mapper high nibble)
//! - byte 8 = PRG RAM size in 8 KiB units (0 => loader default)
//!
//! Vectors always live in the last 6 bytes of PRG ROM, which every supported
//! mapper keeps at $FFFA-$FFFF.

use crate::bus::Bus;
use crate::cartridge::{Cartridge, Mirroring};
use crate::ppu_bus::PpuBus;

/// Build a minimal iNES (v1) image with configurable PRG/CHR sizes and flags.
///
/// PRG is filled with 0xAA and CHR with 0xCC.
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    prg_ram_8k: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(
        16 + trainer.map(|_| 512).unwrap_or(0) + prg_16k * 16 * 1024 + chr_8k * 8 * 1024,
    );

    bytes.extend_from_slice(b"NES\x1A");
    bytes.push(prg_16k as u8);
    bytes.push(chr_8k as u8);
    bytes.push(flags6);
    bytes.push(flags7);
    bytes.push(prg_ram_8k);
    bytes.extend_from_slice(&[0u8; 7]);

    if let Some(t) = trainer {
        bytes.extend_from_slice(t);
    }
    bytes.extend(std::iter::repeat_n(0xAA, prg_16k * 16 * 1024));
    bytes.extend(std::iter::repeat_n(0xCC, chr_8k * 8 * 1024));
    bytes
}

/// Build an image for `mapper` whose every 8 KiB PRG bank is filled with its
/// bank number and every 1 KiB CHR bank with its bank number. Vectors are set
/// in the final bank.
pub fn build_banked_ines(
    mapper: u8,
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    vectors: (u16, u16, u16),
) -> Vec<u8> {
    let flags6 = (flags6 & 0x0F) | (mapper << 4);
    let flags7 = mapper & 0xF0;
    let mut rom = build_ines(prg_16k, chr_8k, flags6, flags7, 1, None);
    let prg_len = prg_16k * 16 * 1024;
    {
        let prg = &mut rom[16..16 + prg_len];
        for (bank, chunk) in prg.chunks_mut(0x2000).enumerate() {
            chunk.fill(bank as u8);
        }
        let (reset, nmi, irq) = vectors;
        set_vectors_in_prg(prg, reset, nmi, irq);
    }
    let chr = &mut rom[16 + prg_len..];
    for (bank, chunk) in chr.chunks_mut(0x400).enumerate() {
        chunk.fill(bank as u8);
    }
    rom
}

/// Build a simple NROM image that places `prg` at the start of a single
/// 16 KiB PRG bank ($8000, mirrored at $C000) and sets vectors (RESET/NMI/IRQ
/// default to $8000).
pub fn build_nrom_with_prg(
    prg: &[u8],
    chr_8k: usize,
    prg_ram_8k: u8,
    vectors: Option<(u16, u16, u16)>,
) -> Vec<u8> {
    assert!(
        prg.len() <= 16 * 1024,
        "Program must fit within a 16 KiB PRG bank"
    );

    let mut rom = build_ines(1, chr_8k, 0, 0, prg_ram_8k, None);
    let prg_start = 16;
    let prg_end = prg_start + 16 * 1024;
    rom[prg_start..(prg_start + prg.len())].copy_from_slice(prg);

    let (reset, nmi, irq) = vectors.unwrap_or((0x8000, 0x8000, 0x8000));
    set_vectors_in_prg(&mut rom[prg_start..prg_end], reset, nmi, irq);
    rom
}

/// Write CPU vectors (NMI, RESET, IRQ/BRK) into the last 6 bytes of a PRG slice.
pub fn set_vectors_in_prg(prg: &mut [u8], reset: u16, nmi: u16, irq: u16) {
    assert!(
        prg.len() >= 0x4000 && prg.len() % 0x4000 == 0,
        "PRG length must be a multiple of 16 KiB, got {} bytes",
        prg.len()
    );
    let base = prg.len() - 6;
    write_le_u16(prg, base, nmi);
    write_le_u16(prg, base + 2, reset);
    write_le_u16(prg, base + 4, irq);
}

#[inline]
fn write_le_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset] = (value & 0x00FF) as u8;
    buf[offset + 1] = (value >> 8) as u8;
}

/// Bus backed by an NROM cart running `prg` at $8000, with CHR RAM.
pub fn nrom_bus(prg: &[u8]) -> Bus {
    let rom = build_nrom_with_prg(prg, 0, 1, None);
    Bus::new(Cartridge::from_ines_bytes(&rom).expect("parse"))
}

/// Bus whose program is copied into internal RAM at `origin`; the cartridge
/// is a blank NROM with CHR RAM.
pub fn ram_program_bus(origin: u16, program: &[u8]) -> Bus {
    let mut bus = nrom_bus(&[]);
    for (i, b) in program.iter().enumerate() {
        bus.write(origin.wrapping_add(i as u16), *b);
    }
    bus
}

/// In-memory pattern table store implementing `PpuBus` for PPU unit tests.
pub struct MockChr {
    pub chr: Vec<u8>,
    pub mirroring: Mirroring,
}

impl MockChr {
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            chr: vec![0; 0x2000],
            mirroring,
        }
    }
}

impl PpuBus for MockChr {
    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[(addr & 0x1FFF) as usize]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        self.chr[(addr & 0x1FFF) as usize] = value;
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_ines() {
        let rom = build_ines(2, 1, 0x01, 0x00, 1, None);
        assert_eq!(&rom[0..4], b"NES\x1A");
        assert_eq!(rom[4], 2);
        assert_eq!(rom[5], 1);
        assert_eq!(rom[6], 0x01);
        assert_eq!(rom[8], 1);
        assert_eq!(rom.len(), 16 + 2 * 16 * 1024 + 8 * 1024);
    }

    #[test]
    fn writes_vectors_for_16k_prg() {
        let mut prg = vec![0u8; 16 * 1024];
        set_vectors_in_prg(&mut prg, 0x8123, 0x8456, 0x8ABC);
        assert_eq!(prg[0x3FFA], 0x56);
        assert_eq!(prg[0x3FFB], 0x84);
        assert_eq!(prg[0x3FFC], 0x23);
        assert_eq!(prg[0x3FFD], 0x81);
        assert_eq!(prg[0x3FFE], 0xBC);
        assert_eq!(prg[0x3FFF], 0x8A);
    }

    #[test]
    fn banked_image_marks_each_bank() {
        let rom = build_banked_ines(2, 4, 1, 0, (0xC000, 0xC000, 0xC000));
        assert_eq!(rom[6] >> 4, 2);
        // Second 8 KiB bank starts at PRG offset 0x2000.
        assert_eq!(rom[16 + 0x2000], 1);
        // Vectors overwrite the tail of the last bank.
        assert_eq!(rom[16 + 0xFFFC], 0x00);
        assert_eq!(rom[16 + 0xFFFD], 0xC0);
        // CHR 1 KiB bank 3
        assert_eq!(rom[16 + 0x10000 + 0xC00], 3);
    }
}
