/*!
Cartridge with iNES (v1) loader.

Features:
- Parse iNES (v1) header from bytes or file path
- Extract PRG ROM, CHR (ROM, or CHR RAM when the header reports none), and PRG RAM size
- Determine mirroring, battery-backed RAM and the mapper kind (0 NROM, 2 UxROM, 4 MMC3)
- Expose raw offset-based accessors; bank translation lives in `crate::mapper`

Notes:
- iNES 2.0 is detected and rejected with an error.
- Unsupported mapper ids fail at load time; a `Cartridge` always names a mapper
  the emulator can drive.
- PRG RAM allocation policy:
  - If header byte 8 (PRG-RAM size in 8 KiB units) is 0, allocate
    `LoadOptions::default_prg_ram_kib` by convention.
  - Otherwise allocate size_in_units * 8 KiB.
- Four-screen VRAM is parsed but not emulated; such carts fall back to the
  mirroring bit and a warning is logged.
*/

use std::cell::Cell;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Errors produced while loading a cartridge or touching its CHR memory.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("data too small for iNES header ({0} bytes)")]
    TooShort(usize),
    #[error("invalid iNES header magic (expected NES<1A>)")]
    BadMagic,
    #[error("NES 2.0 format is not supported")]
    Nes2Unsupported,
    #[error("data too small for {section}: expected {expected} bytes, found {actual}")]
    Truncated {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("unsupported mapper: {0}")]
    UnsupportedMapper(u8),
    #[error("cartridge has no CHR memory")]
    NoChrMemory,
    #[error("CHR memory is read-only")]
    ChrNotWritable,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleScreenLower,
    SingleScreenUpper,
}

/// Mapper boards this emulator can drive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MapperKind {
    Nrom,
    Uxrom,
    Mmc3,
}

impl MapperKind {
    pub fn from_id(id: u8) -> Result<Self, CartridgeError> {
        match id {
            0 => Ok(MapperKind::Nrom),
            2 => Ok(MapperKind::Uxrom),
            4 => Ok(MapperKind::Mmc3),
            other => Err(CartridgeError::UnsupportedMapper(other)),
        }
    }

    pub fn id(self) -> u8 {
        match self {
            MapperKind::Nrom => 0,
            MapperKind::Uxrom => 2,
            MapperKind::Mmc3 => 4,
        }
    }
}

/// Knobs applied while parsing an iNES image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Allocate 8 KiB of CHR RAM when the header reports zero CHR ROM banks.
    pub chr_ram_when_absent: bool,
    /// PRG RAM size used when header byte 8 is zero.
    pub default_prg_ram_kib: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            chr_ram_when_absent: true,
            default_prg_ram_kib: 8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ChrMemory {
    Rom(Vec<u8>),
    Ram(Vec<u8>),
    None,
}

#[derive(Clone)]
pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr: ChrMemory,
    prg_ram: Vec<u8>,

    // Metadata
    mapper_kind: MapperKind,
    mirroring: Mirroring,
    battery: bool,
    has_trainer: bool,

    // Set once the first CHR access fault has been reported
    chr_fault_reported: Cell<bool>,
}

// Debug implemented manually so ROM payloads are not dumped
impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper_kind", &self.mapper_kind)
            .field("mirroring", &self.mirroring)
            .field("battery", &self.battery)
            .field("has_trainer", &self.has_trainer)
            .field("prg_rom_len", &self.prg_rom.len())
            .field("chr_len", &self.chr_len())
            .field("chr_is_ram", &self.has_chr_ram())
            .field("prg_ram_len", &self.prg_ram.len())
            .finish()
    }
}

impl Cartridge {
    // -------------- Construction --------------

    /// Load a cartridge from raw iNES bytes using default `LoadOptions`.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        Self::from_ines_bytes_with(data, LoadOptions::default())
    }

    /// Load a cartridge from raw iNES bytes.
    pub fn from_ines_bytes_with(data: &[u8], options: LoadOptions) -> Result<Self, CartridgeError> {
        if data.len() < 16 {
            return Err(CartridgeError::TooShort(data.len()));
        }

        // Header: 16 bytes
        // 0-3: 'N', 'E', 'S', 0x1A
        if &data[0..4] != b"NES\x1A" {
            return Err(CartridgeError::BadMagic);
        }

        let prg_rom_16k_units = data[4] as usize;
        let chr_rom_8k_units = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];
        let prg_ram_8k_units = data[8] as usize;

        // NES 2.0 if (flags7 & 0x0C) == 0x08
        if (flags7 & 0x0C) == 0x08 {
            return Err(CartridgeError::Nes2Unsupported);
        }

        // Mapper ID: high nibble from flags7 and low nibble from flags6
        let mapper_id = (flags7 & 0xF0) | (flags6 >> 4);
        let mapper_kind = MapperKind::from_id(mapper_id)?;

        let four_screen = (flags6 & 0b0000_1000) != 0;
        let mirroring = if (flags6 & 0b0000_0001) != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        if four_screen {
            log::warn!("four-screen VRAM requested; falling back to {mirroring:?} mirroring");
        }
        let battery = (flags6 & 0b0000_0010) != 0;
        let has_trainer = (flags6 & 0b0000_0100) != 0;

        let mut offset = 16usize;
        if has_trainer {
            // Trainer is 512 bytes right after header
            take(data, offset, 512, "trainer")?;
            log::warn!("discarding 512-byte trainer");
            offset += 512;
        }

        let prg_rom_len = prg_rom_16k_units * 16 * 1024;
        let prg_rom = take(data, offset, prg_rom_len, "PRG ROM")?.to_vec();
        offset += prg_rom_len;

        let chr = if chr_rom_8k_units > 0 {
            let chr_len = chr_rom_8k_units * 8 * 1024;
            ChrMemory::Rom(take(data, offset, chr_len, "CHR ROM")?.to_vec())
        } else if options.chr_ram_when_absent {
            ChrMemory::Ram(vec![0; 8 * 1024])
        } else {
            ChrMemory::None
        };

        let prg_ram_len = if prg_ram_8k_units == 0 {
            options.default_prg_ram_kib * 1024
        } else {
            prg_ram_8k_units * 8 * 1024
        };

        let cart = Self {
            prg_rom,
            chr,
            prg_ram: vec![0; prg_ram_len],
            mapper_kind,
            mirroring,
            battery,
            has_trainer,
            chr_fault_reported: Cell::new(false),
        };
        log::info!(
            "loaded cartridge: mapper {} ({:?}), PRG {} KiB, CHR {} KiB{}, {:?} mirroring{}",
            mapper_id,
            mapper_kind,
            cart.prg_rom.len() / 1024,
            cart.chr_len() / 1024,
            if cart.has_chr_ram() { " RAM" } else { "" },
            mirroring,
            if battery { ", battery" } else { "" },
        );
        Ok(cart)
    }

    /// Load a cartridge from an iNES file (.nes).
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        Self::from_ines_file_with(path, LoadOptions::default())
    }

    /// Load a cartridge from an iNES file with explicit allocation options.
    pub fn from_ines_file_with<P: AsRef<Path>>(
        path: P,
        options: LoadOptions,
    ) -> Result<Self, CartridgeError> {
        let bytes = fs::read(path)?;
        Self::from_ines_bytes_with(&bytes, options)
    }

    // -------------- Raw memory access --------------

    /// Read PRG ROM at a byte offset; offsets wrap at the ROM size.
    pub fn read_prg_rom(&self, offset: usize) -> u8 {
        if self.prg_rom.is_empty() {
            return 0;
        }
        self.prg_rom[offset % self.prg_rom.len()]
    }

    /// Read CHR (ROM or RAM) at a byte offset; offsets wrap at the CHR size.
    pub fn read_chr(&self, offset: usize) -> Result<u8, CartridgeError> {
        match &self.chr {
            ChrMemory::Rom(bytes) | ChrMemory::Ram(bytes) => Ok(bytes[offset % bytes.len()]),
            ChrMemory::None => Err(CartridgeError::NoChrMemory),
        }
    }

    /// Write CHR RAM at a byte offset. CHR ROM rejects writes.
    pub fn write_chr(&mut self, offset: usize, value: u8) -> Result<(), CartridgeError> {
        match &mut self.chr {
            ChrMemory::Ram(bytes) => {
                let len = bytes.len();
                bytes[offset % len] = value;
                Ok(())
            }
            ChrMemory::Rom(_) => Err(CartridgeError::ChrNotWritable),
            ChrMemory::None => Err(CartridgeError::NoChrMemory),
        }
    }

    /// Read PRG RAM at a byte offset; offsets wrap at the RAM size.
    pub fn read_prg_ram(&self, offset: usize) -> u8 {
        if self.prg_ram.is_empty() {
            return 0;
        }
        self.prg_ram[offset % self.prg_ram.len()]
    }

    pub fn write_prg_ram(&mut self, offset: usize, value: u8) {
        if self.prg_ram.is_empty() {
            return;
        }
        let len = self.prg_ram.len();
        self.prg_ram[offset % len] = value;
    }

    // -------------- Accessors --------------

    pub fn mapper_id(&self) -> u8 {
        self.mapper_kind.id()
    }

    pub fn mapper_kind(&self) -> MapperKind {
        self.mapper_kind
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn battery_backed(&self) -> bool {
        self.battery
    }

    pub fn has_trainer(&self) -> bool {
        self.has_trainer
    }

    pub fn has_prg_ram(&self) -> bool {
        !self.prg_ram.is_empty()
    }

    pub fn has_chr_ram(&self) -> bool {
        matches!(self.chr, ChrMemory::Ram(_))
    }

    /// Record a CHR access fault. True only for the first one.
    pub(crate) fn note_chr_fault(&self) -> bool {
        !self.chr_fault_reported.replace(true)
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_rom.len()
    }

    pub fn chr_len(&self) -> usize {
        match &self.chr {
            ChrMemory::Rom(bytes) | ChrMemory::Ram(bytes) => bytes.len(),
            ChrMemory::None => 0,
        }
    }

    pub fn prg_ram_len(&self) -> usize {
        self.prg_ram.len()
    }
}

fn take<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8], CartridgeError> {
    data.get(offset..offset + len)
        .ok_or(CartridgeError::Truncated {
            section,
            expected: len,
            actual: data.len().saturating_sub(offset),
        })
}
