/*
Module: mappers

Declares the board implementations behind `crate::mapper::Mapper` and
re-exports their public types. Each board owns its `Cartridge`.

Implemented:
- NROM (Mapper 0)
- UxROM (Mapper 2)
- MMC3 (Mapper 4) with scanline IRQ
*/

pub mod mmc3;
pub mod nrom;
pub mod uxrom;

pub use mmc3::Mmc3;
pub use nrom::Nrom;
pub use uxrom::Uxrom;
