#![doc = r#"
famicore: NES emulator core.

The CPU, PPU and cartridge mapper run in lockstep: every CPU cycle is
followed by three PPU dots, each of which also clocks the mapper.

Modules:
- bus: CPU address space (RAM, PPU registers, pads, I/O latches, cartridge), OAM DMA
- cartridge: iNES v1 loader, load options and cartridge memories
- controller: standard joypad serial protocol
- cpu: 6502 core (state, addressing, opcode table, execution, trace)
- error: crate-level error enum
- mapper / mappers: NROM, UxROM and MMC3 boards as a closed enum
- ppu: registers, memory, background/sprite pipeline, frame output
- ppu_bus: pattern-table access seen from the PPU
- system: `Nes`, the driver tying everything together

Optional frontends: `display` (window via pixels + winit) and `screenshot`
(PNG export via image).

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod mapper;
pub mod mappers;
pub mod ppu;
pub mod ppu_bus;
pub mod system;

#[cfg(feature = "display")]
pub mod display;
#[cfg(feature = "screenshot")]
pub mod screenshot;

pub use bus::Bus;
pub use cartridge::{Cartridge, CartridgeError, LoadOptions, Mirroring};
pub use controller::{Button, Controller};
pub use cpu::{Cpu, CpuError, Interrupt};
pub use error::{Error, Result};
pub use mapper::Mapper;
pub use ppu::{FrameListener, NES_HEIGHT, NES_WIDTH, Ppu};
pub use system::Nes;

#[cfg(test)]
pub mod test_utils;
