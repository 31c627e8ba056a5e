//! iNES builders shared by the integration tests.

#![allow(dead_code)]

use famicore::{Bus, Cartridge, Cpu};

/// NROM image with one 16 KiB PRG bank (NOP filled), CHR RAM and 8 KiB PRG
/// RAM. `program` starts at $8000; all vectors point at $8000.
pub fn nrom_image(program: &[u8]) -> Vec<u8> {
    let mut rom = Vec::with_capacity(16 + 0x4000);
    rom.extend_from_slice(b"NES\x1A");
    rom.extend_from_slice(&[1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]);
    let mut prg = vec![0xEA; 0x4000];
    prg[..program.len()].copy_from_slice(program);
    for vector in [0x3FFA, 0x3FFC, 0x3FFE] {
        prg[vector] = 0x00;
        prg[vector + 1] = 0x80;
    }
    rom.extend_from_slice(&prg);
    rom
}

/// Powered-on CPU and bus with `program` copied into RAM at `origin` and PC
/// pointing at it.
pub fn ram_machine(origin: u16, program: &[u8]) -> (Cpu, Bus) {
    let cart = Cartridge::from_ines_bytes(&nrom_image(&[])).expect("valid image");
    let mut bus = Bus::new(cart);
    for (i, b) in program.iter().enumerate() {
        bus.write(origin.wrapping_add(i as u16), *b);
    }
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    cpu.set_pc(origin);
    (cpu, bus)
}
