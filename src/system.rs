/*!
Top-level console: owns the CPU and the bus (which owns PPU, mapper and pads).

Order of operations for one `step`:
- Log the trace line when trace logging is enabled and an instruction is next.
- Run one CPU tick of n cycles.
- For each of the 3n PPU dots: step the PPU, then clock the mapper with the
  PPU position. A mapper IRQ or PPU NMI raised on that dot is handed to the
  CPU, which services it at the top of its next tick.

Wall-clock pacing is the caller's business.
*/

use std::path::Path;

use crate::bus::Bus;
use crate::cartridge::{Cartridge, LoadOptions};
use crate::controller::Controller;
use crate::cpu::{Cpu, CpuError, Interrupt};
use crate::error::Result;
use crate::ppu::FrameListener;

/// PPU dots per CPU cycle (NTSC).
pub const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;

pub struct Nes {
    cpu: Cpu,
    bus: Bus,
}

impl Nes {
    /// Insert `cart` and power on.
    pub fn new(cart: Cartridge) -> Self {
        let mut bus = Bus::new(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        Self { cpu, bus }
    }

    pub fn from_ines_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::new(Cartridge::from_ines_bytes(data)?))
    }

    pub fn from_ines_file<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        Ok(Self::new(Cartridge::from_ines_file_with(path, options)?))
    }

    /// Power cycle; cartridge contents, PRG RAM and the frame listener survive.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
    }

    /// One CPU tick plus the PPU and mapper work it pays for. Returns CPU cycles.
    pub fn step(&mut self) -> std::result::Result<u32, CpuError> {
        if log::log_enabled!(log::Level::Trace) && self.cpu.fetches_next(&self.bus) {
            log::trace!("{}", self.cpu.trace(&self.bus));
        }

        let cycles = self.cpu.tick(&mut self.bus)?;

        let bus = &mut self.bus;
        for _ in 0..cycles * PPU_DOTS_PER_CPU_CYCLE {
            bus.ppu.step(&bus.mapper);
            if bus.mapper.step(bus.ppu.position()) {
                self.cpu.trigger_interrupt(Interrupt::Irq);
            }
            if bus.ppu.take_nmi() {
                self.cpu.trigger_interrupt(Interrupt::Nmi);
            }
        }
        Ok(cycles)
    }

    /// Step until the PPU finishes the current frame. Returns CPU cycles spent.
    pub fn run_frame(&mut self) -> std::result::Result<u64, CpuError> {
        let frame = self.bus.ppu.frame();
        let mut cycles = 0u64;
        while self.bus.ppu.frame() == frame {
            cycles += self.step()? as u64;
        }
        Ok(cycles)
    }

    /// Step until at least `budget` CPU cycles have run. Returns cycles spent.
    pub fn run_cycles(&mut self, budget: u64) -> std::result::Result<u64, CpuError> {
        let mut cycles = 0u64;
        while cycles < budget {
            cycles += self.step()? as u64;
        }
        Ok(cycles)
    }

    pub fn set_frame_listener<L: FrameListener + 'static>(&mut self, listener: L) {
        self.bus.ppu.set_frame_listener(Box::new(listener));
    }

    pub fn controller_mut(&mut self, idx: usize) -> Option<&mut Controller> {
        self.bus.controller_mut(idx)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Last completed picture, 256x240 packed 0x00RRGGBB.
    pub fn frame_buffer(&self) -> &[u32] {
        self.bus.ppu.frame_buffer()
    }
}
