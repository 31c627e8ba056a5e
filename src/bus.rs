/*!
Bus mapping the CPU address space to RAM, PPU, controllers, I/O registers and cartridge.

Address map (CPU):
- $0000-$07FF: 2KB internal RAM
- $0800-$1FFF: Mirrors of $0000-$07FF (mask with & 0x07FF)
- $2000-$2007: PPU registers
- $2008-$3FFF: Mirrors of $2000-$2007 (mask with & 0x0007)
- $4014: OAM DMA - copies a 256-byte CPU page ($XX00-$XXFF) into OAM
- $4016: Controller strobe (write, both pads), Controller 1 serial read (read)
- $4017: Controller 2 serial read (read)
- Other $4000-$401F: APU / I/O registers, stored and read back unchanged (no audio)
- $4020-$FFFF: Cartridge (expansion, PRG RAM and PRG ROM through the mapper)

Notes:
- OAM DMA copies immediately and records a 513-cycle stall (514 when the
  CPU cycle count at the write is odd). The CPU collects it with
  `take_dma_stall` and burns it as idle cycles.
- The bus is bound to one cartridge for its whole life; there is no
  unmapped address.
*/

use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::mapper::Mapper;
use crate::ppu::Ppu;

/// CPU cycles consumed by OAM DMA started on an even cycle.
pub const OAM_DMA_CYCLES: u32 = 513;

pub struct Bus {
    // 2KB CPU RAM
    ram: [u8; 0x0800],

    // Devices
    pub ppu: Ppu,
    pub mapper: Mapper,
    pub controllers: [Controller; 2],

    // $4000-$401F register latches
    io_registers: [u8; 0x20],

    // CPU cycle count at the start of the current instruction (DMA parity)
    cpu_cycle: u64,
    dma_stall: u32,
}

impl Bus {
    pub fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; 0x0800],
            ppu: Ppu::new(),
            mapper: Mapper::new(cart),
            controllers: [Controller::new(), Controller::new()],
            io_registers: [0; 0x20],
            cpu_cycle: 0,
            dma_stall: 0,
        }
    }

    /// Power-cycle devices; cartridge ROM and PRG RAM contents are kept.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.ppu.reset();
        self.mapper.reset();
        self.controllers = [Controller::new(), Controller::new()];
        self.io_registers.fill(0);
        self.cpu_cycle = 0;
        self.dma_stall = 0;
    }

    // -----------------------------
    // CPU-visible memory interface
    // -----------------------------

    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr, &self.mapper),
            0x4000..=0x401F => match addr {
                0x4016 => self.controllers[0].read(),
                0x4017 => self.controllers[1].read(),
                _ => self.io_registers[(addr - 0x4000) as usize],
            },
            0x4020..=0xFFFF => self.mapper.cpu_read(addr),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => self.ppu.write_register(addr, value, &mut self.mapper),
            0x4000..=0x401F => match addr {
                0x4014 => self.oam_dma(value),
                0x4016 => {
                    self.controllers[0].write_strobe(value);
                    self.controllers[1].write_strobe(value);
                }
                _ => self.io_registers[(addr - 0x4000) as usize] = value,
            },
            0x4020..=0xFFFF => self.mapper.cpu_write(addr, value),
        }
    }

    /// Side-effect-free read: RAM and cartridge only; registers read as 0.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x401F => 0,
            0x4020..=0xFFFF => self.mapper.cpu_read(addr),
        }
    }

    /// Little-endian word at `addr` / `addr + 1`.
    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Little-endian word whose high byte is fetched without carrying into
    /// the page ($xxFF pairs with $xx00). Covers zero-page pointers and the
    /// indirect JMP quirk.
    pub fn read_word_page_wrapped(&mut self, addr: u16) -> u16 {
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let lo = self.read(addr) as u16;
        let hi = self.read(hi_addr) as u16;
        (hi << 8) | lo
    }

    // -----------------------------
    // OAM DMA
    // -----------------------------

    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        let mut data = [0u8; 256];
        for (i, b) in data.iter_mut().enumerate() {
            *b = self.read(base | i as u16);
        }
        self.ppu.oam_dma(&data);
        self.dma_stall = OAM_DMA_CYCLES + (self.cpu_cycle & 1) as u32;
        log::debug!("OAM DMA from ${:04X}, stall {} cycles", base, self.dma_stall);
    }

    /// Idle cycles owed to a DMA transfer since the last call.
    pub fn take_dma_stall(&mut self) -> u32 {
        std::mem::take(&mut self.dma_stall)
    }

    pub fn dma_stall_pending(&self) -> bool {
        self.dma_stall > 0
    }

    /// Record the CPU cycle count at which the current instruction began.
    pub fn set_cpu_cycle(&mut self, cycle: u64) {
        self.cpu_cycle = cycle;
    }

    pub fn controller_mut(&mut self, idx: usize) -> Option<&mut Controller> {
        self.controllers.get_mut(idx)
    }

    pub fn cartridge(&self) -> &Cartridge {
        self.mapper.cartridge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Button;
    use crate::test_utils::{build_banked_ines, build_ines, nrom_bus};

    fn bus_from(rom: &[u8]) -> Bus {
        Bus::new(Cartridge::from_ines_bytes(rom).expect("parse"))
    }

    fn set_ppu_addr(bus: &mut Bus, addr: u16) {
        let _ = bus.read(0x2002); // reset write toggle
        bus.write(0x2006, (addr >> 8) as u8);
        bus.write(0x2006, addr as u8);
    }

    #[test]
    fn ram_mirroring() {
        let mut bus = nrom_bus(&[]);
        bus.write(0x0001, 0xAA);
        assert_eq!(bus.read(0x0001), 0xAA);
        assert_eq!(bus.read(0x0801), 0xAA);
        assert_eq!(bus.read(0x1801), 0xAA);
        bus.write(0x1FFF, 0x5C);
        assert_eq!(bus.read(0x07FF), 0x5C);
    }

    #[test]
    fn ppu_reg_mirror() {
        let mut bus = nrom_bus(&[]);
        // $3456 mirrors $2006
        bus.write(0x3456, 0x21);
        bus.write(0x2006, 0x00);
        assert_eq!(bus.ppu.vram_addr(), 0x2100);
    }

    #[test]
    fn controller_strobe_and_read() {
        let mut bus = nrom_bus(&[]);
        bus.controllers[0].press(Button::A);
        bus.controllers[1].press(Button::B);
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);
        let pad1: Vec<u8> = (0..9).map(|_| bus.read(0x4016)).collect();
        assert_eq!(pad1, vec![1, 0, 0, 0, 0, 0, 0, 0, 1]);
        let pad2: Vec<u8> = (0..3).map(|_| bus.read(0x4017)).collect();
        assert_eq!(pad2, vec![0, 1, 0]);
    }

    #[test]
    fn io_registers_read_back_last_write() {
        let mut bus = nrom_bus(&[]);
        bus.write(0x4000, 0x3F);
        bus.write(0x4015, 0x0F);
        assert_eq!(bus.read(0x4000), 0x3F);
        assert_eq!(bus.read(0x4015), 0x0F);
    }

    #[test]
    fn prg_rom_and_ram_through_mapper() {
        let mut bus = nrom_bus(&[0xEA, 0x4C]);
        assert_eq!(bus.read(0x8000), 0xEA);
        assert_eq!(bus.read(0xC001), 0x4C);
        bus.write(0x6000, 0x42);
        assert_eq!(bus.read(0x6000), 0x42);
        assert_eq!(bus.peek(0x6000), 0x42);
        assert_eq!(bus.read(0x5000), 0x00);
    }

    #[test]
    fn word_reads_and_page_wrap() {
        let mut bus = nrom_bus(&[]);
        bus.write(0x02FF, 0x34);
        bus.write(0x0300, 0x12);
        bus.write(0x0200, 0x56);
        assert_eq!(bus.read_word(0x02FF), 0x1234);
        assert_eq!(bus.read_word_page_wrapped(0x02FF), 0x5634);
        // Reset vector of the test cart
        assert_eq!(bus.read_word(0xFFFC), 0x8000);
    }

    #[test]
    fn oam_dma_copies_256_bytes() {
        let mut bus = nrom_bus(&[]);
        for i in 0..256u16 {
            bus.write(0x0200 + i, (i & 0xFF) as u8);
        }
        bus.write(0x2003, 0xFE);
        bus.write(0x4014, 0x02);

        let oam = |b: &Bus, i: u8| b.ppu.memory().oam(i);
        assert_eq!(oam(&bus, 0xFE), 0x00);
        assert_eq!(oam(&bus, 0xFF), 0x01);
        assert_eq!(oam(&bus, 0x00), 0x02);
        assert_eq!(oam(&bus, 0x01), 0x03);
    }

    #[test]
    fn oam_dma_stall_depends_on_cycle_parity() {
        let mut bus = nrom_bus(&[]);
        bus.set_cpu_cycle(100);
        bus.write(0x4014, 0x00);
        assert_eq!(bus.take_dma_stall(), 513);
        assert_eq!(bus.take_dma_stall(), 0);

        bus.set_cpu_cycle(101);
        bus.write(0x4014, 0x00);
        assert_eq!(bus.take_dma_stall(), 514);
    }

    #[test]
    fn nametable_horizontal_mirroring() {
        let mut bus = bus_from(&build_ines(1, 1, 0b0000_0000, 0, 1, None));
        set_ppu_addr(&mut bus, 0x2000);
        bus.write(0x2007, 0x55);

        set_ppu_addr(&mut bus, 0x2400);
        let _ = bus.read(0x2007); // buffered read
        assert_eq!(bus.read(0x2007), 0x55);
    }

    #[test]
    fn nametable_vertical_mirroring() {
        let mut bus = bus_from(&build_ines(1, 1, 0b0000_0001, 0, 1, None));
        set_ppu_addr(&mut bus, 0x2000);
        bus.write(0x2007, 0x66);

        set_ppu_addr(&mut bus, 0x2800);
        let _ = bus.read(0x2007);
        assert_eq!(bus.read(0x2007), 0x66);
    }

    #[test]
    fn palette_mirroring_3f10_mirrors_3f00() {
        let mut bus = nrom_bus(&[]);
        set_ppu_addr(&mut bus, 0x3F00);
        bus.write(0x2007, 0x12);

        set_ppu_addr(&mut bus, 0x3F10);
        assert_eq!(bus.read(0x2007), 0x12);
    }

    #[test]
    fn ppudata_buffered_read_and_increment_via_bus() {
        // CHR RAM cart
        let mut bus = nrom_bus(&[]);
        bus.write(0x2000, 0x00);
        set_ppu_addr(&mut bus, 0x0000);
        bus.write(0x2007, 0x11);
        bus.write(0x2007, 0x22);

        set_ppu_addr(&mut bus, 0x0000);
        assert_eq!(bus.read(0x2007), 0x00);
        assert_eq!(bus.read(0x2007), 0x11);
        assert_eq!(bus.read(0x2007), 0x22);
    }

    #[test]
    fn mmc3_dynamic_mirroring_vertical_then_horizontal() {
        let mut bus = bus_from(&build_banked_ines(4, 2, 1, 0, (0xE000, 0xE000, 0xE000)));

        bus.write(0xA000, 0x00);
        set_ppu_addr(&mut bus, 0x2005);
        bus.write(0x2007, 0x9A);
        set_ppu_addr(&mut bus, 0x2805);
        let _ = bus.read(0x2007);
        assert_eq!(
            bus.read(0x2007),
            0x9A,
            "Vertical mirroring: $2800 should mirror $2000"
        );

        bus.write(0xA000, 0x01);
        set_ppu_addr(&mut bus, 0x2005);
        bus.write(0x2007, 0x6E);
        set_ppu_addr(&mut bus, 0x2405);
        let _ = bus.read(0x2007);
        assert_eq!(
            bus.read(0x2007),
            0x6E,
            "Horizontal mirroring: $2400 should mirror $2000"
        );
    }

    #[test]
    fn reset_clears_ram_but_keeps_prg_ram() {
        let mut bus = nrom_bus(&[]);
        bus.write(0x0010, 0x77);
        bus.write(0x6010, 0x88);
        bus.reset();
        assert_eq!(bus.read(0x0010), 0x00);
        assert_eq!(bus.read(0x6010), 0x88);
    }
}
