/*!
core::Cpu - instruction stepping on top of `CpuState`.

`tick` runs one unit of CPU work and returns the cycles it consumed:

1. Idle cycles (OAM DMA stall collected from the bus, or `add_idle_cycles`)
   are burned one per call without fetching.
2. A latched NMI, else a latched IRQ, is serviced: push PC and P (B clear),
   set I, load PC from $FFFA / $FFFE. 7 cycles.
3. Otherwise the opcode at PC is decoded, its operand resolved, PC advanced
   by the encoded length and the operation run. Cost = base + extra
   (taken branches) + 1 when a read-class access crosses a page.

IRQ is only latched while I is clear at the moment it is raised; NMI is
always latched. Undocumented opcodes stop execution with
`CpuError::IllegalOpcode`, leaving PC on the opcode.
*/

use std::fmt;

use crate::bus::Bus;
use crate::cpu::CpuError;
use crate::cpu::addressing::resolve;
use crate::cpu::state::{CpuState, StatusFlags};
use crate::cpu::table::decode;

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles taken by reset and by interrupt entry.
pub const INTERRUPT_CYCLES: u32 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    Nmi,
    Irq,
}

#[derive(Debug, Clone)]
pub struct Cpu {
    state: CpuState,
    cycles: u64,
    idle_cycles: u32,
    nmi_pending: bool,
    irq_pending: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            state: CpuState::new(),
            cycles: 0,
            idle_cycles: 0,
            nmi_pending: false,
            irq_pending: false,
        }
    }

    /// Power-up state: A=X=Y=0, S=$FD, P=$24, PC from the reset vector,
    /// cycle counter at 7.
    pub fn reset(&mut self, bus: &mut Bus) {
        self.state = CpuState::new();
        self.state.pc = bus.read_word(RESET_VECTOR);
        self.cycles = INTERRUPT_CYCLES as u64;
        self.idle_cycles = 0;
        self.nmi_pending = false;
        self.irq_pending = false;
        log::debug!("CPU reset, PC=${:04X}", self.state.pc);
    }

    pub fn trigger_interrupt(&mut self, interrupt: Interrupt) {
        match interrupt {
            Interrupt::Nmi => self.nmi_pending = true,
            Interrupt::Irq => {
                if !self.state.p.interrupt_disable {
                    self.irq_pending = true;
                }
            }
        }
    }

    /// Stall the CPU for `n` cycles before the next fetch.
    pub fn add_idle_cycles(&mut self, n: u32) {
        self.idle_cycles += n;
    }

    pub fn tick(&mut self, bus: &mut Bus) -> Result<u32, CpuError> {
        self.idle_cycles += bus.take_dma_stall();
        if self.idle_cycles > 0 {
            self.idle_cycles -= 1;
            self.cycles += 1;
            return Ok(1);
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            return Ok(self.enter_interrupt(bus, NMI_VECTOR));
        }
        if self.irq_serviceable() {
            self.irq_pending = false;
            return Ok(self.enter_interrupt(bus, IRQ_VECTOR));
        }

        let pc = self.state.pc;
        let opcode = bus.read(pc);
        let instruction = decode(opcode).ok_or(CpuError::IllegalOpcode { opcode, pc })?;

        bus.set_cpu_cycle(self.cycles);
        let operand = resolve(instruction.mode, &self.state, bus);
        self.state.pc = pc.wrapping_add(instruction.mode.len());
        let extra = (instruction.exec)(&mut self.state, bus, &operand);

        let penalty = (instruction.page_penalty && operand.page_crossed) as u32;
        let total = instruction.cycles as u32 + extra + penalty;
        self.cycles += total as u64;
        Ok(total)
    }

    fn enter_interrupt(&mut self, bus: &mut Bus, vector: u16) -> u32 {
        let pc = self.state.pc;
        self.state.push_u16(bus, pc);
        let p = self.state.p.to_push_byte(false);
        self.state.push_u8(bus, p);
        self.state.p.interrupt_disable = true;
        self.state.pc = bus.read_word(vector);
        self.cycles += INTERRUPT_CYCLES as u64;
        INTERRUPT_CYCLES
    }

    /// True when the next `tick` will fetch an instruction rather than idle
    /// or enter an interrupt.
    pub fn fetches_next(&self, bus: &Bus) -> bool {
        self.idle_cycles == 0
            && !bus.dma_stall_pending()
            && !self.nmi_pending
            && !self.irq_serviceable()
    }

    // A latched IRQ stays pending while I is set.
    fn irq_serviceable(&self) -> bool {
        self.irq_pending && !self.state.p.interrupt_disable
    }

    /// Snapshot of the instruction about to execute, read without side effects.
    pub fn trace(&self, bus: &Bus) -> TraceLine {
        let pc = self.state.pc;
        let opcode = bus.peek(pc);
        let (mnemonic, len) = match decode(opcode) {
            Some(ins) => (ins.mnemonic, ins.mode.len()),
            None => ("???", 1),
        };
        TraceLine {
            pc,
            bytes: (0..len).map(|i| bus.peek(pc.wrapping_add(i))).collect(),
            mnemonic,
            a: self.state.a,
            x: self.state.x,
            y: self.state.y,
            p: self.state.p.to_byte(),
            sp: self.state.sp,
            cycles: self.cycles,
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Total CPU cycles since power-up (reset counts as 7).
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    pub fn a(&self) -> u8 {
        self.state.a
    }
    pub fn x(&self) -> u8 {
        self.state.x
    }
    pub fn y(&self) -> u8 {
        self.state.y
    }
    pub fn sp(&self) -> u8 {
        self.state.sp
    }
    pub fn pc(&self) -> u16 {
        self.state.pc
    }
    pub fn set_pc(&mut self, pc: u16) {
        self.state.pc = pc;
    }
    pub fn flags(&self) -> StatusFlags {
        self.state.p
    }
    /// P as it would read back (bit 5 set).
    pub fn status(&self) -> u8 {
        self.state.p.to_byte()
    }
}

/// One line of an execution log: the registers before an instruction runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    pub pc: u16,
    pub bytes: Vec<u8>,
    pub mnemonic: &'static str,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
    pub cycles: u64,
}

impl fmt::Display for TraceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self
            .bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            f,
            "{:04X}  {:<8}  {:<4} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc, bytes, self.mnemonic, self.a, self.x, self.y, self.p, self.sp, self.cycles
        )
    }
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------
