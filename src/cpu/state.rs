/*!
state.rs - 6502 architectural state: registers, status flags and the stack.

Status register layout
======================
Bit: 7 6 5 4 3 2 1 0
     N V 1 B D I Z C

- Bit 5 has no storage and always reads as 1.
- B only exists on the stack: PHP and BRK push it set, IRQ and NMI push it
  clear, PLP and RTI discard it.
- D is stored and pushed but has no effect on ADC/SBC.

Stack
=====
Page 1 ($0100-$01FF). Push writes at $0100|S then decrements S; pull
increments S then reads. S wraps within the page.
*/

use crate::bus::Bus;

/// Processor status bit masks.
pub const CARRY: u8 = 0b0000_0001;
pub const ZERO: u8 = 0b0000_0010;
pub const IRQ_DISABLE: u8 = 0b0000_0100;
pub const DECIMAL: u8 = 0b0000_1000;
pub const BREAK: u8 = 0b0001_0000;
pub const UNUSED: u8 = 0b0010_0000;
pub const OVERFLOW: u8 = 0b0100_0000;
pub const NEGATIVE: u8 = 0b1000_0000;

/// The seven stored status flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub carry: bool,
    pub zero: bool,
    pub interrupt_disable: bool,
    pub decimal: bool,
    pub break_command: bool,
    pub overflow: bool,
    pub negative: bool,
}

impl StatusFlags {
    /// Encode as P with bit 5 forced on.
    pub fn to_byte(self) -> u8 {
        let mut p = UNUSED;
        for (on, mask) in [
            (self.carry, CARRY),
            (self.zero, ZERO),
            (self.interrupt_disable, IRQ_DISABLE),
            (self.decimal, DECIMAL),
            (self.break_command, BREAK),
            (self.overflow, OVERFLOW),
            (self.negative, NEGATIVE),
        ] {
            if on {
                p |= mask;
            }
        }
        p
    }

    pub fn from_byte(p: u8) -> Self {
        Self {
            carry: p & CARRY != 0,
            zero: p & ZERO != 0,
            interrupt_disable: p & IRQ_DISABLE != 0,
            decimal: p & DECIMAL != 0,
            break_command: p & BREAK != 0,
            overflow: p & OVERFLOW != 0,
            negative: p & NEGATIVE != 0,
        }
    }

    /// Byte pushed by PHP/BRK (`brk = true`) or by an IRQ/NMI entry.
    pub fn to_push_byte(self, brk: bool) -> u8 {
        let p = self.to_byte() & !BREAK;
        if brk { p | BREAK } else { p }
    }

    /// Decode a byte pulled by PLP/RTI; B is not restored.
    pub fn from_pulled_byte(p: u8) -> Self {
        Self {
            break_command: false,
            ..Self::from_byte(p)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub p: StatusFlags,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            p: StatusFlags {
                interrupt_disable: true,
                ..StatusFlags::default()
            },
        }
    }
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update_zn(&mut self, value: u8) {
        self.p.zero = value == 0;
        self.p.negative = value & 0x80 != 0;
    }

    // ---------------------------------------------------------------------
    // Stack
    // ---------------------------------------------------------------------

    #[inline]
    pub fn push_u8(&mut self, bus: &mut Bus, value: u8) {
        bus.write(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub fn pop_u8(&mut self, bus: &mut Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | self.sp as u16)
    }

    /// Push high byte first so the word reads back little-endian.
    #[inline]
    pub fn push_u16(&mut self, bus: &mut Bus, value: u16) {
        self.push_u8(bus, (value >> 8) as u8);
        self.push_u8(bus, value as u8);
    }

    #[inline]
    pub fn pop_u16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.pop_u8(bus) as u16;
        let hi = self.pop_u8(bus) as u16;
        (hi << 8) | lo
    }
}
