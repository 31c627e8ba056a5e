/*!
addressing.rs - 6502 addressing modes and effective address resolution.

`resolve` runs with PC still pointing at the opcode; operand bytes are read
from PC+1 and PC+2. It never advances PC, applies cycle penalties or touches
registers; the core does that from the returned `Operand`.

Modes
=====
- Immediate: the effective address is PC+1 itself.
- ZeroPage,X / ZeroPage,Y and (zp,X): index wraps inside page 0.
- (zp),Y: pointer read from page 0 (wrapping), then + Y.
- Indirect (JMP only): pointer high byte does not carry into the next page
  ($xxFF pairs with $xx00).
- Relative: target = address after the branch + signed offset.

`page_crossed` is set when indexing changes the high byte (Absolute,X,
Absolute,Y, (zp),Y) and, for Relative, when the target lies on a different
page than the next instruction.
*/

use crate::bus::Bus;
use crate::cpu::state::CpuState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
}

impl AddressMode {
    /// Encoded instruction length in bytes, opcode included.
    pub const fn len(self) -> u16 {
        use AddressMode::*;
        match self {
            Implied | Accumulator => 1,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | Relative | IndirectX | IndirectY => 2,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 3,
        }
    }
}

/// Resolved operand of the instruction at PC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operand {
    pub mode: AddressMode,
    pub addr: u16,
    pub page_crossed: bool,
}

#[inline]
fn crosses(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

#[inline]
fn read_u16(bus: &mut Bus, addr: u16) -> u16 {
    bus.read_word(addr)
}

/// Zero-page pointer whose high byte wraps to $00.
#[inline]
fn read_zp_pointer(bus: &mut Bus, zp: u8) -> u16 {
    let lo = bus.read(zp as u16) as u16;
    let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

pub fn resolve(mode: AddressMode, state: &CpuState, bus: &mut Bus) -> Operand {
    use AddressMode::*;
    let arg = state.pc.wrapping_add(1);
    let (addr, page_crossed) = match mode {
        Implied | Accumulator => (0, false),
        Immediate => (arg, false),
        ZeroPage => (bus.read(arg) as u16, false),
        ZeroPageX => (bus.read(arg).wrapping_add(state.x) as u16, false),
        ZeroPageY => (bus.read(arg).wrapping_add(state.y) as u16, false),
        Relative => {
            let offset = bus.read(arg) as i8;
            let next = state.pc.wrapping_add(2);
            let target = next.wrapping_add_signed(offset as i16);
            (target, crosses(next, target))
        }
        Absolute => (read_u16(bus, arg), false),
        AbsoluteX => {
            let base = read_u16(bus, arg);
            let addr = base.wrapping_add(state.x as u16);
            (addr, crosses(base, addr))
        }
        AbsoluteY => {
            let base = read_u16(bus, arg);
            let addr = base.wrapping_add(state.y as u16);
            (addr, crosses(base, addr))
        }
        Indirect => {
            let ptr = read_u16(bus, arg);
            (bus.read_word_page_wrapped(ptr), false)
        }
        IndirectX => {
            let zp = bus.read(arg).wrapping_add(state.x);
            (read_zp_pointer(bus, zp), false)
        }
        IndirectY => {
            let zp = bus.read(arg);
            let base = read_zp_pointer(bus, zp);
            let addr = base.wrapping_add(state.y as u16);
            (addr, crosses(base, addr))
        }
    };
    Operand {
        mode,
        addr,
        page_crossed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ram_program_bus;

    fn state_at(pc: u16) -> CpuState {
        CpuState {
            pc,
            ..CpuState::new()
        }
    }

    #[test]
    fn lengths() {
        assert_eq!(AddressMode::Implied.len(), 1);
        assert_eq!(AddressMode::IndirectY.len(), 2);
        assert_eq!(AddressMode::Indirect.len(), 3);
    }

    #[test]
    fn abs_x_page_cross_detection() {
        let mut bus = ram_program_bus(0x0200, &[0xBD, 0xF5, 0x80]);
        let mut state = state_at(0x0200);
        state.x = 0x10;
        let op = resolve(AddressMode::AbsoluteX, &state, &mut bus);
        assert_eq!(op.addr, 0x8105);
        assert!(op.page_crossed);

        state.x = 0x0A;
        let op = resolve(AddressMode::AbsoluteX, &state, &mut bus);
        assert_eq!(op.addr, 0x80FF);
        assert!(!op.page_crossed);
    }

    #[test]
    fn zero_page_index_wraps() {
        let mut bus = ram_program_bus(0x0200, &[0xB5, 0xF0]);
        let mut state = state_at(0x0200);
        state.x = 0x20;
        let op = resolve(AddressMode::ZeroPageX, &state, &mut bus);
        assert_eq!(op.addr, 0x0010);
        assert!(!op.page_crossed);
    }

    #[test]
    fn indirect_x_pointer_wraps_in_page_zero() {
        let mut bus = ram_program_bus(0x0200, &[0xA1, 0xFE]);
        bus.write(0x00FF, 0x34);
        bus.write(0x0000, 0x12);
        let mut state = state_at(0x0200);
        state.x = 0x01;
        assert_eq!(resolve(AddressMode::IndirectX, &state, &mut bus).addr, 0x1234);
    }

    #[test]
    fn indirect_y_adds_after_dereference() {
        let mut bus = ram_program_bus(0x0200, &[0xB1, 0x40]);
        bus.write(0x0040, 0xF0);
        bus.write(0x0041, 0x03);
        let mut state = state_at(0x0200);
        state.y = 0x20;
        let op = resolve(AddressMode::IndirectY, &state, &mut bus);
        assert_eq!(op.addr, 0x0410);
        assert!(op.page_crossed);
    }

    #[test]
    fn indirect_jmp_bug() {
        let mut bus = ram_program_bus(0x0200, &[0x6C, 0xFF, 0x10]);
        bus.write(0x10FF, 0x34);
        bus.write(0x1000, 0x12);
        bus.write(0x1100, 0x56);
        let op = resolve(AddressMode::Indirect, &state_at(0x0200), &mut bus);
        assert_eq!(op.addr, 0x1234);
    }

    #[test]
    fn relative_targets_and_crossing() {
        let mut bus = ram_program_bus(0x02F0, &[0xD0, 0x10]);
        let op = resolve(AddressMode::Relative, &state_at(0x02F0), &mut bus);
        assert_eq!(op.addr, 0x0302);
        assert!(op.page_crossed);

        let mut bus = ram_program_bus(0x0280, &[0xD0, 0xFC]);
        let op = resolve(AddressMode::Relative, &state_at(0x0280), &mut bus);
        assert_eq!(op.addr, 0x027E);
        assert!(!op.page_crossed);
    }

    #[test]
    fn immediate_points_at_operand_byte() {
        let mut bus = ram_program_bus(0x0200, &[0xA9, 0x42]);
        let op = resolve(AddressMode::Immediate, &state_at(0x0200), &mut bus);
        assert_eq!(op.addr, 0x0201);
        assert_eq!(bus.read(op.addr), 0x42);
    }
}
