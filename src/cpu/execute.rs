/*!
execute.rs - 6502 instruction semantics.

Every operation has the shape `fn(&mut CpuState, &mut Bus, &Operand) -> u32`
and returns the cycles it adds on top of the table's base cost (only taken
branches add any). PC has already been advanced past the instruction when
these run, so control-flow ops see the address of the next instruction.

Accumulator-mode shifts and rotates read and write A; every other mode goes
through the bus at the resolved address.
*/

use crate::bus::Bus;
use crate::cpu::addressing::{AddressMode, Operand};
use crate::cpu::state::{CpuState, StatusFlags};

const IRQ_VECTOR: u16 = 0xFFFE;

// ---------------------------------------------------------------------------
// Operand access
// ---------------------------------------------------------------------------

#[inline]
fn load(state: &CpuState, bus: &mut Bus, op: &Operand) -> u8 {
    match op.mode {
        AddressMode::Accumulator => state.a,
        _ => bus.read(op.addr),
    }
}

#[inline]
fn store(state: &mut CpuState, bus: &mut Bus, op: &Operand, value: u8) {
    match op.mode {
        AddressMode::Accumulator => state.a = value,
        _ => bus.write(op.addr, value),
    }
}

// ---------------------------------------------------------------------------
// Loads, stores, transfers
// ---------------------------------------------------------------------------

pub(crate) fn lda(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    state.a = load(state, bus, op);
    state.update_zn(state.a);
    0
}

pub(crate) fn ldx(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    state.x = load(state, bus, op);
    state.update_zn(state.x);
    0
}

pub(crate) fn ldy(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    state.y = load(state, bus, op);
    state.update_zn(state.y);
    0
}

pub(crate) fn sta(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    bus.write(op.addr, state.a);
    0
}

pub(crate) fn stx(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    bus.write(op.addr, state.x);
    0
}

pub(crate) fn sty(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    bus.write(op.addr, state.y);
    0
}

pub(crate) fn tax(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.x = state.a;
    state.update_zn(state.x);
    0
}

pub(crate) fn tay(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.y = state.a;
    state.update_zn(state.y);
    0
}

pub(crate) fn txa(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.a = state.x;
    state.update_zn(state.a);
    0
}

pub(crate) fn tya(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.a = state.y;
    state.update_zn(state.a);
    0
}

pub(crate) fn tsx(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.x = state.sp;
    state.update_zn(state.x);
    0
}

// TXS leaves the flags alone.
pub(crate) fn txs(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.sp = state.x;
    0
}

// ---------------------------------------------------------------------------
// Arithmetic and logic
// ---------------------------------------------------------------------------

/// Binary add of `value` and carry into A; decimal mode is ignored.
pub(crate) fn add_with_carry(state: &mut CpuState, value: u8) {
    let a = state.a;
    let sum = a as u16 + value as u16 + state.p.carry as u16;
    let result = sum as u8;
    state.p.carry = sum > 0xFF;
    state.p.overflow = (!(a ^ value) & (a ^ result) & 0x80) != 0;
    state.a = result;
    state.update_zn(result);
}

pub(crate) fn adc(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    add_with_carry(state, value);
    0
}

pub(crate) fn sbc(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    add_with_carry(state, !value);
    0
}

pub(crate) fn and(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    state.a &= load(state, bus, op);
    state.update_zn(state.a);
    0
}

pub(crate) fn ora(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    state.a |= load(state, bus, op);
    state.update_zn(state.a);
    0
}

pub(crate) fn eor(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    state.a ^= load(state, bus, op);
    state.update_zn(state.a);
    0
}

pub(crate) fn bit(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    state.p.zero = state.a & value == 0;
    state.p.overflow = value & 0x40 != 0;
    state.p.negative = value & 0x80 != 0;
    0
}

fn compare(state: &mut CpuState, register: u8, value: u8) {
    state.p.carry = register >= value;
    state.update_zn(register.wrapping_sub(value));
}

pub(crate) fn cmp(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    compare(state, state.a, value);
    0
}

pub(crate) fn cpx(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    compare(state, state.x, value);
    0
}

pub(crate) fn cpy(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    compare(state, state.y, value);
    0
}

// ---------------------------------------------------------------------------
// Increments and decrements
// ---------------------------------------------------------------------------

pub(crate) fn inc(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op).wrapping_add(1);
    store(state, bus, op, value);
    state.update_zn(value);
    0
}

pub(crate) fn dec(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op).wrapping_sub(1);
    store(state, bus, op, value);
    state.update_zn(value);
    0
}

pub(crate) fn inx(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.x = state.x.wrapping_add(1);
    state.update_zn(state.x);
    0
}

pub(crate) fn iny(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.y = state.y.wrapping_add(1);
    state.update_zn(state.y);
    0
}

pub(crate) fn dex(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.x = state.x.wrapping_sub(1);
    state.update_zn(state.x);
    0
}

pub(crate) fn dey(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.y = state.y.wrapping_sub(1);
    state.update_zn(state.y);
    0
}

// ---------------------------------------------------------------------------
// Shifts and rotates
// ---------------------------------------------------------------------------

pub(crate) fn asl(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    let result = value << 1;
    state.p.carry = value & 0x80 != 0;
    store(state, bus, op, result);
    state.update_zn(result);
    0
}

pub(crate) fn lsr(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    let result = value >> 1;
    state.p.carry = value & 0x01 != 0;
    store(state, bus, op, result);
    state.update_zn(result);
    0
}

pub(crate) fn rol(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    let result = (value << 1) | state.p.carry as u8;
    state.p.carry = value & 0x80 != 0;
    store(state, bus, op, result);
    state.update_zn(result);
    0
}

pub(crate) fn ror(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let value = load(state, bus, op);
    let result = (value >> 1) | ((state.p.carry as u8) << 7);
    state.p.carry = value & 0x01 != 0;
    store(state, bus, op, result);
    state.update_zn(result);
    0
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

/// +1 when taken, +1 more when the target is on another page.
#[inline]
fn branch(state: &mut CpuState, op: &Operand, taken: bool) -> u32 {
    if !taken {
        return 0;
    }
    state.pc = op.addr;
    1 + op.page_crossed as u32
}

pub(crate) fn bcc(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    branch(state, op, !state.p.carry)
}

pub(crate) fn bcs(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    branch(state, op, state.p.carry)
}

pub(crate) fn beq(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    branch(state, op, state.p.zero)
}

pub(crate) fn bne(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    branch(state, op, !state.p.zero)
}

pub(crate) fn bmi(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    branch(state, op, state.p.negative)
}

pub(crate) fn bpl(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    branch(state, op, !state.p.negative)
}

pub(crate) fn bvc(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    branch(state, op, !state.p.overflow)
}

pub(crate) fn bvs(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    branch(state, op, state.p.overflow)
}

// ---------------------------------------------------------------------------
// Jumps, subroutines, interrupts
// ---------------------------------------------------------------------------

pub(crate) fn jmp(state: &mut CpuState, _bus: &mut Bus, op: &Operand) -> u32 {
    state.pc = op.addr;
    0
}

pub(crate) fn jsr(state: &mut CpuState, bus: &mut Bus, op: &Operand) -> u32 {
    let ret = state.pc.wrapping_sub(1);
    state.push_u16(bus, ret);
    state.pc = op.addr;
    0
}

pub(crate) fn rts(state: &mut CpuState, bus: &mut Bus, _op: &Operand) -> u32 {
    state.pc = state.pop_u16(bus).wrapping_add(1);
    0
}

/// Software interrupt: pushes the address two past the opcode and P with B set.
pub(crate) fn brk(state: &mut CpuState, bus: &mut Bus, _op: &Operand) -> u32 {
    let ret = state.pc.wrapping_add(1);
    state.push_u16(bus, ret);
    let p = state.p.to_push_byte(true);
    state.push_u8(bus, p);
    state.p.interrupt_disable = true;
    state.pc = bus.read_word(IRQ_VECTOR);
    0
}

pub(crate) fn rti(state: &mut CpuState, bus: &mut Bus, _op: &Operand) -> u32 {
    let p = state.pop_u8(bus);
    state.p = StatusFlags::from_pulled_byte(p);
    state.pc = state.pop_u16(bus);
    0
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

pub(crate) fn pha(state: &mut CpuState, bus: &mut Bus, _op: &Operand) -> u32 {
    let a = state.a;
    state.push_u8(bus, a);
    0
}

pub(crate) fn php(state: &mut CpuState, bus: &mut Bus, _op: &Operand) -> u32 {
    let p = state.p.to_push_byte(true);
    state.push_u8(bus, p);
    0
}

pub(crate) fn pla(state: &mut CpuState, bus: &mut Bus, _op: &Operand) -> u32 {
    state.a = state.pop_u8(bus);
    state.update_zn(state.a);
    0
}

pub(crate) fn plp(state: &mut CpuState, bus: &mut Bus, _op: &Operand) -> u32 {
    let p = state.pop_u8(bus);
    state.p = StatusFlags::from_pulled_byte(p);
    0
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

pub(crate) fn clc(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.p.carry = false;
    0
}

pub(crate) fn sec(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.p.carry = true;
    0
}

pub(crate) fn cli(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.p.interrupt_disable = false;
    0
}

pub(crate) fn sei(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.p.interrupt_disable = true;
    0
}

pub(crate) fn cld(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.p.decimal = false;
    0
}

pub(crate) fn sed(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.p.decimal = true;
    0
}

pub(crate) fn clv(state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    state.p.overflow = false;
    0
}

pub(crate) fn nop(_state: &mut CpuState, _bus: &mut Bus, _op: &Operand) -> u32 {
    0
}
