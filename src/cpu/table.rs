/*!
table.rs - Opcode table for the 151 documented 6502 instructions.

Each entry carries the mnemonic, addressing mode, base cycle cost, whether
the page-crossing penalty applies, and the function implementing it. The
table is a `static` built in a `const` block; unused opcodes stay `None` and
are reported by the core as illegal.

Page penalty
============
Only read-class instructions (ADC AND CMP EOR LDA LDX LDY ORA SBC) in
Absolute,X / Absolute,Y / (zp),Y pay +1 on a page cross. Stores and
read-modify-write instructions have the worst case folded into their base.
*/

use crate::bus::Bus;
use crate::cpu::addressing::{AddressMode, Operand};
use crate::cpu::execute::*;
use crate::cpu::state::CpuState;

pub type ExecFn = fn(&mut CpuState, &mut Bus, &Operand) -> u32;

#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub mode: AddressMode,
    pub cycles: u8,
    pub page_penalty: bool,
    pub exec: ExecFn,
}

/// Table entry for `opcode`, `None` for undocumented opcodes.
#[inline]
pub fn decode(opcode: u8) -> Option<&'static Instruction> {
    OPCODES[opcode as usize].as_ref()
}

type Table = [Option<Instruction>; 256];

const fn op(mnemonic: &'static str, mode: AddressMode, cycles: u8, exec: ExecFn) -> Option<Instruction> {
    Some(Instruction {
        mnemonic,
        mode,
        cycles,
        page_penalty: false,
        exec,
    })
}

/// Read-class entry that pays the page-crossing penalty.
const fn read(mnemonic: &'static str, mode: AddressMode, cycles: u8, exec: ExecFn) -> Option<Instruction> {
    Some(Instruction {
        mnemonic,
        mode,
        cycles,
        page_penalty: true,
        exec,
    })
}

/// The eight-mode ALU column (ORA AND EOR ADC LDA CMP SBC share the layout).
const fn alu_group(t: &mut Table, base: u8, mnemonic: &'static str, exec: ExecFn) {
    use AddressMode::*;
    t[(base | 0x09) as usize] = op(mnemonic, Immediate, 2, exec);
    t[(base | 0x05) as usize] = op(mnemonic, ZeroPage, 3, exec);
    t[(base | 0x15) as usize] = op(mnemonic, ZeroPageX, 4, exec);
    t[(base | 0x0D) as usize] = op(mnemonic, Absolute, 4, exec);
    t[(base | 0x1D) as usize] = read(mnemonic, AbsoluteX, 4, exec);
    t[(base | 0x19) as usize] = read(mnemonic, AbsoluteY, 4, exec);
    t[(base | 0x01) as usize] = op(mnemonic, IndirectX, 6, exec);
    t[(base | 0x11) as usize] = read(mnemonic, IndirectY, 5, exec);
}

/// Accumulator / memory shift column (ASL ROL LSR ROR).
const fn shift_group(t: &mut Table, base: u8, mnemonic: &'static str, exec: ExecFn) {
    use AddressMode::*;
    t[(base | 0x0A) as usize] = op(mnemonic, Accumulator, 2, exec);
    t[(base | 0x06) as usize] = op(mnemonic, ZeroPage, 5, exec);
    t[(base | 0x16) as usize] = op(mnemonic, ZeroPageX, 6, exec);
    t[(base | 0x0E) as usize] = op(mnemonic, Absolute, 6, exec);
    t[(base | 0x1E) as usize] = op(mnemonic, AbsoluteX, 7, exec);
}

pub static OPCODES: Table = {
    use AddressMode::*;
    let mut t: Table = [None; 256];

    alu_group(&mut t, 0x00, "ORA", ora);
    alu_group(&mut t, 0x20, "AND", and);
    alu_group(&mut t, 0x40, "EOR", eor);
    alu_group(&mut t, 0x60, "ADC", adc);
    alu_group(&mut t, 0xA0, "LDA", lda);
    alu_group(&mut t, 0xC0, "CMP", cmp);
    alu_group(&mut t, 0xE0, "SBC", sbc);

    // STA: same layout, no immediate, fixed cost
    t[0x85] = op("STA", ZeroPage, 3, sta);
    t[0x95] = op("STA", ZeroPageX, 4, sta);
    t[0x8D] = op("STA", Absolute, 4, sta);
    t[0x9D] = op("STA", AbsoluteX, 5, sta);
    t[0x99] = op("STA", AbsoluteY, 5, sta);
    t[0x81] = op("STA", IndirectX, 6, sta);
    t[0x91] = op("STA", IndirectY, 6, sta);

    shift_group(&mut t, 0x00, "ASL", asl);
    shift_group(&mut t, 0x20, "ROL", rol);
    shift_group(&mut t, 0x40, "LSR", lsr);
    shift_group(&mut t, 0x60, "ROR", ror);

    // LDX / LDY
    t[0xA2] = op("LDX", Immediate, 2, ldx);
    t[0xA6] = op("LDX", ZeroPage, 3, ldx);
    t[0xB6] = op("LDX", ZeroPageY, 4, ldx);
    t[0xAE] = op("LDX", Absolute, 4, ldx);
    t[0xBE] = read("LDX", AbsoluteY, 4, ldx);
    t[0xA0] = op("LDY", Immediate, 2, ldy);
    t[0xA4] = op("LDY", ZeroPage, 3, ldy);
    t[0xB4] = op("LDY", ZeroPageX, 4, ldy);
    t[0xAC] = op("LDY", Absolute, 4, ldy);
    t[0xBC] = read("LDY", AbsoluteX, 4, ldy);

    // STX / STY
    t[0x86] = op("STX", ZeroPage, 3, stx);
    t[0x96] = op("STX", ZeroPageY, 4, stx);
    t[0x8E] = op("STX", Absolute, 4, stx);
    t[0x84] = op("STY", ZeroPage, 3, sty);
    t[0x94] = op("STY", ZeroPageX, 4, sty);
    t[0x8C] = op("STY", Absolute, 4, sty);

    // CPX / CPY / BIT
    t[0xE0] = op("CPX", Immediate, 2, cpx);
    t[0xE4] = op("CPX", ZeroPage, 3, cpx);
    t[0xEC] = op("CPX", Absolute, 4, cpx);
    t[0xC0] = op("CPY", Immediate, 2, cpy);
    t[0xC4] = op("CPY", ZeroPage, 3, cpy);
    t[0xCC] = op("CPY", Absolute, 4, cpy);
    t[0x24] = op("BIT", ZeroPage, 3, bit);
    t[0x2C] = op("BIT", Absolute, 4, bit);

    // INC / DEC memory
    t[0xE6] = op("INC", ZeroPage, 5, inc);
    t[0xF6] = op("INC", ZeroPageX, 6, inc);
    t[0xEE] = op("INC", Absolute, 6, inc);
    t[0xFE] = op("INC", AbsoluteX, 7, inc);
    t[0xC6] = op("DEC", ZeroPage, 5, dec);
    t[0xD6] = op("DEC", ZeroPageX, 6, dec);
    t[0xCE] = op("DEC", Absolute, 6, dec);
    t[0xDE] = op("DEC", AbsoluteX, 7, dec);

    // Register increments / transfers
    t[0xE8] = op("INX", Implied, 2, inx);
    t[0xC8] = op("INY", Implied, 2, iny);
    t[0xCA] = op("DEX", Implied, 2, dex);
    t[0x88] = op("DEY", Implied, 2, dey);
    t[0xAA] = op("TAX", Implied, 2, tax);
    t[0xA8] = op("TAY", Implied, 2, tay);
    t[0x8A] = op("TXA", Implied, 2, txa);
    t[0x98] = op("TYA", Implied, 2, tya);
    t[0xBA] = op("TSX", Implied, 2, tsx);
    t[0x9A] = op("TXS", Implied, 2, txs);

    // Branches
    t[0x10] = op("BPL", Relative, 2, bpl);
    t[0x30] = op("BMI", Relative, 2, bmi);
    t[0x50] = op("BVC", Relative, 2, bvc);
    t[0x70] = op("BVS", Relative, 2, bvs);
    t[0x90] = op("BCC", Relative, 2, bcc);
    t[0xB0] = op("BCS", Relative, 2, bcs);
    t[0xD0] = op("BNE", Relative, 2, bne);
    t[0xF0] = op("BEQ", Relative, 2, beq);

    // Control flow
    t[0x4C] = op("JMP", Absolute, 3, jmp);
    t[0x6C] = op("JMP", Indirect, 5, jmp);
    t[0x20] = op("JSR", Absolute, 6, jsr);
    t[0x60] = op("RTS", Implied, 6, rts);
    t[0x00] = op("BRK", Implied, 7, brk);
    t[0x40] = op("RTI", Implied, 6, rti);

    // Stack
    t[0x48] = op("PHA", Implied, 3, pha);
    t[0x08] = op("PHP", Implied, 3, php);
    t[0x68] = op("PLA", Implied, 4, pla);
    t[0x28] = op("PLP", Implied, 4, plp);

    // Flags
    t[0x18] = op("CLC", Implied, 2, clc);
    t[0x38] = op("SEC", Implied, 2, sec);
    t[0x58] = op("CLI", Implied, 2, cli);
    t[0x78] = op("SEI", Implied, 2, sei);
    t[0xD8] = op("CLD", Implied, 2, cld);
    t[0xF8] = op("SED", Implied, 2, sed);
    t[0xB8] = op("CLV", Implied, 2, clv);

    t[0xEA] = op("NOP", Implied, 2, nop);

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_opcode_count() {
        assert_eq!(OPCODES.iter().flatten().count(), 151);
    }

    #[test]
    fn sample_entries() {
        let lda = decode(0xB1).expect("LDA (zp),Y");
        assert_eq!(lda.mnemonic, "LDA");
        assert_eq!(lda.mode, AddressMode::IndirectY);
        assert_eq!(lda.cycles, 5);
        assert!(lda.page_penalty);

        let sta = decode(0x9D).expect("STA abs,X");
        assert_eq!(sta.cycles, 5);
        assert!(!sta.page_penalty);

        let asl = decode(0x0A).expect("ASL A");
        assert_eq!(asl.mode, AddressMode::Accumulator);

        assert!(decode(0x02).is_none());
        assert!(decode(0x89).is_none(), "no STA immediate");
    }

    #[test]
    fn penalty_only_on_read_class() {
        const READS: [&str; 9] = ["ADC", "AND", "CMP", "EOR", "LDA", "LDX", "LDY", "ORA", "SBC"];
        for ins in OPCODES.iter().flatten() {
            let indexed = matches!(
                ins.mode,
                AddressMode::AbsoluteX | AddressMode::AbsoluteY | AddressMode::IndirectY
            );
            let expected = indexed && READS.contains(&ins.mnemonic);
            assert_eq!(ins.page_penalty, expected, "{} {:?}", ins.mnemonic, ins.mode);
        }
    }
}
