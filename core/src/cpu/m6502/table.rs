//! Static per-opcode metadata: operation, addressing mode, base cycle count.
//!
//! Base cycles assume no page crossing and, for branches, branch not taken.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl Mode {
    /// Instruction length in bytes, opcode included.
    pub const fn len(self) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator => 1,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndirectX
            | Mode::IndirectY
            | Mode::Relative => 2,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 3,
        }
    }
}

#[rustfmt::skip]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Adc, Alr, Anc, And, Ane, Arr, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc,
    Bvs, Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dcp, Dec, Dex, Dey, Eor, Inc, Inx, Iny,
    Isc, Jam, Jmp, Jsr, Las, Lax, Lda, Ldx, Ldy, Lsr, Lxa, Nop, Ora, Pha, Php, Pla,
    Plp, Rla, Rol, Ror, Rra, Rti, Rts, Sax, Sbc, Sbx, Sec, Sed, Sei, Sha, Shx, Shy,
    Slo, Sre, Sta, Stx, Sty, Tas, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl Op {
    #[rustfmt::skip]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Op::Adc => "ADC", Op::Alr => "ALR", Op::Anc => "ANC", Op::And => "AND",
            Op::Ane => "ANE", Op::Arr => "ARR", Op::Asl => "ASL", Op::Bcc => "BCC",
            Op::Bcs => "BCS", Op::Beq => "BEQ", Op::Bit => "BIT", Op::Bmi => "BMI",
            Op::Bne => "BNE", Op::Bpl => "BPL", Op::Brk => "BRK", Op::Bvc => "BVC",
            Op::Bvs => "BVS", Op::Clc => "CLC", Op::Cld => "CLD", Op::Cli => "CLI",
            Op::Clv => "CLV", Op::Cmp => "CMP", Op::Cpx => "CPX", Op::Cpy => "CPY",
            Op::Dcp => "DCP", Op::Dec => "DEC", Op::Dex => "DEX", Op::Dey => "DEY",
            Op::Eor => "EOR", Op::Inc => "INC", Op::Inx => "INX", Op::Iny => "INY",
            Op::Isc => "ISC", Op::Jam => "JAM", Op::Jmp => "JMP", Op::Jsr => "JSR",
            Op::Las => "LAS", Op::Lax => "LAX", Op::Lda => "LDA", Op::Ldx => "LDX",
            Op::Ldy => "LDY", Op::Lsr => "LSR", Op::Lxa => "LXA", Op::Nop => "NOP",
            Op::Ora => "ORA", Op::Pha => "PHA", Op::Php => "PHP", Op::Pla => "PLA",
            Op::Plp => "PLP", Op::Rla => "RLA", Op::Rol => "ROL", Op::Ror => "ROR",
            Op::Rra => "RRA", Op::Rti => "RTI", Op::Rts => "RTS", Op::Sax => "SAX",
            Op::Sbc => "SBC", Op::Sbx => "SBX", Op::Sec => "SEC", Op::Sed => "SED",
            Op::Sei => "SEI", Op::Sha => "SHA", Op::Shx => "SHX", Op::Shy => "SHY",
            Op::Slo => "SLO", Op::Sre => "SRE", Op::Sta => "STA", Op::Stx => "STX",
            Op::Sty => "STY", Op::Tas => "TAS", Op::Tax => "TAX", Op::Tay => "TAY",
            Op::Tsx => "TSX", Op::Txa => "TXA", Op::Txs => "TXS", Op::Tya => "TYA",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpInfo {
    pub op: Op,
    pub mode: Mode,
    pub cycles: u8,
    /// Not part of the documented NMOS instruction set.
    pub illegal: bool,
}

impl OpInfo {
    pub const fn mnemonic(&self) -> &'static str {
        self.op.mnemonic()
    }

    pub const fn len(&self) -> u8 {
        self.mode.len()
    }
}

const fn d(op: Op, mode: Mode, cycles: u8) -> OpInfo {
    OpInfo { op, mode, cycles, illegal: false }
}

const fn u(op: Op, mode: Mode, cycles: u8) -> OpInfo {
    OpInfo { op, mode, cycles, illegal: true }
}

use Mode::{
    Absolute as ABS, AbsoluteX as ABX, AbsoluteY as ABY, Accumulator as ACC, Immediate as IMM,
    Implied as IMP, Indirect as IND, IndirectX as IZX, IndirectY as IZY, Relative as REL,
    ZeroPage as ZP, ZeroPageX as ZPX, ZeroPageY as ZPY,
};
use Op::*;

#[rustfmt::skip]
pub static OPCODES: [OpInfo; 256] = [
    // 0x00
    d(Brk, IMP, 7), d(Ora, IZX, 6), u(Jam, IMP, 2), u(Slo, IZX, 8),
    u(Nop, ZP, 3),  d(Ora, ZP, 3),  d(Asl, ZP, 5),  u(Slo, ZP, 5),
    d(Php, IMP, 3), d(Ora, IMM, 2), d(Asl, ACC, 2), u(Anc, IMM, 2),
    u(Nop, ABS, 4), d(Ora, ABS, 4), d(Asl, ABS, 6), u(Slo, ABS, 6),
    // 0x10
    d(Bpl, REL, 2), d(Ora, IZY, 5), u(Jam, IMP, 2), u(Slo, IZY, 8),
    u(Nop, ZPX, 4), d(Ora, ZPX, 4), d(Asl, ZPX, 6), u(Slo, ZPX, 6),
    d(Clc, IMP, 2), d(Ora, ABY, 4), u(Nop, IMP, 2), u(Slo, ABY, 7),
    u(Nop, ABX, 4), d(Ora, ABX, 4), d(Asl, ABX, 7), u(Slo, ABX, 7),
    // 0x20
    d(Jsr, ABS, 6), d(And, IZX, 6), u(Jam, IMP, 2), u(Rla, IZX, 8),
    d(Bit, ZP, 3),  d(And, ZP, 3),  d(Rol, ZP, 5),  u(Rla, ZP, 5),
    d(Plp, IMP, 4), d(And, IMM, 2), d(Rol, ACC, 2), u(Anc, IMM, 2),
    d(Bit, ABS, 4), d(And, ABS, 4), d(Rol, ABS, 6), u(Rla, ABS, 6),
    // 0x30
    d(Bmi, REL, 2), d(And, IZY, 5), u(Jam, IMP, 2), u(Rla, IZY, 8),
    u(Nop, ZPX, 4), d(And, ZPX, 4), d(Rol, ZPX, 6), u(Rla, ZPX, 6),
    d(Sec, IMP, 2), d(And, ABY, 4), u(Nop, IMP, 2), u(Rla, ABY, 7),
    u(Nop, ABX, 4), d(And, ABX, 4), d(Rol, ABX, 7), u(Rla, ABX, 7),
    // 0x40
    d(Rti, IMP, 6), d(Eor, IZX, 6), u(Jam, IMP, 2), u(Sre, IZX, 8),
    u(Nop, ZP, 3),  d(Eor, ZP, 3),  d(Lsr, ZP, 5),  u(Sre, ZP, 5),
    d(Pha, IMP, 3), d(Eor, IMM, 2), d(Lsr, ACC, 2), u(Alr, IMM, 2),
    d(Jmp, ABS, 3), d(Eor, ABS, 4), d(Lsr, ABS, 6), u(Sre, ABS, 6),
    // 0x50
    d(Bvc, REL, 2), d(Eor, IZY, 5), u(Jam, IMP, 2), u(Sre, IZY, 8),
    u(Nop, ZPX, 4), d(Eor, ZPX, 4), d(Lsr, ZPX, 6), u(Sre, ZPX, 6),
    d(Cli, IMP, 2), d(Eor, ABY, 4), u(Nop, IMP, 2), u(Sre, ABY, 7),
    u(Nop, ABX, 4), d(Eor, ABX, 4), d(Lsr, ABX, 7), u(Sre, ABX, 7),
    // 0x60
    d(Rts, IMP, 6), d(Adc, IZX, 6), u(Jam, IMP, 2), u(Rra, IZX, 8),
    u(Nop, ZP, 3),  d(Adc, ZP, 3),  d(Ror, ZP, 5),  u(Rra, ZP, 5),
    d(Pla, IMP, 4), d(Adc, IMM, 2), d(Ror, ACC, 2), u(Arr, IMM, 2),
    d(Jmp, IND, 5), d(Adc, ABS, 4), d(Ror, ABS, 6), u(Rra, ABS, 6),
    // 0x70
    d(Bvs, REL, 2), d(Adc, IZY, 5), u(Jam, IMP, 2), u(Rra, IZY, 8),
    u(Nop, ZPX, 4), d(Adc, ZPX, 4), d(Ror, ZPX, 6), u(Rra, ZPX, 6),
    d(Sei, IMP, 2), d(Adc, ABY, 4), u(Nop, IMP, 2), u(Rra, ABY, 7),
    u(Nop, ABX, 4), d(Adc, ABX, 4), d(Ror, ABX, 7), u(Rra, ABX, 7),
    // 0x80
    u(Nop, IMM, 2), d(Sta, IZX, 6), u(Nop, IMM, 2), u(Sax, IZX, 6),
    d(Sty, ZP, 3),  d(Sta, ZP, 3),  d(Stx, ZP, 3),  u(Sax, ZP, 3),
    d(Dey, IMP, 2), u(Nop, IMM, 2), d(Txa, IMP, 2), u(Ane, IMM, 2),
    d(Sty, ABS, 4), d(Sta, ABS, 4), d(Stx, ABS, 4), u(Sax, ABS, 4),
    // 0x90
    d(Bcc, REL, 2), d(Sta, IZY, 6), u(Jam, IMP, 2), u(Sha, IZY, 6),
    d(Sty, ZPX, 4), d(Sta, ZPX, 4), d(Stx, ZPY, 4), u(Sax, ZPY, 4),
    d(Tya, IMP, 2), d(Sta, ABY, 5), d(Txs, IMP, 2), u(Tas, ABY, 5),
    u(Shy, ABX, 5), d(Sta, ABX, 5), u(Shx, ABY, 5), u(Sha, ABY, 5),
    // 0xA0
    d(Ldy, IMM, 2), d(Lda, IZX, 6), d(Ldx, IMM, 2), u(Lax, IZX, 6),
    d(Ldy, ZP, 3),  d(Lda, ZP, 3),  d(Ldx, ZP, 3),  u(Lax, ZP, 3),
    d(Tay, IMP, 2), d(Lda, IMM, 2), d(Tax, IMP, 2), u(Lxa, IMM, 2),
    d(Ldy, ABS, 4), d(Lda, ABS, 4), d(Ldx, ABS, 4), u(Lax, ABS, 4),
    // 0xB0
    d(Bcs, REL, 2), d(Lda, IZY, 5), u(Jam, IMP, 2), u(Lax, IZY, 5),
    d(Ldy, ZPX, 4), d(Lda, ZPX, 4), d(Ldx, ZPY, 4), u(Lax, ZPY, 4),
    d(Clv, IMP, 2), d(Lda, ABY, 4), d(Tsx, IMP, 2), u(Las, ABY, 4),
    d(Ldy, ABX, 4), d(Lda, ABX, 4), d(Ldx, ABY, 4), u(Lax, ABY, 4),
    // 0xC0
    d(Cpy, IMM, 2), d(Cmp, IZX, 6), u(Nop, IMM, 2), u(Dcp, IZX, 8),
    d(Cpy, ZP, 3),  d(Cmp, ZP, 3),  d(Dec, ZP, 5),  u(Dcp, ZP, 5),
    d(Iny, IMP, 2), d(Cmp, IMM, 2), d(Dex, IMP, 2), u(Sbx, IMM, 2),
    d(Cpy, ABS, 4), d(Cmp, ABS, 4), d(Dec, ABS, 6), u(Dcp, ABS, 6),
    // 0xD0
    d(Bne, REL, 2), d(Cmp, IZY, 5), u(Jam, IMP, 2), u(Dcp, IZY, 8),
    u(Nop, ZPX, 4), d(Cmp, ZPX, 4), d(Dec, ZPX, 6), u(Dcp, ZPX, 6),
    d(Cld, IMP, 2), d(Cmp, ABY, 4), u(Nop, IMP, 2), u(Dcp, ABY, 7),
    u(Nop, ABX, 4), d(Cmp, ABX, 4), d(Dec, ABX, 7), u(Dcp, ABX, 7),
    // 0xE0
    d(Cpx, IMM, 2), d(Sbc, IZX, 6), u(Nop, IMM, 2), u(Isc, IZX, 8),
    d(Cpx, ZP, 3),  d(Sbc, ZP, 3),  d(Inc, ZP, 5),  u(Isc, ZP, 5),
    d(Inx, IMP, 2), d(Sbc, IMM, 2), d(Nop, IMP, 2), u(Sbc, IMM, 2),
    d(Cpx, ABS, 4), d(Sbc, ABS, 4), d(Inc, ABS, 6), u(Isc, ABS, 6),
    // 0xF0
    d(Beq, REL, 2), d(Sbc, IZY, 5), u(Jam, IMP, 2), u(Isc, IZY, 8),
    u(Nop, ZPX, 4), d(Sbc, ZPX, 4), d(Inc, ZPX, 6), u(Isc, ZPX, 6),
    d(Sed, IMP, 2), d(Sbc, ABY, 4), u(Nop, IMP, 2), u(Isc, ABY, 7),
    u(Nop, ABX, 4), d(Sbc, ABX, 4), d(Inc, ABX, 7), u(Isc, ABX, 7),
];

/// Whether the fetch unit has to read (and charge a cycle for) the byte
/// at PC+2.
#[inline]
pub fn needs_third_byte(opcode: u8) -> bool {
    OPCODES[opcode as usize].mode.len() == 3
}
