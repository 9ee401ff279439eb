//! Undocumented NMOS opcodes, executed under `IllegalOpcodePolicy::Emulate`.
//!
//! ANE and LXA depend on an analogue "magic" constant that varies between
//! chips; 0xEE matches the majority of tested parts.

use super::addressing::Access;
use super::{M6502, Mode, Op, OpcodeWord, StatusFlag};
use crate::core::Bus;

const MAGIC: u8 = 0xEE;

impl M6502 {
    // ---- Read-modify-write combinations ----

    /// SLO: ASL memory, then ORA.
    pub(crate) fn slo_value(&mut self, value: u8) -> u8 {
        let result = self.asl_value(value);
        self.perform_ora(result);
        result
    }

    /// RLA: ROL memory, then AND.
    pub(crate) fn rla_value(&mut self, value: u8) -> u8 {
        let result = self.rol_value(value);
        self.perform_and(result);
        result
    }

    /// SRE: LSR memory, then EOR.
    pub(crate) fn sre_value(&mut self, value: u8) -> u8 {
        let result = self.lsr_value(value);
        self.perform_eor(result);
        result
    }

    /// RRA: ROR memory, then ADC with the carry the rotate produced.
    pub(crate) fn rra_value(&mut self, value: u8) -> u8 {
        let result = self.ror_value(value);
        self.perform_adc(result);
        result
    }

    /// DCP: DEC memory, then CMP.
    pub(crate) fn dcp_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.perform_compare(self.a, result);
        result
    }

    /// ISC: INC memory, then SBC.
    pub(crate) fn isc_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.perform_sbc(result);
        result
    }

    // ---- Immediate combinations ----

    /// ANC: AND, then C = N.
    pub(crate) fn op_anc(&mut self, operand: u8) {
        self.perform_and(operand);
        self.set_flag(StatusFlag::C, self.a & 0x80 != 0);
    }

    /// ALR: AND, then LSR A.
    pub(crate) fn op_alr(&mut self, operand: u8) {
        let value = self.a & operand;
        self.a = self.lsr_value(value);
    }

    /// ARR: AND, then ROR A with ADC-like flags. In decimal mode the
    /// result gets a nibble-wise BCD fix-up.
    pub(crate) fn op_arr(&mut self, operand: u8) {
        let carry = self.flag(StatusFlag::C);
        let t = self.a & operand;
        let mut result = (t >> 1) | (carry as u8) << 7;

        if !self.flag(StatusFlag::D) {
            self.set_nz(result);
            self.set_flag(StatusFlag::C, result & 0x40 != 0);
            self.set_flag(StatusFlag::V, ((result >> 6) ^ (result >> 5)) & 1 != 0);
            self.a = result;
            return;
        }

        self.set_flag(StatusFlag::N, carry);
        self.set_flag(StatusFlag::Z, result == 0);
        self.set_flag(StatusFlag::V, (t ^ result) & 0x40 != 0);
        if (t & 0x0F) + (t & 0x01) > 0x05 {
            result = (result & 0xF0) | (result.wrapping_add(0x06) & 0x0F);
        }
        let high_fix = (t as u16 & 0xF0) + (t as u16 & 0x10) > 0x50;
        if high_fix {
            result = result.wrapping_add(0x60);
        }
        self.set_flag(StatusFlag::C, high_fix);
        self.a = result;
    }

    /// SBX: X = (A & X) - imm, carry as in CMP. Ignores D.
    pub(crate) fn op_sbx(&mut self, operand: u8) {
        let t = self.a & self.x;
        self.set_flag(StatusFlag::C, t >= operand);
        self.x = t.wrapping_sub(operand);
        self.set_nz(self.x);
    }

    /// ANE: A = (A | magic) & X & imm.
    pub(crate) fn op_ane(&mut self, operand: u8) {
        self.a = (self.a | MAGIC) & self.x & operand;
        self.set_nz(self.a);
    }

    /// LXA: A = X = (A | magic) & imm.
    pub(crate) fn op_lxa(&mut self, operand: u8) {
        self.a = (self.a | MAGIC) & operand;
        self.x = self.a;
        self.set_nz(self.a);
    }

    /// LAS: A = X = SP = M & SP.
    pub(crate) fn op_las(&mut self, value: u8) {
        let result = value & self.sp;
        self.a = result;
        self.x = result;
        self.sp = result;
        self.set_nz(result);
    }

    // ---- Unstable stores ----

    /// SHA/SHX/SHY/TAS: store `reg & (H + 1)` where H is the high byte of
    /// the base address. On a page crossing the stored value also replaces
    /// the high byte of the target address.
    pub(crate) fn op_unstable_store<B: Bus + ?Sized>(&mut self, bus: &mut B, op: Op, mode: Mode, word: OpcodeWord) {
        let (base, index) = match mode {
            Mode::IndirectY => (self.zp_pointer(bus, word.p1()), self.y),
            Mode::AbsoluteX => (word.p2(), self.x),
            _ => (word.p2(), self.y),
        };
        let (addr, crossed) = self.indexed(bus, base, index, Access::Write);
        let source = match op {
            Op::Shx => self.x,
            Op::Shy => self.y,
            Op::Tas => {
                self.sp = self.a & self.x;
                self.sp
            }
            _ => self.a & self.x,
        };
        let value = source & ((base >> 8) as u8).wrapping_add(1);
        let addr = if crossed {
            (value as u16) << 8 | (addr & 0x00FF)
        } else {
            addr
        };
        self.write(bus, addr, value);
    }
}
