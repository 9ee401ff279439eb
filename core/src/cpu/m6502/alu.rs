use super::{M6502, StatusFlag};

impl M6502 {
    // ---- Flag helpers ----

    /// Set N, Z flags from result (for loads, transfers, logical ops).
    #[inline]
    pub(crate) fn set_nz(&mut self, result: u8) {
        self.set_flag(StatusFlag::N, result & 0x80 != 0);
        self.set_flag(StatusFlag::Z, result == 0);
    }

    /// Set N, Z, C flags for shift/rotate operations.
    #[inline]
    pub(crate) fn set_flags_shift(&mut self, result: u8, carry: bool) {
        self.set_nz(result);
        self.set_flag(StatusFlag::C, carry);
    }

    #[inline]
    fn carry_in(&self) -> u8 {
        self.flag(StatusFlag::C) as u8
    }

    // ---- ALU operations ----

    /// ADC. Binary: A = A + M + C.
    /// Decimal (NMOS): N and V come from the half-corrected sum, Z from the
    /// binary sum, C from the fully corrected sum.
    pub(crate) fn perform_adc(&mut self, operand: u8) {
        let a = self.a as u16;
        let m = operand as u16;
        let c = self.carry_in() as u16;

        if !self.flag(StatusFlag::D) {
            let sum = a + m + c;
            let result = sum as u8;
            self.set_flag(StatusFlag::C, sum > 0xFF);
            self.set_flag(StatusFlag::V, (!(a ^ m) & (a ^ sum)) & 0x80 != 0);
            self.a = result;
            self.set_nz(result);
            return;
        }

        let mut lo = (a & 0x0F) + (m & 0x0F) + c;
        if lo >= 0x0A {
            lo = ((lo + 0x06) & 0x0F) + 0x10;
        }
        let mut sum = (a & 0xF0) + (m & 0xF0) + lo;
        self.set_flag(StatusFlag::N, sum & 0x80 != 0);
        self.set_flag(StatusFlag::V, (!(a ^ m) & (a ^ sum)) & 0x80 != 0);
        if sum >= 0xA0 {
            sum += 0x60;
        }
        self.set_flag(StatusFlag::C, sum >= 0x100);
        self.set_flag(StatusFlag::Z, (a + m + c) & 0xFF == 0);
        self.a = sum as u8;
    }

    /// SBC. All flags come from the binary difference, also in decimal
    /// mode (NMOS); only A gets the BCD correction.
    pub(crate) fn perform_sbc(&mut self, operand: u8) {
        let a = self.a;
        let c = self.carry_in();

        let diff = a as u16 + (operand ^ 0xFF) as u16 + c as u16;
        let result = diff as u8;
        self.set_flag(StatusFlag::C, diff > 0xFF);
        self.set_flag(StatusFlag::V, ((a ^ operand) & (a ^ result)) & 0x80 != 0);
        self.set_nz(result);

        if !self.flag(StatusFlag::D) {
            self.a = result;
            return;
        }

        let borrow = (1 - c) as i16;
        let mut lo = (a & 0x0F) as i16 - (operand & 0x0F) as i16 - borrow;
        let half_borrow = lo < 0;
        if half_borrow {
            lo -= 6;
        }
        let mut hi = (a >> 4) as i16 - (operand >> 4) as i16 - half_borrow as i16;
        if hi < 0 {
            hi -= 6;
        }
        self.a = ((hi as u8 & 0x0F) << 4) | (lo as u8 & 0x0F);
    }

    /// CMP/CPX/CPY. Sets N, Z, C. V is untouched.
    #[inline]
    pub(crate) fn perform_compare(&mut self, register: u8, operand: u8) {
        self.set_flag(StatusFlag::C, register >= operand);
        self.set_nz(register.wrapping_sub(operand));
    }

    #[inline]
    pub(crate) fn perform_and(&mut self, operand: u8) {
        self.a &= operand;
        self.set_nz(self.a);
    }

    #[inline]
    pub(crate) fn perform_ora(&mut self, operand: u8) {
        self.a |= operand;
        self.set_nz(self.a);
    }

    #[inline]
    pub(crate) fn perform_eor(&mut self, operand: u8) {
        self.a ^= operand;
        self.set_nz(self.a);
    }

    /// BIT: N = M bit 7, V = M bit 6, Z = (A & M) == 0. A is not modified.
    #[inline]
    pub(crate) fn perform_bit(&mut self, operand: u8) {
        self.set_flag(StatusFlag::N, operand & 0x80 != 0);
        self.set_flag(StatusFlag::V, operand & 0x40 != 0);
        self.set_flag(StatusFlag::Z, self.a & operand == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(a: u8, p: u8) -> M6502 {
        let mut cpu = M6502::new();
        cpu.a = a;
        cpu.p = p | StatusFlag::U as u8;
        cpu
    }

    #[test]
    fn decimal_adc_carries_into_next_digit() {
        let mut c = cpu(0x58, StatusFlag::D as u8 | StatusFlag::C as u8);
        c.perform_adc(0x46);
        assert_eq!(c.a, 0x05);
        assert!(c.flag(StatusFlag::C));
    }

    #[test]
    fn decimal_sbc_borrows() {
        let mut c = cpu(0x12, StatusFlag::D as u8 | StatusFlag::C as u8);
        c.perform_sbc(0x21);
        assert_eq!(c.a, 0x91);
        assert!(!c.flag(StatusFlag::C));
    }

    #[test]
    fn binary_adc_overflow() {
        let mut c = cpu(0x50, 0);
        c.perform_adc(0x50);
        assert_eq!(c.a, 0xA0);
        assert!(c.flag(StatusFlag::V));
        assert!(c.flag(StatusFlag::N));
        assert!(!c.flag(StatusFlag::C));
    }
}
