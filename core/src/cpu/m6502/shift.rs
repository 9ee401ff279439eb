use super::{M6502, StatusFlag};

impl M6502 {
    // ---- Shift/rotate cores ----
    // Shared by the accumulator and memory forms (and by SLO/RLA/SRE/RRA).

    /// ASL: C = old bit 7, bit 0 = 0.
    pub(crate) fn asl_value(&mut self, value: u8) -> u8 {
        let result = value << 1;
        self.set_flags_shift(result, value & 0x80 != 0);
        result
    }

    /// LSR: C = old bit 0, bit 7 = 0 (so N is always cleared).
    pub(crate) fn lsr_value(&mut self, value: u8) -> u8 {
        let result = value >> 1;
        self.set_flags_shift(result, value & 0x01 != 0);
        result
    }

    /// ROL: bit 0 = old C, C = old bit 7.
    pub(crate) fn rol_value(&mut self, value: u8) -> u8 {
        let result = (value << 1) | self.flag(StatusFlag::C) as u8;
        self.set_flags_shift(result, value & 0x80 != 0);
        result
    }

    /// ROR: bit 7 = old C, C = old bit 0.
    pub(crate) fn ror_value(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | (self.flag(StatusFlag::C) as u8) << 7;
        self.set_flags_shift(result, value & 0x01 != 0);
        result
    }
}
