use super::{M6502, Mode, OpcodeWord};
use crate::core::Bus;

impl M6502 {
    // ---- Branch helper ----

    /// Generic conditional branch. Timing:
    /// - Not taken: 2 cycles (fetch only)
    /// - Taken, no page cross: 3 cycles
    /// - Taken, page cross: 4 cycles
    pub(crate) fn branch<B: Bus + ?Sized>(&mut self, bus: &mut B, word: OpcodeWord, condition: bool) {
        if !condition {
            return;
        }
        let target = self.pc.wrapping_add(word.p1() as i8 as u16);
        // The chip reads the next opcode while it adds the offset.
        self.dummy_read(bus, self.pc);
        if (self.pc ^ target) & 0xFF00 != 0 {
            // High byte fix-up cycle, reading the un-fixed address.
            self.dummy_read(bus, (self.pc & 0xFF00) | (target & 0x00FF));
        }
        self.pc = target;
    }

    // ---- Jumps ----

    /// JMP abs (3 cycles) and JMP (ind) (5 cycles). The indirect form never
    /// carries into the pointer's high byte: JMP ($10FF) reads $10FF/$1000.
    pub(crate) fn op_jmp<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: Mode, word: OpcodeWord) {
        if mode != Mode::Indirect {
            self.pc = word.p2();
            return;
        }
        let ptr = word.p2();
        let lo = self.read(bus, ptr);
        let hi = self.read(bus, (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF));
        self.pc = lo as u16 | (hi as u16) << 8;
    }

    /// JSR (0x20) - 6 cycles. Pushes the address of its own last byte.
    pub(crate) fn op_jsr<B: Bus + ?Sized>(&mut self, bus: &mut B, word: OpcodeWord) {
        let ret = self.pc.wrapping_sub(1);
        self.stack_dummy_read(bus);
        self.push(bus, (ret >> 8) as u8);
        self.push(bus, ret as u8);
        self.pc = word.p2();
    }

    /// RTS (0x60) - 6 cycles.
    pub(crate) fn op_rts<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.stack_dummy_read(bus);
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        let ret = lo as u16 | (hi as u16) << 8;
        // Increment cycle: reads the byte at the pulled address.
        self.dummy_read(bus, ret);
        self.pc = ret.wrapping_add(1);
    }
}
