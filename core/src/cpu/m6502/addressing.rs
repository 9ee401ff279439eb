use super::{M6502, Mode, OpcodeWord};
use crate::core::{AccessKind, Bus};

/// How an indexed access treats the extra cycle for the high-byte fix-up.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    /// Only on page crossing.
    Read,
    /// Always (stores and read-modify-write).
    Write,
}

impl M6502 {
    // ---- Single-cycle bus helpers ----
    //
    // Every helper performs exactly one bus access and charges exactly one
    // cycle, so instruction timing is the count of helper calls.

    #[inline]
    pub(crate) fn read<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u8 {
        let value = bus.read(self.master, addr, AccessKind::Read);
        bus.tick();
        value
    }

    #[inline]
    pub(crate) fn dummy_read<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) {
        bus.read(self.master, addr, AccessKind::DummyRead);
        bus.tick();
    }

    #[inline]
    pub(crate) fn write<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, value: u8) {
        bus.write(self.master, addr, value, AccessKind::Write);
        bus.tick();
    }

    #[inline]
    pub(crate) fn dummy_write<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, value: u8) {
        bus.write(self.master, addr, value, AccessKind::DummyWrite);
        bus.tick();
    }

    #[inline]
    pub(crate) fn push<B: Bus + ?Sized>(&mut self, bus: &mut B, value: u8) {
        self.write(bus, 0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub(crate) fn pull<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read(bus, 0x0100 | self.sp as u16)
    }

    /// The internal cycle before a pull reads the stack at the old SP.
    #[inline]
    pub(crate) fn stack_dummy_read<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.dummy_read(bus, 0x0100 | self.sp as u16);
    }

    // ---- Effective address resolution ----

    /// `base + index`, with the dummy read at the un-fixed address the
    /// real chip performs while it carries into the high byte.
    pub(crate) fn indexed<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        base: u16,
        index: u8,
        access: Access,
    ) -> (u16, bool) {
        let addr = base.wrapping_add(index as u16);
        let crossed = (base ^ addr) & 0xFF00 != 0;
        if crossed || access == Access::Write {
            self.dummy_read(bus, (base & 0xFF00) | (addr & 0x00FF));
        }
        (addr, crossed)
    }

    /// Pointer for (zp),Y: two zero-page reads, high byte wraps in page 0.
    pub(crate) fn zp_pointer<B: Bus + ?Sized>(&mut self, bus: &mut B, zp: u8) -> u16 {
        let lo = self.read(bus, zp as u16);
        let hi = self.read(bus, zp.wrapping_add(1) as u16);
        lo as u16 | (hi as u16) << 8
    }

    /// Resolve a memory operand's address, charging the mode's extra cycles.
    pub(crate) fn effective_address<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: Mode,
        word: OpcodeWord,
        access: Access,
    ) -> u16 {
        match mode {
            Mode::ZeroPage => word.p1() as u16,
            Mode::ZeroPageX => {
                self.dummy_read(bus, word.p1() as u16);
                word.p1().wrapping_add(self.x) as u16
            }
            Mode::ZeroPageY => {
                self.dummy_read(bus, word.p1() as u16);
                word.p1().wrapping_add(self.y) as u16
            }
            Mode::Absolute => word.p2(),
            Mode::AbsoluteX => self.indexed(bus, word.p2(), self.x, access).0,
            Mode::AbsoluteY => self.indexed(bus, word.p2(), self.y, access).0,
            Mode::IndirectX => {
                self.dummy_read(bus, word.p1() as u16);
                self.zp_pointer(bus, word.p1().wrapping_add(self.x))
            }
            Mode::IndirectY => {
                let base = self.zp_pointer(bus, word.p1());
                self.indexed(bus, base, self.y, access).0
            }
            // Register and immediate operands never reach the bus; the
            // dispatcher does not send them here.
            Mode::Implied
            | Mode::Accumulator
            | Mode::Immediate
            | Mode::Relative
            | Mode::Indirect => word.p2(),
        }
    }

    /// Operand of a read-class instruction.
    pub(crate) fn read_operand<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: Mode, word: OpcodeWord) -> u8 {
        match mode {
            Mode::Immediate => word.p1(),
            Mode::Accumulator => self.a,
            _ => {
                let addr = self.effective_address(bus, mode, word, Access::Read);
                self.read(bus, addr)
            }
        }
    }

    pub(crate) fn store<B: Bus + ?Sized>(&mut self, bus: &mut B, mode: Mode, word: OpcodeWord, value: u8) {
        let addr = self.effective_address(bus, mode, word, Access::Write);
        self.write(bus, addr, value);
    }

    /// Read-modify-write: read, write the old value back while the ALU
    /// works, then write the result.
    pub(crate) fn modify<B, F>(&mut self, bus: &mut B, mode: Mode, word: OpcodeWord, f: F)
    where
        B: Bus + ?Sized,
        F: FnOnce(&mut Self, u8) -> u8,
    {
        if mode == Mode::Accumulator {
            let value = self.a;
            self.a = f(self, value);
            return;
        }
        let addr = self.effective_address(bus, mode, word, Access::Write);
        let old = self.read(bus, addr);
        self.dummy_write(bus, addr, old);
        let new = f(self, old);
        self.write(bus, addr, new);
    }
}
