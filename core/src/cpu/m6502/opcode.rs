use crate::core::{AccessKind, Bus, BusMaster};

use super::table::needs_third_byte;

/// One fetched instruction: opcode plus up to two operand bytes.
///
/// The operand word is assembled arithmetically, so the result does not
/// depend on host byte order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpcodeWord {
    opcode: u8,
    lo: u8,
    hi: u8,
}

impl OpcodeWord {
    pub const fn new(opcode: u8, lo: u8, hi: u8) -> Self {
        Self { opcode, lo, hi }
    }

    /// Opcode byte.
    #[inline]
    pub const fn p0(&self) -> u8 {
        self.opcode
    }

    /// First operand byte.
    #[inline]
    pub const fn p1(&self) -> u8 {
        self.lo
    }

    /// Little-endian 16-bit operand.
    #[inline]
    pub const fn p2(&self) -> u16 {
        self.lo as u16 | (self.hi as u16) << 8
    }

    pub const fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Fetch the instruction at `pc`, charging one cycle per byte.
    ///
    /// The byte after the opcode is always fetched and charged; the third
    /// byte only when the opcode's addressing mode has one. When all three
    /// bytes lie inside the fast window they are sampled before the first
    /// tick, so a bank switch fired by an alarm mid-fetch cannot tear the
    /// word. Otherwise every byte goes through [`Bus::read`], which picks
    /// the fast window or the page table per address and may have side
    /// effects.
    pub fn fetch<B: Bus + ?Sized>(bus: &mut B, master: BusMaster, pc: u16) -> Self {
        let operand = pc.wrapping_add(1);
        let high = pc.wrapping_add(2);

        if let Some([opcode, lo, hi]) = bus.fetch_window(pc) {
            bus.observe(pc, opcode, AccessKind::OpcodeFetch);
            bus.tick();
            bus.observe(operand, lo, AccessKind::OperandFetch);
            bus.tick();
            if !needs_third_byte(opcode) {
                return Self::new(opcode, lo, 0);
            }
            bus.observe(high, hi, AccessKind::OperandFetch);
            bus.tick();
            return Self::new(opcode, lo, hi);
        }

        let opcode = bus.read(master, pc, AccessKind::OpcodeFetch);
        bus.tick();
        let lo = bus.read(master, operand, AccessKind::OperandFetch);
        bus.tick();
        let hi = if needs_third_byte(opcode) {
            let hi = bus.read(master, high, AccessKind::OperandFetch);
            bus.tick();
            hi
        } else {
            0
        };
        Self::new(opcode, lo, hi)
    }
}
