use log::debug;

use super::{ExecState, M6502, StatusFlag, TraceEvent};
use crate::core::{Bus, InterruptLine};

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

impl M6502 {
    // ---- Stack instructions ----

    /// PLA (0x68) - 4 cycles. Pull A from stack. Sets N, Z.
    pub(crate) fn op_pla<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.stack_dummy_read(bus);
        self.a = self.pull(bus);
        self.set_nz(self.a);
    }

    /// PLP (0x28) - 4 cycles. B does not exist in the register; U always reads 1.
    pub(crate) fn op_plp<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.stack_dummy_read(bus);
        let p = self.pull(bus);
        self.p = (p & !(StatusFlag::B as u8)) | StatusFlag::U as u8;
    }

    /// RTI (0x40) - 6 cycles. Pull P, then PC. No +1 on PC, unlike RTS.
    pub(crate) fn op_rti<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.stack_dummy_read(bus);
        let p = self.pull(bus);
        self.p = (p & !(StatusFlag::B as u8)) | StatusFlag::U as u8;
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        self.pc = lo as u16 | (hi as u16) << 8;
    }

    /// BRK (0x00) - 7 cycles. Pushes PC+2 (the padding byte is skipped) and
    /// P with B set.
    pub(crate) fn op_brk<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let ret = self.pc.wrapping_add(1);
        self.push(bus, (ret >> 8) as u8);
        self.push(bus, ret as u8);
        self.push(bus, self.p | StatusFlag::B as u8 | StatusFlag::U as u8);
        self.set_flag(StatusFlag::I, true);
        let (line, vector) = self.hijack(bus, InterruptLine::Irq, IRQ_VECTOR);
        let pc = ret.wrapping_sub(2);
        self.load_vector(bus, vector);
        if line == InterruptLine::Nmi {
            self.emit(TraceEvent::Interrupt { line, pc, vector });
        }
    }

    // ---- Interrupts ----

    /// An NMI edge that arrives while IRQ/BRK is pushing steals the vector.
    fn hijack<B: Bus + ?Sized>(&mut self, bus: &mut B, line: InterruptLine, vector: u16) -> (InterruptLine, u16) {
        if bus.check_interrupts(self.master).nmi {
            bus.acknowledge_interrupt(self.master, InterruptLine::Nmi);
            return (InterruptLine::Nmi, NMI_VECTOR);
        }
        (line, vector)
    }

    fn load_vector<B: Bus + ?Sized>(&mut self, bus: &mut B, vector: u16) {
        let lo = self.read(bus, vector);
        let hi = self.read(bus, vector.wrapping_add(1));
        self.pc = lo as u16 | (hi as u16) << 8;
    }

    /// The InterruptCheck state. Priority: RESET > NMI > IRQ; IRQ is
    /// masked by I.
    pub(crate) fn check_interrupts<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Option<InterruptLine> {
        let state = bus.check_interrupts(self.master);
        if state.reset {
            self.reset(bus);
            Some(InterruptLine::Reset)
        } else if state.nmi {
            bus.acknowledge_interrupt(self.master, InterruptLine::Nmi);
            Some(self.enter_interrupt(bus, InterruptLine::Nmi, NMI_VECTOR))
        } else if state.irq && !self.flag(StatusFlag::I) {
            bus.acknowledge_interrupt(self.master, InterruptLine::Irq);
            Some(self.enter_interrupt(bus, InterruptLine::Irq, IRQ_VECTOR))
        } else {
            None
        }
    }

    /// Hardware interrupt entry - 7 cycles. Same as BRK, but PC is not
    /// advanced and B is pushed clear.
    fn enter_interrupt<B: Bus + ?Sized>(&mut self, bus: &mut B, line: InterruptLine, vector: u16) -> InterruptLine {
        let pc = self.pc;
        self.dummy_read(bus, pc);
        self.dummy_read(bus, pc);
        self.push(bus, (pc >> 8) as u8);
        self.push(bus, pc as u8);
        self.push(bus, (self.p & !(StatusFlag::B as u8)) | StatusFlag::U as u8);
        self.set_flag(StatusFlag::I, true);
        let (line, vector) = if line == InterruptLine::Irq {
            self.hijack(bus, line, vector)
        } else {
            (line, vector)
        };
        self.load_vector(bus, vector);
        self.emit(TraceEvent::Interrupt { line, pc, vector });
        line
    }

    /// Reset sequence - 7 cycles. Three stack cycles are performed as
    /// reads (SP still decrements), then PC is loaded from $FFFC.
    pub fn reset<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let pc = self.pc;
        self.dummy_read(bus, pc);
        self.dummy_read(bus, pc);
        for _ in 0..3 {
            self.stack_dummy_read(bus);
            self.sp = self.sp.wrapping_sub(1);
        }
        self.p |= StatusFlag::I as u8 | StatusFlag::U as u8;
        bus.acknowledge_interrupt(self.master, InterruptLine::Reset);
        self.load_vector(bus, RESET_VECTOR);
        self.state = ExecState::Fetching;
        debug!("cpu {:?} reset, PC=${:04X}", self.master, self.pc);
        self.emit(TraceEvent::Interrupt {
            line: InterruptLine::Reset,
            pc,
            vector: RESET_VECTOR,
        });
    }
}
