mod addressing;
mod alu;
mod branch;
pub mod disasm;
mod illegal;
pub mod opcode;
mod shift;
mod stack;
pub mod table;
mod unary;

use log::{Level, info, log_enabled, trace, warn};

use crate::core::{Bus, BusMaster, InterruptLine, RunExit, RunLimit};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, M6502State},
};

pub use opcode::OpcodeWord;
pub use table::{Mode, OPCODES, Op, OpInfo, needs_third_byte};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt Disable
    D = 0x08, // Decimal
    B = 0x10, // Break
    U = 0x20, // Unused (always 1)
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

/// What to do with opcodes outside the documented instruction set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IllegalOpcodePolicy {
    /// Execute them the way NMOS silicon does. JAM opcodes lock the core.
    #[default]
    Emulate,
    /// Stop before executing and leave PC on the opcode.
    Trap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    StopRequested,
    CycleLimit,
    /// A JAM opcode locked the core. Only a reset gets it going again.
    Jammed { pc: u16, opcode: u8 },
    /// Trapped by [`IllegalOpcodePolicy::Trap`].
    IllegalOpcode { pc: u16, opcode: u8 },
}

impl HaltReason {
    /// Halts imposed from outside, lifted by the next run request.
    pub fn is_external(&self) -> bool {
        matches!(self, HaltReason::StopRequested | HaltReason::CycleLimit)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExecState {
    Fetching,
    Executing(OpcodeWord),
    InterruptCheck,
    Halted(HaltReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// One instruction ran. `interrupt` is set when the interrupt check
    /// that followed it entered a handler.
    Executed {
        pc: u16,
        opcode: u8,
        cycles: u64,
        interrupt: Option<InterruptLine>,
    },
    /// No instruction ran, but a RESET pulled a jammed core out of its halt.
    Interrupted { line: InterruptLine, cycles: u64 },
    Halted(HaltReason),
}

/// Events delivered to the optional trace hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// About to execute `word`, fetched from `pc`.
    Instruction { pc: u16, word: OpcodeWord, clock: u64 },
    Interrupt { line: InterruptLine, pc: u16, vector: u16 },
    IllegalOpcode { pc: u16, opcode: u8 },
    Jam { pc: u16, opcode: u8 },
}

pub type TraceHook = Box<dyn FnMut(&TraceEvent)>;

pub struct M6502 {
    // Registers
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: u8,

    // Internal state
    pub(crate) state: ExecState,
    pub(crate) master: BusMaster,
    policy: IllegalOpcodePolicy,
    tracer: Option<TraceHook>,
}

impl M6502 {
    pub fn new() -> Self {
        Self::with_master(BusMaster::Cpu(0))
    }

    /// A core that identifies itself as `master` on the bus.
    pub fn with_master(master: BusMaster) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0,
            p: 0x24, // I=1, U=1
            state: ExecState::Fetching,
            master,
            policy: IllegalOpcodePolicy::Emulate,
            tracer: None,
        }
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, flag: StatusFlag, set: bool) {
        if set {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    #[inline]
    pub(crate) fn flag(&self, flag: StatusFlag) -> bool {
        self.p & flag as u8 != 0
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn master(&self) -> BusMaster {
        self.master
    }

    pub fn policy(&self) -> IllegalOpcodePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: IllegalOpcodePolicy) {
        self.policy = policy;
    }

    pub fn set_trace(&mut self, hook: Option<TraceHook>) {
        self.tracer = hook;
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        match self.state {
            ExecState::Halted(reason) => Some(reason),
            _ => None,
        }
    }

    /// Stopped by the program itself (JAM or a trapped opcode). A core
    /// parked by a cycle limit or stop request is not halted; the reason
    /// stays visible through [`M6502::halt_reason`] until the next run.
    pub fn is_halted(&self) -> bool {
        self.halt_reason().is_some_and(|reason| !reason.is_external())
    }

    /// Leave a halt. A jammed core stays jammed until reset.
    pub fn resume(&mut self) {
        if let ExecState::Halted(reason) = self.state
            && !matches!(reason, HaltReason::Jammed { .. })
        {
            self.state = ExecState::Fetching;
        }
    }

    fn resume_external(&mut self) {
        if let ExecState::Halted(reason) = self.state
            && reason.is_external()
        {
            self.state = ExecState::Fetching;
        }
    }

    /// Load registers from a snapshot. Execution continues at `state.pc`
    /// with a fresh fetch.
    pub fn restore(&mut self, state: &M6502State) {
        self.a = state.a;
        self.x = state.x;
        self.y = state.y;
        self.pc = state.pc;
        self.sp = state.sp;
        self.p = state.p | StatusFlag::U as u8;
        self.state = ExecState::Fetching;
    }

    #[inline]
    fn emit(&mut self, event: TraceEvent) {
        if let Some(hook) = self.tracer.as_mut() {
            hook(&event);
        }
    }

    /// Run one pass of the state machine: fetch, execute, interrupt check.
    ///
    /// Returns after the interrupt check, or as soon as the core is halted.
    pub fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> StepOutcome {
        let start = bus.clock();
        let pc = self.pc;
        let mut opcode = None;
        loop {
            match self.state {
                ExecState::Halted(reason) => {
                    if matches!(reason, HaltReason::Jammed { .. })
                        && bus.check_interrupts(self.master).reset
                    {
                        self.state = ExecState::InterruptCheck;
                        continue;
                    }
                    return StepOutcome::Halted(reason);
                }
                ExecState::Fetching => {
                    let word = OpcodeWord::fetch(bus, self.master, self.pc);
                    opcode = Some(word.p0());
                    self.state = ExecState::Executing(word);
                }
                ExecState::Executing(word) => {
                    self.trace_instruction(pc, word, bus.clock());
                    self.execute(bus, pc, word);
                    if let ExecState::Executing(_) = self.state {
                        self.state = ExecState::InterruptCheck;
                    }
                }
                ExecState::InterruptCheck => {
                    let interrupt = self.check_interrupts(bus);
                    self.state = ExecState::Fetching;
                    let cycles = bus.clock().wrapping_sub(start);
                    return match (opcode, interrupt) {
                        (Some(opcode), _) => StepOutcome::Executed {
                            pc,
                            opcode,
                            cycles,
                            interrupt,
                        },
                        (None, Some(line)) => StepOutcome::Interrupted { line, cycles },
                        (None, None) => continue,
                    };
                }
            }
        }
    }

    /// Execute exactly one instruction, lifting a previous stop or cycle
    /// limit halt first.
    pub fn single_step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> StepOutcome {
        self.resume_external();
        self.step(bus)
    }

    /// Run whole instructions until `limit` says stop or the core halts.
    ///
    /// The limit is only checked between instructions, so the core is
    /// always left in an instruction-consistent state. The clock may
    /// overshoot the cycle limit by at most one instruction.
    pub fn run_until<B: Bus + ?Sized>(&mut self, bus: &mut B, limit: &RunLimit) -> RunExit {
        self.resume_external();
        loop {
            if self.state == ExecState::Fetching
                && let Some(exit) = limit.check(bus.clock())
            {
                let reason = match exit {
                    RunExit::CycleLimit => HaltReason::CycleLimit,
                    RunExit::StopRequested => HaltReason::StopRequested,
                    RunExit::Halted(reason) => reason,
                };
                self.state = ExecState::Halted(reason);
                return exit;
            }
            if let StepOutcome::Halted(reason) = self.step(bus) {
                info!("cpu {:?} halted at ${:04X}: {reason:?}", self.master, self.pc);
                return RunExit::Halted(reason);
            }
        }
    }

    /// Bounded hand-off: run for `cycles` cycles from the current clock.
    pub fn run_for<B: Bus + ?Sized>(&mut self, bus: &mut B, cycles: u64) -> RunExit {
        let limit = RunLimit::until(bus.clock().saturating_add(cycles));
        self.run_until(bus, &limit)
    }

    fn trace_instruction(&mut self, pc: u16, word: OpcodeWord, clock: u64) {
        if log_enabled!(Level::Trace) {
            trace!(
                "{clock:>10} {pc:04X}  {:<14} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
                disasm::disassemble(pc, word),
                self.a,
                self.x,
                self.y,
                self.p,
                self.sp
            );
        }
        self.emit(TraceEvent::Instruction { pc, word, clock });
    }

    fn execute<B: Bus + ?Sized>(&mut self, bus: &mut B, pc: u16, word: OpcodeWord) {
        let info = OPCODES[word.p0() as usize];
        if info.illegal && self.policy == IllegalOpcodePolicy::Trap {
            self.trap(pc, word.p0());
            return;
        }
        self.pc = pc.wrapping_add(info.len() as u16);
        let mode = info.mode;

        match info.op {
            // Loads and stores
            Op::Lda => {
                let value = self.read_operand(bus, mode, word);
                self.a = value;
                self.set_nz(value);
            }
            Op::Ldx => {
                let value = self.read_operand(bus, mode, word);
                self.x = value;
                self.set_nz(value);
            }
            Op::Ldy => {
                let value = self.read_operand(bus, mode, word);
                self.y = value;
                self.set_nz(value);
            }
            Op::Sta => self.store(bus, mode, word, self.a),
            Op::Stx => self.store(bus, mode, word, self.x),
            Op::Sty => self.store(bus, mode, word, self.y),

            // Transfers
            Op::Tax | Op::Tay | Op::Txa | Op::Tya | Op::Tsx | Op::Txs => self.transfer(info.op),

            // Arithmetic and logic
            Op::Adc => {
                let value = self.read_operand(bus, mode, word);
                self.perform_adc(value);
            }
            Op::Sbc => {
                let value = self.read_operand(bus, mode, word);
                self.perform_sbc(value);
            }
            Op::And => {
                let value = self.read_operand(bus, mode, word);
                self.perform_and(value);
            }
            Op::Ora => {
                let value = self.read_operand(bus, mode, word);
                self.perform_ora(value);
            }
            Op::Eor => {
                let value = self.read_operand(bus, mode, word);
                self.perform_eor(value);
            }
            Op::Cmp => {
                let value = self.read_operand(bus, mode, word);
                self.perform_compare(self.a, value);
            }
            Op::Cpx => {
                let value = self.read_operand(bus, mode, word);
                self.perform_compare(self.x, value);
            }
            Op::Cpy => {
                let value = self.read_operand(bus, mode, word);
                self.perform_compare(self.y, value);
            }
            Op::Bit => {
                let value = self.read_operand(bus, mode, word);
                self.perform_bit(value);
            }

            // Shifts and read-modify-write
            Op::Asl => self.modify(bus, mode, word, Self::asl_value),
            Op::Lsr => self.modify(bus, mode, word, Self::lsr_value),
            Op::Rol => self.modify(bus, mode, word, Self::rol_value),
            Op::Ror => self.modify(bus, mode, word, Self::ror_value),
            Op::Inc => self.modify(bus, mode, word, Self::inc_value),
            Op::Dec => self.modify(bus, mode, word, Self::dec_value),
            Op::Inx | Op::Iny | Op::Dex | Op::Dey => self.step_register(info.op),

            // Flags
            Op::Clc => self.set_flag(StatusFlag::C, false),
            Op::Sec => self.set_flag(StatusFlag::C, true),
            Op::Cli => self.set_flag(StatusFlag::I, false),
            Op::Sei => self.set_flag(StatusFlag::I, true),
            Op::Cld => self.set_flag(StatusFlag::D, false),
            Op::Sed => self.set_flag(StatusFlag::D, true),
            Op::Clv => self.set_flag(StatusFlag::V, false),

            // Control flow
            Op::Bpl => self.branch(bus, word, !self.flag(StatusFlag::N)),
            Op::Bmi => self.branch(bus, word, self.flag(StatusFlag::N)),
            Op::Bvc => self.branch(bus, word, !self.flag(StatusFlag::V)),
            Op::Bvs => self.branch(bus, word, self.flag(StatusFlag::V)),
            Op::Bcc => self.branch(bus, word, !self.flag(StatusFlag::C)),
            Op::Bcs => self.branch(bus, word, self.flag(StatusFlag::C)),
            Op::Bne => self.branch(bus, word, !self.flag(StatusFlag::Z)),
            Op::Beq => self.branch(bus, word, self.flag(StatusFlag::Z)),
            Op::Jmp => self.op_jmp(bus, mode, word),
            Op::Jsr => self.op_jsr(bus, word),
            Op::Rts => self.op_rts(bus),
            Op::Rti => self.op_rti(bus),
            Op::Brk => self.op_brk(bus),

            // Stack
            Op::Pha => self.push(bus, self.a),
            Op::Php => self.push(bus, self.p | StatusFlag::B as u8 | StatusFlag::U as u8),
            Op::Pla => self.op_pla(bus),
            Op::Plp => self.op_plp(bus),

            Op::Nop => {
                if !matches!(mode, Mode::Implied | Mode::Immediate) {
                    self.read_operand(bus, mode, word);
                }
            }

            // Undocumented
            Op::Jam => self.jam(pc, word.p0()),
            Op::Slo => self.modify(bus, mode, word, Self::slo_value),
            Op::Rla => self.modify(bus, mode, word, Self::rla_value),
            Op::Sre => self.modify(bus, mode, word, Self::sre_value),
            Op::Rra => self.modify(bus, mode, word, Self::rra_value),
            Op::Dcp => self.modify(bus, mode, word, Self::dcp_value),
            Op::Isc => self.modify(bus, mode, word, Self::isc_value),
            Op::Sax => self.store(bus, mode, word, self.a & self.x),
            Op::Lax => {
                let value = self.read_operand(bus, mode, word);
                self.a = value;
                self.x = value;
                self.set_nz(value);
            }
            Op::Las => {
                let value = self.read_operand(bus, mode, word);
                self.op_las(value);
            }
            Op::Anc => self.op_anc(word.p1()),
            Op::Alr => self.op_alr(word.p1()),
            Op::Arr => self.op_arr(word.p1()),
            Op::Sbx => self.op_sbx(word.p1()),
            Op::Ane => self.op_ane(word.p1()),
            Op::Lxa => self.op_lxa(word.p1()),
            Op::Sha | Op::Shx | Op::Shy | Op::Tas => self.op_unstable_store(bus, info.op, mode, word),
        }
    }

    fn trap(&mut self, pc: u16, opcode: u8) {
        warn!(
            "cpu {:?}: undocumented opcode ${opcode:02X} at ${pc:04X} trapped",
            self.master
        );
        self.pc = pc;
        self.state = ExecState::Halted(HaltReason::IllegalOpcode { pc, opcode });
        self.emit(TraceEvent::IllegalOpcode { pc, opcode });
    }

    fn jam(&mut self, pc: u16, opcode: u8) {
        info!("cpu {:?}: JAM ${opcode:02X} at ${pc:04X}", self.master);
        self.pc = pc;
        self.state = ExecState::Halted(HaltReason::Jammed { pc, opcode });
        self.emit(TraceEvent::Jam { pc, opcode });
    }
}

impl Default for M6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for M6502 {
    fn reset<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        M6502::reset(self, bus);
    }

    fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> StepOutcome {
        M6502::step(self, bus)
    }

    fn run_until<B: Bus + ?Sized>(&mut self, bus: &mut B, limit: &RunLimit) -> RunExit {
        M6502::run_until(self, bus, limit)
    }

    fn run_for<B: Bus + ?Sized>(&mut self, bus: &mut B, cycles: u64) -> RunExit {
        M6502::run_for(self, bus, cycles)
    }

    fn pc(&self) -> u16 {
        self.pc
    }

    fn is_halted(&self) -> bool {
        M6502::is_halted(self)
    }
}

impl CpuStateTrait for M6502 {
    type Snapshot = M6502State;

    fn snapshot(&self) -> M6502State {
        M6502State {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.p,
        }
    }
}
