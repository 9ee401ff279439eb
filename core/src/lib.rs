pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::machine::{Machine, RunExit, RunLimit, StopFlag};
    pub use crate::core::{
        AccessKind, AddressSpace, AlarmAction, AlarmContext, AlarmId, AlarmScheduler, BankId, Board, Bus,
        BusMaster, ConfigError, HandlerId, InterruptLine, InterruptLines, InterruptSource, InterruptState,
        IoContext, IoHandler, MemoryAccess, WindowId,
    };
    pub use crate::cpu::m6502::{
        HaltReason, IllegalOpcodePolicy, M6502, OpcodeWord, StepOutcome, TraceEvent,
    };
    pub use crate::cpu::{Cpu, CpuStateTrait, M6502State};
}
