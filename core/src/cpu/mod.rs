use crate::core::{Bus, RunExit, RunLimit};

/// Generic CPU interface, so a machine can drive a secondary core without
/// knowing its concrete type.
pub trait Cpu: CpuStateTrait {
    /// Run the reset sequence through the reset vector.
    fn reset<B: Bus + ?Sized>(&mut self, bus: &mut B);

    /// Execute one instruction (plus any interrupt entry that follows it).
    fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> m6502::StepOutcome;

    /// Run whole instructions until `limit` says stop or the core halts.
    fn run_until<B: Bus + ?Sized>(&mut self, bus: &mut B, limit: &RunLimit) -> RunExit;

    /// Cooperative hand-off: run for a bounded number of cycles, then
    /// return control to the caller.
    fn run_for<B: Bus + ?Sized>(&mut self, bus: &mut B, cycles: u64) -> RunExit;

    fn pc(&self) -> u16;

    /// Stopped by the program (JAM or trap). Running out of cycles or a
    /// stop request does not count.
    fn is_halted(&self) -> bool;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, M6502State};

pub mod m6502;
pub use m6502::M6502;
