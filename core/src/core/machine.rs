use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::board::Board;
use crate::cpu::m6502::{HaltReason, StepOutcome};
use crate::cpu::state::M6502State;

/// Host-side break request. Clones share the same flag, so a debugger
/// thread or a signal handler can stop a run loop it does not own.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Consume a pending request.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// When a run loop should hand control back. Both conditions are only
/// looked at between instructions.
#[derive(Clone, Debug, Default)]
pub struct RunLimit {
    /// Absolute clock value at which to stop.
    pub cycle_limit: Option<u64>,
    pub stop: Option<StopFlag>,
}

impl RunLimit {
    /// Run until the clock reaches `limit`.
    pub fn until(limit: u64) -> Self {
        Self {
            cycle_limit: Some(limit),
            stop: None,
        }
    }

    /// Only a halt or a stop request ends the run.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_stop(mut self, stop: StopFlag) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Checked at the instruction boundary.
    pub fn check(&self, clock: u64) -> Option<RunExit> {
        if self.stop.as_ref().is_some_and(StopFlag::take) {
            return Some(RunExit::StopRequested);
        }
        match self.cycle_limit {
            Some(limit) if clock >= limit => Some(RunExit::CycleLimit),
            _ => None,
        }
    }
}

/// Why a run loop returned. Reaching the cycle limit is the normal way
/// out, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunExit {
    CycleLimit,
    StopRequested,
    Halted(HaltReason),
}

/// Machine-agnostic interface for emulated systems.
///
/// Each machine wires a board and one or more CPU cores together; the
/// command-line runner and the tests drive it only through this trait.
pub trait Machine {
    fn name(&self) -> &'static str;

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);

    /// Execute whole instructions until `limit` is hit or the main CPU
    /// halts.
    fn run_until(&mut self, limit: &RunLimit) -> RunExit;

    /// Execute exactly one instruction (or interrupt entry) on the main CPU.
    fn single_step(&mut self) -> StepOutcome;

    fn clock(&self) -> u64;

    fn cpu_state(&self) -> M6502State;

    fn board(&self) -> &Board;

    fn board_mut(&mut self) -> &mut Board;

    /// Run for `cycles` more cycles from the current clock.
    fn run_for(&mut self, cycles: u64) -> RunExit {
        let limit = RunLimit::until(self.clock().saturating_add(cycles));
        self.run_until(&limit)
    }
}
