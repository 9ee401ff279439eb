use pulsar_core::core::{Board, ConfigError};
use pulsar_core::cpu::m6502::IllegalOpcodePolicy;
use thiserror::Error;

use crate::image::{ImageError, ProgramImage};

/// Errors raised while a machine is being built.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("machine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// What every machine factory accepts.
#[derive(Debug, Clone, Default)]
pub struct MachineConfig {
    pub program: Option<ProgramImage>,
    pub policy: IllegalOpcodePolicy,
    pub memory_history: bool,
    /// Access-log bound; `None` keeps the core default.
    pub history_capacity: Option<usize>,
    /// Overrides the reset vector.
    pub entry: Option<u16>,
}

impl MachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: ProgramImage) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_policy(mut self, policy: IllegalOpcodePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_memory_history(mut self, enabled: bool) -> Self {
        self.memory_history = enabled;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = Some(capacity);
        self
    }

    /// Switch recording on or off and apply the log bound.
    pub fn apply_history(&self, board: &mut Board) {
        if let Some(capacity) = self.history_capacity {
            board.set_history_capacity(capacity);
        }
        board.enable_memory_history(self.memory_history);
    }

    pub fn with_entry(mut self, entry: u16) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Where execution should start: the explicit entry, else the start of
    /// the loaded program.
    pub fn entry_point(&self) -> Option<u16> {
        self.entry
            .or_else(|| self.program.as_ref().map(|p| p.load_address))
    }
}
