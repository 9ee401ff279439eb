use pulsar_core::core::machine::{Machine, RunExit, RunLimit};
use pulsar_core::core::{AddressSpace, BankId, Board, Bus, ConfigError, MAX_FAST_LIMIT};
use pulsar_core::cpu::CpuStateTrait;
use pulsar_core::cpu::m6502::{M6502, StepOutcome};
use pulsar_core::cpu::state::M6502State;

use crate::config::{MachineConfig, MachineError};
use crate::registry::MachineEntry;

/// A bare 6502 with 64 KB of RAM and nothing else.
///
/// The whole address space is one writable bank served by the fast path.
pub struct Simple6502System {
    pub cpu: M6502,
    board: Board,
    ram: BankId,
}

impl Simple6502System {
    pub fn new() -> Result<Self, ConfigError> {
        let mut memory = AddressSpace::new();
        let ram = memory.add_ram(0x10000);
        memory.set_fast_bank(ram, 0, MAX_FAST_LIMIT)?;
        Ok(Self {
            cpu: M6502::new(),
            board: Board::new(memory),
            ram,
        })
    }

    /// Build, load the program, point the reset vector at the entry and
    /// run the reset sequence.
    pub fn from_config(config: &MachineConfig) -> Result<Self, MachineError> {
        let mut sys = Self::new()?;
        sys.cpu.set_policy(config.policy);
        config.apply_history(&mut sys.board);
        if let Some(program) = &config.program {
            program.load_into(&mut sys.board.memory)?;
        }
        if let Some(entry) = config.entry_point() {
            sys.set_reset_vector(entry)?;
        }
        sys.reset();
        Ok(sys)
    }

    pub fn load_program(&mut self, addr: u16, data: &[u8]) -> Result<(), ConfigError> {
        self.board.memory.load(addr, data)
    }

    pub fn set_reset_vector(&mut self, entry: u16) -> Result<(), ConfigError> {
        self.board
            .memory
            .poke_bank(self.ram, 0xFFFC, &entry.to_le_bytes())
    }

    pub fn ram(&self) -> &[u8] {
        self.board.memory.bank_data(self.ram).unwrap_or_default()
    }

    pub fn get_cpu_state(&self) -> M6502State {
        self.cpu.snapshot()
    }
}

impl Machine for Simple6502System {
    fn name(&self) -> &'static str {
        "simple6502"
    }

    fn reset(&mut self) {
        self.board.reset();
        self.cpu.reset(&mut self.board);
    }

    fn run_until(&mut self, limit: &RunLimit) -> RunExit {
        self.cpu.run_until(&mut self.board, limit)
    }

    fn single_step(&mut self) -> StepOutcome {
        self.cpu.single_step(&mut self.board)
    }

    fn clock(&self) -> u64 {
        self.board.clock()
    }

    fn cpu_state(&self) -> M6502State {
        self.cpu.snapshot()
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

fn create_machine(config: &MachineConfig) -> Result<Box<dyn Machine>, MachineError> {
    Ok(Box::new(Simple6502System::from_config(config)?))
}

inventory::submit! {
    MachineEntry::new("simple6502", "bare 6502 with 64 KB RAM", create_machine)
}
