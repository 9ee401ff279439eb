//! Two 6502 cores sharing one board.
//!
//! The cores never run at the same time. A select latch at 0xEFF0 decides
//! which one owns the bus: while it selects the secondary core, the main
//! loop hands off in bounded slices and takes the bus back at the first
//! instruction boundary after the latch flips. Hand-off is cooperative,
//! never preemptive.
//!
//! The interrupt lines are wired to the main core only. An NMI or IRQ
//! raised while the secondary owns the bus stays pending and is taken by
//! the main core once the bus comes back.

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};
use pulsar_core::core::machine::{Machine, RunExit, RunLimit, StopFlag};
use pulsar_core::core::{AddressSpace, BankId, Board, Bus, BusMaster, ConfigError};
use pulsar_core::cpu::m6502::{M6502, StepOutcome};
use pulsar_core::cpu::state::M6502State;
use pulsar_core::cpu::{Cpu, CpuStateTrait};

use crate::config::{MachineConfig, MachineError};
use crate::registry::MachineEntry;

pub const SELECT_LATCH: u16 = 0xEFF0;

const MAIN_CPU: BusMaster = BusMaster::Cpu(0);
const SECONDARY_CPU: BusMaster = BusMaster::Cpu(1);
const LATCH_PAGE: u8 = 0xEF;

/// Start address of the secondary core, stored like the hardware vectors.
pub const COPROCESSOR_VECTOR: u16 = 0xFFF8;

/// The secondary core keeps its stack in the lower half of page 1.
const COPROCESSOR_SP: u8 = 0x7F;

/// Longest stretch the secondary core runs before the loop looks at the
/// run limit again.
pub const HANDOFF_SLICE: u64 = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuSelect {
    Main,
    Secondary,
}

impl CpuSelect {
    fn from_latch(value: u8) -> Self {
        if value == 0 { Self::Main } else { Self::Secondary }
    }

    fn latch_value(self) -> u8 {
        match self {
            Self::Main => 0,
            Self::Secondary => 1,
        }
    }
}

pub struct CoprocessorSystem {
    pub main: M6502,
    pub secondary: M6502,
    board: Board,
    ram: BankId,
    select: Rc<Cell<CpuSelect>>,
    /// Raised by the latch so a running slice stops at its next boundary.
    handback: StopFlag,
}

impl CoprocessorSystem {
    pub fn new() -> Result<Self, ConfigError> {
        let mut memory = AddressSpace::new();
        let ram = memory.add_ram(0x10000);
        memory.set_fast_bank(ram, 0, (LATCH_PAGE as u32) << 8)?;
        memory.map_bank(0xF0..=0xFF, ram, 0xF000)?;

        let select = Rc::new(Cell::new(CpuSelect::Main));
        let handback = StopFlag::new();
        let (read_select, write_select, flag) = (select.clone(), select.clone(), handback.clone());
        memory.register_page(
            LATCH_PAGE,
            move |addr, _ctx| {
                if addr == SELECT_LATCH {
                    read_select.get().latch_value()
                } else {
                    LATCH_PAGE
                }
            },
            move |addr, value, ctx| {
                if addr != SELECT_LATCH {
                    return;
                }
                let next = CpuSelect::from_latch(value);
                if next != write_select.get() {
                    debug!("cpu select -> {next:?} at cycle {}", ctx.now());
                    write_select.set(next);
                    flag.request();
                }
            },
        );

        let mut board = Board::new(memory);
        board.route_interrupts_to(MAIN_CPU);

        Ok(Self {
            main: M6502::with_master(MAIN_CPU),
            secondary: M6502::with_master(SECONDARY_CPU),
            board,
            ram,
            select,
            handback,
        })
    }

    pub fn from_config(config: &MachineConfig) -> Result<Self, MachineError> {
        let mut sys = Self::new()?;
        sys.main.set_policy(config.policy);
        sys.secondary.set_policy(config.policy);
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

    pub fn set_coprocessor_vector(&mut self, entry: u16) -> Result<(), ConfigError> {
        self.board
            .memory
            .poke_bank(self.ram, COPROCESSOR_VECTOR as usize, &entry.to_le_bytes())
    }

    pub fn selected(&self) -> CpuSelect {
        self.select.get()
    }

    pub fn secondary_state(&self) -> M6502State {
        self.secondary.snapshot()
    }

    fn coprocessor_entry(&self) -> u16 {
        let lo = self.board.peek(COPROCESSOR_VECTOR);
        let hi = self.board.peek(COPROCESSOR_VECTOR + 1);
        u16::from_le_bytes([lo, hi])
    }

    /// One bounded slice on the secondary core. A halt gives the bus back.
    fn hand_off(&mut self, limit: &RunLimit) {
        let mut end = self.board.clock().saturating_add(HANDOFF_SLICE);
        if let Some(cap) = limit.cycle_limit {
            end = end.min(cap);
        }
        self.handback.take();
        let slice = RunLimit::until(end).with_stop(self.handback.clone());
        if let RunExit::Halted(reason) = run_slice(&mut self.secondary, &mut self.board, &slice) {
            info!("secondary cpu halted ({reason:?}), bus returns to main cpu");
            self.select.set(CpuSelect::Main);
        }
    }
}

fn run_slice<C: Cpu>(cpu: &mut C, board: &mut Board, slice: &RunLimit) -> RunExit {
    cpu.run_until(board, slice)
}

impl Machine for CoprocessorSystem {
    fn name(&self) -> &'static str {
        "coprocessor"
    }

    /// Both cores restart. The secondary core starts at the address in
    /// [`COPROCESSOR_VECTOR`] and owns the bus first, unless that vector
    /// is zero.
    fn reset(&mut self) {
        self.board.reset();
        self.main.reset(&mut self.board);
        let entry = self.coprocessor_entry();
        self.secondary.restore(&M6502State {
            pc: entry,
            sp: COPROCESSOR_SP,
            p: 0x24,
            ..M6502State::default()
        });
        let first = if entry == 0 { CpuSelect::Main } else { CpuSelect::Secondary };
        self.select.set(first);
        info!("coprocessor reset: secondary entry ${entry:04X}, {first:?} cpu first");
    }

    fn run_until(&mut self, limit: &RunLimit) -> RunExit {
        loop {
            if let Some(exit) = limit.check(self.board.clock()) {
                return exit;
            }
            match self.select.get() {
                CpuSelect::Secondary => self.hand_off(limit),
                CpuSelect::Main => {
                    if let StepOutcome::Halted(reason) = self.main.step(&mut self.board) {
                        info!("main cpu halted at ${:04X}: {reason:?}", self.main.pc);
                        return RunExit::Halted(reason);
                    }
                }
            }
        }
    }

    fn single_step(&mut self) -> StepOutcome {
        self.main.single_step(&mut self.board)
    }

    fn clock(&self) -> u64 {
        self.board.clock()
    }

    fn cpu_state(&self) -> M6502State {
        self.main.snapshot()
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

fn create_machine(config: &MachineConfig) -> Result<Box<dyn Machine>, MachineError> {
    Ok(Box::new(CoprocessorSystem::from_config(config)?))
}

inventory::submit! {
    MachineEntry::new("coprocessor", "two 6502 cores sharing one bus", create_machine)
}
