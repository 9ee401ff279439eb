use std::cell::Cell;
use std::rc::Rc;

use log::{debug, warn};
use pulsar_core::core::machine::{Machine, RunExit, RunLimit};
use pulsar_core::core::{
    AddressSpace, AlarmAction, BankId, Board, Bus, ConfigError, InterruptLine, InterruptSource, IoContext,
    IoHandler, WindowId,
};
use pulsar_core::cpu::CpuStateTrait;
use pulsar_core::cpu::m6502::{M6502, StepOutcome};
use pulsar_core::cpu::state::M6502State;
use pulsar_core::device::{BankLatch, IntervalTimer, RasterCounter};

use crate::config::{MachineConfig, MachineError};
use crate::registry::MachineEntry;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
// CPU clock: 1 MHz
// Jiffy interrupt: 60 Hz -> 16667 cycles
// Video: 64 cycles per line, 260 lines per frame
pub const JIFFY_CYCLES: u64 = 16_667;
const CYCLES_PER_LINE: u16 = 64;
const LINES_PER_FRAME: u16 = 260;

// ---------------------------------------------------------------------------
// Memory map
// ---------------------------------------------------------------------------
//   0x0000-0x7FFF  RAM (fast path; two switchable 32 KB windows)
//   0x8000-0x8FFF  Screen RAM
//   0x9000-0xBFFF  Open bus
//   0xC000-0xFFFF  ROM
//   0xE810-0xE81F  Jiffy status (read 0xE812 to acknowledge)
//   0xE840-0xE84F  Interval timer (mirrored every 4 bytes)
//   0xE850-0xE85F  Bank latch
//   0xE880-0xE881  Raster line / cycle
pub const SCREEN_BASE: u16 = 0x8000;
pub const IO_PAGE: u8 = 0xE8;
pub const JIFFY_ACK: u16 = 0xE812;
pub const TIMER_BASE: u16 = 0xE840;
pub const BANK_LATCH: u16 = 0xE850;
pub const RASTER_BASE: u16 = 0xE880;

const ROM_BASE: u16 = 0xC000;
const ROM_SIZE: usize = 0x4000;
const RAM_WINDOW: u32 = 0x8000;
const SCREEN_SIZE: usize = 0x1000;

/// Zero-page jiffy counter bumped by the built-in IRQ handler (high byte
/// at 0x8E).
pub const JIFFY_COUNTER: u16 = 0x008F;

/// Built-in ROM: an idle loop at 0xC000 and a jiffy IRQ handler at 0xFF00.
fn builtin_rom() -> Vec<u8> {
    let mut rom = vec![0xEA; ROM_SIZE];
    let idle: &[u8] = &[
        0x58, //             CLI
        0x4C, 0x01, 0xC0, // JMP $C001
    ];
    let irq: &[u8] = &[
        0x48, //             PHA
        0xAD, 0x12, 0xE8, // LDA $E812
        0xE6, 0x8F, //       INC $8F
        0xD0, 0x02, //       BNE +2
        0xE6, 0x8E, //       INC $8E
        0x68, //             PLA
        0x40, //             RTI
    ];
    rom[..idle.len()].copy_from_slice(idle);
    rom[0x3F00..0x3F00 + irq.len()].copy_from_slice(irq);
    let vectors = [0x0B, 0xFF, 0x00, 0xC0, 0x00, 0xFF]; // NMI -> RTI, RESET, IRQ
    rom[0x3FFA..].copy_from_slice(&vectors);
    rom
}

// ---------------------------------------------------------------------------
// I/O page
// ---------------------------------------------------------------------------

/// Everything on page 0xE8, decoded by address bits 4-7.
struct PetIo {
    timer: IntervalTimer,
    latch: BankLatch,
    raster: RasterCounter,
    jiffy: Rc<Cell<bool>>,
    jiffy_source: InterruptSource,
}

impl PetIo {
    fn jiffy_status(&self) -> u8 {
        if self.jiffy.get() { 0x80 } else { 0x00 }
    }
}

impl IoHandler for PetIo {
    fn read(&mut self, addr: u16, ctx: &mut IoContext<'_>) -> u8 {
        match addr & 0xF0 {
            0x10 => {
                let status = self.jiffy_status();
                if addr == JIFFY_ACK {
                    self.jiffy.set(false);
                    ctx.clear_interrupt(InterruptLine::Irq, self.jiffy_source);
                }
                status
            }
            0x40 => self.timer.read(addr, ctx),
            0x50 => self.latch.read(addr, ctx),
            0x80 => self.raster.read(addr, ctx),
            _ => IO_PAGE,
        }
    }

    fn write(&mut self, addr: u16, value: u8, ctx: &mut IoContext<'_>) {
        match addr & 0xF0 {
            0x40 => self.timer.write(addr, value, ctx),
            0x50 => self.latch.write(addr, value, ctx),
            _ => {}
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        match addr & 0xF0 {
            0x10 => self.jiffy_status(),
            0x40 => self.timer.peek(addr),
            0x50 => self.latch.peek(addr),
            0x80 => self.raster.peek(addr),
            _ => IO_PAGE,
        }
    }

    // Only the timer schedules alarms on this handler.
    fn on_alarm(&mut self, ctx: &mut IoContext<'_>) -> AlarmAction {
        self.timer.on_alarm(ctx)
    }

    fn on_cycle(&mut self, ctx: &mut IoContext<'_>) {
        self.raster.on_cycle(ctx);
    }

    fn reset(&mut self) {
        self.timer.reset();
        self.latch.reset();
        self.raster.reset();
        self.jiffy.set(false);
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// A PET-style system: 32 KB of banked RAM on the fast path, screen RAM,
/// a 16 KB ROM, an I/O page and a 60 Hz jiffy interrupt.
pub struct PetSystem {
    pub cpu: M6502,
    board: Board,
    rom: BankId,
    screen: BankId,
    windows: [WindowId; 2],
}

impl PetSystem {
    pub fn new() -> Result<Self, ConfigError> {
        let mut memory = AddressSpace::new();

        let ram = memory.add_ram(2 * RAM_WINDOW as usize);
        let windows = [
            memory.register_window(ram, 0, RAM_WINDOW)?,
            memory.register_window(ram, RAM_WINDOW as usize, RAM_WINDOW)?,
        ];
        memory.select_window(windows[0])?;

        let screen = memory.add_ram(SCREEN_SIZE);
        memory.map_bank(0x80..=0x8F, screen, 0)?;

        let rom = memory.add_bank(builtin_rom(), false);
        memory.map_bank(0xC0..=0xFF, rom, 0)?;

        let mut board = Board::new(memory);
        let timer_source = board.interrupts.register_source("timer")?;
        let jiffy_source = board.interrupts.register_source("jiffy")?;
        let jiffy = Rc::new(Cell::new(false));

        let io = board.memory.map_handler(
            IO_PAGE..=IO_PAGE,
            PetIo {
                timer: IntervalTimer::new(timer_source),
                latch: BankLatch::new(windows.to_vec()),
                raster: RasterCounter::new(CYCLES_PER_LINE, LINES_PER_FRAME),
                jiffy: jiffy.clone(),
                jiffy_source,
            },
        );
        board.memory.attach_cycle_hook(io)?;

        board.schedule(
            JIFFY_CYCLES,
            Box::new(move |ctx| {
                jiffy.set(true);
                ctx.assert_interrupt(InterruptLine::Irq, jiffy_source);
                AlarmAction::Reschedule(ctx.now() + JIFFY_CYCLES)
            }),
        );

        Ok(Self {
            cpu: M6502::new(),
            board,
            rom,
            screen,
            windows,
        })
    }

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

    /// Replace the built-in ROM. Images shorter than 16 KB are placed at
    /// the top so they keep their vectors.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), ConfigError> {
        let offset = ROM_SIZE.saturating_sub(data.len());
        self.board.memory.poke_bank(self.rom, offset, data)
    }

    pub fn set_reset_vector(&mut self, entry: u16) -> Result<(), ConfigError> {
        let offset = (0xFFFC - ROM_BASE) as usize;
        self.board
            .memory
            .poke_bank(self.rom, offset, &entry.to_le_bytes())
    }

    pub fn screen(&self) -> &[u8] {
        self.board.memory.bank_data(self.screen).unwrap_or_default()
    }

    /// Which RAM window the fast path currently serves, if any.
    pub fn ram_window(&self) -> Option<usize> {
        let fast = self.board.memory.fast_path();
        if fast.limit() == 0 {
            return None;
        }
        Some(fast.offset() / RAM_WINDOW as usize)
    }
}

impl Machine for PetSystem {
    fn name(&self) -> &'static str {
        "pet"
    }

    fn reset(&mut self) {
        self.board.reset();
        // The latch forgets its selection; put the hardware back in step.
        if let Err(e) = self.board.memory.select_window(self.windows[0]) {
            warn!("pet: cannot restore RAM window 0: {e}");
        }
        self.cpu.reset(&mut self.board);
        debug!("pet reset, PC=${:04X}", self.cpu.pc);
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
    Ok(Box::new(PetSystem::from_config(config)?))
}

inventory::submit! {
    MachineEntry::new("pet", "PET-style system with banked RAM, timer and jiffy IRQ", create_machine)
}
