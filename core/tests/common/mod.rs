#![allow(dead_code)]

use pulsar_core::core::{AccessKind, Bus, BusMaster, InterruptLine, InterruptState};
use pulsar_core::cpu::m6502::M6502;

/// Minimal bus for testing: flat 64KB read/write memory, no peripherals,
/// a cycle counter, directly settable interrupt lines and an access log.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub clock: u64,
    pub irq: bool,
    /// Edge latch: cleared when the CPU acknowledges.
    pub nmi: bool,
    pub reset: bool,
    pub accesses: Vec<(u16, u8, AccessKind)>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            clock: 0,
            irq: false,
            nmi: false,
            reset: false,
            accesses: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn set_vector(&mut self, vector: u16, target: u16) {
        self.load(vector, &[target as u8, (target >> 8) as u8]);
    }
}

impl Bus for TestBus {
    fn read(&mut self, _master: BusMaster, addr: u16, kind: AccessKind) -> u8 {
        let value = self.memory[addr as usize];
        self.accesses.push((addr, value, kind));
        value
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8, kind: AccessKind) {
        self.accesses.push((addr, data, kind));
        self.memory[addr as usize] = data;
    }

    fn tick(&mut self) {
        self.clock += 1;
    }

    fn clock(&self) -> u64 {
        self.clock
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState {
            nmi: self.nmi,
            irq: self.irq,
            reset: self.reset,
        }
    }

    fn acknowledge_interrupt(&mut self, _target: BusMaster, line: InterruptLine) {
        match line {
            InterruptLine::Nmi => self.nmi = false,
            InterruptLine::Reset => self.reset = false,
            InterruptLine::Irq => {}
        }
    }
}

/// CPU at `pc` with SP=$FD and the given program loaded there.
pub fn setup(pc: u16, program: &[u8]) -> (M6502, TestBus) {
    let mut cpu = M6502::new();
    let mut bus = TestBus::new();
    bus.load(pc, program);
    cpu.pc = pc;
    cpu.sp = 0xFD;
    (cpu, bus)
}

/// Execute one instruction and return the cycles it took.
pub fn run_one(cpu: &mut M6502, bus: &mut TestBus) -> u64 {
    let start = bus.clock;
    cpu.step(bus);
    bus.clock - start
}

/// Board with 64K of RAM: the fast window covers everything below
/// `fast_limit`, the remaining pages map the same bank directly.
pub fn ram_board(fast_limit: u32) -> pulsar_core::core::Board {
    use pulsar_core::core::{AddressSpace, Board};

    let mut memory = AddressSpace::new();
    let ram = memory.add_ram(0x10000);
    memory.set_fast_bank(ram, 0, fast_limit).unwrap();
    let first = (fast_limit >> 8) as u8;
    memory.map_bank(first..=0xFF, ram, (first as usize) << 8).unwrap();
    Board::new(memory)
}
