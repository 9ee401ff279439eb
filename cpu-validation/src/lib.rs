use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use pulsar_core::core::{AccessKind, Bus, BusMaster, InterruptLine, InterruptState};
use pulsar_core::cpu::m6502::{M6502, OPCODES, Op, StepOutcome};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- TracingBus: flat 64KB memory with cycle-by-cycle recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
}

impl BusOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BusOp::Read => "read",
            BusOp::Write => "write",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
    pub kind: AccessKind,
}

pub struct TracingBus {
    pub memory: [u8; 0x10000],
    pub cycles: Vec<BusCycle>,
    clock: u64,
    fast_fetch: bool,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            cycles: Vec::new(),
            clock: 0,
            fast_fetch: false,
        }
    }

    /// Serve instruction fetches through [`Bus::fetch_window`], the way a
    /// board does inside its fast window.
    pub fn with_fast_fetch(mut self) -> Self {
        self.fast_fetch = true;
        self
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }

    fn record(&mut self, addr: u16, data: u8, kind: AccessKind) {
        let op = if kind.is_write() { BusOp::Write } else { BusOp::Read };
        self.cycles.push(BusCycle { addr, data, op, kind });
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn read(&mut self, _master: BusMaster, addr: u16, kind: AccessKind) -> u8 {
        let data = self.memory[addr as usize];
        self.record(addr, data, kind);
        data
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8, kind: AccessKind) {
        self.memory[addr as usize] = data;
        self.record(addr, data, kind);
    }

    fn fetch_window(&self, addr: u16) -> Option<[u8; 3]> {
        if !self.fast_fetch {
            return None;
        }
        let byte = |offset: u16| self.memory[addr.wrapping_add(offset) as usize];
        Some([byte(0), byte(1), byte(2)])
    }

    fn observe(&mut self, addr: u16, data: u8, kind: AccessKind) {
        self.record(addr, data, kind);
    }

    fn tick(&mut self) {
        self.clock += 1;
    }

    fn clock(&self) -> u64 {
        self.clock
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState::default()
    }

    fn acknowledge_interrupt(&mut self, _target: BusMaster, _line: InterruptLine) {}
}

// --- M6502 JSON test vector types (SingleStepTests/65x02 format) ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct M6502TestCase {
    pub name: String,
    pub initial: M6502CpuState,
    #[serde(rename = "final")]
    pub final_state: M6502CpuState,
    pub cycles: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct M6502CpuState {
    pub pc: u16,
    pub s: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub ram: Vec<(u16, u8)>,
}

impl M6502CpuState {
    fn capture(cpu: &M6502, ram: Vec<(u16, u8)>) -> Self {
        Self {
            pc: cpu.pc,
            s: cpu.sp,
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            p: cpu.p,
            ram,
        }
    }

    fn apply(&self, cpu: &mut M6502, bus: &mut TracingBus) {
        cpu.pc = self.pc;
        cpu.sp = self.s;
        cpu.a = self.a;
        cpu.x = self.x;
        cpu.y = self.y;
        cpu.p = self.p;
        for &(addr, value) in &self.ram {
            bus.memory[addr as usize] = value;
        }
    }
}

// --- Replaying a vector ---

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Mismatch {
    #[error("{name}: {register} expected {expected:#04X}, got {actual:#04X}")]
    Register {
        name: String,
        register: &'static str,
        expected: u16,
        actual: u16,
    },

    #[error("{name}: RAM[{addr:#06X}] expected {expected:#04X}, got {actual:#04X}")]
    Ram { name: String, addr: u16, expected: u8, actual: u8 },

    #[error("{name}: {expected} cycles expected, got {actual}")]
    CycleCount { name: String, expected: usize, actual: usize },

    #[error("{name}: cycle {index} expected {expected:?}, got {actual:?}")]
    Cycle {
        name: String,
        index: usize,
        expected: (u16, u8, String),
        actual: (u16, u8, String),
    },

    #[error("{name}: core halted ({reason})")]
    Halted { name: String, reason: String },
}

/// Opcodes whose bus order differs from silicon because the whole
/// instruction word is fetched before execution starts. JSR reads its
/// high operand byte before the stack cycles rather than after.
pub const PREFETCH_REORDERED: &[u8] = &[0x20];

/// Execute one instruction from `tc.initial` and compare everything
/// against `tc.final_state` and `tc.cycles`.
pub fn replay(tc: &M6502TestCase, fast_fetch: bool) -> Result<(), Mismatch> {
    let mut cpu = M6502::new();
    let mut bus = TracingBus::new();
    if fast_fetch {
        bus = bus.with_fast_fetch();
    }
    tc.initial.apply(&mut cpu, &mut bus);
    let opcode = bus.memory[tc.initial.pc as usize];

    if let StepOutcome::Halted(reason) = cpu.step(&mut bus) {
        return Err(Mismatch::Halted {
            name: tc.name.clone(),
            reason: format!("{reason:?}"),
        });
    }

    let expected = &tc.final_state;
    let registers = [
        ("PC", expected.pc, cpu.pc),
        ("S", expected.s as u16, cpu.sp as u16),
        ("A", expected.a as u16, cpu.a as u16),
        ("X", expected.x as u16, cpu.x as u16),
        ("Y", expected.y as u16, cpu.y as u16),
        ("P", expected.p as u16, cpu.p as u16),
    ];
    for (register, expected, actual) in registers {
        if expected != actual {
            return Err(Mismatch::Register {
                name: tc.name.clone(),
                register,
                expected,
                actual,
            });
        }
    }

    for &(addr, expected) in &expected.ram {
        let actual = bus.memory[addr as usize];
        if actual != expected {
            return Err(Mismatch::Ram {
                name: tc.name.clone(),
                addr,
                expected,
                actual,
            });
        }
    }

    if bus.cycles.len() != tc.cycles.len() || bus.clock() != tc.cycles.len() as u64 {
        return Err(Mismatch::CycleCount {
            name: tc.name.clone(),
            expected: tc.cycles.len(),
            actual: bus.clock() as usize,
        });
    }

    let mut actual: Vec<_> = bus.cycles.iter().map(cycle_tuple).collect();
    let mut wanted = tc.cycles.clone();
    if PREFETCH_REORDERED.contains(&opcode) {
        actual.sort();
        wanted.sort();
    }
    for (index, (expected, actual)) in wanted.into_iter().zip(actual).enumerate() {
        if expected != actual {
            return Err(Mismatch::Cycle {
                name: tc.name.clone(),
                index,
                expected,
                actual,
            });
        }
    }
    Ok(())
}

fn cycle_tuple(cycle: &BusCycle) -> (u16, u8, String) {
    (cycle.addr, cycle.data, cycle.op.as_str().to_string())
}

// --- Generating vectors ---

/// Every opcode a vector can be generated for: all but the JAMs.
pub fn traceable_opcodes() -> impl Iterator<Item = u8> {
    (0..=0xFFu8).filter(|&op| OPCODES[op as usize].op != Op::Jam)
}

/// One random vector for `opcode`: random registers, random 64 KB, the
/// opcode placed at a random PC. The core under test records the result,
/// so these vectors pin behaviour rather than prove it.
pub fn generate_case(rng: &mut impl Rng, opcode: u8) -> M6502TestCase {
    let mut cpu = M6502::new();
    let mut bus = TracingBus::new();

    rng.fill(&mut bus.memory[..]);
    cpu.a = rng.r#gen();
    cpu.x = rng.r#gen();
    cpu.y = rng.r#gen();
    cpu.sp = rng.r#gen();
    cpu.p = rng.r#gen::<u8>() | 0x20;
    cpu.pc = rng.r#gen();

    let pc = cpu.pc;
    bus.memory[pc as usize] = opcode;
    let pre_memory = bus.memory;
    let initial = M6502CpuState::capture(&cpu, Vec::new());

    cpu.step(&mut bus);

    let addresses: BTreeSet<u16> = bus.cycles.iter().map(|c| c.addr).collect();
    let ram_at = |memory: &[u8; 0x10000]| -> Vec<(u16, u8)> {
        addresses
            .iter()
            .map(|&addr| (addr, memory[addr as usize]))
            .collect()
    };

    let len = OPCODES[opcode as usize].len() as u16;
    let name = (0..len)
        .map(|i| format!("{:02x}", pre_memory[pc.wrapping_add(i) as usize]))
        .collect::<Vec<_>>()
        .join(" ");

    M6502TestCase {
        name,
        initial: M6502CpuState {
            ram: ram_at(&pre_memory),
            ..initial
        },
        final_state: M6502CpuState::capture(&cpu, ram_at(&bus.memory)),
        cycles: bus.cycles.iter().map(cycle_tuple).collect(),
    }
}

pub fn generate_cases(rng: &mut impl Rng, opcode: u8, count: usize) -> Vec<M6502TestCase> {
    (0..count).map(|_| generate_case(rng, opcode)).collect()
}

// --- Vector files ---

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed vector file: {0}")]
    Json(#[from] serde_json::Error),
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Read a vector file; `.gz` files are decompressed on the fly.
pub fn read_vectors(path: &Path) -> Result<Vec<M6502TestCase>, VectorError> {
    let mut file = BufReader::new(File::open(path)?);
    let mut json = String::new();
    if is_gzip(path) {
        GzDecoder::new(file).read_to_string(&mut json)?;
    } else {
        file.read_to_string(&mut json)?;
    }
    Ok(serde_json::from_str(&json)?)
}

pub fn write_vectors(path: &Path, cases: &[M6502TestCase]) -> Result<(), VectorError> {
    let file = BufWriter::new(File::create(path)?);
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer(&mut encoder, cases)?;
        encoder.finish()?.flush()?;
    } else {
        let mut file = file;
        serde_json::to_writer(&mut file, cases)?;
        file.flush()?;
    }
    Ok(())
}
