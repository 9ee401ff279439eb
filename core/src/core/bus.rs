use crate::core::interrupt::InterruptLine;

/// Identifies who is accessing the bus (for multi-CPU/DMA arbitration)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusMaster {
    Cpu(usize), // CPU 0 (main), CPU 1 (coprocessor), etc.
    Dma,        // Host-side loaders and monitors poking through the map
}

/// Classification of a single bus access.
///
/// The CPU tags every access so the memory history can tell instruction
/// stream bytes from data, and so mapped devices can tell the extra
/// accesses of indexed/read-modify-write cycles from the real ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    OpcodeFetch,
    OperandFetch,
    Read,
    Write,
    DummyRead,
    DummyWrite,
}

impl AccessKind {
    pub fn is_write(self) -> bool {
        matches!(self, AccessKind::Write | AccessKind::DummyWrite)
    }

    pub fn is_dummy(self) -> bool {
        matches!(self, AccessKind::DummyRead | AccessKind::DummyWrite)
    }
}

/// CPU-facing bus interface.
///
/// A bus access never advances time by itself: the CPU charges each cycle
/// explicitly through [`Bus::tick`] so that instruction timing stays in one
/// place. `tick` is also where peripheral alarms get a chance to run.
pub trait Bus {
    fn read(&mut self, master: BusMaster, addr: u16, kind: AccessKind) -> u8;
    fn write(&mut self, master: BusMaster, addr: u16, data: u8, kind: AccessKind);

    /// Three consecutive bytes starting at `addr` when all three lie inside
    /// the fast-path bank window, `None` when the access must go through
    /// [`Bus::read`]. The three bytes are sampled together, so a bank switch
    /// can never tear an instruction fetch.
    fn fetch_window(&self, _addr: u16) -> Option<[u8; 3]> {
        None
    }

    /// Report an access that bypassed [`Bus::read`] (fast-path fetches) so
    /// that observers still see it. Must not change emulation state.
    fn observe(&mut self, _addr: u16, _data: u8, _kind: AccessKind) {}

    /// Advance the shared clock by one cycle.
    fn tick(&mut self);

    /// Current value of the shared clock.
    fn clock(&self) -> u64;

    /// Generic interrupt query. CPUs pick what they need.
    fn check_interrupts(&self, target: BusMaster) -> InterruptState;

    /// Called by the CPU once it has taken an interrupt.
    fn acknowledge_interrupt(&mut self, target: BusMaster, line: InterruptLine);
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterruptState {
    pub nmi: bool,   // Edge latched, cleared on acknowledge
    pub irq: bool,   // Level: true while any source holds the line
    pub reset: bool, // Latched until acknowledged
}

impl InterruptState {
    pub fn any(&self) -> bool {
        self.nmi || self.irq || self.reset
    }
}
