use pulsar_core::core::machine::{Machine, RunExit};
use pulsar_core::core::{AccessKind, Bus, BusMaster};

/// Write through the bus the way a running program would.
pub fn poke_io(machine: &mut dyn Machine, addr: u16, value: u8) {
    machine
        .board_mut()
        .write(BusMaster::Cpu(0), addr, value, AccessKind::Write);
}

pub fn read_io(machine: &mut dyn Machine, addr: u16) -> u8 {
    machine.board_mut().read(BusMaster::Cpu(0), addr, AccessKind::Read)
}

/// Run until the main CPU stops on its own, with a generous safety limit.
pub fn run_to_halt(machine: &mut dyn Machine) -> RunExit {
    machine.run_for(1_000_000)
}
