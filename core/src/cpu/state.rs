//! CPU state snapshot types and traits

/// Trait for CPU types that can provide state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
}

/// M6502 CPU state snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct M6502State {
    pub a: u8,   // Accumulator
    pub x: u8,   // X index register
    pub y: u8,   // Y index register
    pub pc: u16, // Program counter
    pub sp: u8,  // Stack pointer (0x0100 based)
    pub p: u8,   // Status register (flags)
}

impl std::fmt::Display for M6502State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const FLAGS: &[u8; 8] = b"NV-BDIZC";
        write!(
            f,
            "PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} SP:{:02X} P:{:02X} [",
            self.pc, self.a, self.x, self.y, self.sp, self.p
        )?;
        for (bit, name) in FLAGS.iter().enumerate() {
            let set = self.p & (0x80 >> bit) != 0;
            write!(f, "{}", if set { *name as char } else { '.' })?;
        }
        write!(f, "]")
    }
}
