//! Machine registry for runtime discovery.
//!
//! Each machine self-registers via [`inventory::submit!`] with a
//! [`MachineEntry`] holding its command-line name, a one-line description
//! and a factory. The runner lists and builds machines without any
//! central table.

use pulsar_core::core::machine::Machine;

use crate::config::{MachineConfig, MachineError};

pub type MachineFactory = fn(&MachineConfig) -> Result<Box<dyn Machine>, MachineError>;

pub struct MachineEntry {
    /// Name used to select this machine (e.g., "pet").
    pub name: &'static str,
    pub description: &'static str,
    pub create: MachineFactory,
}

impl MachineEntry {
    pub const fn new(name: &'static str, description: &'static str, create: MachineFactory) -> Self {
        Self {
            name,
            description,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// Return all registered machines, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a machine by name.
pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}
