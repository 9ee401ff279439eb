//! Passive memory-access recorder for debuggers and inspectors.
//!
//! Recording is off by default and costs one branch per access when off.
//! It never charges cycles and never feeds back into emulation. The log is
//! a ring: once full, each new access evicts the oldest one.

use std::collections::VecDeque;

use bitflags::bitflags;

use crate::core::bus::AccessKind;

bitflags! {
    /// Per-address summary of how an address has been touched.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MapFlags: u8 {
        const READ = 0x01;
        const WRITE = 0x02;
        const EXECUTE = 0x04;
        const DUMMY = 0x08;
    }
}

impl From<AccessKind> for MapFlags {
    fn from(kind: AccessKind) -> Self {
        match kind {
            AccessKind::OpcodeFetch => MapFlags::EXECUTE,
            AccessKind::OperandFetch | AccessKind::Read => MapFlags::READ,
            AccessKind::Write => MapFlags::WRITE,
            AccessKind::DummyRead | AccessKind::DummyWrite => MapFlags::DUMMY,
        }
    }
}

/// One recorded access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryAccess {
    pub clock: u64,
    pub addr: u16,
    pub value: u8,
    pub kind: AccessKind,
}

/// Accumulated [`MapFlags`] for all 64K addresses.
#[derive(Clone, Debug)]
pub struct AccessMap {
    flags: Vec<MapFlags>,
}

impl AccessMap {
    fn new() -> Self {
        Self {
            flags: vec![MapFlags::empty(); 0x10000],
        }
    }

    pub fn flags(&self, addr: u16) -> MapFlags {
        self.flags[addr as usize]
    }

    /// Addresses that have been executed from, in ascending order.
    pub fn executed(&self) -> impl Iterator<Item = u16> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, f)| f.contains(MapFlags::EXECUTE))
            .map(|(addr, _)| addr as u16)
    }

    pub fn clear(&mut self) {
        self.flags.fill(MapFlags::empty());
    }
}

/// Entries kept by a fresh [`MemoryHistory`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 1 << 20;

/// Bounded access log plus its [`AccessMap`].
#[derive(Clone, Debug)]
pub struct MemoryHistory {
    enabled: bool,
    capacity: usize,
    log: VecDeque<MemoryAccess>,
    dropped: u64,
    map: AccessMap,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// A log holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            enabled: false,
            capacity: capacity.max(1),
            log: VecDeque::new(),
            dropped: 0,
            map: AccessMap::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shrinking drops the oldest entries.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.log.len() > self.capacity {
            self.log.pop_front();
            self.dropped += 1;
        }
    }

    /// Entries evicted since the last [`MemoryHistory::clear`].
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub(crate) fn record(&mut self, clock: u64, addr: u16, value: u8, kind: AccessKind) {
        if !self.enabled {
            return;
        }
        if self.log.len() == self.capacity {
            self.log.pop_front();
            self.dropped += 1;
        }
        self.log.push_back(MemoryAccess {
            clock,
            addr,
            value,
            kind,
        });
        self.map.flags[addr as usize] |= MapFlags::from(kind);
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryAccess> {
        self.log.iter()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn last(&self) -> Option<&MemoryAccess> {
        self.log.back()
    }

    pub fn access_map(&self) -> &AccessMap {
        &self.map
    }

    /// Hand the recorded entries to the caller, leaving the log empty.
    /// The access map keeps accumulating.
    pub fn drain(&mut self) -> Vec<MemoryAccess> {
        self.log.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.log.clear();
        self.dropped = 0;
        self.map.clear();
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}
