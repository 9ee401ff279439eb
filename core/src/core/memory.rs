//! 16-bit address space: a fast bank window plus a 256-entry page table.
//!
//! Every access resolves through exactly one path. Addresses below the fast
//! limit go straight to the fast bank. Everything else is looked up by page
//! (`addr >> 8`) and lands in a bank slice, an [`IoHandler`], or open bus.
//!
//! Mapping calls return [`ConfigError`] and are meant for machine setup.
//! Once a configuration is accepted the runtime paths cannot fail: bank
//! switches at run time go through pre-validated [`WindowId`]s.

use std::ops::RangeInclusive;

use log::{debug, warn};

use crate::core::alarm::{AlarmAction, AlarmCallback, AlarmId, AlarmScheduler};
use crate::core::bus::AccessKind;
use crate::core::error::ConfigError;
use crate::core::history::MemoryHistory;
use crate::core::interrupt::{InterruptLine, InterruptLines, InterruptSource};

/// Highest accepted fast-path limit: a window covering the whole address
/// space.
pub const MAX_FAST_LIMIT: u32 = 0x10000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BankId(usize);

impl BankId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(usize);

/// The active fast-path configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FastPath {
    bank: BankId,
    offset: usize,
    limit: u32,
}

impl FastPath {
    pub const DISABLED: Self = Self {
        bank: BankId(0),
        offset: 0,
        limit: 0,
    };

    pub fn bank(&self) -> BankId {
        self.bank
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[inline]
    fn covers(&self, addr: u16) -> bool {
        (addr as u32) < self.limit
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageMapping {
    /// Open bus: reads return the page number, writes vanish.
    Unmapped,
    /// Direct bank access outside the fast window. `offset` is where this
    /// page starts inside the bank.
    Bank { bank: BankId, offset: usize },
    Handler(HandlerId),
}

struct Bank {
    data: Box<[u8]>,
    writable: bool,
}

/// A memory-mapped device.
///
/// `addr` is always the full 16-bit address, so one handler can serve
/// several pages and decode its own mirrors.
pub trait IoHandler {
    fn read(&mut self, addr: u16, ctx: &mut IoContext<'_>) -> u8;
    fn write(&mut self, addr: u16, value: u8, ctx: &mut IoContext<'_>);

    /// Extra read issued by indexed addressing. Real silicon performs it,
    /// so by default it has the same side effects as a real read.
    fn dummy_read(&mut self, addr: u16, ctx: &mut IoContext<'_>) -> u8 {
        self.read(addr, ctx)
    }

    /// Write-back of the unmodified value in a read-modify-write cycle.
    fn dummy_write(&mut self, addr: u16, value: u8, ctx: &mut IoContext<'_>) {
        self.write(addr, value, ctx)
    }

    /// Side-effect-free view for monitors.
    fn peek(&self, addr: u16) -> u8 {
        (addr >> 8) as u8
    }

    /// An alarm scheduled with [`IoContext::schedule_self`] fired.
    fn on_alarm(&mut self, _ctx: &mut IoContext<'_>) -> AlarmAction {
        AlarmAction::Done
    }

    /// Runs once per clock tick after [`AddressSpace::attach_cycle_hook`].
    fn on_cycle(&mut self, _ctx: &mut IoContext<'_>) {}

    fn reset(&mut self) {}
}

/// What a handler may touch while it is being called.
pub struct IoContext<'a> {
    handler: HandlerId,
    fast: &'a mut FastPath,
    windows: &'a [FastPath],
    alarms: &'a mut AlarmScheduler,
    interrupts: &'a mut InterruptLines,
}

impl IoContext<'_> {
    pub fn now(&self) -> u64 {
        self.alarms.now()
    }

    pub fn handler(&self) -> HandlerId {
        self.handler
    }

    /// Schedule an alarm delivered to this handler's `on_alarm`.
    pub fn schedule_self(&mut self, at: u64) -> AlarmId {
        self.alarms.schedule_handler(at, self.handler)
    }

    pub fn schedule(&mut self, at: u64, callback: AlarmCallback) -> AlarmId {
        self.alarms.schedule(at, callback)
    }

    pub fn reschedule(&mut self, id: AlarmId, at: u64) -> bool {
        self.alarms.reschedule(id, at)
    }

    pub fn cancel(&mut self, id: AlarmId) -> bool {
        self.alarms.cancel(id)
    }

    pub fn is_pending(&self, id: AlarmId) -> bool {
        self.alarms.is_pending(id)
    }

    pub fn assert_interrupt(&mut self, line: InterruptLine, source: InterruptSource) {
        self.interrupts.assert(line, source);
    }

    pub fn clear_interrupt(&mut self, line: InterruptLine, source: InterruptSource) {
        self.interrupts.clear(line, source);
    }

    /// Switch the fast path to a registered window. Takes effect with the
    /// next access, so the instruction currently executing is unaffected.
    pub fn select_window(&mut self, window: WindowId) {
        match self.windows.get(window.0) {
            Some(fast) => {
                debug!(
                    "fast window -> #{} (bank #{}, limit {:#06X})",
                    window.0, fast.bank.0, fast.limit
                );
                *self.fast = *fast;
            }
            None => warn!("handler #{} selected unknown window #{}", self.handler.0, window.0),
        }
    }

    pub fn disable_fast_path(&mut self) {
        debug!("fast path disabled by handler #{}", self.handler.0);
        *self.fast = FastPath::DISABLED;
    }

    pub fn fast_limit(&self) -> u32 {
        self.fast.limit
    }
}

struct FnHandler<R, W> {
    read: R,
    write: W,
}

impl<R, W> IoHandler for FnHandler<R, W>
where
    R: FnMut(u16, &mut IoContext<'_>) -> u8,
    W: FnMut(u16, u8, &mut IoContext<'_>),
{
    fn read(&mut self, addr: u16, ctx: &mut IoContext<'_>) -> u8 {
        (self.read)(addr, ctx)
    }

    fn write(&mut self, addr: u16, value: u8, ctx: &mut IoContext<'_>) {
        (self.write)(addr, value, ctx)
    }
}

pub struct AddressSpace {
    banks: Vec<Bank>,
    fast: FastPath,
    windows: Vec<FastPath>,
    pages: [PageMapping; 256],
    handlers: Vec<Box<dyn IoHandler>>,
    cycle_hooks: Vec<HandlerId>,
    history: MemoryHistory,
}

impl AddressSpace {
    /// Empty address space: no banks, no fast path, every page unmapped.
    pub fn new() -> Self {
        Self {
            banks: Vec::new(),
            fast: FastPath::DISABLED,
            windows: Vec::new(),
            pages: [PageMapping::Unmapped; 256],
            handlers: Vec::new(),
            cycle_hooks: Vec::new(),
            history: MemoryHistory::new(),
        }
    }

    // ---- Configuration ----

    pub fn add_bank(&mut self, data: Vec<u8>, writable: bool) -> BankId {
        self.banks.push(Bank {
            data: data.into_boxed_slice(),
            writable,
        });
        BankId(self.banks.len() - 1)
    }

    /// Zero-filled RAM bank.
    pub fn add_ram(&mut self, len: usize) -> BankId {
        self.add_bank(vec![0; len], true)
    }

    fn bank(&self, bank: BankId) -> Result<&Bank, ConfigError> {
        self.banks
            .get(bank.0)
            .ok_or(ConfigError::UnknownBank { bank: bank.0 })
    }

    fn validate_window(&self, bank: BankId, offset: usize, limit: u32) -> Result<FastPath, ConfigError> {
        if limit > MAX_FAST_LIMIT {
            return Err(ConfigError::LimitTooHigh {
                limit,
                max: MAX_FAST_LIMIT,
            });
        }
        let available = self.bank(bank)?.data.len();
        let required = offset + limit as usize;
        if required > available {
            return Err(ConfigError::BankLimit {
                bank: bank.0,
                offset,
                limit,
                required,
                available,
            });
        }
        Ok(FastPath { bank, offset, limit })
    }

    /// Point the fast path at `bank[offset..]`, valid for addresses below
    /// `limit`. A limit of zero sends every access through the page table.
    pub fn set_fast_bank(&mut self, bank: BankId, offset: usize, limit: u32) -> Result<(), ConfigError> {
        self.fast = self.validate_window(bank, offset, limit)?;
        debug!("fast path: bank #{} offset {offset:#06X} limit {limit:#06X}", bank.0);
        Ok(())
    }

    /// Pre-validate a fast-path configuration for later runtime switching.
    pub fn register_window(&mut self, bank: BankId, offset: usize, limit: u32) -> Result<WindowId, ConfigError> {
        let window = self.validate_window(bank, offset, limit)?;
        self.windows.push(window);
        Ok(WindowId(self.windows.len() - 1))
    }

    pub fn select_window(&mut self, window: WindowId) -> Result<(), ConfigError> {
        let fast = *self
            .windows
            .get(window.0)
            .ok_or(ConfigError::UnknownWindow { window: window.0 })?;
        self.fast = fast;
        Ok(())
    }

    pub fn disable_fast_path(&mut self) {
        self.fast = FastPath::DISABLED;
    }

    pub fn fast_path(&self) -> FastPath {
        self.fast
    }

    pub fn fast_limit(&self) -> u32 {
        self.fast.limit
    }

    /// Map `pages` onto consecutive 256-byte slices of `bank` starting at
    /// `offset`.
    pub fn map_bank(&mut self, pages: RangeInclusive<u8>, bank: BankId, offset: usize) -> Result<(), ConfigError> {
        let (first, last) = (*pages.start(), *pages.end());
        let available = self.bank(bank)?.data.len();
        let count = (last as usize + 1).saturating_sub(first as usize);
        if offset + count * 0x100 > available {
            return Err(ConfigError::PageRange {
                bank: bank.0,
                first,
                last,
                offset,
            });
        }
        for (i, page) in pages.enumerate() {
            self.pages[page as usize] = PageMapping::Bank {
                bank,
                offset: offset + i * 0x100,
            };
        }
        Ok(())
    }

    /// Register a handler without mapping it (alarm-only devices, or pages
    /// mapped later with [`AddressSpace::map_existing`]).
    pub fn add_handler(&mut self, handler: impl IoHandler + 'static) -> HandlerId {
        self.handlers.push(Box::new(handler));
        HandlerId(self.handlers.len() - 1)
    }

    pub fn map_handler(&mut self, pages: RangeInclusive<u8>, handler: impl IoHandler + 'static) -> HandlerId {
        let id = self.add_handler(handler);
        for page in pages {
            self.pages[page as usize] = PageMapping::Handler(id);
        }
        id
    }

    pub fn map_existing(&mut self, pages: RangeInclusive<u8>, handler: HandlerId) -> Result<(), ConfigError> {
        if handler.0 >= self.handlers.len() {
            return Err(ConfigError::UnknownHandler { handler: handler.0 });
        }
        for page in pages {
            self.pages[page as usize] = PageMapping::Handler(handler);
        }
        Ok(())
    }

    /// Install a read/write closure pair for a single page.
    pub fn register_page<R, W>(&mut self, page: u8, read: R, write: W) -> HandlerId
    where
        R: FnMut(u16, &mut IoContext<'_>) -> u8 + 'static,
        W: FnMut(u16, u8, &mut IoContext<'_>) + 'static,
    {
        self.map_handler(page..=page, FnHandler { read, write })
    }

    pub fn unmap(&mut self, pages: RangeInclusive<u8>) {
        for page in pages {
            self.pages[page as usize] = PageMapping::Unmapped;
        }
    }

    pub fn page_mapping(&self, page: u8) -> PageMapping {
        self.pages[page as usize]
    }

    pub fn attach_cycle_hook(&mut self, handler: HandlerId) -> Result<(), ConfigError> {
        if handler.0 >= self.handlers.len() {
            return Err(ConfigError::UnknownHandler { handler: handler.0 });
        }
        self.cycle_hooks.push(handler);
        Ok(())
    }

    /// Copy `bytes` into a bank, ignoring write protection.
    pub fn poke_bank(&mut self, bank: BankId, offset: usize, bytes: &[u8]) -> Result<(), ConfigError> {
        let target = self
            .banks
            .get_mut(bank.0)
            .ok_or(ConfigError::UnknownBank { bank: bank.0 })?;
        let available = target.data.len();
        let dest = target
            .data
            .get_mut(offset..offset + bytes.len())
            .ok_or(ConfigError::BankOverflow {
                bank: bank.0,
                offset,
                len: bytes.len(),
                available,
            })?;
        dest.copy_from_slice(bytes);
        Ok(())
    }

    pub fn bank_data(&self, bank: BankId) -> Option<&[u8]> {
        self.banks.get(bank.0).map(|b| &b.data[..])
    }

    /// Load an image through the current mapping. Every byte must land in
    /// a bank (fast window or bank page); write protection is ignored.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) -> Result<(), ConfigError> {
        for (i, &byte) in bytes.iter().enumerate() {
            let target = addr as usize + i;
            if target > 0xFFFF {
                return Err(ConfigError::ImageOutOfRange { addr: 0xFFFF });
            }
            let target = target as u16;
            let (bank, index) = self
                .resolve_bank(target)
                .ok_or(ConfigError::ImageOutOfRange { addr: target })?;
            self.banks[bank.0].data[index] = byte;
        }
        Ok(())
    }

    #[inline]
    fn resolve_bank(&self, addr: u16) -> Option<(BankId, usize)> {
        if self.fast.covers(addr) {
            return Some((self.fast.bank, self.fast.offset + addr as usize));
        }
        match self.pages[(addr >> 8) as usize] {
            PageMapping::Bank { bank, offset } => Some((bank, offset + (addr & 0xFF) as usize)),
            PageMapping::Handler(_) | PageMapping::Unmapped => None,
        }
    }

    // ---- Memory history ----

    pub fn enable_memory_history(&mut self, enabled: bool) {
        debug!("memory history {}", if enabled { "enabled" } else { "disabled" });
        self.history.set_enabled(enabled);
    }

    pub fn history(&self) -> &MemoryHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut MemoryHistory {
        &mut self.history
    }

    /// Record an access that did not go through [`AddressSpace::read`].
    #[inline]
    pub fn observe(&mut self, clock: u64, addr: u16, value: u8, kind: AccessKind) {
        self.history.record(clock, addr, value, kind);
    }

    // ---- Runtime access ----

    /// Three bytes at `addr` if all of them lie inside the fast window.
    /// An instruction straddling the limit is fetched byte by byte, so the
    /// bytes at or above the limit resolve through the page table.
    #[inline]
    pub fn fetch_window(&self, addr: u16) -> Option<[u8; 3]> {
        if addr as u32 + 2 >= self.fast.limit {
            return None;
        }
        let data = &self.banks[self.fast.bank.0].data;
        let base = self.fast.offset + addr as usize;
        Some([data[base], data[base + 1], data[base + 2]])
    }

    fn with_handler<T>(
        &mut self,
        id: HandlerId,
        alarms: &mut AlarmScheduler,
        interrupts: &mut InterruptLines,
        f: impl FnOnce(&mut dyn IoHandler, &mut IoContext<'_>) -> T,
    ) -> Option<T> {
        let Self {
            handlers,
            fast,
            windows,
            ..
        } = self;
        let handler = handlers.get_mut(id.0)?;
        let mut ctx = IoContext {
            handler: id,
            fast,
            windows,
            alarms,
            interrupts,
        };
        Some(f(handler.as_mut(), &mut ctx))
    }

    pub fn read(
        &mut self,
        addr: u16,
        kind: AccessKind,
        alarms: &mut AlarmScheduler,
        interrupts: &mut InterruptLines,
    ) -> u8 {
        let value = if self.fast.covers(addr) {
            self.banks[self.fast.bank.0].data[self.fast.offset + addr as usize]
        } else {
            match self.pages[(addr >> 8) as usize] {
                PageMapping::Unmapped => (addr >> 8) as u8,
                PageMapping::Bank { bank, offset } => {
                    self.banks[bank.0].data[offset + (addr & 0xFF) as usize]
                }
                PageMapping::Handler(id) => self
                    .with_handler(id, alarms, interrupts, |handler, ctx| {
                        if kind.is_dummy() {
                            handler.dummy_read(addr, ctx)
                        } else {
                            handler.read(addr, ctx)
                        }
                    })
                    .unwrap_or((addr >> 8) as u8),
            }
        };
        self.history.record(alarms.now(), addr, value, kind);
        value
    }

    pub fn write(
        &mut self,
        addr: u16,
        value: u8,
        kind: AccessKind,
        alarms: &mut AlarmScheduler,
        interrupts: &mut InterruptLines,
    ) {
        self.history.record(alarms.now(), addr, value, kind);
        if self.fast.covers(addr) {
            let bank = &mut self.banks[self.fast.bank.0];
            if bank.writable {
                bank.data[self.fast.offset + addr as usize] = value;
            }
            return;
        }
        match self.pages[(addr >> 8) as usize] {
            PageMapping::Unmapped => {}
            PageMapping::Bank { bank, offset } => {
                let bank = &mut self.banks[bank.0];
                if bank.writable {
                    bank.data[offset + (addr & 0xFF) as usize] = value;
                }
            }
            PageMapping::Handler(id) => {
                self.with_handler(id, alarms, interrupts, |handler, ctx| {
                    if kind.is_dummy() {
                        handler.dummy_write(addr, value, ctx)
                    } else {
                        handler.write(addr, value, ctx)
                    }
                });
            }
        }
    }

    /// Read without side effects and without recording history.
    pub fn peek(&self, addr: u16) -> u8 {
        if let Some((bank, index)) = self.resolve_bank(addr) {
            return self.banks[bank.0].data[index];
        }
        match self.pages[(addr >> 8) as usize] {
            PageMapping::Handler(id) => self
                .handlers
                .get(id.0)
                .map_or((addr >> 8) as u8, |h| h.peek(addr)),
            _ => (addr >> 8) as u8,
        }
    }

    pub(crate) fn dispatch_alarm(
        &mut self,
        id: HandlerId,
        alarms: &mut AlarmScheduler,
        interrupts: &mut InterruptLines,
    ) -> AlarmAction {
        self.with_handler(id, alarms, interrupts, |handler, ctx| handler.on_alarm(ctx))
            .unwrap_or(AlarmAction::Done)
    }

    pub(crate) fn run_cycle_hooks(&mut self, alarms: &mut AlarmScheduler, interrupts: &mut InterruptLines) {
        for i in 0..self.cycle_hooks.len() {
            let id = self.cycle_hooks[i];
            self.with_handler(id, alarms, interrupts, |handler, ctx| handler.on_cycle(ctx));
        }
    }

    pub fn reset_handlers(&mut self) {
        for handler in &mut self.handlers {
            handler.reset();
        }
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}
