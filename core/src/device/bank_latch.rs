use log::{debug, warn};

use crate::core::{IoContext, IoHandler, WindowId};

/// Write-only bank select register.
///
/// Writing `n` switches the fast path to the `n`-th registered window.
/// Writing [`BankLatch::DISABLE`] turns the fast path off, sending every
/// access through the page table. The switch applies from the next bus
/// access on, so it never affects the fetch already in progress.
pub struct BankLatch {
    windows: Vec<WindowId>,
    selected: u8,
}

impl BankLatch {
    pub const DISABLE: u8 = 0xFF;

    pub fn new(windows: Vec<WindowId>) -> Self {
        Self {
            windows,
            selected: 0,
        }
    }

    pub fn selected(&self) -> u8 {
        self.selected
    }
}

impl IoHandler for BankLatch {
    fn read(&mut self, addr: u16, _ctx: &mut IoContext<'_>) -> u8 {
        self.peek(addr)
    }

    fn write(&mut self, _addr: u16, value: u8, ctx: &mut IoContext<'_>) {
        if value == Self::DISABLE {
            self.selected = value;
            ctx.disable_fast_path();
            return;
        }
        match self.windows.get(value as usize) {
            Some(&window) => {
                debug!("bank latch -> {value} at cycle {}", ctx.now());
                self.selected = value;
                ctx.select_window(window);
            }
            None => warn!("bank latch: no window {value} ({} registered)", self.windows.len()),
        }
    }

    /// Write-only: reads float to the page number.
    fn peek(&self, addr: u16) -> u8 {
        (addr >> 8) as u8
    }

    fn reset(&mut self) {
        self.selected = 0;
    }
}
