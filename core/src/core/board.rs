use log::debug;

use crate::core::alarm::{AlarmAction, AlarmCallback, AlarmContext, AlarmId, AlarmScheduler, AlarmTarget};
use crate::core::bus::{AccessKind, Bus, BusMaster, InterruptState};
use crate::core::interrupt::{InterruptLine, InterruptLines, InterruptSource};
use crate::core::memory::AddressSpace;

/// Everything a CPU core talks to: the address space, the shared clock with
/// its alarms, and the interrupt lines.
///
/// Several cores may share one board. They never run at the same time, so
/// each one simply borrows the board mutably while it executes. The
/// interrupt lines reach every core unless they are wired to one master
/// with [`Board::route_interrupts_to`].
pub struct Board {
    pub memory: AddressSpace,
    pub alarms: AlarmScheduler,
    pub interrupts: InterruptLines,
    interrupt_target: Option<BusMaster>,
}

impl Board {
    pub fn new(memory: AddressSpace) -> Self {
        Self {
            memory,
            alarms: AlarmScheduler::new(),
            interrupts: InterruptLines::new(),
            interrupt_target: None,
        }
    }

    /// Wire the interrupt lines to `master` alone. Other masters see idle
    /// lines, so a pending NMI or IRQ waits until `master` runs again.
    pub fn route_interrupts_to(&mut self, master: BusMaster) {
        debug!("interrupt lines routed to {master:?}");
        self.interrupt_target = Some(master);
    }

    pub fn interrupt_target(&self) -> Option<BusMaster> {
        self.interrupt_target
    }

    fn receives_interrupts(&self, master: BusMaster) -> bool {
        self.interrupt_target.is_none_or(|target| target == master)
    }

    /// Fire every alarm that is due at the current clock. Alarms created
    /// while this runs wait for the next call, even if already due.
    pub fn dispatch_alarms(&mut self) {
        let barrier = self.alarms.dispatch_barrier();
        while let Some((id, mut target)) = self.alarms.take_due(barrier) {
            let action = match &mut target {
                AlarmTarget::Callback(callback) => {
                    let mut ctx = AlarmContext {
                        id,
                        memory: &mut self.memory,
                        interrupts: &mut self.interrupts,
                        alarms: &mut self.alarms,
                    };
                    callback(&mut ctx)
                }
                AlarmTarget::Handler(handler) => {
                    self.memory
                        .dispatch_alarm(*handler, &mut self.alarms, &mut self.interrupts)
                }
            };
            self.alarms.finish(id, target, action);
        }
    }

    /// Machine reset: clock back to zero (pending alarms keep their
    /// relative distance), all interrupt lines released, every handler
    /// reset.
    pub fn reset(&mut self) {
        debug!("board reset at cycle {}", self.alarms.now());
        self.alarms.rebase();
        self.interrupts.clear_all();
        self.memory.reset_handlers();
    }

    pub fn schedule(&mut self, at: u64, callback: AlarmCallback) -> AlarmId {
        self.alarms.schedule(at, callback)
    }

    pub fn cancel(&mut self, id: AlarmId) -> bool {
        self.alarms.cancel(id)
    }

    pub fn assert_interrupt(&mut self, line: InterruptLine, source: InterruptSource) {
        self.interrupts.assert(line, source);
    }

    pub fn clear_interrupt(&mut self, line: InterruptLine, source: InterruptSource) {
        self.interrupts.clear(line, source);
    }

    pub fn enable_memory_history(&mut self, enabled: bool) {
        self.memory.enable_memory_history(enabled);
    }

    /// Bound the access log; the oldest entries are evicted first.
    pub fn set_history_capacity(&mut self, capacity: usize) {
        self.memory.history_mut().set_capacity(capacity);
    }

    pub fn peek(&self, addr: u16) -> u8 {
        self.memory.peek(addr)
    }

    /// Run the clock forward without a CPU (used while every core is
    /// halted, and by tests).
    pub fn idle(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    /// Convenience: the callback always returns [`AlarmAction::Done`].
    pub fn schedule_once(&mut self, at: u64, mut f: impl FnMut(&mut AlarmContext<'_>) + 'static) -> AlarmId {
        self.alarms.schedule(
            at,
            Box::new(move |ctx| {
                f(ctx);
                AlarmAction::Done
            }),
        )
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(AddressSpace::new())
    }
}

impl Bus for Board {
    #[inline]
    fn read(&mut self, _master: BusMaster, addr: u16, kind: AccessKind) -> u8 {
        self.memory
            .read(addr, kind, &mut self.alarms, &mut self.interrupts)
    }

    #[inline]
    fn write(&mut self, _master: BusMaster, addr: u16, data: u8, kind: AccessKind) {
        self.memory
            .write(addr, data, kind, &mut self.alarms, &mut self.interrupts);
    }

    #[inline]
    fn fetch_window(&self, addr: u16) -> Option<[u8; 3]> {
        self.memory.fetch_window(addr)
    }

    #[inline]
    fn observe(&mut self, addr: u16, data: u8, kind: AccessKind) {
        self.memory.observe(self.alarms.now(), addr, data, kind);
    }

    fn tick(&mut self) {
        self.alarms.advance();
        self.memory
            .run_cycle_hooks(&mut self.alarms, &mut self.interrupts);
        if self
            .alarms
            .next_due()
            .is_some_and(|due| due <= self.alarms.now())
        {
            self.dispatch_alarms();
        }
    }

    fn clock(&self) -> u64 {
        self.alarms.now()
    }

    fn check_interrupts(&self, target: BusMaster) -> InterruptState {
        if self.receives_interrupts(target) {
            self.interrupts.state()
        } else {
            InterruptState::default()
        }
    }

    fn acknowledge_interrupt(&mut self, target: BusMaster, line: InterruptLine) {
        if self.receives_interrupts(target) {
            self.interrupts.acknowledge(line);
        }
    }
}
