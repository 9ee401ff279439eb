use log::debug;

use crate::core::{AlarmAction, AlarmId, InterruptLine, InterruptSource, IoContext, IoHandler};

/// Control register bits.
pub const CTRL_START: u8 = 0x01;
pub const CTRL_FREE_RUN: u8 = 0x02;
pub const CTRL_IRQ_ENABLE: u8 = 0x80;

/// Flag register bit set on underflow.
pub const FLAG_UNDERFLOW: u8 = 0x80;

/// 16-bit down-counting interval timer.
///
/// The counter is never decremented cycle by cycle: the timer remembers
/// when it was loaded and schedules one alarm for the underflow. Reading
/// the counter computes its value from the clock.
///
/// | Offset | Read            | Write                                 |
/// |--------|-----------------|---------------------------------------|
/// | 0      | counter low     | latch low                             |
/// | 1      | counter high    | latch high, load counter, start       |
/// | 2      | control         | control                               |
/// | 3      | flags (clears)  | bit 7 set: acknowledge underflow      |
///
/// Registers mirror every four bytes. The counter underflows `latch + 1`
/// cycles after being loaded; in free-run mode it reloads from the latch.
pub struct IntervalTimer {
    latch: u16,
    control: u8,
    flag: bool,
    running: bool,
    /// Counter value at `loaded_at`; also the frozen value while stopped.
    counter: u16,
    loaded_at: u64,
    alarm: Option<AlarmId>,
    source: InterruptSource,
}

impl IntervalTimer {
    pub fn new(source: InterruptSource) -> Self {
        Self {
            latch: 0xFFFF,
            control: 0,
            flag: false,
            running: false,
            counter: 0xFFFF,
            loaded_at: 0,
            alarm: None,
            source,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn underflowed(&self) -> bool {
        self.flag
    }

    pub fn counter_at(&self, now: u64) -> u16 {
        if !self.running {
            return self.counter;
        }
        let elapsed = now.saturating_sub(self.loaded_at);
        self.counter.wrapping_sub(elapsed as u16)
    }

    fn irq_enabled(&self) -> bool {
        self.control & CTRL_IRQ_ENABLE != 0
    }

    fn update_irq(&self, ctx: &mut IoContext<'_>) {
        if self.flag && self.irq_enabled() {
            ctx.assert_interrupt(InterruptLine::Irq, self.source);
        } else {
            ctx.clear_interrupt(InterruptLine::Irq, self.source);
        }
    }

    fn start(&mut self, ctx: &mut IoContext<'_>, value: u16) {
        let now = ctx.now();
        self.counter = value;
        self.loaded_at = now;
        self.running = true;
        let due = now + value as u64 + 1;
        self.alarm = match self.alarm {
            Some(id) if ctx.reschedule(id, due) => Some(id),
            _ => Some(ctx.schedule_self(due)),
        };
    }

    fn stop(&mut self, ctx: &mut IoContext<'_>) {
        self.counter = self.counter_at(ctx.now());
        self.running = false;
        if let Some(id) = self.alarm.take() {
            ctx.cancel(id);
        }
    }
}

impl IoHandler for IntervalTimer {
    fn read(&mut self, addr: u16, ctx: &mut IoContext<'_>) -> u8 {
        match addr & 0x03 {
            0 => self.counter_at(ctx.now()) as u8,
            1 => (self.counter_at(ctx.now()) >> 8) as u8,
            2 => self.control,
            _ => {
                let value = if self.flag { FLAG_UNDERFLOW } else { 0 };
                self.flag = false;
                self.update_irq(ctx);
                value
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8, ctx: &mut IoContext<'_>) {
        match addr & 0x03 {
            0 => self.latch = (self.latch & 0xFF00) | value as u16,
            1 => {
                self.latch = (self.latch & 0x00FF) | (value as u16) << 8;
                self.flag = false;
                self.update_irq(ctx);
                self.control |= CTRL_START;
                self.start(ctx, self.latch);
            }
            2 => {
                let was_started = self.control & CTRL_START != 0;
                self.control = value;
                match (was_started, value & CTRL_START != 0) {
                    (false, true) => self.start(ctx, self.counter),
                    (true, false) => self.stop(ctx),
                    _ => {}
                }
                self.update_irq(ctx);
            }
            _ => {
                if value & FLAG_UNDERFLOW != 0 {
                    self.flag = false;
                    self.update_irq(ctx);
                }
            }
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        // No clock here: counter registers show the last loaded value.
        match addr & 0x03 {
            0 => self.counter as u8,
            1 => (self.counter >> 8) as u8,
            2 => self.control,
            _ => {
                if self.flag {
                    FLAG_UNDERFLOW
                } else {
                    0
                }
            }
        }
    }

    fn on_alarm(&mut self, ctx: &mut IoContext<'_>) -> AlarmAction {
        if !self.running {
            self.alarm = None;
            return AlarmAction::Done;
        }
        let now = ctx.now();
        self.flag = true;
        self.update_irq(ctx);
        if self.control & CTRL_FREE_RUN != 0 {
            self.counter = self.latch;
            self.loaded_at = now;
            AlarmAction::Reschedule(now + self.latch as u64 + 1)
        } else {
            debug!("interval timer one-shot expired at cycle {now}");
            self.counter = 0xFFFF;
            self.running = false;
            self.control &= !CTRL_START;
            self.alarm = None;
            AlarmAction::Done
        }
    }

    fn reset(&mut self) {
        self.latch = 0xFFFF;
        self.control = 0;
        self.flag = false;
        self.running = false;
        self.counter = 0xFFFF;
        // A pending alarm finds the timer stopped and retires itself, or
        // is moved by the next start.
    }
}
