use crate::core::{InterruptLine, InterruptSource, IoContext, IoHandler};

/// Beam position counter for a video chip clocked by the CPU clock.
///
/// Attached as a cycle hook, so it advances on every tick like a real
/// video chip would. Reading offset 0 returns the current line (low
/// byte), offset 1 the cycle within the line. When a vertical-blank
/// source is given, the counter holds it on IRQ for the first line of
/// each frame.
pub struct RasterCounter {
    cycles_per_line: u16,
    lines: u16,
    cycle: u16,
    line: u16,
    vblank: Option<InterruptSource>,
}

impl RasterCounter {
    pub fn new(cycles_per_line: u16, lines: u16) -> Self {
        Self {
            cycles_per_line: cycles_per_line.max(1),
            lines: lines.max(1),
            cycle: 0,
            line: 0,
            vblank: None,
        }
    }

    pub fn with_vblank_irq(mut self, source: InterruptSource) -> Self {
        self.vblank = Some(source);
        self
    }

    pub fn position(&self) -> (u16, u16) {
        (self.line, self.cycle)
    }
}

impl IoHandler for RasterCounter {
    fn read(&mut self, addr: u16, _ctx: &mut IoContext<'_>) -> u8 {
        self.peek(addr)
    }

    fn write(&mut self, _addr: u16, _value: u8, _ctx: &mut IoContext<'_>) {}

    fn peek(&self, addr: u16) -> u8 {
        match addr & 0x01 {
            0 => self.line as u8,
            _ => self.cycle as u8,
        }
    }

    fn on_cycle(&mut self, ctx: &mut IoContext<'_>) {
        self.cycle += 1;
        if self.cycle < self.cycles_per_line {
            return;
        }
        self.cycle = 0;
        self.line = (self.line + 1) % self.lines;
        if let Some(source) = self.vblank {
            if self.line == 0 {
                ctx.assert_interrupt(InterruptLine::Irq, source);
            } else if self.line == 1 {
                ctx.clear_interrupt(InterruptLine::Irq, source);
            }
        }
    }

    fn reset(&mut self) {
        self.cycle = 0;
        self.line = 0;
    }
}
