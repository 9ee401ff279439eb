//! Interrupt request lines shared between peripherals and the CPU.
//!
//! Every line is a wired-OR of up to 32 sources. Peripherals assert and
//! clear their own source bit; the CPU only ever acknowledges.

use crate::core::bus::InterruptState;
use crate::core::error::ConfigError;

/// Maximum number of distinct interrupt sources per board.
pub const MAX_SOURCES: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterruptLine {
    Irq,
    Nmi,
    Reset,
}

/// One bit of the wired-OR on each line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InterruptSource(u8);

impl InterruptSource {
    /// Always-registered source for host-side or test-driven requests.
    pub const EXTERNAL: Self = Self(0);

    pub fn index(self) -> u8 {
        self.0
    }

    #[inline]
    fn mask(self) -> u32 {
        1 << self.0
    }
}

#[derive(Debug, Clone)]
pub struct InterruptLines {
    irq: u32,
    nmi: u32,
    reset: u32,
    nmi_latched: bool,
    reset_latched: bool,
    names: Vec<&'static str>,
}

impl InterruptLines {
    pub fn new() -> Self {
        Self {
            irq: 0,
            nmi: 0,
            reset: 0,
            nmi_latched: false,
            reset_latched: false,
            names: vec!["external"],
        }
    }

    /// Hand out a new source bit. Configuration time only.
    pub fn register_source(&mut self, name: &'static str) -> Result<InterruptSource, ConfigError> {
        if self.names.len() >= MAX_SOURCES {
            return Err(ConfigError::TooManyInterruptSources { max: MAX_SOURCES });
        }
        self.names.push(name);
        Ok(InterruptSource((self.names.len() - 1) as u8))
    }

    pub fn source_name(&self, source: InterruptSource) -> Option<&'static str> {
        self.names.get(source.0 as usize).copied()
    }

    pub fn assert(&mut self, line: InterruptLine, source: InterruptSource) {
        match line {
            InterruptLine::Irq => self.irq |= source.mask(),
            InterruptLine::Nmi => {
                // Edge-triggered: only the first source to pull the line
                // low produces an edge.
                if self.nmi == 0 {
                    self.nmi_latched = true;
                }
                self.nmi |= source.mask();
            }
            InterruptLine::Reset => {
                self.reset |= source.mask();
                self.reset_latched = true;
            }
        }
    }

    pub fn clear(&mut self, line: InterruptLine, source: InterruptSource) {
        match line {
            InterruptLine::Irq => self.irq &= !source.mask(),
            InterruptLine::Nmi => self.nmi &= !source.mask(),
            InterruptLine::Reset => self.reset &= !source.mask(),
        }
    }

    /// Electrical level of a line: true while any source holds it.
    pub fn is_asserted(&self, line: InterruptLine) -> bool {
        match line {
            InterruptLine::Irq => self.irq != 0,
            InterruptLine::Nmi => self.nmi != 0,
            InterruptLine::Reset => self.reset != 0,
        }
    }

    /// Sources currently holding `line`.
    pub fn asserted_sources(&self, line: InterruptLine) -> impl Iterator<Item = InterruptSource> {
        let bits = match line {
            InterruptLine::Irq => self.irq,
            InterruptLine::Nmi => self.nmi,
            InterruptLine::Reset => self.reset,
        };
        (0..MAX_SOURCES as u8)
            .filter(move |bit| bits & (1 << bit) != 0)
            .map(InterruptSource)
    }

    pub fn state(&self) -> InterruptState {
        InterruptState {
            irq: self.irq != 0,
            nmi: self.nmi_latched,
            reset: self.reset_latched,
        }
    }

    /// The CPU took the interrupt. IRQ has no latch: a source that keeps
    /// the line asserted will interrupt again once I is cleared.
    pub fn acknowledge(&mut self, line: InterruptLine) {
        match line {
            InterruptLine::Irq => {}
            InterruptLine::Nmi => self.nmi_latched = false,
            InterruptLine::Reset => self.reset_latched = false,
        }
    }

    pub fn clear_all(&mut self) {
        self.irq = 0;
        self.nmi = 0;
        self.reset = 0;
        self.nmi_latched = false;
        self.reset_latched = false;
    }
}

impl Default for InterruptLines {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nmi_latches_only_on_first_edge() {
        let mut lines = InterruptLines::new();
        let a = lines.register_source("a").unwrap();
        lines.assert(InterruptLine::Nmi, InterruptSource::EXTERNAL);
        lines.acknowledge(InterruptLine::Nmi);
        // Second source while the line is already low: no new edge.
        lines.assert(InterruptLine::Nmi, a);
        assert!(!lines.state().nmi);
        lines.clear(InterruptLine::Nmi, InterruptSource::EXTERNAL);
        lines.clear(InterruptLine::Nmi, a);
        lines.assert(InterruptLine::Nmi, a);
        assert!(lines.state().nmi);
    }

    #[test]
    fn irq_is_wired_or() {
        let mut lines = InterruptLines::new();
        let timer = lines.register_source("timer").unwrap();
        lines.assert(InterruptLine::Irq, timer);
        lines.assert(InterruptLine::Irq, InterruptSource::EXTERNAL);
        lines.clear(InterruptLine::Irq, timer);
        assert!(lines.state().irq);
        lines.acknowledge(InterruptLine::Irq);
        assert!(lines.state().irq, "acknowledge must not drop a level line");
        lines.clear(InterruptLine::Irq, InterruptSource::EXTERNAL);
        assert!(!lines.state().irq);
        assert_eq!(lines.source_name(timer), Some("timer"));
    }

    #[test]
    fn source_table_is_bounded() {
        let mut lines = InterruptLines::new();
        for _ in 1..MAX_SOURCES {
            lines.register_source("dev").unwrap();
        }
        assert_eq!(
            lines.register_source("one too many"),
            Err(ConfigError::TooManyInterruptSources { max: MAX_SOURCES })
        );
    }
}
