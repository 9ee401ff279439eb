//! One-line disassembly for trace logging and monitors.

use super::{Mode, OPCODES, OpcodeWord};

/// Render `word`, fetched from `pc`, in conventional assembler syntax.
/// Undocumented opcodes are prefixed with `*`.
pub fn disassemble(pc: u16, word: OpcodeWord) -> String {
    let info = &OPCODES[word.p0() as usize];
    let mark = if info.illegal { "*" } else { "" };
    let name = info.mnemonic();
    let operand = match info.mode {
        Mode::Implied => String::new(),
        Mode::Accumulator => " A".to_string(),
        Mode::Immediate => format!(" #${:02X}", word.p1()),
        Mode::ZeroPage => format!(" ${:02X}", word.p1()),
        Mode::ZeroPageX => format!(" ${:02X},X", word.p1()),
        Mode::ZeroPageY => format!(" ${:02X},Y", word.p1()),
        Mode::Absolute => format!(" ${:04X}", word.p2()),
        Mode::AbsoluteX => format!(" ${:04X},X", word.p2()),
        Mode::AbsoluteY => format!(" ${:04X},Y", word.p2()),
        Mode::Indirect => format!(" (${:04X})", word.p2()),
        Mode::IndirectX => format!(" (${:02X},X)", word.p1()),
        Mode::IndirectY => format!(" (${:02X}),Y", word.p1()),
        Mode::Relative => {
            let target = pc.wrapping_add(2).wrapping_add(word.p1() as i8 as u16);
            format!(" ${target:04X}")
        }
    };
    format!("{mark}{name}{operand}")
}
