use pulsar_core::core::AccessKind;
use pulsar_core::cpu::m6502::{M6502, StatusFlag};
mod common;
use common::{TestBus, run_one, setup};

// =============================================================================
// LDA / LDX / LDY
// =============================================================================

#[test]
fn test_lda_imm_basic() {
    let mut cpu = M6502::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xA9, 0x42]); // LDA #$42
    assert_eq!(run_one(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.pc, 2);
    assert_eq!(cpu.p & (StatusFlag::Z as u8), 0);
    assert_eq!(cpu.p & (StatusFlag::N as u8), 0);
}

#[test]
fn test_lda_imm_zero_and_negative() {
    let (mut cpu, mut bus) = setup(0, &[0xA9, 0x00, 0xA9, 0x80]);
    run_one(&mut cpu, &mut bus);
    assert_eq!(cpu.p & (StatusFlag::Z as u8), StatusFlag::Z as u8);
    run_one(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x80);
    assert_eq!(cpu.p & (StatusFlag::Z as u8), 0);
    assert_eq!(cpu.p & (StatusFlag::N as u8), StatusFlag::N as u8);
}

#[test]
fn test_ldx_zp() {
    let (mut cpu, mut bus) = setup(0, &[0xA6, 0x10]); // LDX $10
    bus.memory[0x10] = 0x37;
    assert_eq!(run_one(&mut cpu, &mut bus), 3);
    assert_eq!(cpu.x, 0x37);
}

#[test]
fn test_ldy_zp_x_wraps_in_page_zero() {
    let (mut cpu, mut bus) = setup(0x0200, &[0xB4, 0xF0]); // LDY $F0,X
    cpu.x = 0x20;
    bus.memory[0x0010] = 0x99;
    bus.memory[0x0110] = 0x11;
    assert_eq!(run_one(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.y, 0x99);
}

#[test]
fn test_ldx_zp_y() {
    let (mut cpu, mut bus) = setup(0x0200, &[0xB6, 0x10]); // LDX $10,Y
    cpu.y = 0x05;
    bus.memory[0x15] = 0x44;
    assert_eq!(run_one(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.x, 0x44);
}

#[test]
fn test_lda_abs() {
    let (mut cpu, mut bus) = setup(0, &[0xAD, 0x34, 0x12]); // LDA $1234
    bus.memory[0x1234] = 0x5A;
    assert_eq!(run_one(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.a, 0x5A);
    assert_eq!(cpu.pc, 3);
}

#[test]
fn test_lda_abs_x_no_page_cross() {
    let (mut cpu, mut bus) = setup(0, &[0xBD, 0x00, 0x12]); // LDA $1200,X
    cpu.x = 0x10;
    bus.memory[0x1210] = 0x77;
    assert_eq!(run_one(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.a, 0x77);
}

#[test]
fn test_lda_abs_x_page_cross_adds_cycle() {
    let (mut cpu, mut bus) = setup(0, &[0xBD, 0xF0, 0x12]); // LDA $12F0,X
    cpu.x = 0x20;
    bus.memory[0x1310] = 0x66;
    assert_eq!(run_one(&mut cpu, &mut bus), 5);
    assert_eq!(cpu.a, 0x66);
    // The fix-up cycle reads the un-carried address.
    assert!(bus.accesses.contains(&(0x1210, 0, AccessKind::DummyRead)));
}

#[test]
fn test_ldx_abs_y_page_cross() {
    let (mut cpu, mut bus) = setup(0, &[0xBE, 0xFF, 0x20]); // LDX $20FF,Y
    cpu.y = 0x01;
    bus.memory[0x2100] = 0x12;
    assert_eq!(run_one(&mut cpu, &mut bus), 5);
    assert_eq!(cpu.x, 0x12);
}

#[test]
fn test_lda_indirect_x() {
    let (mut cpu, mut bus) = setup(0x0200, &[0xA1, 0x20]); // LDA ($20,X)
    cpu.x = 0x04;
    bus.load(0x24, &[0x00, 0x30]);
    bus.memory[0x3000] = 0xAB;
    assert_eq!(run_one(&mut cpu, &mut bus), 6);
    assert_eq!(cpu.a, 0xAB);
}

#[test]
fn test_lda_indirect_x_pointer_wraps() {
    let (mut cpu, mut bus) = setup(0x0200, &[0xA1, 0xFF]); // LDA ($FF,X)
    cpu.x = 0x00;
    bus.memory[0xFF] = 0x34;
    bus.memory[0x00] = 0x12;
    bus.memory[0x1234] = 0xCD;
    run_one(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0xCD);
}

#[test]
fn test_lda_indirect_y() {
    let (mut cpu, mut bus) = setup(0x0200, &[0xB1, 0x40]); // LDA ($40),Y
    cpu.y = 0x02;
    bus.load(0x40, &[0x00, 0x30]);
    bus.memory[0x3002] = 0x21;
    assert_eq!(run_one(&mut cpu, &mut bus), 5);
    assert_eq!(cpu.a, 0x21);
}

#[test]
fn test_lda_indirect_y_page_cross() {
    let (mut cpu, mut bus) = setup(0x0200, &[0xB1, 0x40]);
    cpu.y = 0x10;
    bus.load(0x40, &[0xF8, 0x30]);
    bus.memory[0x3108] = 0x22;
    assert_eq!(run_one(&mut cpu, &mut bus), 6);
    assert_eq!(cpu.a, 0x22);
}

// =============================================================================
// STA / STX / STY
// =============================================================================

#[test]
fn test_sta_zp() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x85, 0x10]);
    cpu.a = 0x42;
    let p = cpu.p;
    assert_eq!(run_one(&mut cpu, &mut bus), 3);
    assert_eq!(bus.memory[0x10], 0x42);
    assert_eq!(cpu.p, p, "stores leave flags alone");
}

#[test]
fn test_sta_abs_x_always_takes_fixup_cycle() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x9D, 0x00, 0x30]); // STA $3000,X
    cpu.a = 0x55;
    cpu.x = 0x01;
    assert_eq!(run_one(&mut cpu, &mut bus), 5);
    assert_eq!(bus.memory[0x3001], 0x55);
}

#[test]
fn test_sta_indirect_y_always_six_cycles() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x91, 0x40]); // STA ($40),Y
    cpu.a = 0x99;
    cpu.y = 0x01;
    bus.load(0x40, &[0x00, 0x30]);
    assert_eq!(run_one(&mut cpu, &mut bus), 6);
    assert_eq!(bus.memory[0x3001], 0x99);
}

#[test]
fn test_stx_zp_y_and_sty_abs() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x96, 0x10, 0x8C, 0x00, 0x40]);
    cpu.x = 0x11;
    cpu.y = 0x02;
    assert_eq!(run_one(&mut cpu, &mut bus), 4);
    assert_eq!(bus.memory[0x12], 0x11);
    assert_eq!(run_one(&mut cpu, &mut bus), 4);
    assert_eq!(bus.memory[0x4000], 0x02);
}

// =============================================================================
// Transfers
// =============================================================================

#[test]
fn test_tax_tay_set_flags() {
    let (mut cpu, mut bus) = setup(0, &[0xAA, 0xA8]);
    cpu.a = 0x80;
    assert_eq!(run_one(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.x, 0x80);
    run_one(&mut cpu, &mut bus);
    assert_eq!(cpu.y, 0x80);
    assert_eq!(cpu.p & (StatusFlag::N as u8), StatusFlag::N as u8);
}

#[test]
fn test_txs_does_not_touch_flags() {
    let (mut cpu, mut bus) = setup(0, &[0x9A]);
    cpu.x = 0x00;
    cpu.p = StatusFlag::U as u8;
    run_one(&mut cpu, &mut bus);
    assert_eq!(cpu.sp, 0x00);
    assert_eq!(cpu.p & (StatusFlag::Z as u8), 0);
}

#[test]
fn test_tsx_sets_flags() {
    let (mut cpu, mut bus) = setup(0, &[0xBA]);
    cpu.sp = 0xF0;
    run_one(&mut cpu, &mut bus);
    assert_eq!(cpu.x, 0xF0);
    assert_eq!(cpu.p & (StatusFlag::N as u8), StatusFlag::N as u8);
}

// =============================================================================
// Fetch accounting
// =============================================================================

#[test]
fn test_two_byte_instruction_fetches_opcode_and_operand() {
    let (mut cpu, mut bus) = setup(0x0400, &[0xEA]);
    run_one(&mut cpu, &mut bus);
    assert_eq!(
        &bus.accesses[..],
        &[
            (0x0400, 0xEA, AccessKind::OpcodeFetch),
            (0x0401, 0x00, AccessKind::OperandFetch),
        ]
    );
}

#[test]
fn test_three_byte_instruction_fetches_all_three() {
    let (mut cpu, mut bus) = setup(0x0400, &[0x4C, 0x00, 0x05]); // JMP $0500
    assert_eq!(run_one(&mut cpu, &mut bus), 3);
    assert_eq!(cpu.pc, 0x0500);
    assert_eq!(bus.accesses.len(), 3);
    assert_eq!(bus.accesses[2], (0x0402, 0x05, AccessKind::OperandFetch));
}
