use pulsar_core::core::AccessKind;
use pulsar_core::cpu::m6502::StatusFlag;
mod common;
use common::{run_one, setup};

#[test]
fn test_pha_pushes_and_decrements() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x48]);
    cpu.a = 0x42;
    assert_eq!(run_one(&mut cpu, &mut bus), 3);
    assert_eq!(bus.memory[0x01FD], 0x42);
    assert_eq!(cpu.sp, 0xFC);
}

#[test]
fn test_pla_pulls_and_sets_flags() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x68]);
    cpu.sp = 0xFC;
    bus.memory[0x01FD] = 0x80;
    assert_eq!(run_one(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.a, 0x80);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.p & (StatusFlag::N as u8), StatusFlag::N as u8);
    // Internal cycle reads the stack at the old SP.
    assert!(bus.accesses.contains(&(0x01FC, 0, AccessKind::DummyRead)));
}

#[test]
fn test_php_sets_b_and_u_in_pushed_copy() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x08]);
    cpu.p = StatusFlag::C as u8;
    run_one(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x01FD], 0x31);
    assert_eq!(cpu.p, StatusFlag::C as u8, "register itself is untouched");
}

#[test]
fn test_plp_ignores_b_and_forces_u() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x28]);
    cpu.sp = 0xFC;
    bus.memory[0x01FD] = 0xDF & 0xFF; // everything but U
    run_one(&mut cpu, &mut bus);
    assert_eq!(cpu.p & (StatusFlag::B as u8), 0);
    assert_eq!(cpu.p & (StatusFlag::U as u8), StatusFlag::U as u8);
    assert_eq!(cpu.p & (StatusFlag::N as u8), StatusFlag::N as u8);
}

#[test]
fn test_stack_pointer_wraps() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x48, 0x68]);
    cpu.sp = 0x00;
    cpu.a = 0x5A;
    run_one(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x0100], 0x5A);
    assert_eq!(cpu.sp, 0xFF);
    cpu.a = 0;
    run_one(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x5A);
    assert_eq!(cpu.sp, 0x00);
}

#[test]
fn test_brk_rti_round_trip() {
    let (mut cpu, mut bus) = setup(0x0200, &[0x00, 0xFF, 0xEA]);
    bus.set_vector(0xFFFE, 0x4000);
    bus.load(0x4000, &[0x40]); // RTI
    cpu.p = StatusFlag::U as u8 | StatusFlag::C as u8;

    assert_eq!(run_one(&mut cpu, &mut bus), 7);
    assert_eq!(cpu.pc, 0x4000);
    assert_eq!(cpu.p & (StatusFlag::I as u8), StatusFlag::I as u8);
    // Return address skips the padding byte.
    assert_eq!(bus.memory[0x01FD], 0x02);
    assert_eq!(bus.memory[0x01FC], 0x02);
    assert_eq!(bus.memory[0x01FB], 0x31);

    assert_eq!(run_one(&mut cpu, &mut bus), 6);
    assert_eq!(cpu.pc, 0x0202);
    assert_eq!(cpu.p, StatusFlag::U as u8 | StatusFlag::C as u8);
    assert_eq!(cpu.sp, 0xFD);
}
