use std::cell::RefCell;
use std::rc::Rc;

use pulsar_core::core::{
    AddressSpace, AlarmAction, BankId, Board, Bus, InterruptLine, RunExit, RunLimit, StopFlag,
    WindowId,
};
use pulsar_core::cpu::m6502::{HaltReason, M6502, StepOutcome};
use pulsar_core::device::BankLatch;
mod common;
use common::ram_board;

fn cpu_at(pc: u16) -> M6502 {
    let mut cpu = M6502::new();
    cpu.pc = pc;
    cpu.sp = 0xFD;
    cpu
}

// =============================================================================
// Run loop
// =============================================================================

#[test]
fn test_nop_through_fast_window() {
    let mut board = ram_board(0x1000);
    board.memory.load(0x0200, &[0xEA]).unwrap();
    let mut cpu = cpu_at(0x0200);
    let outcome = cpu.step(&mut board);
    assert_eq!(
        outcome,
        StepOutcome::Executed {
            pc: 0x0200,
            opcode: 0xEA,
            cycles: 2,
            interrupt: None,
        }
    );
    assert_eq!(cpu.pc, 0x0201);
    assert_eq!(board.clock(), 2);
}

#[test]
fn test_run_until_stops_at_instruction_boundary() {
    let mut board = ram_board(0x1000);
    // LDA abs (4 cycles) in a loop: JMP back.
    board.memory.load(0x0200, &[0xAD, 0x00, 0x30, 0x4C, 0x00, 0x02]).unwrap();
    let mut cpu = cpu_at(0x0200);
    let exit = cpu.run_until(&mut board, &RunLimit::until(10));
    assert_eq!(exit, RunExit::CycleLimit);
    // 4 + 3 + 4 = 11: the limit is only checked between instructions.
    assert_eq!(board.clock(), 11);
    assert_eq!(cpu.pc, 0x0203);
    assert_eq!(cpu.halt_reason(), Some(HaltReason::CycleLimit));

    // The next run lifts the halt.
    let exit = cpu.run_for(&mut board, 3);
    assert_eq!(exit, RunExit::CycleLimit);
    assert_eq!(board.clock(), 14);
    assert_eq!(cpu.pc, 0x0200);
}

#[test]
fn test_limit_already_reached_runs_nothing() {
    let mut board = ram_board(0x1000);
    board.idle(50);
    let mut cpu = cpu_at(0x0200);
    assert_eq!(cpu.run_until(&mut board, &RunLimit::until(20)), RunExit::CycleLimit);
    assert_eq!(board.clock(), 50);
    assert_eq!(cpu.pc, 0x0200);
}

#[test]
fn test_stop_flag_from_alarm() {
    let mut board = ram_board(0x1000);
    board.memory.load(0x0200, &[0x4C, 0x00, 0x02]).unwrap(); // JMP $0200
    let stop = StopFlag::new();
    let requester = stop.clone();
    board.schedule_once(100, move |_| requester.request());
    let mut cpu = cpu_at(0x0200);
    let exit = cpu.run_until(&mut board, &RunLimit::unbounded().with_stop(stop.clone()));
    assert_eq!(exit, RunExit::StopRequested);
    assert!(board.clock() >= 100 && board.clock() < 103);
    assert!(!stop.is_requested());
    assert_eq!(cpu.pc, 0x0200);
    assert!(!cpu.is_halted(), "a stop request only parks the core");
    assert_eq!(cpu.halt_reason(), Some(HaltReason::StopRequested));
}

#[test]
fn test_sliced_core_is_not_halted() {
    let mut board = ram_board(0x1000);
    // JMP $0200 forever, then a JAM nobody reaches.
    board.memory.load(0x0200, &[0x4C, 0x00, 0x02, 0x02]).unwrap();
    let mut cpu = cpu_at(0x0200);
    for _ in 0..3 {
        assert_eq!(cpu.run_for(&mut board, 50), RunExit::CycleLimit);
        assert!(!cpu.is_halted());
        assert!(!pulsar_core::cpu::Cpu::is_halted(&cpu));
        assert_eq!(cpu.halt_reason(), Some(HaltReason::CycleLimit));
    }

    // A JAM is a real halt.
    board.memory.load(0x0200, &[0x02]).unwrap();
    cpu.pc = 0x0200;
    assert_eq!(
        cpu.run_for(&mut board, 50),
        RunExit::Halted(HaltReason::Jammed { pc: 0x0200, opcode: 0x02 })
    );
    assert!(cpu.is_halted());
}

// =============================================================================
// Alarms
// =============================================================================

#[test]
fn test_alarm_fires_exactly_once() {
    let mut board = ram_board(0x1000);
    board.memory.load(0x0200, &[0x4C, 0x00, 0x02]).unwrap();
    let fired = Rc::new(RefCell::new(Vec::new()));
    let log = fired.clone();
    board.schedule_once(5, move |ctx| log.borrow_mut().push(ctx.now()));
    let mut cpu = cpu_at(0x0200);
    cpu.run_until(&mut board, &RunLimit::until(100));
    assert_eq!(*fired.borrow(), vec![5]);
    assert_eq!(board.alarms.pending(), 0);
}

#[test]
fn test_periodic_alarm_and_cancel() {
    let mut board = ram_board(0x1000);
    let count = Rc::new(RefCell::new(0u32));
    let c = count.clone();
    let id = board.schedule(
        10,
        Box::new(move |ctx| {
            *c.borrow_mut() += 1;
            AlarmAction::Reschedule(ctx.now() + 10)
        }),
    );
    board.idle(45);
    assert_eq!(*count.borrow(), 4);
    assert!(board.cancel(id));
    board.idle(100);
    assert_eq!(*count.borrow(), 4);
}

#[test]
fn test_alarms_at_same_cycle_fire_in_schedule_order() {
    let mut board = Board::default();
    let order = Rc::new(RefCell::new(Vec::new()));
    for tag in ["a", "b", "c"] {
        let log = order.clone();
        board.schedule_once(3, move |_| log.borrow_mut().push(tag));
    }
    let log = order.clone();
    board.schedule_once(2, move |_| log.borrow_mut().push("early"));
    board.idle(3);
    assert_eq!(*order.borrow(), vec!["early", "a", "b", "c"]);
}

#[test]
fn test_interrupt_raised_mid_instruction_waits_for_boundary() {
    let mut board = ram_board(0x1000);
    let source = board.interrupts.register_source("test").unwrap();
    board.memory.load(0x0200, &[0xEA, 0xAD, 0x00, 0x30, 0xEA]).unwrap();
    board.memory.load(0xFFFE, &[0x00, 0x80]).unwrap();
    // Fires during the LDA (cycles 3..=6).
    board.schedule_once(4, move |ctx| ctx.assert_interrupt(InterruptLine::Irq, source));
    let mut cpu = cpu_at(0x0200);
    cpu.p &= !0x04;

    assert!(matches!(
        cpu.step(&mut board),
        StepOutcome::Executed { interrupt: None, .. }
    ));
    let outcome = cpu.step(&mut board);
    assert_eq!(
        outcome,
        StepOutcome::Executed {
            pc: 0x0201,
            opcode: 0xAD,
            cycles: 11,
            interrupt: Some(InterruptLine::Irq),
        }
    );
    assert_eq!(cpu.pc, 0x8000);
    // Return address is after the LDA.
    assert_eq!(board.peek(0x01FD), 0x02);
    assert_eq!(board.peek(0x01FC), 0x04);
}

// =============================================================================
// Banking
// =============================================================================

fn banked_board() -> (Board, [BankId; 2], [WindowId; 2]) {
    let mut memory = AddressSpace::new();
    let low = memory.add_ram(0x8000);
    let high = memory.add_ram(0x8000);
    let w0 = memory.register_window(low, 0, 0x8000).unwrap();
    let w1 = memory.register_window(high, 0, 0x8000).unwrap();
    memory.select_window(w0).unwrap();
    memory.map_handler(0xE8..=0xE8, BankLatch::new(vec![w0, w1]));
    (Board::new(memory), [low, high], [w0, w1])
}

#[test]
fn test_bank_switch_applies_to_next_fetch() {
    let (mut board, [low, high], _) = banked_board();
    // LDA #1; STA $E800; NOP in the low bank, LDA #$42 at $0205 in the high one.
    board
        .memory
        .poke_bank(low, 0x0200, &[0xA9, 0x01, 0x8D, 0x00, 0xE8, 0xEA])
        .unwrap();
    board.memory.poke_bank(high, 0x0205, &[0xA9, 0x42]).unwrap();
    let mut cpu = cpu_at(0x0200);
    cpu.step(&mut board);
    cpu.step(&mut board);
    assert_eq!(cpu.pc, 0x0205);
    cpu.step(&mut board);
    assert_eq!(cpu.a, 0x42);
}

#[test]
fn test_bank_switch_during_fetch_does_not_tear() {
    let (mut board, [low, high], [_, w1]) = banked_board();
    board.memory.poke_bank(low, 0x0200, &[0xA9, 0x11, 0xEA]).unwrap();
    board.memory.poke_bank(high, 0x0200, &[0xA9, 0x22, 0xA9, 0x33]).unwrap();
    // Switch after the opcode byte has been charged.
    board.schedule_once(1, move |ctx| {
        ctx.memory.select_window(w1).unwrap();
    });
    let mut cpu = cpu_at(0x0200);
    cpu.step(&mut board);
    assert_eq!(cpu.a, 0x11, "operand comes from the bank the opcode came from");
    cpu.step(&mut board);
    assert_eq!(cpu.a, 0x33);
}
