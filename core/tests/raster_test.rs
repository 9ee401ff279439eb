use pulsar_core::core::{AccessKind, Board, Bus, BusMaster, InterruptLine};
use pulsar_core::device::RasterCounter;

fn raster_board(vblank: bool) -> Board {
    let mut board = Board::default();
    let mut counter = RasterCounter::new(4, 3);
    if vblank {
        let source = board.interrupts.register_source("vblank").unwrap();
        counter = counter.with_vblank_irq(source);
    }
    let id = board.memory.map_handler(0xE8..=0xE8, counter);
    board.memory.attach_cycle_hook(id).unwrap();
    board
}

#[test]
fn test_position_advances_every_tick() {
    let mut board = raster_board(false);
    board.idle(5);
    assert_eq!(board.read(BusMaster::Cpu(0), 0xE880, AccessKind::Read), 1);
    assert_eq!(board.read(BusMaster::Cpu(0), 0xE881, AccessKind::Read), 1);
    board.idle(7);
    assert_eq!(board.peek(0xE880), 0, "wrapped to line 0 after a frame");
    assert_eq!(board.peek(0xE881), 0);
}

#[test]
fn test_vblank_irq_held_for_first_line() {
    let mut board = raster_board(true);
    board.idle(11);
    assert!(!board.interrupts.is_asserted(InterruptLine::Irq));
    board.idle(1);
    assert!(board.interrupts.is_asserted(InterruptLine::Irq));
    board.idle(3);
    assert!(board.interrupts.is_asserted(InterruptLine::Irq));
    board.idle(1);
    assert!(!board.interrupts.is_asserted(InterruptLine::Irq));
}

#[test]
fn test_reset_returns_to_top() {
    let mut board = raster_board(false);
    board.idle(6);
    board.reset();
    assert_eq!(board.peek(0xE880), 0);
    assert_eq!(board.peek(0xE881), 0);
}
