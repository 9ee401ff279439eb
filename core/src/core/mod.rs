pub mod alarm;
pub mod board;
pub mod bus;
pub mod error;
pub mod history;
pub mod interrupt;
pub mod machine;
pub mod memory;

pub use alarm::{AlarmAction, AlarmCallback, AlarmContext, AlarmId, AlarmScheduler};
pub use board::Board;
pub use bus::{AccessKind, Bus, BusMaster, InterruptState};
pub use error::ConfigError;
pub use history::{AccessMap, DEFAULT_HISTORY_CAPACITY, MapFlags, MemoryAccess, MemoryHistory};
pub use interrupt::{InterruptLine, InterruptLines, InterruptSource};
pub use machine::{Machine, RunExit, RunLimit, StopFlag};
pub use memory::{
    AddressSpace, BankId, FastPath, HandlerId, IoContext, IoHandler, MAX_FAST_LIMIT, PageMapping, WindowId,
};
