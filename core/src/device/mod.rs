pub mod bank_latch;
pub mod interval_timer;
pub mod raster;

pub use bank_latch::BankLatch;
pub use interval_timer::IntervalTimer;
pub use raster::RasterCounter;
