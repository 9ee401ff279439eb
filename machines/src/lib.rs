pub mod config;
pub mod coprocessor;
pub mod disk;
pub mod image;
pub mod pet;
pub mod registry;
pub mod simple6502;

pub use config::{MachineConfig, MachineError};
pub use coprocessor::CoprocessorSystem;
pub use image::{ImageError, ProgramImage, RomImage};
pub use pet::PetSystem;
pub use simple6502::Simple6502System;
