use thiserror::Error;

/// Machine configuration errors.
///
/// These are raised while a machine is being wired together, never from
/// the execution loop: once a configuration has been accepted, every
/// runtime path through the address space is infallible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("bank #{bank} is not registered")]
    UnknownBank { bank: usize },

    #[error(
        "fast window over bank #{bank} (offset {offset:#06X}, limit {limit:#06X}) needs {required} bytes but the bank holds {available}"
    )]
    BankLimit {
        bank: usize,
        offset: usize,
        limit: u32,
        required: usize,
        available: usize,
    },

    #[error("fast-path limit {limit:#06X} is above the maximum of {max:#06X}")]
    LimitTooHigh { limit: u32, max: u32 },

    #[error("pages {first:#04X}..={last:#04X} do not fit in bank #{bank} at offset {offset:#06X}")]
    PageRange {
        bank: usize,
        first: u8,
        last: u8,
        offset: usize,
    },

    #[error("{len} bytes at offset {offset:#06X} overflow bank #{bank} ({available} bytes)")]
    BankOverflow {
        bank: usize,
        offset: usize,
        len: usize,
        available: usize,
    },

    #[error("I/O handler #{handler} is not registered")]
    UnknownHandler { handler: usize },

    #[error("fast window #{window} is not registered")]
    UnknownWindow { window: usize },

    #[error("address {addr:#06X} is not backed by a memory bank")]
    ImageOutOfRange { addr: u16 },

    #[error("all {max} interrupt sources are in use")]
    TooManyInterruptSources { max: usize },
}
