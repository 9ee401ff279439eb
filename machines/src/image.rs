//! Program and ROM images.
//!
//! A program is either a raw binary placed at an explicit address or a
//! Commodore PRG file, whose first two bytes hold the little-endian load
//! address. ROM images carry an optional CRC-32 check so a machine can
//! refuse a dump that is not the one it was built against.

use std::path::Path;

use pulsar_core::core::{AddressSpace, ConfigError};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CRC-32
// ---------------------------------------------------------------------------

/// CRC-32 lookup table (reflected polynomial 0xEDB88320), the same
/// checksum ZIP and PNG use.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A PRG file needs at least its two-byte load address.
    #[error("image is {len} bytes, too short for a load address header")]
    TooShort { len: usize },

    #[error("{name}: CRC32 expected 0x{expected:08X}, got 0x{actual:08X}")]
    ChecksumMismatch { name: String, expected: u32, actual: u32 },
}

// ---------------------------------------------------------------------------
// ProgramImage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    pub load_address: u16,
    pub data: Vec<u8>,
}

impl ProgramImage {
    pub fn raw(load_address: u16, data: Vec<u8>) -> Self {
        Self { load_address, data }
    }

    /// Split a PRG file into its load address and body.
    pub fn prg(bytes: &[u8]) -> Result<Self, ImageError> {
        match bytes {
            [lo, hi, body @ ..] => Ok(Self {
                load_address: u16::from_le_bytes([*lo, *hi]),
                data: body.to_vec(),
            }),
            _ => Err(ImageError::TooShort { len: bytes.len() }),
        }
    }

    /// Read a program from disk. With an explicit address the file is
    /// taken as a raw binary, otherwise as a PRG.
    pub fn from_file(path: &Path, load_address: Option<u16>) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path)?;
        match load_address {
            Some(addr) => Ok(Self::raw(addr, bytes)),
            None => Self::prg(&bytes),
        }
    }

    /// One past the last byte, as a 17-bit address.
    pub fn end(&self) -> u32 {
        self.load_address as u32 + self.data.len() as u32
    }

    pub fn load_into(&self, memory: &mut AddressSpace) -> Result<(), ConfigError> {
        memory.load(self.load_address, &self.data)
    }
}

// ---------------------------------------------------------------------------
// RomImage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomImage {
    pub name: String,
    pub data: Vec<u8>,
}

impl RomImage {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ImageError> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, data })
    }

    pub fn crc32(&self) -> u32 {
        crc32(&self.data)
    }

    pub fn verify_crc32(&self, expected: u32) -> Result<(), ImageError> {
        let actual = self.crc32();
        if actual != expected {
            return Err(ImageError::ChecksumMismatch {
                name: self.name.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
