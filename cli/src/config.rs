//! Runner settings: an optional TOML file, overridden by command-line flags.
//!
//! ```toml
//! [run]
//! machine = "pet"
//! cycle_limit = 5_000_000
//! entry = 0x0400
//!
//! [cpu]
//! illegal_opcodes = "trap"
//!
//! [debug]
//! memory_history = true
//! history_capacity = 100_000
//! history_dump = "accesses.txt"
//! ```

use std::path::{Path, PathBuf};

use pulsar_core::core::{ConfigError, DEFAULT_HISTORY_CAPACITY};
use pulsar_core::cpu::m6502::IllegalOpcodePolicy;
use pulsar_machines::{ImageError, MachineError};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MACHINE: &str = "simple6502";
pub const DEFAULT_CYCLE_LIMIT: u64 = 20_000_000;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("unknown machine '{name}' (available: {available})")]
    UnknownMachine { name: String, available: String },
}

impl From<MachineError> for CliError {
    fn from(e: MachineError) -> Self {
        match e {
            MachineError::Config(e) => CliError::Config(e),
            MachineError::Image(e) => CliError::Image(e),
        }
    }
}

// ---------------------------------------------------------------------------
// File layout
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub run: RunSection,
    pub cpu: CpuSection,
    pub debug: DebugSection,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub machine: Option<String>,
    /// 0 runs until the CPU halts.
    pub cycle_limit: Option<u64>,
    pub entry: Option<u16>,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CpuSection {
    pub illegal_opcodes: IllegalOpcodes,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IllegalOpcodes {
    #[default]
    Emulate,
    Trap,
}

impl From<IllegalOpcodes> for IllegalOpcodePolicy {
    fn from(mode: IllegalOpcodes) -> Self {
        match mode {
            IllegalOpcodes::Emulate => IllegalOpcodePolicy::Emulate,
            IllegalOpcodes::Trap => IllegalOpcodePolicy::Trap,
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DebugSection {
    pub memory_history: bool,
    /// Most recent accesses to keep; older ones are dropped.
    pub history_capacity: Option<usize>,
    /// Write every recorded access here after the run.
    pub history_dump: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| CliError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `<config dir>/pulsar/pulsar.toml`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pulsar").join("pulsar.toml"))
}

/// An explicit path must exist; a missing default file means defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, CliError> {
    if let Some(path) = explicit {
        return FileConfig::load(path);
    }
    match default_path() {
        Some(path) if path.is_file() => {
            log::debug!("reading {}", path.display());
            FileConfig::load(&path)
        }
        _ => Ok(FileConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Values given on the command line. Unset fields fall back to the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub machine: Option<String>,
    pub cycles: Option<u64>,
    pub entry: Option<u16>,
    pub trap_illegal: bool,
    pub history: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Settings {
    pub machine: String,
    /// `None` runs until the CPU halts.
    pub cycle_limit: Option<u64>,
    pub entry: Option<u16>,
    pub policy: IllegalOpcodePolicy,
    pub memory_history: bool,
    pub history_capacity: usize,
    pub history_dump: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Self {
        let cycles = overrides
            .cycles
            .or(file.run.cycle_limit)
            .unwrap_or(DEFAULT_CYCLE_LIMIT);
        let policy = if overrides.trap_illegal {
            IllegalOpcodePolicy::Trap
        } else {
            file.cpu.illegal_opcodes.into()
        };
        // Dumping needs something to dump.
        let memory_history =
            overrides.history || file.debug.memory_history || file.debug.history_dump.is_some();
        Self {
            machine: overrides
                .machine
                .or(file.run.machine)
                .unwrap_or_else(|| DEFAULT_MACHINE.to_string()),
            cycle_limit: (cycles != 0).then_some(cycles),
            entry: overrides.entry.or(file.run.entry),
            policy,
            memory_history,
            history_capacity: file
                .debug
                .history_capacity
                .unwrap_or(DEFAULT_HISTORY_CAPACITY)
                .max(1),
            history_dump: file.debug.history_dump,
        }
    }
}

/// Parse a 16-bit address written as `C000`, `$C000` or `0xC000`.
pub fn parse_hex(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix('$')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let file = FileConfig::parse(
            r#"
            [run]
            machine = "pet"
            cycle_limit = 5_000_000
            entry = 0x0400

            [cpu]
            illegal_opcodes = "trap"

            [debug]
            memory_history = true
            history_capacity = 4096
            history_dump = "accesses.txt"
            "#,
        )
        .unwrap();
        assert_eq!(file.run.machine.as_deref(), Some("pet"));
        assert_eq!(file.run.cycle_limit, Some(5_000_000));
        assert_eq!(file.run.entry, Some(0x0400));
        assert_eq!(file.cpu.illegal_opcodes, IllegalOpcodes::Trap);
        assert!(file.debug.memory_history);
        assert_eq!(file.debug.history_capacity, Some(4096));
        assert_eq!(file.debug.history_dump, Some(PathBuf::from("accesses.txt")));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(FileConfig::parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[run]\nspeed = 2\n").is_err());
        assert!(FileConfig::parse("[cpu]\nillegal_opcodes = \"ignore\"\n").is_err());
    }

    #[test]
    fn entry_outside_address_space_is_rejected() {
        assert!(FileConfig::parse("[run]\nentry = 0x10000\n").is_err());
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let settings = Settings::resolve(FileConfig::default(), Overrides::default());
        assert_eq!(
            settings,
            Settings {
                machine: DEFAULT_MACHINE.to_string(),
                cycle_limit: Some(DEFAULT_CYCLE_LIMIT),
                entry: None,
                policy: IllegalOpcodePolicy::Emulate,
                memory_history: false,
                history_capacity: DEFAULT_HISTORY_CAPACITY,
                history_dump: None,
            }
        );
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig::parse(
            "[run]\nmachine = \"pet\"\ncycle_limit = 100\nentry = 0x0400\n",
        )
        .unwrap();
        let settings = Settings::resolve(
            file,
            Overrides {
                machine: Some("coprocessor".to_string()),
                cycles: Some(0),
                entry: Some(0xC000),
                trap_illegal: true,
                history: false,
            },
        );
        assert_eq!(settings.machine, "coprocessor");
        assert_eq!(settings.cycle_limit, None);
        assert_eq!(settings.entry, Some(0xC000));
        assert_eq!(settings.policy, IllegalOpcodePolicy::Trap);
    }

    #[test]
    fn history_dump_turns_recording_on() {
        let file = FileConfig::parse("[debug]\nhistory_dump = \"out.txt\"\n").unwrap();
        let settings = Settings::resolve(file, Overrides::default());
        assert!(settings.memory_history);
        assert_eq!(settings.history_dump, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn history_capacity_has_a_floor() {
        let file = FileConfig::parse("[debug]\nhistory_capacity = 0\n").unwrap();
        assert_eq!(Settings::resolve(file, Overrides::default()).history_capacity, 1);
        let file = FileConfig::parse("[debug]\nhistory_capacity = 250\n").unwrap();
        assert_eq!(Settings::resolve(file, Overrides::default()).history_capacity, 250);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("pulsar-no-such-config.toml");
        assert!(matches!(
            load_config(Some(&path)),
            Err(CliError::Io { .. })
        ));
    }

    #[test]
    fn hex_addresses() {
        assert_eq!(parse_hex("C000"), Ok(0xC000));
        assert_eq!(parse_hex("$0400"), Ok(0x0400));
        assert_eq!(parse_hex("0xfffc"), Ok(0xFFFC));
        assert!(parse_hex("10000").is_err());
        assert!(parse_hex("$").is_err());
    }
}
