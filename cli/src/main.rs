use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, info};
use pulsar_core::core::Board;
use pulsar_core::core::machine::{Machine, RunExit, RunLimit};
use pulsar_core::cpu::m6502::HaltReason;
use pulsar_machines::{MachineConfig, ProgramImage, registry};

mod config;

use config::{CliError, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(name = "pulsar", version, about = "Headless cycle-accurate 6502 machine runner.")]
struct Args {
    /// Machine to build (see --list-machines).
    #[arg(long)]
    machine: Option<String>,

    /// TOML configuration file (defaults to <config dir>/pulsar/pulsar.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Cycles to run; 0 runs until the CPU halts.
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Start address. PROGRAM is then loaded there as a raw binary
    /// instead of being read as a PRG.
    #[arg(long, value_name = "HEX", value_parser = config::parse_hex)]
    entry: Option<u16>,

    /// Stop on undocumented opcodes instead of executing them.
    #[arg(long)]
    trap_illegal: bool,

    /// Record every bus access and print a summary afterwards.
    #[arg(long)]
    history: bool,

    /// List the available machines and exit.
    #[arg(long)]
    list_machines: bool,

    /// Log level (overrides RUST_LOG).
    #[arg(long, value_name = "LEVEL", value_parser = parse_level)]
    log_level: Option<LevelFilter>,

    /// Program image to load before reset.
    #[arg(value_name = "PROGRAM")]
    program: Option<PathBuf>,
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("invalid log level '{s}' (off, error, warn, info, debug, trace)"))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = args.log_level {
        logger.filter_level(level);
    }
    logger.init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pulsar: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    if args.list_machines {
        for entry in registry::all() {
            println!("{:<12} {}", entry.name, entry.description);
        }
        return Ok(());
    }

    let file = config::load_config(args.config.as_deref())?;
    let settings = Settings::resolve(
        file,
        Overrides {
            machine: args.machine,
            cycles: args.cycles,
            entry: args.entry,
            trap_illegal: args.trap_illegal,
            history: args.history,
        },
    );

    let entry = registry::find(&settings.machine).ok_or_else(|| {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        CliError::UnknownMachine {
            name: settings.machine.clone(),
            available: names.join(", "),
        }
    })?;

    let mut machine_config = MachineConfig::new()
        .with_policy(settings.policy)
        .with_memory_history(settings.memory_history)
        .with_history_capacity(settings.history_capacity);
    if let Some(path) = &args.program {
        let image = ProgramImage::from_file(path, settings.entry)?;
        info!(
            "{}: {} bytes at ${:04X}",
            path.display(),
            image.data.len(),
            image.load_address
        );
        machine_config = machine_config.with_program(image);
    }
    if let Some(addr) = settings.entry {
        machine_config = machine_config.with_entry(addr);
    }

    let mut machine = (entry.create)(&machine_config)?;
    let limit = match settings.cycle_limit {
        Some(cycles) => RunLimit::until(machine.clock().saturating_add(cycles)),
        None => RunLimit::unbounded(),
    };
    let exit = machine.run_until(&limit);

    println!("{}: {}", machine.name(), describe_exit(exit));
    println!("{}", machine.cpu_state());
    println!("clock: {}", machine.clock());

    if settings.memory_history {
        print_history_summary(machine.board());
    }
    if let Some(path) = &settings.history_dump {
        dump_history(machine.board(), path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}

fn describe_exit(exit: RunExit) -> String {
    match exit {
        RunExit::CycleLimit => "cycle limit reached".to_string(),
        RunExit::StopRequested => "stop requested".to_string(),
        RunExit::Halted(HaltReason::Jammed { pc, opcode }) => {
            format!("jammed by ${opcode:02X} at ${pc:04X}")
        }
        RunExit::Halted(HaltReason::IllegalOpcode { pc, opcode }) => {
            format!("undocumented opcode ${opcode:02X} trapped at ${pc:04X}")
        }
        RunExit::Halted(reason) => format!("halted ({reason:?})"),
    }
}

fn print_history_summary(board: &Board) {
    let history = board.memory.history();
    let executed = history.access_map().executed().count();
    println!(
        "history: {} accesses ({} dropped), {} executed addresses",
        history.len(),
        history.dropped(),
        executed
    );
    if let Some(last) = history.last() {
        println!(
            "last: ${:04X} = {:02X} ({:?}) at cycle {}",
            last.addr, last.value, last.kind, last.clock
        );
    }
}

fn dump_history(board: &Board, path: &Path) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for access in board.memory.history().iter() {
        writeln!(
            out,
            "{:>10} {:04X} {:02X} {:?}",
            access.clock, access.addr, access.value, access.kind
        )?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "pulsar",
            "--machine",
            "pet",
            "--cycles",
            "1000",
            "--entry",
            "$0400",
            "--trap-illegal",
            "--log-level",
            "debug",
            "prog.bin",
        ])
        .unwrap();
        assert_eq!(args.machine.as_deref(), Some("pet"));
        assert_eq!(args.cycles, Some(1000));
        assert_eq!(args.entry, Some(0x0400));
        assert!(args.trap_illegal);
        assert!(!args.history);
        assert_eq!(args.log_level, Some(LevelFilter::Debug));
        assert_eq!(args.program, Some(PathBuf::from("prog.bin")));
    }

    #[test]
    fn rejects_bad_entry() {
        assert!(Args::try_parse_from(["pulsar", "--entry", "12345"]).is_err());
    }

    #[test]
    fn exit_descriptions() {
        assert_eq!(describe_exit(RunExit::CycleLimit), "cycle limit reached");
        assert_eq!(
            describe_exit(RunExit::Halted(HaltReason::Jammed {
                pc: 0x0200,
                opcode: 0x02
            })),
            "jammed by $02 at $0200"
        );
    }

    #[test]
    fn unknown_machine_lists_alternatives() {
        let args = Args::try_parse_from(["pulsar", "--machine", "nope", "--config", "/dev/null"]).unwrap();
        match run(args) {
            Err(CliError::UnknownMachine { name, available }) => {
                assert_eq!(name, "nope");
                assert!(available.contains("simple6502"));
            }
            other => panic!("expected UnknownMachine, got {other:?}"),
        }
    }
}
