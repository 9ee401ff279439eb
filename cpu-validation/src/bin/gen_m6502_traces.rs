use std::fs;
use std::path::Path;

use pulsar_core::cpu::m6502::OPCODES;
use pulsar_cpu_validation::{generate_cases, traceable_opcodes, write_vectors};
use rand::SeedableRng;
use rand::rngs::StdRng;

const NUM_TESTS: usize = 1000;

fn generate_and_write(rng: &mut StdRng, opcode: u8, out_dir: &Path) {
    let tests = generate_cases(rng, opcode, NUM_TESTS);
    let out_path = out_dir.join(format!("{:02x}.json.gz", opcode));
    if let Err(e) = write_vectors(&out_path, &tests) {
        eprintln!("Failed to write {}: {e}", out_path.display());
        std::process::exit(1);
    }
    println!(
        "Generated {} tests for 0x{:02X} ({}) -> {}",
        tests.len(),
        opcode,
        OPCODES[opcode as usize].mnemonic(),
        out_path.display()
    );
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: gen_m6502_traces <opcode_hex | all> [seed]");
        eprintln!("Examples:");
        eprintln!("  gen_m6502_traces 0xA9");
        eprintln!("  gen_m6502_traces all 6502");
        std::process::exit(1);
    }

    let mut rng = match args.get(2) {
        Some(seed) => match seed.parse::<u64>() {
            Ok(seed) => StdRng::seed_from_u64(seed),
            Err(_) => {
                eprintln!("Invalid seed: {seed}");
                std::process::exit(1);
            }
        },
        None => StdRng::from_entropy(),
    };

    let out_dir = Path::new("test_data/m6502");
    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create {}: {e}", out_dir.display());
        std::process::exit(1);
    }

    if args[1] == "all" {
        let mut count = 0;
        for opcode in traceable_opcodes() {
            generate_and_write(&mut rng, opcode, out_dir);
            count += 1;
        }
        println!("Generated tests for {} opcodes", count);
    } else {
        let opcode_str = args[1].trim_start_matches("0x").trim_start_matches("0X");
        let opcode = u8::from_str_radix(opcode_str, 16).unwrap_or_else(|_| {
            eprintln!("Invalid hex opcode: {}", args[1]);
            std::process::exit(1);
        });
        if !traceable_opcodes().any(|op| op == opcode) {
            eprintln!("Opcode 0x{:02X} locks the core; no vectors", opcode);
            std::process::exit(1);
        }
        generate_and_write(&mut rng, opcode, out_dir);
    }
}
