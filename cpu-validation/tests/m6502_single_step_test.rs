use std::path::Path;

use pulsar_cpu_validation::{
    M6502TestCase, Mismatch, generate_cases, read_vectors, replay, traceable_opcodes, write_vectors,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// All 151 legal NMOS 6502 opcodes.
const LEGAL_OPCODES: &[u8] = &[
    // BRK
    0x00, // ORA
    0x01, 0x05, 0x09, 0x0D, 0x11, 0x15, 0x19, 0x1D, // ASL
    0x06, 0x0A, 0x0E, 0x16, 0x1E, // PHP
    0x08, // BPL
    0x10, // CLC
    0x18, // JSR
    0x20, // AND
    0x21, 0x25, 0x29, 0x2D, 0x31, 0x35, 0x39, 0x3D, // BIT
    0x24, 0x2C, // ROL
    0x26, 0x2A, 0x2E, 0x36, 0x3E, // PLP
    0x28, // BMI
    0x30, // SEC
    0x38, // RTI
    0x40, // EOR
    0x41, 0x45, 0x49, 0x4D, 0x51, 0x55, 0x59, 0x5D, // LSR
    0x46, 0x4A, 0x4E, 0x56, 0x5E, // PHA
    0x48, // JMP
    0x4C, 0x6C, // BVC
    0x50, // CLI
    0x58, // RTS
    0x60, // ADC
    0x61, 0x65, 0x69, 0x6D, 0x71, 0x75, 0x79, 0x7D, // ROR
    0x66, 0x6A, 0x6E, 0x76, 0x7E, // PLA
    0x68, // BVS
    0x70, // SEI
    0x78, // STA
    0x81, 0x85, 0x8D, 0x91, 0x95, 0x99, 0x9D, // STX
    0x86, 0x8E, 0x96, // STY
    0x84, 0x8C, 0x94, // DEY
    0x88, // TXA
    0x8A, // BCC
    0x90, // TYA
    0x98, // TXS
    0x9A, // LDA
    0xA1, 0xA5, 0xA9, 0xAD, 0xB1, 0xB5, 0xB9, 0xBD, // LDX
    0xA2, 0xA6, 0xAE, 0xB6, 0xBE, // LDY
    0xA0, 0xA4, 0xAC, 0xB4, 0xBC, // TAY
    0xA8, // TAX
    0xAA, // BCS
    0xB0, // CLV
    0xB8, // TSX
    0xBA, // CMP
    0xC1, 0xC5, 0xC9, 0xCD, 0xD1, 0xD5, 0xD9, 0xDD, // CPY
    0xC0, 0xC4, 0xCC, // DEC
    0xC6, 0xCE, 0xD6, 0xDE, // INY
    0xC8, // DEX
    0xCA, // BNE
    0xD0, // CLD
    0xD8, // CPX
    0xE0, 0xE4, 0xEC, // SBC
    0xE1, 0xE5, 0xE9, 0xED, 0xF1, 0xF5, 0xF9, 0xFD, // INC
    0xE6, 0xEE, 0xF6, 0xFE, // INX
    0xE8, // NOP
    0xEA, // BEQ
    0xF0, // SED
    0xF8,
];

// =============================================================================
// Hand-written vectors in SingleStepTests format
// =============================================================================

const LDA_IMMEDIATE: &str = r#"{
    "name": "a9 42",
    "initial": {"pc": 512, "s": 253, "a": 0, "x": 0, "y": 0, "p": 36,
                "ram": [[512, 169], [513, 66]]},
    "final":   {"pc": 514, "s": 253, "a": 66, "x": 0, "y": 0, "p": 36,
                "ram": [[512, 169], [513, 66]]},
    "cycles": [[512, 169, "read"], [513, 66, "read"]]
}"#;

// Silicon reads the high operand byte last; the fetch unit reads it third.
const JSR_ABSOLUTE: &str = r#"{
    "name": "20 00 30",
    "initial": {"pc": 512, "s": 253, "a": 0, "x": 0, "y": 0, "p": 36,
                "ram": [[512, 32], [513, 0], [514, 48], [508, 0], [509, 0]]},
    "final":   {"pc": 12288, "s": 251, "a": 0, "x": 0, "y": 0, "p": 36,
                "ram": [[512, 32], [513, 0], [514, 48], [508, 2], [509, 2]]},
    "cycles": [[512, 32, "read"], [513, 0, "read"], [509, 0, "read"],
               [509, 2, "write"], [508, 2, "write"], [514, 48, "read"]]
}"#;

fn parse(json: &str) -> M6502TestCase {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_hand_written_lda_immediate() {
    let tc = parse(LDA_IMMEDIATE);
    assert_eq!(replay(&tc, false), Ok(()));
    assert_eq!(replay(&tc, true), Ok(()));
}

#[test]
fn test_jsr_prefetch_order_is_tolerated() {
    let tc = parse(JSR_ABSOLUTE);
    assert_eq!(replay(&tc, false), Ok(()));
}

#[test]
fn test_register_mismatch_is_reported() {
    let mut tc = parse(LDA_IMMEDIATE);
    tc.final_state.a = 0x43;
    assert!(matches!(
        replay(&tc, false),
        Err(Mismatch::Register { register: "A", expected: 0x43, actual: 0x42, .. })
    ));
}

#[test]
fn test_cycle_mismatch_is_reported() {
    let mut tc = parse(LDA_IMMEDIATE);
    tc.cycles[1].2 = "write".to_string();
    assert!(matches!(replay(&tc, false), Err(Mismatch::Cycle { index: 1, .. })));
}

// =============================================================================
// Generated vectors
// =============================================================================

#[test]
fn test_generation_is_deterministic_for_a_seed() {
    let mut first = StdRng::seed_from_u64(0x6502);
    let mut second = StdRng::seed_from_u64(0x6502);
    for opcode in [0x00u8, 0x6D, 0x91, 0xFE] {
        assert_eq!(
            generate_cases(&mut first, opcode, 4),
            generate_cases(&mut second, opcode, 4)
        );
    }
}

#[test]
fn test_generated_vectors_replay_on_both_fetch_paths() {
    let mut rng = StdRng::seed_from_u64(1);
    for opcode in traceable_opcodes() {
        for tc in generate_cases(&mut rng, opcode, 8) {
            if let Err(e) = replay(&tc, false) {
                panic!("paged fetch: {e}");
            }
            if let Err(e) = replay(&tc, true) {
                panic!("fast fetch: {e}");
            }
        }
    }
}

#[test]
fn test_vector_file_round_trip_through_gzip() {
    let mut rng = StdRng::seed_from_u64(7);
    let cases = generate_cases(&mut rng, 0xB1, 16);
    let path = std::env::temp_dir().join(format!("pulsar-vectors-{}.json.gz", std::process::id()));
    write_vectors(&path, &cases).unwrap();
    let loaded = read_vectors(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, cases);
}

// =============================================================================
// SingleStepTests data set
// =============================================================================

#[test]
fn test_all_legal_opcodes() {
    let test_dir = Path::new("test_data/65x02/6502/v1");
    if !test_dir.exists() {
        eprintln!("No SingleStepTests data in {}, skipping", test_dir.display());
        return;
    }

    let mut total_tests = 0;
    let mut total_files = 0;

    for &opcode in LEGAL_OPCODES {
        let json_path = test_dir.join(format!("{:02x}.json", opcode));
        assert!(
            json_path.exists(),
            "Missing test file for opcode 0x{:02X}: {:?}",
            opcode,
            json_path
        );

        let tests = read_vectors(&json_path)
            .unwrap_or_else(|e| panic!("Failed to load {:?}: {}", json_path, e));
        assert!(!tests.is_empty(), "Test file {:?} is empty", json_path);

        for tc in &tests {
            if let Err(e) = replay(tc, false) {
                panic!("{e}");
            }
        }

        total_tests += tests.len();
        total_files += 1;
    }

    eprintln!(
        "Validated {} tests across {} opcode files",
        total_tests, total_files
    );
}
