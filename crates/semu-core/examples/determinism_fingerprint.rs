//! Deterministic run fingerprint used for cross-host comparison.

use proptest as _;
use rstest as _;
use semu_core::{FunctionSource, InstructionSource, Program, ProgramSource};
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn source() -> ProgramSource {
    let add = FunctionSource::new(
        "Add",
        "x1 + x2",
        vec![
            InstructionSource::synthetic("ASSIGNMENT", "y").argument("assignedVariable", "x1"),
            InstructionSource::synthetic("ASSIGNMENT", "z1").argument("assignedVariable", "x2"),
            InstructionSource::synthetic("JUMP_ZERO", "z1")
                .labeled("L1")
                .argument("JZLabel", "EXIT"),
            InstructionSource::basic("DECREASE", "z1"),
            InstructionSource::basic("INCREASE", "y"),
            InstructionSource::synthetic("GOTO_LABEL", "").argument("gotoLabel", "L1"),
        ],
    );
    ProgramSource::new(
        "Fingerprint",
        vec![
            InstructionSource::synthetic("QUOTE", "z1")
                .argument("functionName", "Add")
                .argument("functionArguments", "x1,(Add,x2,3)"),
            InstructionSource::synthetic("JUMP_EQUAL_CONSTANT", "z1")
                .argument("constantValue", "9")
                .argument("JEConstantLabel", "L2"),
            InstructionSource::synthetic("CONSTANT_ASSIGNMENT", "y").argument("constantValue", "1"),
            InstructionSource::synthetic("ASSIGNMENT", "y")
                .labeled("L2")
                .argument("assignedVariable", "z1"),
        ],
    )
    .with_function(add)
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> Result<String, Box<dyn std::error::Error>> {
    let mut program = Program::compile(&source())?;
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;

    for level in 0..=program.max_level() {
        let expanded = program.expand_to_level(level)?;
        hash_bytes(&mut hash, &expanded.len().to_le_bytes());
        for instruction in expanded.instructions() {
            hash_bytes(&mut hash, instruction.to_string().as_bytes());
        }
        let outcome = program.run(level, &[2, 4])?;
        hash_bytes(&mut hash, &outcome.output.to_le_bytes());
        hash_bytes(&mut hash, &outcome.cycles.to_le_bytes());
        for (name, value) in outcome.context.variables() {
            hash_bytes(&mut hash, name.as_bytes());
            hash_bytes(&mut hash, &value.to_le_bytes());
        }
    }

    Ok(format!("{hash:016x}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", fingerprint()?);
    Ok(())
}
