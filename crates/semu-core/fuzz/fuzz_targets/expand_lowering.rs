#![no_main]

use libfuzzer_sys::fuzz_target;
use semu_core::{InstructionSource, Program, ProgramSource};

const NAMES: [&str; 11] = [
    "INCREASE",
    "DECREASE",
    "NEUTRAL",
    "JUMP_NOT_ZERO",
    "ZERO_VARIABLE",
    "ASSIGNMENT",
    "CONSTANT_ASSIGNMENT",
    "GOTO_LABEL",
    "JUMP_ZERO",
    "JUMP_EQUAL_CONSTANT",
    "JUMP_EQUAL_VARIABLE",
];
const VARIABLES: [&str; 4] = ["y", "x1", "x2", "z1"];
const CREDITS: u64 = 20_000;

fn decode(chunk: &[u8], len: usize) -> InstructionSource {
    let name = NAMES[usize::from(chunk[0]) % NAMES.len()];
    let kind = if usize::from(chunk[0]) % NAMES.len() < 4 {
        "basic"
    } else {
        "synthetic"
    };
    let v = VARIABLES[usize::from(chunk[1]) % VARIABLES.len()];
    let w = VARIABLES[usize::from(chunk[2]) % VARIABLES.len()];
    let target = usize::from(chunk[3]) % (len + 1);
    let target = if target == len {
        "EXIT".to_owned()
    } else {
        format!("L{}", target + 1)
    };
    let constant = (chunk[4] % 8).to_string();

    InstructionSource::new(name, kind, v)
        .argument("JNZLabel", target.clone())
        .argument("JZLabel", target.clone())
        .argument("gotoLabel", target.clone())
        .argument("JEConstantLabel", target.clone())
        .argument("JEVariableLabel", target)
        .argument("assignedVariable", w)
        .argument("variableName", w)
        .argument("constantValue", constant)
}

fuzz_target!(|data: &[u8]| {
    let chunks: Vec<&[u8]> = data.chunks_exact(5).take(16).collect();
    let len = chunks.len();
    let instructions = chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| decode(chunk, len).labeled(format!("L{}", index + 1)))
        .collect();

    let Ok(mut program) = Program::compile(&ProgramSource::new("Fuzz", instructions)) else {
        return;
    };
    let inputs = [3, 1];
    let baseline = program.run_with_credits(0, &inputs, CREDITS);
    for level in 0..=program.max_level() {
        let Ok(expanded) = program.expand_to_level(level) else {
            return;
        };
        assert_eq!(expanded.level(), level);
        let _ = program.run_with_credits(level, &inputs, CREDITS);
    }
    if let Ok(baseline) = baseline {
        let max = program.max_level();
        if let Ok(lowered) = program.run(max, &inputs) {
            assert_eq!(lowered.output, baseline.output);
        }
    }
});
