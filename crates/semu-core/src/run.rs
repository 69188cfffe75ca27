//! The program runner: a fetch-execute loop over one expansion level.

use tracing::{debug, trace};

use crate::execute::{commit_execution, execute_instruction, CallResolver};
use crate::{Context, ExpansionLevel, Fault, FaultKind, Instruction};

/// Result of running a program to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Final value of `y`.
    pub output: i64,
    /// Final context, PC included.
    pub context: Context,
    /// Total cycles consumed, callee cycles included.
    pub cycles: u64,
}

/// Runs `instructions` against `context` until the PC passes the end.
///
/// With a `credits` budget, each instruction's full cost (a call's callee run
/// included) is computed before anything is committed; if it exceeds what is
/// left the run aborts with [`FaultKind::InsufficientCredits`] carrying the
/// credits still unspent. Without a budget the loop is unbounded.
///
/// # Errors
///
/// Returns the first [`Fault`] raised, tagged with its PC.
pub fn run_instructions(
    instructions: &[Instruction],
    mut context: Context,
    resolver: &dyn CallResolver,
    credits: Option<u64>,
) -> Result<RunOutcome, Fault> {
    let mut remaining = credits;
    let mut cycles = 0_u64;

    while let Some(instruction) = instructions.get(context.pc()) {
        let pc = context.pc();
        let exec = execute_instruction(instruction, &context, resolver).map_err(|kind| kind.at(pc))?;

        if let Some(left) = remaining {
            if left < exec.cycles {
                return Err(FaultKind::InsufficientCredits {
                    remaining: left,
                    required: exec.cycles,
                }
                .at(pc));
            }
            remaining = Some(left - exec.cycles);
        }

        cycles = cycles.saturating_add(exec.cycles);
        trace!(pc, next_pc = exec.next_pc, cycles = exec.cycles, "instruction retired");
        commit_execution(&mut context, exec);
    }

    Ok(RunOutcome {
        output: context.output(),
        context,
        cycles,
    })
}

/// Runs a level with `inputs` bound positionally to `x1, x2, ...`.
///
/// # Errors
///
/// Returns the first [`Fault`] raised, tagged with its PC.
pub fn run(
    level: &ExpansionLevel,
    inputs: &[i64],
    resolver: &dyn CallResolver,
) -> Result<RunOutcome, Fault> {
    run_level(level, inputs, resolver, None)
}

/// Runs a level under a credit budget.
///
/// # Errors
///
/// Returns [`FaultKind::InsufficientCredits`] when the budget cannot cover
/// the next instruction, or any other [`Fault`] raised by the run.
pub fn run_with_credits(
    level: &ExpansionLevel,
    inputs: &[i64],
    resolver: &dyn CallResolver,
    credits: u64,
) -> Result<RunOutcome, Fault> {
    run_level(level, inputs, resolver, Some(credits))
}

fn run_level(
    level: &ExpansionLevel,
    inputs: &[i64],
    resolver: &dyn CallResolver,
    credits: Option<u64>,
) -> Result<RunOutcome, Fault> {
    let mut context = level.context().clone();
    context.bind_inputs(inputs).map_err(|kind| kind.at(0))?;
    debug!(level = level.level(), ?inputs, ?credits, "starting run");
    let outcome = run_instructions(level.instructions(), context, resolver, credits)?;
    debug!(output = outcome.output, cycles = outcome.cycles, "run finished");
    Ok(outcome)
}
