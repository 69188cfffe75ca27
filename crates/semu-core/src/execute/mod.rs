//! Instruction execution pipeline.
//!
//! Execution is split in two phases so that a step can be costed before it
//! becomes visible:
//! 1. [`execute_instruction`] reads operands, runs any callee, and computes
//!    the pending write, next PC, and cycle cost without touching the context;
//! 2. [`commit_execution`] applies the pending effects.
//!
//! A faulting instruction therefore leaves no partial side effects.

mod call;

pub use call::{evaluate_call, CallOutcome, CallResolver};

use tracing::trace;

use crate::{ArgumentRole, Context, Fault, FaultKind, Instruction, InstructionKind};

/// Pending effects of one instruction, computed but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteState {
    /// Variable write to apply, if any.
    pub write: Option<(String, i64)>,
    /// Program counter after the instruction.
    pub next_pc: usize,
    /// Total cycle cost, including callee cycles for calls.
    pub cycles: u64,
}

impl ExecuteState {
    fn fall_through(pc: usize, cycles: u64) -> Self {
        Self {
            write: None,
            next_pc: pc + 1,
            cycles,
        }
    }

    fn write(mut self, variable: &str, value: i64) -> Self {
        self.write = Some((variable.to_owned(), value));
        self
    }

    fn jump_if(mut self, taken: bool, target: usize) -> Self {
        if taken {
            self.next_pc = target;
        }
        self
    }
}

/// Outcome of a single step request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The instruction at `pc` retired.
    Retired {
        /// Index of the retired instruction.
        pc: usize,
        /// Cycles it consumed.
        cycles: u64,
    },
    /// The program counter is already past the last instruction.
    Finished,
}

fn literal(text: &str) -> Result<i64, FaultKind> {
    crate::names::parse_literal(text).ok_or_else(|| FaultKind::InvalidLiteral(text.to_owned()))
}

/// Computes the effects of `instruction` against `context` without mutating it.
///
/// Call instructions run their callee here, exactly once; the callee's output
/// and cost both come from that single run.
///
/// # Errors
///
/// Returns the [`FaultKind`] describing why the instruction cannot execute.
pub fn execute_instruction(
    instruction: &Instruction,
    context: &Context,
    resolver: &dyn CallResolver,
) -> Result<ExecuteState, FaultKind> {
    let pc = context.pc();
    let v = instruction.target();
    let exec = ExecuteState::fall_through(pc, instruction.cycles());

    let state = match instruction.kind() {
        InstructionKind::Increase => {
            let value = context.value(v)?;
            exec.write(v, value.saturating_add(1))
        }
        InstructionKind::Decrease => {
            let value = context.value(v)?;
            exec.write(v, if value > 0 { value - 1 } else { 0 })
        }
        InstructionKind::Neutral => exec,
        InstructionKind::JumpNotZero => {
            let target = context.label_target(instruction.require(ArgumentRole::JnzLabel)?)?;
            exec.jump_if(context.value(v)? != 0, target)
        }
        InstructionKind::ZeroVariable => exec.write(v, 0),
        InstructionKind::Assignment => {
            let source = instruction.require(ArgumentRole::AssignedVariable)?;
            exec.write(v, context.value(source)?)
        }
        InstructionKind::ConstantAssignment => {
            let value = literal(instruction.require(ArgumentRole::ConstantValue)?)?;
            exec.write(v, value)
        }
        InstructionKind::GotoLabel => {
            let target = context.label_target(instruction.require(ArgumentRole::GotoLabel)?)?;
            exec.jump_if(true, target)
        }
        InstructionKind::JumpZero => {
            let target = context.label_target(instruction.require(ArgumentRole::JzLabel)?)?;
            exec.jump_if(context.value(v)? == 0, target)
        }
        InstructionKind::JumpEqualConstant => {
            let constant = literal(instruction.require(ArgumentRole::ConstantValue)?)?;
            let target =
                context.label_target(instruction.require(ArgumentRole::JeConstantLabel)?)?;
            exec.jump_if(context.value(v)? == constant, target)
        }
        InstructionKind::JumpEqualVariable => {
            let other = context.value(instruction.require(ArgumentRole::VariableName)?)?;
            let target =
                context.label_target(instruction.require(ArgumentRole::JeVariableLabel)?)?;
            exec.jump_if(context.value(v)? == other, target)
        }
        InstructionKind::Quote => {
            let outcome = evaluate_call(&instruction.function_call()?, context, resolver)?;
            let mut exec = exec.write(v, outcome.output);
            exec.cycles = exec.cycles.saturating_add(outcome.cycles);
            exec
        }
        InstructionKind::JumpEqualFunction => {
            let target =
                context.label_target(instruction.require(ArgumentRole::JeFunctionLabel)?)?;
            let current = context.value(v)?;
            let outcome = evaluate_call(&instruction.function_call()?, context, resolver)?;
            let mut exec = exec.jump_if(current == outcome.output, target);
            exec.cycles = exec.cycles.saturating_add(outcome.cycles);
            exec
        }
    };

    Ok(state)
}

/// Applies the pending effects computed by [`execute_instruction`].
pub fn commit_execution(context: &mut Context, exec: ExecuteState) {
    if let Some((variable, value)) = exec.write {
        context.set(&variable, value);
    }
    context.set_pc(exec.next_pc);
}

/// Executes the instruction at the current program counter, if any.
///
/// # Errors
///
/// Returns a [`Fault`] carrying the program counter of the failing instruction;
/// the context is left untouched in that case.
pub fn step_one(
    instructions: &[Instruction],
    context: &mut Context,
    resolver: &dyn CallResolver,
) -> Result<StepOutcome, Fault> {
    let pc = context.pc();
    let Some(instruction) = instructions.get(pc) else {
        return Ok(StepOutcome::Finished);
    };

    let exec = execute_instruction(instruction, context, resolver).map_err(|kind| kind.at(pc))?;
    let cycles = exec.cycles;
    trace!(pc, next_pc = exec.next_pc, cycles, "instruction retired");
    commit_execution(context, exec);
    Ok(StepOutcome::Retired { pc, cycles })
}

#[cfg(test)]
mod tests {
    use super::{
        commit_execution, execute_instruction, step_one, CallOutcome, CallResolver, StepOutcome,
    };
    use crate::{ArgumentRole, Context, FaultKind, Instruction, InstructionKind};

    struct Doubler;

    impl CallResolver for Doubler {
        fn invoke(&self, function: &str, inputs: &[i64]) -> Result<CallOutcome, FaultKind> {
            match function {
                "Double" => Ok(CallOutcome {
                    output: inputs.first().copied().unwrap_or(0) * 2,
                    cycles: 7,
                }),
                other => Err(FaultKind::FunctionNotFound(other.to_owned())),
            }
        }
    }

    fn context_with(entries: &[(&str, i64)]) -> Context {
        let mut context = Context::new();
        for (name, value) in entries {
            context.set(name, *value);
        }
        context
    }

    fn run_one(instruction: &Instruction, context: &mut Context) -> u64 {
        let exec = execute_instruction(instruction, context, &Doubler).expect("executes");
        let cycles = exec.cycles;
        commit_execution(context, exec);
        cycles
    }

    #[test]
    fn decrease_saturates_at_zero() {
        let mut context = context_with(&[("x1", 0)]);
        let instruction = Instruction::new(InstructionKind::Decrease, "x1");
        run_one(&instruction, &mut context);
        assert_eq!(context.get("x1"), Some(0));
        assert_eq!(context.pc(), 1);

        let mut negative = context_with(&[("x1", -4)]);
        run_one(&instruction, &mut negative);
        assert_eq!(negative.get("x1"), Some(0));
    }

    #[test]
    fn jump_not_zero_follows_label_only_when_nonzero() {
        let instruction = Instruction::new(InstructionKind::JumpNotZero, "x1")
            .with_argument(ArgumentRole::JnzLabel, "L1");

        let mut taken = context_with(&[("x1", 2), ("L1", 5)]);
        assert_eq!(run_one(&instruction, &mut taken), 2);
        assert_eq!(taken.pc(), 5);

        let mut fallthrough = context_with(&[("x1", 0), ("L1", 5)]);
        run_one(&instruction, &mut fallthrough);
        assert_eq!(fallthrough.pc(), 1);
    }

    #[test]
    fn jump_to_absent_label_faults_without_side_effects() {
        let instruction = Instruction::new(InstructionKind::JumpNotZero, "x1")
            .with_argument(ArgumentRole::JnzLabel, "L9");
        let context = context_with(&[("x1", 1)]);
        assert_eq!(
            execute_instruction(&instruction, &context, &Doubler),
            Err(FaultKind::UnknownLabel("L9".into()))
        );
    }

    #[test]
    fn assignment_from_absent_variable_faults() {
        let instruction = Instruction::new(InstructionKind::Assignment, "y")
            .with_argument(ArgumentRole::AssignedVariable, "z4");
        assert_eq!(
            execute_instruction(&instruction, &Context::new(), &Doubler),
            Err(FaultKind::UnknownVariable("z4".into()))
        );
    }

    #[test]
    fn constant_assignment_rejects_malformed_literal() {
        let instruction = Instruction::new(InstructionKind::ConstantAssignment, "y")
            .with_argument(ArgumentRole::ConstantValue, "1e3");
        assert_eq!(
            execute_instruction(&instruction, &Context::new(), &Doubler),
            Err(FaultKind::InvalidLiteral("1e3".into()))
        );
    }

    #[test]
    fn jump_equal_variable_compares_both_operands() {
        let instruction = Instruction::new(InstructionKind::JumpEqualVariable, "x1")
            .with_argument(ArgumentRole::VariableName, "x2")
            .with_argument(ArgumentRole::JeVariableLabel, "EXIT");
        let mut equal = context_with(&[("x1", 3), ("x2", 3), ("EXIT", 9)]);
        run_one(&instruction, &mut equal);
        assert_eq!(equal.pc(), 9);

        let mut differ = context_with(&[("x1", 3), ("x2", 4), ("EXIT", 9)]);
        run_one(&instruction, &mut differ);
        assert_eq!(differ.pc(), 1);
    }

    #[test]
    fn quote_writes_callee_output_and_adds_callee_cycles() {
        let instruction = Instruction::new(InstructionKind::Quote, "z1")
            .with_argument(ArgumentRole::FunctionName, "Double")
            .with_argument(ArgumentRole::FunctionArguments, "x1");
        let mut context = context_with(&[("x1", 21), ("z1", 0)]);
        let cycles = run_one(&instruction, &mut context);
        assert_eq!(context.get("z1"), Some(42));
        assert_eq!(cycles, 5 + 7);
    }

    #[test]
    fn jump_equal_function_jumps_on_matching_result() {
        let instruction = Instruction::new(InstructionKind::JumpEqualFunction, "x2")
            .with_argument(ArgumentRole::FunctionName, "Double")
            .with_argument(ArgumentRole::FunctionArguments, "x1")
            .with_argument(ArgumentRole::JeFunctionLabel, "L1");
        let mut context = context_with(&[("x1", 4), ("x2", 8), ("L1", 3)]);
        let cycles = run_one(&instruction, &mut context);
        assert_eq!(context.pc(), 3);
        assert_eq!(cycles, 6 + 7);
    }

    #[test]
    fn step_one_reports_finished_past_the_end() {
        let program = vec![Instruction::new(InstructionKind::Increase, "y")];
        let mut context = Context::new();

        assert_eq!(
            step_one(&program, &mut context, &Doubler),
            Ok(StepOutcome::Retired { pc: 0, cycles: 1 })
        );
        assert_eq!(
            step_one(&program, &mut context, &Doubler),
            Ok(StepOutcome::Finished)
        );
        assert_eq!(context.output(), 1);
    }

    #[test]
    fn step_one_fault_carries_pc() {
        let program = vec![
            Instruction::new(InstructionKind::Neutral, "y"),
            Instruction::new(InstructionKind::Increase, "x5"),
        ];
        let mut context = Context::new();
        step_one(&program, &mut context, &Doubler).expect("neutral retires");
        let fault = step_one(&program, &mut context, &Doubler).expect_err("x5 is unknown");
        assert_eq!(fault.pc, 1);
        assert_eq!(fault.kind, FaultKind::UnknownVariable("x5".into()));
        assert_eq!(context.pc(), 1);
    }
}
