use crate::{CallArgument, Context, FaultKind, FunctionCall};

/// Result of running a callee to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallOutcome {
    /// Callee output (`y`).
    pub output: i64,
    /// Cycles the callee consumed.
    pub cycles: u64,
}

/// Resolves and runs named programs on behalf of call instructions.
pub trait CallResolver {
    /// Runs `function` with positional `inputs` and reports its output and cost.
    ///
    /// # Errors
    ///
    /// Returns [`FaultKind::FunctionNotFound`] for unknown names, or
    /// [`FaultKind::CallFailed`] when the callee faults.
    fn invoke(&self, function: &str, inputs: &[i64]) -> Result<CallOutcome, FaultKind>;
}

/// Evaluates a call in the caller's context.
///
/// Arguments are evaluated left to right; nested calls run first and their
/// cycles are added to the reported cost. The callee runs exactly once.
///
/// # Errors
///
/// Propagates unknown-variable lookups and callee failures.
pub fn evaluate_call(
    call: &FunctionCall,
    context: &Context,
    resolver: &dyn CallResolver,
) -> Result<CallOutcome, FaultKind> {
    let mut cycles = 0_u64;
    let mut inputs = Vec::with_capacity(call.arguments.len());
    for argument in &call.arguments {
        let value = match argument {
            CallArgument::Variable(name) => context.value(name)?,
            CallArgument::Literal(value) => *value,
            CallArgument::Call(nested) => {
                let outcome = evaluate_call(nested, context, resolver)?;
                cycles = cycles.saturating_add(outcome.cycles);
                outcome.output
            }
        };
        inputs.push(value);
    }

    let outcome = resolver.invoke(&call.function, &inputs)?;
    Ok(CallOutcome {
        output: outcome.output,
        cycles: cycles.saturating_add(outcome.cycles),
    })
}
