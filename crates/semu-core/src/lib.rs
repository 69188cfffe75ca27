//! Core of the S-language emulator: instruction model, level-by-level macro
//! lowering, interpreter, cross-program calls, and a reversible debugger.

/// Reserved names and naming conventions.
pub mod names;

/// Flat variable/label namespace with the program counter.
pub mod context;
pub use context::{Context, UNBOUND_LABEL};

/// Fault taxonomy for construction and execution.
pub mod fault;
pub use fault::{BuildError, Fault, FaultClass, FaultKind};

/// Deterministic instruction cycle-cost table and lookup helpers.
pub mod timing;
pub use timing::{cycle_cost, CYCLE_COST_TABLE};

/// Instruction data model and macro lowering.
pub mod instruction;
pub use instruction::{
    expansion_depth, ArgumentClass, ArgumentRole, CallArgument, FunctionCall, Instruction,
    InstructionKind, LoweringSite, Origin,
};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, evaluate_call, execute_instruction, step_one, CallOutcome, CallResolver,
    ExecuteState, StepOutcome,
};

/// Expansion levels and the lowering pass between them.
pub mod expand;
pub use expand::{ExpansionLevel, LevelSummary};

/// Loader-boundary program descriptions.
pub mod source;
pub use source::{ArgumentSource, FunctionSource, InstructionSource, ProgramSource};

/// Compiled bodies and call resolution.
pub mod registry;
pub use registry::{CompiledProgram, FunctionRegistry};

/// Fetch-execute loop.
pub mod run;
pub use run::{run, run_instructions, run_with_credits, RunOutcome};

/// Programs with cached expansion levels.
pub mod program;
pub use program::Program;

/// Reversible debugger.
pub mod debug;
pub use debug::{
    DebugError, DebugSession, DebugState, Debugger, FinishedSession, ResumeReport, ResumeStop,
    StepReport,
};

/// Run history.
pub mod stats;
pub use stats::{ExecutionRecord, StatisticsLedger};

/// Presentation views.
pub mod view;
pub use view::{DebugView, InstructionRow, ProgramView, ProvenanceStep, RunResultView};

/// Public host-facing facade.
pub mod api;
pub use api::{CoreConfig, Emulator, RerunError};

#[cfg(test)]
use proptest as _;
