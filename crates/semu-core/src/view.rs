//! Read-only views handed to presentation layers.

use crate::debug::{DebugState, Debugger};
use crate::run::RunOutcome;
use crate::{Context, ExpansionLevel, Instruction, LevelSummary};

/// One link of a provenance chain.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProvenanceStep {
    /// Index of the source instruction in its own level.
    pub index: usize,
    /// Rendered source instruction.
    pub rendered: String,
}

/// One instruction of a structural view.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionRow {
    /// Position in the level.
    pub index: usize,
    /// `true` for primitive instructions.
    pub primitive: bool,
    /// Attached label, if any.
    pub label: Option<String>,
    /// Operand text.
    pub text: String,
    /// Fixed cycle cost.
    pub cycles: u64,
    /// Origins, nearest first.
    pub provenance: Vec<ProvenanceStep>,
}

impl InstructionRow {
    /// Builds the row for `instruction` at `index`.
    #[must_use]
    pub fn new(index: usize, instruction: &Instruction) -> Self {
        Self {
            index,
            primitive: instruction.is_primitive(),
            label: instruction.label().map(str::to_owned),
            text: instruction.text(),
            cycles: instruction.cycles(),
            provenance: instruction
                .provenance()
                .map(|origin| ProvenanceStep {
                    index: origin.index,
                    rendered: origin.instruction.to_string(),
                })
                .collect(),
        }
    }
}

/// Structural view of one expansion level.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProgramView {
    /// Program name.
    pub name: String,
    /// Level shown.
    pub level: usize,
    /// Highest level available.
    pub max_level: usize,
    /// Input variables used by the level.
    pub inputs: Vec<String>,
    /// Declared labels.
    pub labels: Vec<String>,
    /// Instruction counts.
    pub summary: LevelSummary,
    /// Instructions in order.
    pub rows: Vec<InstructionRow>,
}

impl ProgramView {
    /// Builds the view of `level`.
    #[must_use]
    pub fn new(name: &str, max_level: usize, level: &ExpansionLevel) -> Self {
        Self {
            name: name.to_owned(),
            level: level.level(),
            max_level,
            inputs: level
                .context()
                .inputs()
                .into_iter()
                .map(|(name, _)| name)
                .collect(),
            labels: level.labels().iter().cloned().collect(),
            summary: level.summary(),
            rows: level
                .instructions()
                .iter()
                .enumerate()
                .map(|(index, instruction)| InstructionRow::new(index, instruction))
                .collect(),
        }
    }
}

/// Result view of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunResultView {
    /// Final value of `y`.
    pub output: i64,
    /// Input variables ordered by index.
    pub inputs: Vec<(String, i64)>,
    /// Work variables ordered by index.
    pub work_variables: Vec<(String, i64)>,
    /// Total cycles.
    pub cycles: u64,
}

impl From<&RunOutcome> for RunResultView {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            output: outcome.output,
            inputs: outcome.context.inputs(),
            work_variables: outcome.context.work_variables(),
            cycles: outcome.cycles,
        }
    }
}

/// Debugger state as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DebugView {
    /// Lifecycle state.
    pub state: DebugState,
    /// Current PC; `None` when no session is active.
    pub pc: Option<usize>,
    /// Whether the PC denotes the end.
    pub finished: bool,
    /// Cumulative cycles.
    pub cycles: u64,
    /// Current context snapshot.
    pub context: Option<Context>,
    /// Breakpoints in index order.
    pub breakpoints: Vec<usize>,
}

impl From<&Debugger> for DebugView {
    fn from(debugger: &Debugger) -> Self {
        let session = debugger.session();
        Self {
            state: debugger.state(),
            pc: session.map(crate::DebugSession::pc),
            finished: session.is_some_and(crate::DebugSession::is_finished),
            cycles: session.map_or(0, crate::DebugSession::cycles),
            context: session.and_then(|session| session.context().cloned()),
            breakpoints: debugger.breakpoints().iter().copied().collect(),
        }
    }
}
