//! Instruction data model: kinds, arguments, labels, and provenance.

/// Call argument expressions for `QUOTE` and `JUMP_EQUAL_FUNCTION`.
pub mod call;
/// Instruction kinds and argument roles.
pub mod kind;
/// One-level macro lowering of synthetic instructions.
pub mod lowering;
/// Human-readable instruction text.
pub mod text;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use call::{CallArgument, FunctionCall};
pub use kind::{ArgumentClass, ArgumentRole, InstructionKind};
pub use lowering::{expansion_depth, LoweringSite};

use crate::timing::cycle_cost;
use crate::FaultKind;

/// The instruction (and its index in the previous level) another instruction was lowered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Snapshot of the source instruction, carrying its own origin.
    pub instruction: Instruction,
    /// Index of the source instruction in the level it belonged to.
    pub index: usize,
}

/// An immutable instruction value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    kind: InstructionKind,
    target: String,
    arguments: BTreeMap<ArgumentRole, String>,
    label: Option<String>,
    origin: Option<Arc<Origin>>,
}

impl Instruction {
    /// Creates an unlabeled instruction without arguments.
    #[must_use]
    pub fn new(kind: InstructionKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            arguments: BTreeMap::new(),
            label: None,
            origin: None,
        }
    }

    /// Sets an argument value.
    #[must_use]
    pub fn with_argument(mut self, role: ArgumentRole, value: impl Into<String>) -> Self {
        self.arguments.insert(role, value.into());
        self
    }

    /// Attaches a label. An empty label means unlabeled.
    #[must_use]
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label.filter(|label| !label.is_empty());
        self
    }

    /// Records the instruction this one was lowered from.
    #[must_use]
    pub fn derived_from(mut self, origin: Arc<Origin>) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Operation kind.
    #[must_use]
    pub const fn kind(&self) -> InstructionKind {
        self.kind
    }

    /// Name of the variable the instruction principally affects; empty for pure control.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Attached label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Looks up an argument value.
    #[must_use]
    pub fn argument(&self, role: ArgumentRole) -> Option<&str> {
        self.arguments.get(&role).map(String::as_str)
    }

    /// Looks up an argument the instruction kind requires.
    ///
    /// # Errors
    ///
    /// Returns [`FaultKind::MissingArgument`] when the argument is absent.
    pub fn require(&self, role: ArgumentRole) -> Result<&str, FaultKind> {
        self.argument(role)
            .ok_or(FaultKind::MissingArgument(role))
    }

    /// All arguments in role order.
    pub fn arguments(&self) -> impl Iterator<Item = (ArgumentRole, &str)> + '_ {
        self.arguments
            .iter()
            .map(|(role, value)| (*role, value.as_str()))
    }

    /// Fixed cycle cost (for calls, the overhead excluding the callee).
    #[must_use]
    pub fn cycles(&self) -> u64 {
        cycle_cost(self.kind)
    }

    /// Returns `true` for primitive instructions.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        self.kind.is_primitive()
    }

    /// Label this instruction may jump to.
    #[must_use]
    pub fn jump_target(&self) -> Option<&str> {
        self.kind.jump_role().and_then(|role| self.argument(role))
    }

    /// Parsed call for `QUOTE` / `JUMP_EQUAL_FUNCTION`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultKind::MissingArgument`] when the function name or
    /// argument list is absent or malformed.
    pub fn function_call(&self) -> Result<FunctionCall, FaultKind> {
        let function = self.require(ArgumentRole::FunctionName)?;
        let arguments = self.argument(ArgumentRole::FunctionArguments).unwrap_or("");
        FunctionCall::parse(function, arguments)
            .ok_or(FaultKind::MissingArgument(ArgumentRole::FunctionArguments))
    }

    /// Variables this instruction reads or writes, including call argument variables.
    #[must_use]
    pub fn referenced_variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.target.is_empty() {
            out.push(self.target.clone());
        }
        for (role, value) in self.arguments() {
            if role.class() == ArgumentClass::Variable {
                out.push(value.to_owned());
            }
        }
        if self.kind.is_call() {
            if let Ok(call) = self.function_call() {
                out.extend(call.variables().into_iter().map(str::to_owned));
            }
        }
        out
    }

    /// Labels attached to or targeted by this instruction.
    #[must_use]
    pub fn referenced_labels(&self) -> Vec<&str> {
        self.label().into_iter().chain(self.jump_target()).collect()
    }

    /// Direct origin, if this instruction was produced by lowering.
    #[must_use]
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_deref()
    }

    /// Walks the provenance chain from the direct origin back to the original instruction.
    pub fn provenance(&self) -> impl Iterator<Item = &Origin> + '_ {
        std::iter::successors(self.origin(), |origin| origin.instruction.origin())
    }
}
