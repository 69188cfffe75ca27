use thiserror::Error;

use crate::ArgumentRole;

/// Fault classes used for reporting and recovery policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// A name was absent from the context.
    Lookup,
    /// A literal or argument was malformed.
    Operand,
    /// A cross-program call failed.
    Call,
    /// The credit budget ran out.
    Budget,
}

/// Execution-time failure causes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultKind {
    /// A variable was read that has no context entry.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    /// A jump named a label that is absent or unbound.
    #[error("unknown label '{0}'")]
    UnknownLabel(String),
    /// A constant argument was not a non-negative integer.
    #[error("invalid literal '{0}'")]
    InvalidLiteral(String),
    /// A run was started with a negative input value.
    #[error("input x{position} must be a natural number, got {value}")]
    NegativeInput {
        /// 1-based input position.
        position: usize,
        /// The rejected value.
        value: i64,
    },
    /// An instruction lacks an argument its kind requires.
    #[error("missing argument {0}")]
    MissingArgument(ArgumentRole),
    /// A call named a function the registry does not hold.
    #[error("function '{0}' not found")]
    FunctionNotFound(String),
    /// The credit budget cannot cover the next instruction.
    #[error("insufficient credits: {remaining} remaining, {required} required")]
    InsufficientCredits {
        /// Credits left before the aborted instruction.
        remaining: u64,
        /// Cost of the instruction that could not be paid for.
        required: u64,
    },
    /// A called function faulted.
    #[error("call to '{function}' failed: {fault}")]
    CallFailed {
        /// Name of the callee.
        function: String,
        /// Fault raised inside the callee.
        fault: Box<Fault>,
    },
}

impl FaultKind {
    /// Returns the reporting class for this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::UnknownVariable(_) | Self::UnknownLabel(_) => FaultClass::Lookup,
            Self::InvalidLiteral(_) | Self::NegativeInput { .. } | Self::MissingArgument(_) => {
                FaultClass::Operand
            }
            Self::FunctionNotFound(_) | Self::CallFailed { .. } => FaultClass::Call,
            Self::InsufficientCredits { .. } => FaultClass::Budget,
        }
    }

    /// Faults a caller is expected to handle (top up and retry) rather than treat as fatal.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientCredits { .. })
    }

    /// Attaches the program counter the fault was raised at.
    #[must_use]
    pub fn at(self, pc: usize) -> Fault {
        Fault { pc, kind: self }
    }
}

/// An execution fault together with the instruction index it occurred at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("{kind} at instruction #{pc}")]
pub struct Fault {
    /// Index of the faulting instruction.
    pub pc: usize,
    /// Failure cause.
    pub kind: FaultKind,
}

impl Fault {
    /// Credits left when an [`FaultKind::InsufficientCredits`] abort happened.
    #[must_use]
    pub fn remaining_credits(&self) -> Option<u64> {
        match &self.kind {
            FaultKind::InsufficientCredits { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }
}

/// Program construction failures. No partially valid program is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BuildError {
    /// A label argument names a label no instruction declares.
    #[error("label '{label}' referenced by instruction #{index} of '{program}' does not exist")]
    LabelNotExist {
        /// Program holding the instruction.
        program: String,
        /// Index of the referencing instruction.
        index: usize,
        /// The missing label.
        label: String,
    },
    /// A call names a function that is neither registered nor the program itself.
    #[error("function '{function}' called from '{program}' was not found")]
    FunctionNotFound {
        /// Program holding the call.
        program: String,
        /// The unresolved callee.
        function: String,
    },
    /// Two programs share a name.
    #[error("function '{0}' already exists")]
    FunctionAlreadyExists(String),
    /// The instruction name is not part of the instruction set.
    #[error("unknown instruction '{name}' at #{index} of '{program}'")]
    UnknownInstruction {
        /// Program holding the instruction.
        program: String,
        /// Instruction index.
        index: usize,
        /// The unrecognised name.
        name: String,
    },
    /// The declared primitive/synthetic type disagrees with the instruction name.
    #[error("instruction #{index} of '{program}' declared as {declared} but '{name}' is not")]
    KindMismatch {
        /// Program holding the instruction.
        program: String,
        /// Instruction index.
        index: usize,
        /// Instruction name.
        name: String,
        /// Declared type text.
        declared: String,
    },
    /// A required argument is absent.
    #[error("instruction #{index} of '{program}' is missing argument {role}")]
    MissingArgument {
        /// Program holding the instruction.
        program: String,
        /// Instruction index.
        index: usize,
        /// Missing role.
        role: ArgumentRole,
    },
    /// An instruction that writes a variable has no target variable.
    #[error("instruction #{index} of '{program}' has no target variable")]
    MissingTargetVariable {
        /// Program holding the instruction.
        program: String,
        /// Instruction index.
        index: usize,
    },
    /// A label does not follow the label naming convention.
    #[error("invalid label name '{label}' at #{index} of '{program}'")]
    InvalidLabelName {
        /// Program holding the instruction.
        program: String,
        /// Instruction index.
        index: usize,
        /// Offending label.
        label: String,
    },
    /// A variable operand is not `y`, `x<n>`, or `z<n>`.
    #[error("invalid variable name '{name}' at #{index} of '{program}'")]
    InvalidVariableName {
        /// Program holding the instruction.
        program: String,
        /// Instruction index.
        index: usize,
        /// Offending name.
        name: String,
    },
    /// The same label is attached to two instructions.
    #[error("label '{label}' attached twice in '{program}' (#{first} and #{second})")]
    DuplicateLabel {
        /// Program holding the instructions.
        program: String,
        /// The label.
        label: String,
        /// First attachment index.
        first: usize,
        /// Second attachment index.
        second: usize,
    },
    /// A `functionArguments` value could not be parsed.
    #[error("malformed call arguments '{text}' at #{index} of '{program}'")]
    MalformedCallArguments {
        /// Program holding the instruction.
        program: String,
        /// Instruction index.
        index: usize,
        /// The raw argument text.
        text: String,
    },
}
