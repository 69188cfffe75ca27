//! Loader-boundary program descriptions.
//!
//! A loader turns whatever on-disk format it reads into these plain values;
//! [`Program::compile`](crate::Program::compile) validates them and builds the
//! instruction model. Nothing here is checked until compilation.

use tracing::debug;

use crate::names::{self, EXIT_LABEL};
use crate::{ArgumentRole, BuildError, Instruction, InstructionKind};

/// One `(name, value)` argument of an instruction description.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArgumentSource {
    /// Argument role name, e.g. `JNZLabel` or `assignedVariable`.
    pub name: String,
    /// Raw value: a variable, a label, a literal, or a call argument list.
    pub value: String,
}

/// An instruction as the loader describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionSource {
    /// Instruction name, e.g. `INCREASE`.
    pub name: String,
    /// Declared type: `basic` (or `primitive`) or `synthetic`.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: String,
    /// Target variable; may be empty for `GOTO_LABEL`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub variable: String,
    /// Attached label, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: Option<String>,
    /// Arguments in source order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub arguments: Vec<ArgumentSource>,
}

/// A named function body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FunctionSource {
    /// Name used by call instructions.
    pub name: String,
    /// Display name shown to users.
    #[cfg_attr(feature = "serde", serde(default))]
    pub user_string: String,
    /// Function body.
    pub instructions: Vec<InstructionSource>,
}

/// A whole program description: the main body plus its functions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProgramSource {
    /// Program name.
    pub name: String,
    /// Main body.
    pub instructions: Vec<InstructionSource>,
    /// Functions visible to every body in the program.
    #[cfg_attr(feature = "serde", serde(default))]
    pub functions: Vec<FunctionSource>,
}

impl ArgumentSource {
    /// Creates an argument description.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl InstructionSource {
    /// Creates an unlabeled description without arguments.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        variable: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            variable: variable.into(),
            label: None,
            arguments: Vec::new(),
        }
    }

    /// Shorthand for a `basic` instruction.
    #[must_use]
    pub fn basic(name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::new(name, "basic", variable)
    }

    /// Shorthand for a `synthetic` instruction.
    #[must_use]
    pub fn synthetic(name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::new(name, "synthetic", variable)
    }

    /// Attaches a label.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Appends an argument.
    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push(ArgumentSource::new(name, value));
        self
    }

    /// Validates the description and builds the instruction it denotes.
    ///
    /// Unknown argument names are ignored. Jump targets and callee names are
    /// checked later, against the whole body.
    ///
    /// # Errors
    ///
    /// Returns the [`BuildError`] describing the first problem found.
    pub fn compile(&self, program: &str, index: usize) -> Result<Instruction, BuildError> {
        let kind = InstructionKind::from_name(&self.name).ok_or_else(|| {
            BuildError::UnknownInstruction {
                program: program.to_owned(),
                index,
                name: self.name.clone(),
            }
        })?;

        let declared_primitive = match self.kind.trim().to_ascii_lowercase().as_str() {
            "basic" | "primitive" => Some(true),
            "synthetic" => Some(false),
            _ => None,
        };
        if declared_primitive != Some(kind.is_primitive()) {
            return Err(BuildError::KindMismatch {
                program: program.to_owned(),
                index,
                name: kind.name().to_owned(),
                declared: self.kind.clone(),
            });
        }

        let variable = self.variable.trim();
        if variable.is_empty() && !kind.is_pure_control() {
            return Err(BuildError::MissingTargetVariable {
                program: program.to_owned(),
                index,
            });
        }

        let label = self
            .label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty());
        if let Some(label) = label {
            if label == EXIT_LABEL || !names::is_valid_label(label) {
                return Err(BuildError::InvalidLabelName {
                    program: program.to_owned(),
                    index,
                    label: label.to_owned(),
                });
            }
        }

        let mut instruction = Instruction::new(kind, variable).with_label(label.map(str::to_owned));
        for argument in &self.arguments {
            let Some(role) = ArgumentRole::from_name(&argument.name) else {
                debug!(program, index, argument = %argument.name, "ignoring unknown argument");
                continue;
            };
            instruction = instruction.with_argument(role, argument.value.trim());
        }

        for role in kind.required_arguments() {
            let present = instruction
                .argument(*role)
                .is_some_and(|value| *role == ArgumentRole::FunctionArguments || !value.is_empty());
            if !present {
                return Err(BuildError::MissingArgument {
                    program: program.to_owned(),
                    index,
                    role: *role,
                });
            }
        }

        if kind.is_call() && instruction.function_call().is_err() {
            return Err(BuildError::MalformedCallArguments {
                program: program.to_owned(),
                index,
                text: instruction
                    .argument(ArgumentRole::FunctionArguments)
                    .unwrap_or_default()
                    .to_owned(),
            });
        }

        if let Some(name) = instruction
            .referenced_variables()
            .into_iter()
            .find(|name| !names::classify(name).is_variable())
        {
            return Err(BuildError::InvalidVariableName {
                program: program.to_owned(),
                index,
                name,
            });
        }

        Ok(instruction)
    }
}

impl FunctionSource {
    /// Creates a function description.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        user_string: impl Into<String>,
        instructions: Vec<InstructionSource>,
    ) -> Self {
        Self {
            name: name.into(),
            user_string: user_string.into(),
            instructions,
        }
    }
}

impl ProgramSource {
    /// Creates a program description without functions.
    #[must_use]
    pub fn new(name: impl Into<String>, instructions: Vec<InstructionSource>) -> Self {
        Self {
            name: name.into(),
            instructions,
            functions: Vec::new(),
        }
    }

    /// Adds a function.
    #[must_use]
    pub fn with_function(mut self, function: FunctionSource) -> Self {
        self.functions.push(function);
        self
    }
}
