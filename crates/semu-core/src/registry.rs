//! Compiled programs and the registry that resolves calls between them.
//!
//! The registry is built once, validated as a whole, and never mutated
//! afterwards, so independent sessions may share it behind an [`Arc`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::execute::{CallOutcome, CallResolver};
use crate::names::EXIT_LABEL;
use crate::run::run_instructions;
use crate::source::{InstructionSource, ProgramSource};
use crate::{expansion_depth, BuildError, Context, ExpansionLevel, Fault, FaultKind};

/// A validated program body: the main program or one of its functions.
#[derive(Debug)]
pub struct CompiledProgram {
    name: String,
    user_string: String,
    is_function: bool,
    original: Arc<ExpansionLevel>,
    max_level: usize,
    lowered: OnceLock<Result<Arc<ExpansionLevel>, Fault>>,
}

impl CompiledProgram {
    fn compile(
        name: &str,
        user_string: &str,
        is_function: bool,
        sources: &[InstructionSource],
        known: &BTreeSet<&str>,
    ) -> Result<Self, BuildError> {
        let instructions = sources
            .iter()
            .enumerate()
            .map(|(index, source)| source.compile(name, index))
            .collect::<Result<Vec<_>, _>>()?;

        let mut attached = BTreeMap::new();
        for (index, instruction) in instructions.iter().enumerate() {
            if let Some(label) = instruction.label() {
                if let Some(first) = attached.insert(label.to_owned(), index) {
                    return Err(BuildError::DuplicateLabel {
                        program: name.to_owned(),
                        label: label.to_owned(),
                        first,
                        second: index,
                    });
                }
            }
        }

        let mut context = Context::new();
        let mut labels: BTreeSet<String> = attached.keys().cloned().collect();
        for (index, instruction) in instructions.iter().enumerate() {
            if let Some(target) = instruction.jump_target() {
                if target != EXIT_LABEL && !attached.contains_key(target) {
                    return Err(BuildError::LabelNotExist {
                        program: name.to_owned(),
                        index,
                        label: target.to_owned(),
                    });
                }
                labels.insert(target.to_owned());
            }
            if instruction.kind().is_call() {
                if let Ok(call) = instruction.function_call() {
                    if let Some(missing) = call
                        .functions()
                        .into_iter()
                        .find(|function| !known.contains(function))
                    {
                        return Err(BuildError::FunctionNotFound {
                            program: name.to_owned(),
                            function: missing.to_owned(),
                        });
                    }
                }
            }
            for variable in instruction.referenced_variables() {
                context.declare_variable(&variable);
            }
        }
        for (label, index) in &attached {
            context.bind_label(label, *index);
        }
        context.pin_exit(instructions.len());

        let max_level = instructions
            .iter()
            .map(|instruction| expansion_depth(instruction.kind()))
            .max()
            .unwrap_or(0);
        debug!(
            program = name,
            instructions = instructions.len(),
            max_level,
            is_function,
            "compiled program body"
        );

        Ok(Self {
            name: name.to_owned(),
            user_string: user_string.to_owned(),
            is_function,
            original: Arc::new(ExpansionLevel::new(0, instructions, context, labels)),
            max_level,
            lowered: OnceLock::new(),
        })
    }

    /// Program or function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name; the plain name when none was given.
    #[must_use]
    pub fn user_string(&self) -> &str {
        if self.user_string.is_empty() {
            &self.name
        } else {
            &self.user_string
        }
    }

    /// Returns `true` for functions, `false` for the main program.
    #[must_use]
    pub const fn is_function(&self) -> bool {
        self.is_function
    }

    /// Level 0: the body as written.
    #[must_use]
    pub const fn original(&self) -> &Arc<ExpansionLevel> {
        &self.original
    }

    /// Level at which the body contains no lowerable instruction.
    #[must_use]
    pub const fn max_level(&self) -> usize {
        self.max_level
    }

    /// The fully lowered level, computed on first use.
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] raised while lowering, e.g. an invalid constant.
    pub fn lowered(&self) -> Result<&Arc<ExpansionLevel>, &Fault> {
        self.lowered
            .get_or_init(|| {
                let mut level = Arc::clone(&self.original);
                for _ in 0..self.max_level {
                    level = Arc::new(level.lower()?);
                }
                Ok(level)
            })
            .as_ref()
    }
}

/// Every compiled body of one program, keyed by name.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    programs: BTreeMap<String, Arc<CompiledProgram>>,
    main: String,
}

impl FunctionRegistry {
    /// Compiles the main body and every function of `source`.
    ///
    /// All names are registered before any body is checked, so forward and
    /// recursive references are legal.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::FunctionAlreadyExists`] on a name collision, or
    /// the first error raised while compiling a body.
    pub fn build(source: &ProgramSource) -> Result<Self, BuildError> {
        let mut known = BTreeSet::from([source.name.as_str()]);
        for function in &source.functions {
            if !known.insert(function.name.as_str()) {
                return Err(BuildError::FunctionAlreadyExists(function.name.clone()));
            }
        }

        let mut programs = BTreeMap::new();
        let main = CompiledProgram::compile(&source.name, "", false, &source.instructions, &known)?;
        programs.insert(source.name.clone(), Arc::new(main));
        for function in &source.functions {
            let compiled = CompiledProgram::compile(
                &function.name,
                &function.user_string,
                true,
                &function.instructions,
                &known,
            )?;
            programs.insert(function.name.clone(), Arc::new(compiled));
        }

        Ok(Self {
            programs,
            main: source.name.clone(),
        })
    }

    /// Looks up a compiled body by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<CompiledProgram>> {
        self.programs.get(name)
    }

    /// The main program.
    #[must_use]
    pub fn main(&self) -> Option<&Arc<CompiledProgram>> {
        self.get(&self.main)
    }

    /// Functions (excluding the main program) in name order.
    pub fn functions(&self) -> impl Iterator<Item = &Arc<CompiledProgram>> + '_ {
        self.programs.values().filter(|program| program.is_function())
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    /// Number of registered bodies, main program included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl CallResolver for FunctionRegistry {
    /// Runs the callee at its fully lowered level in a fresh context.
    ///
    /// `inputs[i]` binds `x{i+1}` only when the callee uses that input; other
    /// inputs stay 0 and surplus values are dropped.
    fn invoke(&self, function: &str, inputs: &[i64]) -> Result<CallOutcome, FaultKind> {
        let callee = self
            .get(function)
            .ok_or_else(|| FaultKind::FunctionNotFound(function.to_owned()))?;
        let failed = |fault: Fault| FaultKind::CallFailed {
            function: function.to_owned(),
            fault: Box::new(fault),
        };

        let level = callee.lowered().map_err(|fault| failed(fault.clone()))?;
        let mut context = level.context().clone();
        context.bind_declared_inputs(inputs);
        let outcome = run_instructions(level.instructions(), context, self, None).map_err(failed)?;

        Ok(CallOutcome {
            output: outcome.output,
            cycles: outcome.cycles,
        })
    }
}
