//! Compiled programs with a lazily filled cache of expansion levels.

use std::sync::Arc;

use tracing::debug;

use crate::registry::{CompiledProgram, FunctionRegistry};
use crate::run::{self, RunOutcome};
use crate::source::ProgramSource;
use crate::{BuildError, ExpansionLevel, Fault};

/// A runnable program: one compiled body, its registry, and its level cache.
///
/// Levels are computed on demand and cached; once produced, a level is never
/// recomputed or mutated.
#[derive(Debug, Clone)]
pub struct Program {
    registry: Arc<FunctionRegistry>,
    body: Arc<CompiledProgram>,
    levels: Vec<Arc<ExpansionLevel>>,
}

impl Program {
    /// Validates and compiles a program description.
    ///
    /// # Errors
    ///
    /// Returns the first [`BuildError`] found; no partially valid program is
    /// produced.
    pub fn compile(source: &ProgramSource) -> Result<Self, BuildError> {
        let registry = Arc::new(FunctionRegistry::build(source)?);
        let body = registry
            .main()
            .cloned()
            .ok_or_else(|| BuildError::FunctionNotFound {
                program: source.name.clone(),
                function: source.name.clone(),
            })?;
        Ok(Self::with_body(registry, body))
    }

    fn with_body(registry: Arc<FunctionRegistry>, body: Arc<CompiledProgram>) -> Self {
        let levels = vec![Arc::clone(body.original())];
        Self {
            registry,
            body,
            levels,
        }
    }

    /// A registered function as a standalone program sharing this registry.
    #[must_use]
    pub fn for_function(&self, name: &str) -> Option<Self> {
        let body = self.registry.get(name).cloned()?;
        Some(Self::with_body(Arc::clone(&self.registry), body))
    }

    /// Program name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.body.name()
    }

    /// Display name.
    #[must_use]
    pub fn user_string(&self) -> &str {
        self.body.user_string()
    }

    /// Returns `true` when this program is a registered function.
    #[must_use]
    pub fn is_function(&self) -> bool {
        self.body.is_function()
    }

    /// Highest meaningful expansion level.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.body.max_level()
    }

    /// Registry used to resolve calls.
    #[must_use]
    pub const fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Level 0.
    #[must_use]
    pub fn original(&self) -> &Arc<ExpansionLevel> {
        self.body.original()
    }

    /// Input variable names used by the program, ordered by index.
    #[must_use]
    pub fn input_variables(&self) -> Vec<String> {
        self.original()
            .context()
            .inputs()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Labels declared at level 0, `EXIT` included when referenced.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.original().labels().iter().cloned().collect()
    }

    /// Number of levels already cached.
    #[must_use]
    pub fn cached_levels(&self) -> usize {
        self.levels.len()
    }

    /// Returns expansion level `level`, computing any missing levels first.
    ///
    /// Requests above [`Self::max_level`] are clamped to it. Cached levels
    /// are returned as-is, so repeated calls yield the same [`Arc`].
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] raised while lowering; cached levels are kept.
    pub fn expand_to_level(&mut self, level: usize) -> Result<Arc<ExpansionLevel>, Fault> {
        let max_level = self.max_level();
        let level = if level > max_level {
            debug!(requested = level, max_level, "clamping expansion level");
            max_level
        } else {
            level
        };

        while self.levels.len() <= level {
            let Some(last) = self.levels.last() else {
                break;
            };
            let next = Arc::new(last.lower()?);
            self.levels.push(next);
        }

        Ok(self
            .levels
            .get(level)
            .map_or_else(|| Arc::clone(self.original()), Arc::clone))
    }

    /// Runs the program at `level` with `inputs`.
    ///
    /// # Errors
    ///
    /// Returns the first [`Fault`] raised by expansion or execution.
    pub fn run(&mut self, level: usize, inputs: &[i64]) -> Result<RunOutcome, Fault> {
        let expanded = self.expand_to_level(level)?;
        run::run(&expanded, inputs, self.registry.as_ref())
    }

    /// Runs the program at `level` with `inputs` under a credit budget.
    ///
    /// # Errors
    ///
    /// Returns [`FaultKind::InsufficientCredits`](crate::FaultKind::InsufficientCredits)
    /// when the budget runs out, or any other [`Fault`].
    pub fn run_with_credits(
        &mut self,
        level: usize,
        inputs: &[i64],
        credits: u64,
    ) -> Result<RunOutcome, Fault> {
        let expanded = self.expand_to_level(level)?;
        run::run_with_credits(&expanded, inputs, self.registry.as_ref(), credits)
    }
}
