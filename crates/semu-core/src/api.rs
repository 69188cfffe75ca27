//! Host-facing facade bundling a program, its debugger, and its run history.

use thiserror::Error;
use tracing::debug;

use crate::debug::{DebugError, Debugger, ResumeReport, StepReport};
use crate::run::RunOutcome;
use crate::source::ProgramSource;
use crate::stats::{ExecutionRecord, StatisticsLedger};
use crate::view::{DebugView, ProgramView};
use crate::{BuildError, Fault, Program};

/// Host configuration for an [`Emulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Credits available to each `run` and to each debug session as a whole;
    /// `None` runs unmetered.
    pub credit_budget: Option<u64>,
    /// Whether completed runs and stopped debug sessions are recorded.
    pub record_runs: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            credit_budget: None,
            record_runs: true,
        }
    }
}

/// Failures of [`Emulator::rerun`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RerunError {
    /// No record carries the requested run number.
    #[error("run #{0} has not been recorded")]
    UnknownRun(usize),
    /// The repeated run faulted.
    #[error(transparent)]
    Fault(#[from] Fault),
}

/// A program together with its debugger, history, and configuration.
#[derive(Debug, Clone)]
pub struct Emulator {
    program: Program,
    debugger: Debugger,
    ledger: StatisticsLedger,
    config: CoreConfig,
}

impl Emulator {
    /// Wraps an already compiled program.
    #[must_use]
    pub fn new(program: Program, config: CoreConfig) -> Self {
        Self {
            program,
            debugger: Debugger::new(),
            ledger: StatisticsLedger::new(),
            config,
        }
    }

    /// Compiles `source` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns the [`BuildError`] raised by compilation.
    pub fn compile(source: &ProgramSource, config: CoreConfig) -> Result<Self, BuildError> {
        Ok(Self::new(Program::compile(source)?, config))
    }

    /// The wrapped program.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Recorded runs.
    #[must_use]
    pub const fn history(&self) -> &StatisticsLedger {
        &self.ledger
    }

    /// Structural view of `level` (clamped to the maximum).
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] raised while expanding.
    pub fn view(&mut self, level: usize) -> Result<ProgramView, Fault> {
        let expanded = self.program.expand_to_level(level)?;
        Ok(ProgramView::new(
            self.program.name(),
            self.program.max_level(),
            &expanded,
        ))
    }

    /// Runs the program, honouring the configured credit budget.
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] that aborted the run; nothing is recorded then.
    pub fn run(&mut self, level: usize, inputs: &[i64]) -> Result<RunOutcome, Fault> {
        let level = level.min(self.program.max_level());
        let outcome = match self.config.credit_budget {
            Some(credits) => self.program.run_with_credits(level, inputs, credits)?,
            None => self.program.run(level, inputs)?,
        };
        if self.config.record_runs {
            let record = self
                .ledger
                .append(level, inputs, outcome.output, outcome.cycles);
            debug!(run = record.run_number, "recorded run");
        }
        Ok(outcome)
    }

    /// Runs a recorded run again with its level and inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RerunError::UnknownRun`] for an unrecorded run number, or the
    /// [`Fault`] raised by the repeated run.
    pub fn rerun(&mut self, run_number: usize) -> Result<RunOutcome, RerunError> {
        let record = self
            .ledger
            .get(run_number)
            .cloned()
            .ok_or(RerunError::UnknownRun(run_number))?;
        Ok(self.run(record.level, &record.inputs)?)
    }

    /// The debugger, e.g. to manage breakpoints.
    #[must_use]
    pub const fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    /// Mutable access to the debugger.
    pub fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }

    /// Starts a debug session.
    ///
    /// # Errors
    ///
    /// See [`Debugger::start`].
    pub fn debug_start(&mut self, level: usize, inputs: &[i64]) -> Result<DebugView, DebugError> {
        self.debugger.start_with_credits(
            &mut self.program,
            level,
            inputs,
            self.config.credit_budget,
        )?;
        Ok(self.debug_view())
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// See [`Debugger::step`].
    pub fn debug_step(&mut self) -> Result<StepReport, DebugError> {
        self.debugger.step()
    }

    /// Undoes one instruction.
    ///
    /// # Errors
    ///
    /// See [`Debugger::step_back`].
    pub fn debug_step_back(&mut self) -> Result<bool, DebugError> {
        self.debugger.step_back()
    }

    /// Runs to completion or the next breakpoint.
    ///
    /// # Errors
    ///
    /// See [`Debugger::resume`].
    pub fn debug_resume(&mut self) -> Result<ResumeReport, DebugError> {
        self.debugger.resume()
    }

    /// Stops the session and records it.
    ///
    /// Returns `None` when recording is disabled.
    ///
    /// # Errors
    ///
    /// See [`Debugger::stop`].
    pub fn debug_stop(&mut self) -> Result<Option<ExecutionRecord>, DebugError> {
        let finished = self.debugger.stop()?;
        if !self.config.record_runs {
            return Ok(None);
        }
        let record = self.ledger.append(
            finished.level,
            &finished.inputs,
            finished.output,
            finished.cycles,
        );
        Ok(Some(record))
    }

    /// Current debugger state.
    #[must_use]
    pub fn debug_view(&self) -> DebugView {
        DebugView::from(&self.debugger)
    }
}
