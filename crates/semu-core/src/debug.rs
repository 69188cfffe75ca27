//! Reversible single-step debugger.
//!
//! A session keeps one full context snapshot per executed step, so stepping
//! back is a pop. Memory grows with steps times context size.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::execute::{step_one, StepOutcome};
use crate::{Context, ExpansionLevel, Fault, FaultKind, FunctionRegistry, Program};

/// Debugger lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DebugState {
    /// No session.
    #[default]
    Idle,
    /// A session is paused before the instruction at the PC.
    Stepping,
    /// A session has run past the last instruction.
    Finished,
}

/// Debugger failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebugError {
    /// The operation needs a session and none is active.
    #[error("no debug session is active")]
    NotActive,
    /// `start` was called while a session is active.
    #[error("a debug session is already active")]
    AlreadyActive,
    /// Execution or expansion faulted; the session has been stopped.
    #[error(transparent)]
    Fault(#[from] Fault),
}

/// What one `step` did.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StepReport {
    /// Index of the executed instruction; `None` when already finished.
    pub executed: Option<usize>,
    /// PC after the step.
    pub pc: usize,
    /// Cycles the step consumed.
    pub cycles: u64,
    /// Cumulative cycles since `start`.
    pub total_cycles: u64,
    /// Variables whose value the step changed.
    pub changed: Vec<String>,
    /// Whether the PC now denotes the end.
    pub finished: bool,
}

/// Why `resume` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ResumeStop {
    /// The program ran to completion.
    Finished,
    /// The PC reached a breakpoint.
    Breakpoint(usize),
}

/// What one `resume` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ResumeReport {
    /// Instructions executed by this call.
    pub steps: usize,
    /// Why it returned.
    pub stop: ResumeStop,
    /// Cumulative cycles since `start`.
    pub total_cycles: u64,
}

/// Values finalized by `stop`, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSession {
    /// Expansion level debugged.
    pub level: usize,
    /// Inputs the session started with.
    pub inputs: Vec<i64>,
    /// Value of `y` when stopped.
    pub output: i64,
    /// Cycles consumed when stopped.
    pub cycles: u64,
}

#[derive(Debug, Clone)]
struct Snapshot {
    context: Context,
    cycles: u64,
}

/// State of one debugging session over a single expansion level.
#[derive(Debug, Clone)]
pub struct DebugSession {
    level: Arc<ExpansionLevel>,
    registry: Arc<FunctionRegistry>,
    inputs: Vec<i64>,
    credits: Option<u64>,
    history: Vec<Snapshot>,
}

impl DebugSession {
    fn current(&self) -> Option<&Snapshot> {
        self.history.last()
    }

    /// Expansion level being debugged.
    #[must_use]
    pub const fn level(&self) -> &Arc<ExpansionLevel> {
        &self.level
    }

    /// Inputs the session started with.
    #[must_use]
    pub fn inputs(&self) -> &[i64] {
        &self.inputs
    }

    /// Credit budget for the whole session, if metered.
    #[must_use]
    pub const fn credits(&self) -> Option<u64> {
        self.credits
    }

    /// Current context.
    #[must_use]
    pub fn context(&self) -> Option<&Context> {
        self.current().map(|snapshot| &snapshot.context)
    }

    /// Current program counter.
    #[must_use]
    pub fn pc(&self) -> usize {
        self.context().map_or(0, Context::pc)
    }

    /// Cumulative cycles.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.current().map_or(0, |snapshot| snapshot.cycles)
    }

    /// Number of history entries, the initial snapshot included.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Whether the PC is past the last instruction.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.pc() >= self.level.len()
    }
}

/// Reversible stepping over one expansion level.
#[derive(Debug, Clone, Default)]
pub struct Debugger {
    session: Option<DebugSession>,
    breakpoints: BTreeSet<usize>,
}

impl Debugger {
    /// Creates an idle debugger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DebugState {
        match &self.session {
            None => DebugState::Idle,
            Some(session) if session.is_finished() => DebugState::Finished,
            Some(_) => DebugState::Stepping,
        }
    }

    /// Active session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&DebugSession> {
        self.session.as_ref()
    }

    /// Adds a breakpoint before instruction `index`.
    pub fn set_breakpoint(&mut self, index: usize) -> bool {
        self.breakpoints.insert(index)
    }

    /// Removes a breakpoint.
    pub fn clear_breakpoint(&mut self, index: usize) -> bool {
        self.breakpoints.remove(&index)
    }

    /// Breakpoints in index order.
    #[must_use]
    pub const fn breakpoints(&self) -> &BTreeSet<usize> {
        &self.breakpoints
    }

    /// Starts a session at `level` with `inputs` bound to `x1, x2, ...`.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::AlreadyActive`] when a session is running, or
    /// [`DebugError::Fault`] when expansion fails or an input is negative.
    pub fn start(
        &mut self,
        program: &mut Program,
        level: usize,
        inputs: &[i64],
    ) -> Result<&DebugSession, DebugError> {
        self.start_with_credits(program, level, inputs, None)
    }

    /// Starts a session whose steps together may spend at most `credits`.
    ///
    /// A step the remaining credits cannot cover fails with
    /// [`FaultKind::InsufficientCredits`] and leaves the session where it was.
    ///
    /// # Errors
    ///
    /// Same as [`Self::start`].
    pub fn start_with_credits(
        &mut self,
        program: &mut Program,
        level: usize,
        inputs: &[i64],
        credits: Option<u64>,
    ) -> Result<&DebugSession, DebugError> {
        if self.session.is_some() {
            return Err(DebugError::AlreadyActive);
        }
        let level = program.expand_to_level(level)?;
        let mut context = level.context().clone();
        context.bind_inputs(inputs).map_err(|kind| kind.at(0))?;
        debug!(
            program = program.name(),
            level = level.level(),
            ?inputs,
            ?credits,
            "debug session started"
        );

        Ok(self.session.insert(DebugSession {
            level,
            registry: Arc::clone(program.registry()),
            inputs: inputs.to_vec(),
            credits,
            history: vec![Snapshot { context, cycles: 0 }],
        }))
    }

    /// Executes the instruction at the PC.
    ///
    /// A finished session reports `executed: None` and is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::NotActive`] without a session. A fault stops the
    /// session and is returned as [`DebugError::Fault`], except running out of
    /// credits, which keeps the session unchanged.
    pub fn step(&mut self) -> Result<StepReport, DebugError> {
        let session = self.session.as_mut().ok_or(DebugError::NotActive)?;
        let Some(current) = session.current() else {
            return Err(DebugError::NotActive);
        };
        let mut context = current.context.clone();
        let previous_cycles = current.cycles;

        let outcome = step_one(
            session.level.instructions(),
            &mut context,
            session.registry.as_ref(),
        );
        match outcome {
            Ok(StepOutcome::Finished) => Ok(StepReport {
                executed: None,
                pc: context.pc(),
                cycles: 0,
                total_cycles: previous_cycles,
                changed: Vec::new(),
                finished: true,
            }),
            Ok(StepOutcome::Retired { pc, cycles }) => {
                let changed = context.changed_variables(&current.context);
                if let Some(budget) = session.credits {
                    let remaining = budget.saturating_sub(previous_cycles);
                    if cycles > remaining {
                        let fault = FaultKind::InsufficientCredits {
                            remaining,
                            required: cycles,
                        }
                        .at(pc);
                        debug!(%fault, "debug step exceeds the credit budget");
                        return Err(fault.into());
                    }
                }
                let total_cycles = previous_cycles.saturating_add(cycles);
                let report = StepReport {
                    executed: Some(pc),
                    pc: context.pc(),
                    cycles,
                    total_cycles,
                    changed,
                    finished: context.pc() >= session.level.len(),
                };
                session.history.push(Snapshot {
                    context,
                    cycles: total_cycles,
                });
                Ok(report)
            }
            Err(fault) => {
                debug!(%fault, "debug session stopped by fault");
                self.session = None;
                Err(fault.into())
            }
        }
    }

    /// Undoes the most recent step. Returns `false` at the initial snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::NotActive`] without a session.
    pub fn step_back(&mut self) -> Result<bool, DebugError> {
        let session = self.session.as_mut().ok_or(DebugError::NotActive)?;
        if session.history.len() <= 1 {
            return Ok(false);
        }
        session.history.pop();
        Ok(true)
    }

    /// Steps until the program finishes or the PC reaches a breakpoint.
    ///
    /// The breakpoint at the starting PC, if any, does not stop the run.
    ///
    /// # Errors
    ///
    /// Same as [`Self::step`].
    pub fn resume(&mut self) -> Result<ResumeReport, DebugError> {
        let mut steps = 0_usize;
        loop {
            let session = self.session.as_ref().ok_or(DebugError::NotActive)?;
            let pc = session.pc();
            if session.is_finished() {
                return Ok(ResumeReport {
                    steps,
                    stop: ResumeStop::Finished,
                    total_cycles: session.cycles(),
                });
            }
            if steps > 0 && self.breakpoints.contains(&pc) {
                return Ok(ResumeReport {
                    steps,
                    stop: ResumeStop::Breakpoint(pc),
                    total_cycles: session.cycles(),
                });
            }
            self.step()?;
            steps += 1;
        }
    }

    /// Ends the session, returning its final output and cycle count.
    ///
    /// # Errors
    ///
    /// Returns [`DebugError::NotActive`] without a session.
    pub fn stop(&mut self) -> Result<FinishedSession, DebugError> {
        let session = self.session.take().ok_or(DebugError::NotActive)?;
        let output = session.context().map_or(0, Context::output);
        debug!(output, cycles = session.cycles(), "debug session stopped");
        Ok(FinishedSession {
            level: session.level.level(),
            output,
            cycles: session.cycles(),
            inputs: session.inputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DebugError, DebugState, Debugger, ResumeStop};
    use crate::source::{InstructionSource, ProgramSource};
    use crate::{FaultKind, Program};

    fn countdown() -> Program {
        Program::compile(&ProgramSource::new(
            "Countdown",
            vec![
                InstructionSource::basic("DECREASE", "x1").labeled("L1"),
                InstructionSource::basic("INCREASE", "y"),
                InstructionSource::basic("JUMP_NOT_ZERO", "x1").argument("JNZLabel", "L1"),
            ],
        ))
        .expect("valid program")
    }

    #[test]
    fn operations_need_an_active_session() {
        let mut debugger = Debugger::new();
        assert_eq!(debugger.state(), DebugState::Idle);
        assert_eq!(debugger.step(), Err(DebugError::NotActive));
        assert_eq!(debugger.step_back(), Err(DebugError::NotActive));
        assert_eq!(debugger.stop(), Err(DebugError::NotActive));
    }

    #[test]
    fn step_reports_changes_and_cycles() {
        let mut program = countdown();
        let mut debugger = Debugger::new();
        debugger.start(&mut program, 0, &[2]).expect("starts");
        assert!(matches!(
            debugger.start(&mut program, 0, &[2]),
            Err(DebugError::AlreadyActive)
        ));

        let first = debugger.step().expect("steps");
        assert_eq!(first.executed, Some(0));
        assert_eq!(first.changed, vec!["x1".to_owned()]);
        assert_eq!(first.total_cycles, 1);

        let second = debugger.step().expect("steps");
        assert_eq!(second.changed, vec!["y".to_owned()]);
        let third = debugger.step().expect("steps");
        assert!(third.changed.is_empty());
        assert_eq!(third.pc, 0);
        assert_eq!(third.total_cycles, 4);
        assert_eq!(debugger.state(), DebugState::Stepping);
    }

    #[test]
    fn credit_budget_stops_steps_without_ending_the_session() {
        let mut program = countdown();
        let mut debugger = Debugger::new();
        debugger
            .start_with_credits(&mut program, 0, &[2], Some(5))
            .expect("starts");

        let fault = debugger.resume().expect_err("budget runs out");
        assert_eq!(
            fault,
            DebugError::Fault(
                FaultKind::InsufficientCredits {
                    remaining: 0,
                    required: 1,
                }
                .at(1)
            )
        );

        let session = debugger.session().expect("still active");
        assert_eq!(session.pc(), 1);
        assert_eq!(session.cycles(), 5);
        assert_eq!(session.credits(), Some(5));
        assert!(debugger.step().is_err());
        assert_eq!(debugger.step_back(), Ok(true));
        assert_eq!(debugger.session().map(super::DebugSession::cycles), Some(4));
    }

    #[test]
    fn step_back_restores_previous_snapshot() {
        let mut program = countdown();
        let mut debugger = Debugger::new();
        debugger.start(&mut program, 0, &[2]).expect("starts");
        assert_eq!(debugger.step_back(), Ok(false));

        debugger.step().expect("steps");
        debugger.step().expect("steps");
        assert_eq!(debugger.step_back(), Ok(true));

        let session = debugger.session().expect("active");
        assert_eq!(session.pc(), 1);
        assert_eq!(session.cycles(), 1);
        assert_eq!(session.context().and_then(|c| c.get("y")), Some(0));
    }

    #[test]
    fn resume_stops_at_breakpoints_but_not_the_starting_one() {
        let mut program = countdown();
        let mut debugger = Debugger::new();
        debugger.set_breakpoint(2);
        debugger.start(&mut program, 0, &[2]).expect("starts");

        let first = debugger.resume().expect("resumes");
        assert_eq!(first.stop, ResumeStop::Breakpoint(2));
        assert_eq!(first.steps, 2);

        let second = debugger.resume().expect("resumes");
        assert_eq!(second.stop, ResumeStop::Breakpoint(2));
        assert_eq!(second.steps, 3);

        assert!(debugger.clear_breakpoint(2));
        let last = debugger.resume().expect("resumes");
        assert_eq!(last.stop, ResumeStop::Finished);
        assert_eq!(debugger.state(), DebugState::Finished);

        let finished = debugger.step().expect("no-op");
        assert_eq!(finished.executed, None);
        assert!(finished.finished);

        let record = debugger.stop().expect("stops");
        assert_eq!(record.output, 2);
        assert_eq!(record.inputs, vec![2]);
        assert_eq!(record.cycles, 8);
        assert_eq!(debugger.state(), DebugState::Idle);
    }

    #[test]
    fn fault_stops_the_session() {
        let mut program = Program::compile(&ProgramSource::new(
            "Broken",
            vec![InstructionSource::synthetic("CONSTANT_ASSIGNMENT", "y")
                .argument("constantValue", "ten")],
        ))
        .expect("literals are checked at run time");
        let mut debugger = Debugger::new();
        debugger.start(&mut program, 0, &[]).expect("starts");

        match debugger.step() {
            Err(DebugError::Fault(fault)) => {
                assert_eq!(fault.pc, 0);
                assert_eq!(fault.kind, FaultKind::InvalidLiteral("ten".into()));
            }
            other => panic!("unexpected step result: {other:?}"),
        }
        assert_eq!(debugger.state(), DebugState::Idle);
    }
}
