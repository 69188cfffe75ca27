//! Line-oriented debugger driver.
//!
//! Each input line is one command; each command prints exactly one line.
//! Blank lines and lines starting with `#` are skipped. End of input behaves
//! like `stop`.

use std::io::{self, BufRead, Write};

use semu_core::{DebugError, Emulator, ExecutionRecord};
use thiserror::Error;
use tracing::debug;

use crate::report;

/// One debugger command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    /// Execute one instruction.
    Step,
    /// Undo one instruction.
    Back,
    /// Run to completion or the next breakpoint.
    Resume,
    /// Set a breakpoint at an instruction index.
    Break(usize),
    /// Clear a breakpoint.
    Clear(usize),
    /// Print the current state.
    State,
    /// End the session and record it.
    Stop,
}

impl DebugCommand {
    /// Parses one command line.
    ///
    /// # Errors
    ///
    /// Returns a message naming the unknown command or bad operand.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let operand = words.next();
        if words.next().is_some() {
            return Err(format!("too many operands for '{command}'"));
        }
        let index = || -> Result<usize, String> {
            let text = operand.ok_or_else(|| format!("'{command}' needs an instruction index"))?;
            text.parse()
                .map_err(|_| format!("invalid instruction index '{text}'"))
        };
        let command = match command.to_ascii_lowercase().as_str() {
            "step" | "s" => Self::Step,
            "back" | "b" => Self::Back,
            "resume" | "r" => Self::Resume,
            "break" => return index().map(Self::Break),
            "clear" => return index().map(Self::Clear),
            "state" => Self::State,
            "stop" | "q" => Self::Stop,
            other => return Err(format!("unknown command '{other}'")),
        };
        match operand {
            Some(extra) => Err(format!("unexpected operand '{extra}'")),
            None => Ok(command),
        }
    }
}

/// Failures that end a debug script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Reading commands or writing replies failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The debugger failed; a fault also ends the session.
    #[error(transparent)]
    Debug(#[from] DebugError),
}

/// Starts a session at `level` and applies every command read from `input`.
///
/// Malformed commands are reported on `output` and skipped. The session is
/// stopped on `stop` or at end of input; the returned record is `None` when
/// the emulator does not record runs.
///
/// # Errors
///
/// Returns [`ScriptError::Debug`] when the debugger faults and
/// [`ScriptError::Io`] when reading or writing fails.
pub fn run_debug_script(
    emulator: &mut Emulator,
    level: usize,
    inputs: &[i64],
    input: impl BufRead,
    output: &mut impl Write,
) -> Result<Option<ExecutionRecord>, ScriptError> {
    let view = emulator.debug_start(level, inputs)?;
    writeln!(output, "{}", report::render_debug(&view))?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = match DebugCommand::parse(line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "error: {message}")?;
                continue;
            }
        };
        debug!(?command, "debug command");
        let reply = match command {
            DebugCommand::Step => report::render_step(&emulator.debug_step()?),
            DebugCommand::Back => {
                if emulator.debug_step_back()? {
                    let view = emulator.debug_view();
                    format!("back at #{}", view.pc.unwrap_or_default())
                } else {
                    "already at the first instruction".to_owned()
                }
            }
            DebugCommand::Resume => report::render_resume(&emulator.debug_resume()?),
            DebugCommand::Break(index) => {
                if emulator.debugger_mut().set_breakpoint(index) {
                    format!("breakpoint set at #{index}")
                } else {
                    format!("breakpoint already set at #{index}")
                }
            }
            DebugCommand::Clear(index) => {
                if emulator.debugger_mut().clear_breakpoint(index) {
                    format!("breakpoint cleared at #{index}")
                } else {
                    format!("no breakpoint at #{index}")
                }
            }
            DebugCommand::State => report::render_debug(&emulator.debug_view()),
            DebugCommand::Stop => break,
        };
        writeln!(output, "{reply}")?;
    }

    let record = emulator.debug_stop()?;
    match &record {
        Some(record) => writeln!(output, "stopped: {}", report::render_record(record))?,
        None => writeln!(output, "stopped")?,
    }
    Ok(record)
}
