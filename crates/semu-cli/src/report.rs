//! Plain-text rendering of core views and debugger reports.

use std::fmt::Write as _;

use semu_core::{
    DebugView, ExecutionRecord, Fault, InstructionRow, ProgramView, ResumeReport, ResumeStop,
    RunResultView, StepReport,
};

fn join_pairs(pairs: &[(String, i64)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders one row, followed by its provenance chain.
///
/// ```text
/// #1 (B) [L1   ] y <- y + 1 (1) <<< #0 (S) [L1   ] y <- 3 (2)
/// ```
#[must_use]
pub fn render_row(row: &InstructionRow) -> String {
    let kind = if row.primitive { 'B' } else { 'S' };
    let mut line = format!(
        "#{} ({kind}) [{:<5}] {} ({})",
        row.index,
        row.label.as_deref().unwrap_or(""),
        row.text,
        row.cycles
    );
    for step in &row.provenance {
        let _ = write!(line, " <<< #{} {}", step.index, step.rendered);
    }
    line
}

/// Renders a structural view: header lines then one line per instruction.
#[must_use]
pub fn render_program(view: &ProgramView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "program {} (level {} of {})",
        view.name, view.level, view.max_level
    );
    let _ = writeln!(out, "inputs: {}", view.inputs.join(", "));
    let _ = writeln!(out, "labels: {}", view.labels.join(", "));
    let _ = writeln!(
        out,
        "instructions: {} ({} basic, {} synthetic)",
        view.rows.len(),
        view.summary.primitive,
        view.summary.synthetic
    );
    for row in &view.rows {
        let _ = writeln!(out, "{}", render_row(row));
    }
    out
}

/// Renders the result of a completed run.
#[must_use]
pub fn render_run(view: &RunResultView) -> String {
    let mut out = format!("y = {}\n", view.output);
    if !view.inputs.is_empty() {
        let _ = writeln!(out, "inputs: {}", join_pairs(&view.inputs));
    }
    if !view.work_variables.is_empty() {
        let _ = writeln!(out, "work: {}", join_pairs(&view.work_variables));
    }
    let _ = writeln!(out, "cycles: {}", view.cycles);
    out
}

/// Renders a fault, adding the remaining credits for budget aborts.
#[must_use]
pub fn render_fault(fault: &Fault) -> String {
    match fault.remaining_credits() {
        Some(remaining) => format!("{fault}\nremaining credits: {remaining}"),
        None => fault.to_string(),
    }
}

/// Renders what one debugger step did.
#[must_use]
pub fn render_step(report: &StepReport) -> String {
    let Some(executed) = report.executed else {
        return format!(
            "finished at #{} (total {} cycles)",
            report.pc, report.total_cycles
        );
    };
    let mut line = format!(
        "executed #{executed} (+{} cycles, total {}) -> #{}",
        report.cycles, report.total_cycles, report.pc
    );
    if !report.changed.is_empty() {
        let _ = write!(line, "; changed {}", report.changed.join(", "));
    }
    if report.finished {
        line.push_str("; finished");
    }
    line
}

/// Renders why a resume returned.
#[must_use]
pub fn render_resume(report: &ResumeReport) -> String {
    match report.stop {
        ResumeStop::Finished => format!(
            "finished after {} steps (total {} cycles)",
            report.steps, report.total_cycles
        ),
        ResumeStop::Breakpoint(index) => format!(
            "breakpoint #{index} after {} steps (total {} cycles)",
            report.steps, report.total_cycles
        ),
    }
}

/// Renders the debugger state on one line.
#[must_use]
pub fn render_debug(view: &DebugView) -> String {
    let mut line = format!("state {:?}", view.state);
    if let Some(pc) = view.pc {
        let _ = write!(line, "; pc #{pc}; cycles {}", view.cycles);
    }
    if !view.breakpoints.is_empty() {
        let points: Vec<String> = view.breakpoints.iter().map(|b| format!("#{b}")).collect();
        let _ = write!(line, "; breakpoints {}", points.join(" "));
    }
    if let Some(context) = &view.context {
        let _ = write!(line, "; {}", join_pairs(&context.variables()));
    }
    line
}

/// Renders a ledger entry.
#[must_use]
pub fn render_record(record: &ExecutionRecord) -> String {
    format!(
        "run #{}: level {}, y = {}, {} cycles",
        record.run_number, record.level, record.output, record.cycles
    )
}

#[cfg(test)]
mod tests {
    use semu_core::{
        CoreConfig, DebugState, DebugView, Emulator, FaultKind, InstructionSource, ProgramSource,
        ProvenanceStep, ResumeReport, ResumeStop, RunResultView, StepReport,
    };

    use super::{render_debug, render_fault, render_program, render_resume, render_row, render_run, render_step};

    fn three() -> Emulator {
        let source = ProgramSource::new(
            "Three",
            vec![InstructionSource::synthetic("CONSTANT_ASSIGNMENT", "y")
                .labeled("L1")
                .argument("constantValue", "3")],
        );
        Emulator::compile(&source, CoreConfig::default()).expect("valid program")
    }

    #[test]
    fn rows_carry_their_provenance_chain() {
        let mut emulator = three();
        let view = emulator.view(1).expect("expands");
        let rendered = render_row(&view.rows[1]);
        assert!(rendered.starts_with("#1 (B) [     ] "), "{rendered}");
        assert!(rendered.contains(" <<< #0 (S) [L1   ] "), "{rendered}");

        let listing = render_program(&view);
        assert!(listing.starts_with("program Three (level 1 of 2)\n"));
        assert!(listing.contains("instructions: 4 (3 basic, 1 synthetic)"));
    }

    #[test]
    fn provenance_steps_render_in_order() {
        let mut row = semu_core::InstructionRow {
            index: 4,
            primitive: true,
            label: None,
            text: "y <- y + 1".into(),
            cycles: 1,
            provenance: Vec::new(),
        };
        row.provenance.push(ProvenanceStep { index: 2, rendered: "a".into() });
        row.provenance.push(ProvenanceStep { index: 0, rendered: "b".into() });
        assert_eq!(render_row(&row), "#4 (B) [     ] y <- y + 1 (1) <<< #2 a <<< #0 b");
    }

    #[test]
    fn run_view_lists_variables_and_cycles() {
        let view = RunResultView {
            output: 6,
            inputs: vec![("x1".into(), 0)],
            work_variables: Vec::new(),
            cycles: 12,
        };
        assert_eq!(render_run(&view), "y = 6\ninputs: x1=0\ncycles: 12\n");
    }

    #[test]
    fn budget_faults_show_remaining_credits() {
        let fault = FaultKind::InsufficientCredits {
            remaining: 3,
            required: 4,
        }
        .at(2);
        assert!(render_fault(&fault).ends_with("\nremaining credits: 3"));
        let plain = FaultKind::UnknownLabel("L9".into()).at(0);
        assert!(!render_fault(&plain).contains("remaining"));
    }

    #[test]
    fn debugger_reports_are_one_line() {
        let step = StepReport {
            executed: Some(0),
            pc: 1,
            cycles: 2,
            total_cycles: 2,
            changed: vec!["y".into()],
            finished: true,
        };
        assert_eq!(
            render_step(&step),
            "executed #0 (+2 cycles, total 2) -> #1; changed y; finished"
        );

        let resume = ResumeReport {
            steps: 3,
            stop: ResumeStop::Breakpoint(5),
            total_cycles: 7,
        };
        assert_eq!(render_resume(&resume), "breakpoint #5 after 3 steps (total 7 cycles)");

        let idle = DebugView {
            state: DebugState::Idle,
            pc: None,
            finished: false,
            cycles: 0,
            context: None,
            breakpoints: vec![2],
        };
        assert_eq!(render_debug(&idle), "state Idle; breakpoints #2");
    }
}
