//! CLI entry point for the `semu` emulator binary.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use semu_cli::report::{render_fault, render_program, render_run};
use semu_cli::{load_program, run_debug_script, ScriptError};
use semu_core::{CoreConfig, Emulator, ProgramSource, RunResultView};
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE_TEXT: &str = "\
Usage: semu <command> [options]

Commands:
  show  <file> [--level N] [--json]                        Print an expansion level
  run   <file> [--level N] [--credits C] [--json] [x1 ...]  Run and print the result
  debug <file> [--level N] [x1 ...]                        Debug with commands from stdin

Options:
  -l, --level <N>      Expansion level (default 0, clamped to the maximum)
  -c, --credits <C>    Credit budget for the run (default unlimited)
      --json           Print JSON instead of text
  -h, --help           Show this help message

Debugger commands (one per line):
  step, back, resume, break <N>, clear <N>, state, stop

Examples:
  semu show program.json --level 2
  semu run program.json --credits 100 3 4
  echo 'break 2
resume
state' | semu debug program.json 3
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Show(ShowArgs),
    Run(RunArgs),
    Debug(DebugArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct ShowArgs {
    input: PathBuf,
    level: usize,
    json: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    level: usize,
    credits: Option<u64>,
    json: bool,
    values: Vec<i64>,
}

#[derive(Debug, PartialEq, Eq)]
struct DebugArgs {
    input: PathBuf,
    level: usize,
    values: Vec<i64>,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

/// Options shared by every command.
#[derive(Debug, Default)]
struct Parsed {
    input: Option<PathBuf>,
    level: usize,
    credits: Option<u64>,
    json: bool,
    values: Vec<i64>,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "show" => parse_show_args(args)
            .map(Command::Show)
            .map(ParseResult::Command),
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        "debug" => parse_debug_args(args)
            .map(Command::Debug)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<OsString>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("missing value for {flag}"))?;
    let text = value.to_string_lossy();
    text.parse()
        .map_err(|_| format!("invalid value for {flag}: {text}"))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_common(
    mut args: impl Iterator<Item = OsString>,
    allow_credits: bool,
    allow_json: bool,
    allow_values: bool,
) -> Result<Parsed, String> {
    let mut parsed = Parsed::default();

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--level" || arg == "-l" {
            parsed.level = parse_number("--level", args.next())?;
            continue;
        }

        if allow_credits && (arg == "--credits" || arg == "-c") {
            parsed.credits = Some(parse_number("--credits", args.next())?);
            continue;
        }

        if allow_json && arg == "--json" {
            parsed.json = true;
            continue;
        }

        let text = arg.to_string_lossy();
        if text.starts_with('-') {
            return Err(format!("unknown option: {text}"));
        }

        if parsed.input.is_none() {
            parsed.input = Some(PathBuf::from(arg));
            continue;
        }

        if !allow_values {
            return Err("multiple input paths provided".to_string());
        }
        let value: u32 = text
            .parse()
            .map_err(|_| format!("invalid input value: {text}"))?;
        parsed.values.push(i64::from(value));
    }

    if parsed.input.is_none() {
        return Err("missing input path".to_string());
    }
    Ok(parsed)
}

fn parse_show_args(args: impl Iterator<Item = OsString>) -> Result<ShowArgs, String> {
    let parsed = parse_common(args, false, true, false)?;
    Ok(ShowArgs {
        input: parsed.input.unwrap_or_default(),
        level: parsed.level,
        json: parsed.json,
    })
}

fn parse_run_args(args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let parsed = parse_common(args, true, true, true)?;
    Ok(RunArgs {
        input: parsed.input.unwrap_or_default(),
        level: parsed.level,
        credits: parsed.credits,
        json: parsed.json,
        values: parsed.values,
    })
}

fn parse_debug_args(args: impl Iterator<Item = OsString>) -> Result<DebugArgs, String> {
    let parsed = parse_common(args, false, false, true)?;
    Ok(DebugArgs {
        input: parsed.input.unwrap_or_default(),
        level: parsed.level,
        values: parsed.values,
    })
}

fn load_emulator(input: &std::path::Path, config: CoreConfig) -> Result<Emulator, i32> {
    let source: ProgramSource = load_program(input).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;
    Emulator::compile(&source, config).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn print_json(encoded: serde_json::Result<String>) -> Result<(), i32> {
    match encoded {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(e) => {
            eprintln!("error: failed to encode JSON: {e}");
            Err(1)
        }
    }
}

fn run_show(args: &ShowArgs) -> Result<(), i32> {
    let mut emulator = load_emulator(&args.input, CoreConfig::default())?;
    let view = emulator.view(args.level).map_err(|fault| {
        eprintln!("error: {}", render_fault(&fault));
        1
    })?;
    if args.json {
        return print_json(serde_json::to_string_pretty(&view));
    }
    print!("{}", render_program(&view));
    Ok(())
}

fn run_run(args: &RunArgs) -> Result<(), i32> {
    let config = CoreConfig {
        credit_budget: args.credits,
        ..CoreConfig::default()
    };
    let mut emulator = load_emulator(&args.input, config)?;
    let outcome = emulator.run(args.level, &args.values).map_err(|fault| {
        eprintln!("error: {}", render_fault(&fault));
        if fault.kind.is_recoverable() { 3 } else { 2 }
    })?;
    let view = RunResultView::from(&outcome);
    if args.json {
        return print_json(serde_json::to_string_pretty(&view));
    }
    print!("{}", render_run(&view));
    Ok(())
}

fn run_debug(args: &DebugArgs) -> Result<(), i32> {
    let mut emulator = load_emulator(&args.input, CoreConfig::default())?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    match run_debug_script(
        &mut emulator,
        args.level,
        &args.values,
        stdin.lock(),
        &mut stdout,
    ) {
        Ok(_) => Ok(()),
        Err(ScriptError::Debug(semu_core::DebugError::Fault(fault))) => {
            eprintln!("error: {}", render_fault(&fault));
            Err(2)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Err(1)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => {
            debug!(?command, "parsed command");
            let result = match command {
                Command::Show(args) => run_show(&args),
                Command::Run(args) => run_run(&args),
                Command::Debug(args) => run_debug(&args),
            };
            match result {
                Ok(()) => 0,
                Err(code) => code,
            }
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
