//! Loading, rendering, and scripted debugging for the `semu` binary.

/// JSON program loading.
pub mod loader;
pub use loader::{load_program, parse_program, LoadError};

/// Text rendering of views and reports.
pub mod report;

/// Stdin-driven debugger sessions.
pub mod session;
pub use session::{run_debug_script, DebugCommand, ScriptError};

use tracing_subscriber as _;

#[cfg(test)]
use tempfile as _;
