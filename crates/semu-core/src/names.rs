//! Reserved names and the naming conventions that classify context entries.
//!
//! Every entry of a [`Context`](crate::Context) is discoverable purely by its
//! name: `y` is the output, `x<n>` are inputs, `z<n>` are work variables,
//! `L<n>` are labels, and `EXIT` is the implicit end-of-program label.

use std::cmp::Ordering;

/// Name of the output variable.
pub const OUTPUT_VARIABLE: &str = "y";
/// Reserved label that always resolves to the instruction-list length.
pub const EXIT_LABEL: &str = "EXIT";
/// Prefix every non-reserved label must start with.
pub const LABEL_PREFIX: char = 'L';
/// Prefix of input (argument) variables.
pub const INPUT_PREFIX: char = 'x';
/// Prefix of work variables.
pub const WORK_PREFIX: char = 'z';

/// Classification of a context entry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// The output variable `y`.
    Output,
    /// An input variable `x<n>`.
    Input(u32),
    /// A work variable `z<n>`.
    Work(u32),
    /// A numbered label `L<n>`.
    Label(u32),
    /// The reserved `EXIT` label.
    Exit,
    /// Anything that fits none of the conventions.
    Other,
}

impl NameKind {
    /// Returns `true` for names that denote variables rather than labels.
    #[must_use]
    pub const fn is_variable(self) -> bool {
        matches!(self, Self::Output | Self::Input(_) | Self::Work(_))
    }

    /// Returns `true` for numbered labels and `EXIT`.
    #[must_use]
    pub const fn is_label(self) -> bool {
        matches!(self, Self::Label(_) | Self::Exit)
    }
}

fn numbered(name: &str, prefix: char) -> Option<u32> {
    let digits = name.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Classifies a context entry name by convention.
#[must_use]
pub fn classify(name: &str) -> NameKind {
    if name == OUTPUT_VARIABLE {
        return NameKind::Output;
    }
    if name == EXIT_LABEL {
        return NameKind::Exit;
    }
    if let Some(n) = numbered(name, INPUT_PREFIX) {
        return NameKind::Input(n);
    }
    if let Some(n) = numbered(name, WORK_PREFIX) {
        return NameKind::Work(n);
    }
    if let Some(n) = numbered(name, LABEL_PREFIX) {
        return NameKind::Label(n);
    }
    NameKind::Other
}

/// Returns `true` when `name` may be attached to an instruction as a label.
#[must_use]
pub fn is_valid_label(name: &str) -> bool {
    name == EXIT_LABEL || (name.starts_with(LABEL_PREFIX) && name.len() > 1)
}

/// Returns `true` when `name` follows the label naming pattern.
#[must_use]
pub fn is_label_name(name: &str) -> bool {
    classify(name).is_label()
}

/// Formats the `index`-th input variable name (1-based).
#[must_use]
pub fn input_variable(index: u32) -> String {
    format!("{INPUT_PREFIX}{index}")
}

/// Formats the `index`-th work variable name (1-based).
#[must_use]
pub fn work_variable(index: u32) -> String {
    format!("{WORK_PREFIX}{index}")
}

/// Formats the `index`-th label name (1-based).
#[must_use]
pub fn label(index: u32) -> String {
    format!("{LABEL_PREFIX}{index}")
}

/// Parses a non-negative integer literal.
///
/// Returns `None` for anything that is not a plain decimal natural number.
#[must_use]
pub fn parse_literal(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Orders names by convention group, then numerically within the group.
///
/// `y` sorts first, then inputs, work variables, labels, `EXIT`, and finally
/// unconventional names in lexical order.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    fn key(kind: NameKind) -> (u8, u32) {
        match kind {
            NameKind::Output => (0, 0),
            NameKind::Input(n) => (1, n),
            NameKind::Work(n) => (2, n),
            NameKind::Label(n) => (3, n),
            NameKind::Exit => (4, 0),
            NameKind::Other => (5, 0),
        }
    }

    key(classify(a))
        .cmp(&key(classify(b)))
        .then_with(|| a.cmp(b))
}
