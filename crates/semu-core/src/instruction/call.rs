//! Argument expressions of the call instructions.
//!
//! A `functionArguments` value is a comma-separated list whose items are a
//! variable name, a non-negative integer literal, or a nested call written
//! `(Name,arg,...)`.

use std::fmt;

use crate::names;

/// One argument expression of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CallArgument {
    /// Value of a caller variable.
    Variable(String),
    /// A literal value.
    Literal(i64),
    /// Output of a nested call, evaluated in the caller's context.
    Call(FunctionCall),
}

/// A function name applied to argument expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FunctionCall {
    /// Callee name.
    pub function: String,
    /// Positional arguments.
    pub arguments: Vec<CallArgument>,
}

impl FunctionCall {
    /// Builds a call from a function name and its raw `functionArguments` text.
    ///
    /// Returns `None` when the argument text is malformed.
    #[must_use]
    pub fn parse(function: &str, arguments: &str) -> Option<Self> {
        let function = function.trim();
        if !is_plain_token(function) {
            return None;
        }
        Some(Self {
            function: function.to_owned(),
            arguments: parse_arguments(arguments)?,
        })
    }

    /// Every function name this call (including nested calls) invokes.
    #[must_use]
    pub fn functions(&self) -> Vec<&str> {
        let mut out = vec![self.function.as_str()];
        for argument in &self.arguments {
            if let CallArgument::Call(nested) = argument {
                out.extend(nested.functions());
            }
        }
        out
    }

    /// Every caller variable the arguments read, in order of appearance.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for argument in &self.arguments {
            match argument {
                CallArgument::Variable(name) => out.push(name.as_str()),
                CallArgument::Literal(_) => {}
                CallArgument::Call(nested) => out.extend(nested.variables()),
            }
        }
        out
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.function)?;
        for argument in &self.arguments {
            write!(f, ",{argument}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for CallArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => f.write_str(name),
            Self::Literal(value) => write!(f, "{value}"),
            Self::Call(call) => write!(f, "{call}"),
        }
    }
}

/// Parses a comma-separated argument list. An empty (or blank) list is valid.
///
/// Returns `None` on unbalanced parentheses, empty items, numeric tokens that
/// are not natural numbers, or nested calls without a function name.
#[must_use]
pub fn parse_arguments(text: &str) -> Option<Vec<CallArgument>> {
    if text.trim().is_empty() {
        return Some(Vec::new());
    }
    split_top_level(text)?
        .into_iter()
        .map(parse_item)
        .collect()
}

fn parse_item(item: &str) -> Option<CallArgument> {
    let item = item.trim();
    if let Some(inner) = item.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        let (function, rest) = inner.split_once(',').unwrap_or((inner, ""));
        return FunctionCall::parse(function, rest).map(CallArgument::Call);
    }
    if item.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        return names::parse_literal(item).map(CallArgument::Literal);
    }
    is_plain_token(item).then(|| CallArgument::Variable(item.to_owned()))
}

fn is_plain_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| !c.is_whitespace() && c != '(' && c != ')' && c != ',')
}

fn split_top_level(text: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (offset, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(&text[start..offset]);
                start = offset + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(&text[start..]);
    Some(parts)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{parse_arguments, CallArgument, FunctionCall};

    #[test]
    fn parses_flat_variable_and_literal_lists() {
        let args = parse_arguments("x1, 5 ,z2").expect("valid list");
        assert_eq!(
            args,
            vec![
                CallArgument::Variable("x1".into()),
                CallArgument::Literal(5),
                CallArgument::Variable("z2".into()),
            ]
        );
    }

    #[test]
    fn parses_nested_calls() {
        let call = FunctionCall::parse("Plus", "(Minus,x1,(Const7)),y").expect("valid call");
        assert_eq!(call.to_string(), "(Plus,(Minus,x1,(Const7)),y)");
        assert_eq!(call.functions(), vec!["Plus", "Minus", "Const7"]);
        assert_eq!(call.variables(), vec!["x1", "y"]);
    }

    #[test]
    fn blank_list_means_no_arguments() {
        assert_eq!(parse_arguments("  "), Some(Vec::new()));
        let call = FunctionCall::parse("Zero", "").expect("valid call");
        assert_eq!(call.to_string(), "(Zero)");
    }

    #[rstest]
    #[case("x1,,x2")]
    #[case("(f,x1")]
    #[case("x1)")]
    #[case("(,x1)")]
    #[case("x 1")]
    #[case("-1")]
    #[case("4a")]
    fn rejects_malformed_lists(#[case] text: &str) {
        assert_eq!(parse_arguments(text), None);
    }
}
