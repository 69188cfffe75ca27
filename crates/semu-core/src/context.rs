//! The flat name-to-integer namespace shared by expansion and execution.

use std::collections::BTreeMap;

use crate::names::{self, NameKind, EXIT_LABEL, OUTPUT_VARIABLE};
use crate::FaultKind;

/// Value stored for a label that is declared but not attached to any instruction.
pub const UNBOUND_LABEL: i64 = -1;

/// Mapping from every variable and label name to an integer, plus the program counter.
///
/// Variables hold their current value; labels hold the index of the instruction
/// they are attached to. Uninitialised variables deterministically start at 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Context {
    values: BTreeMap<String, i64>,
    pc: usize,
}

impl Context {
    /// Creates a context holding only the output variable.
    #[must_use]
    pub fn new() -> Self {
        let mut context = Self::default();
        context.declare_variable(OUTPUT_VARIABLE);
        context
    }

    /// Returns the current program counter.
    #[must_use]
    pub const fn pc(&self) -> usize {
        self.pc
    }

    /// Moves the program counter.
    pub fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    /// Returns `true` when `name` has an entry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the raw entry for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Reads a variable, failing with [`FaultKind::UnknownVariable`] when absent.
    ///
    /// # Errors
    ///
    /// Returns [`FaultKind::UnknownVariable`] if `name` has no entry.
    pub fn value(&self, name: &str) -> Result<i64, FaultKind> {
        self.get(name)
            .ok_or_else(|| FaultKind::UnknownVariable(name.to_owned()))
    }

    /// Writes an entry, creating it if needed.
    pub fn set(&mut self, name: &str, value: i64) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        } else {
            self.values.insert(name.to_owned(), value);
        }
    }

    /// Ensures a variable entry exists, initialising it to 0.
    pub fn declare_variable(&mut self, name: &str) {
        if !self.values.contains_key(name) {
            self.values.insert(name.to_owned(), 0);
        }
    }

    /// Ensures a label entry exists, initialising it as unbound.
    pub fn declare_label(&mut self, name: &str) {
        if !self.values.contains_key(name) {
            self.values.insert(name.to_owned(), UNBOUND_LABEL);
        }
    }

    /// Binds a label to the instruction index it is attached to.
    pub fn bind_label(&mut self, name: &str, index: usize) {
        self.set(name, i64::try_from(index).unwrap_or(i64::MAX));
    }

    /// Resolves a jump target.
    ///
    /// # Errors
    ///
    /// Returns [`FaultKind::UnknownLabel`] when the label is absent or unbound.
    pub fn label_target(&self, name: &str) -> Result<usize, FaultKind> {
        self.get(name)
            .and_then(|value| usize::try_from(value).ok())
            .ok_or_else(|| FaultKind::UnknownLabel(name.to_owned()))
    }

    /// Pins the reserved `EXIT` label to the program length.
    pub fn pin_exit(&mut self, program_len: usize) {
        self.bind_label(EXIT_LABEL, program_len);
    }

    /// Allocates the first `L<n>` name not already present.
    #[must_use]
    pub fn next_free_label(&self) -> String {
        self.first_free(names::label)
    }

    /// Allocates the first `z<n>` name not already present.
    #[must_use]
    pub fn next_free_work_variable(&self) -> String {
        self.first_free(names::work_variable)
    }

    fn first_free(&self, make: fn(u32) -> String) -> String {
        (1..)
            .map(make)
            .find(|candidate| !self.values.contains_key(candidate))
            .unwrap_or_default()
    }

    /// Returns the value of the output variable `y`.
    #[must_use]
    pub fn output(&self) -> i64 {
        self.get(OUTPUT_VARIABLE).unwrap_or(0)
    }

    /// Binds input values positionally to `x1, x2, ...`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultKind::NegativeInput`] for the first negative value;
    /// nothing is bound then.
    pub fn bind_inputs(&mut self, inputs: &[i64]) -> Result<(), FaultKind> {
        if let Some((position, value)) = (1..).zip(inputs).find(|(_, value)| **value < 0) {
            return Err(FaultKind::NegativeInput {
                position,
                value: *value,
            });
        }
        for (index, value) in (1..).zip(inputs) {
            self.set(&names::input_variable(index), *value);
        }
        Ok(())
    }

    /// Binds input values positionally, skipping inputs this context does not declare.
    ///
    /// Undeclared positions are ignored, so surplus caller values never
    /// introduce new entries.
    pub fn bind_declared_inputs(&mut self, inputs: &[i64]) {
        for (index, value) in (1..).zip(inputs) {
            let name = names::input_variable(index);
            if let Some(slot) = self.values.get_mut(&name) {
                *slot = *value;
            }
        }
    }

    /// Iterates every entry in lexical name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Input variables ordered by index.
    #[must_use]
    pub fn inputs(&self) -> Vec<(String, i64)> {
        self.collect_sorted(|kind| matches!(kind, NameKind::Input(_)))
    }

    /// Work variables ordered by index.
    #[must_use]
    pub fn work_variables(&self) -> Vec<(String, i64)> {
        self.collect_sorted(|kind| matches!(kind, NameKind::Work(_)))
    }

    /// Every variable (output, inputs, work variables) in display order.
    #[must_use]
    pub fn variables(&self) -> Vec<(String, i64)> {
        self.collect_sorted(NameKind::is_variable)
    }

    /// Every label name known to this context, in display order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.collect_sorted(NameKind::is_label)
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    fn collect_sorted(&self, keep: impl Fn(NameKind) -> bool) -> Vec<(String, i64)> {
        let mut out: Vec<_> = self
            .values
            .iter()
            .filter(|(name, _)| keep(names::classify(name)))
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        out.sort_by(|(a, _), (b, _)| names::compare(a, b));
        out
    }

    /// Variables whose value differs between `previous` and `self`.
    #[must_use]
    pub fn changed_variables(&self, previous: &Self) -> Vec<String> {
        self.variables()
            .into_iter()
            .filter(|(name, value)| previous.get(name) != Some(*value))
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, UNBOUND_LABEL};
    use crate::FaultKind;

    #[test]
    fn new_context_declares_output_at_zero() {
        let context = Context::new();
        assert_eq!(context.get("y"), Some(0));
        assert_eq!(context.pc(), 0);
    }

    #[test]
    fn fresh_names_skip_existing_entries() {
        let mut context = Context::new();
        context.declare_label("L1");
        context.declare_label("L3");
        context.declare_variable("z1");
        context.declare_variable("z2");

        assert_eq!(context.next_free_label(), "L2");
        assert_eq!(context.next_free_work_variable(), "z3");
    }

    #[test]
    fn unbound_label_is_not_a_valid_target() {
        let mut context = Context::new();
        context.declare_label("L1");
        assert_eq!(context.get("L1"), Some(UNBOUND_LABEL));
        assert_eq!(
            context.label_target("L1"),
            Err(FaultKind::UnknownLabel("L1".into()))
        );

        context.bind_label("L1", 4);
        assert_eq!(context.label_target("L1"), Ok(4));
    }

    #[test]
    fn missing_variable_reports_unknown_variable() {
        let context = Context::new();
        assert_eq!(
            context.value("x9"),
            Err(FaultKind::UnknownVariable("x9".into()))
        );
    }

    #[test]
    fn inputs_bind_positionally_and_sort_numerically() {
        let mut context = Context::new();
        context
            .bind_inputs(&[5, 6, 7, 8, 9, 10, 11, 12, 13, 14])
            .expect("natural inputs");
        let inputs = context.inputs();
        assert_eq!(inputs.len(), 10);
        assert_eq!(inputs[0], ("x1".to_owned(), 5));
        assert_eq!(inputs[1], ("x2".to_owned(), 6));
        assert_eq!(inputs[9], ("x10".to_owned(), 14));
    }

    #[test]
    fn negative_inputs_are_rejected_before_binding() {
        let mut context = Context::new();
        assert_eq!(
            context.bind_inputs(&[2, -3]),
            Err(FaultKind::NegativeInput {
                position: 2,
                value: -3
            })
        );
        assert!(context.inputs().is_empty());
    }

    #[test]
    fn declared_inputs_ignore_surplus_values() {
        let mut context = Context::new();
        context.declare_variable("x1");
        context.declare_variable("x3");
        context.bind_declared_inputs(&[4, 5, 6, 7]);

        assert_eq!(context.get("x1"), Some(4));
        assert_eq!(context.get("x2"), None);
        assert_eq!(context.get("x3"), Some(6));
        assert_eq!(context.get("x4"), None);
    }

    #[test]
    fn changed_variables_ignores_labels() {
        let mut before = Context::new();
        before.declare_variable("x1");
        before.declare_label("L1");
        let mut after = before.clone();
        after.set("x1", 3);
        after.bind_label("L1", 2);

        assert_eq!(after.changed_variables(&before), vec!["x1".to_owned()]);
    }
}
