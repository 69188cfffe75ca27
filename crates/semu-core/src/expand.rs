//! Expansion levels and the one-notch lowering pass between them.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::names::EXIT_LABEL;
use crate::{Context, Fault, Instruction, LoweringSite};

/// Primitive versus synthetic instruction counts of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LevelSummary {
    /// Number of primitive instructions.
    pub primitive: usize,
    /// Number of synthetic instructions (including calls).
    pub synthetic: usize,
}

/// One expansion level: an instruction list plus the context it runs against.
///
/// The context holds every variable at 0, every label bound to its index in
/// this level, `EXIT` pinned to the list length, and the PC at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionLevel {
    level: usize,
    instructions: Arc<[Instruction]>,
    context: Context,
    labels: BTreeSet<String>,
}

impl ExpansionLevel {
    /// Assembles a level from its parts.
    #[must_use]
    pub fn new(
        level: usize,
        instructions: Vec<Instruction>,
        context: Context,
        labels: BTreeSet<String>,
    ) -> Self {
        Self {
            level,
            instructions: instructions.into(),
            context,
            labels,
        }
    }

    /// Number of lowering passes applied to reach this level.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Instructions of this level.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Shared handle to the instruction list.
    #[must_use]
    pub fn shared_instructions(&self) -> Arc<[Instruction]> {
        Arc::clone(&self.instructions)
    }

    /// Initial context for runs of this level.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Declared label names, including labels introduced by lowering.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` for an empty program.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Counts primitive and synthetic instructions.
    #[must_use]
    pub fn summary(&self) -> LevelSummary {
        let primitive = self
            .instructions
            .iter()
            .filter(|instruction| instruction.is_primitive())
            .count();
        LevelSummary {
            primitive,
            synthetic: self.instructions.len() - primitive,
        }
    }

    /// Indices of instructions that read, write, carry, or jump to `name`.
    #[must_use]
    pub fn usages(&self, name: &str) -> Vec<usize> {
        self.instructions
            .iter()
            .enumerate()
            .filter(|(_, instruction)| {
                instruction.referenced_labels().contains(&name)
                    || instruction
                        .referenced_variables()
                        .iter()
                        .any(|variable| variable == name)
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Produces the next level by lowering every synthetic instruction once.
    ///
    /// The context is cloned, fresh names are allocated in it, every attached
    /// label is re-bound to its new index, and `EXIT` is pinned to the new
    /// length.
    ///
    /// # Errors
    ///
    /// Returns a [`Fault`] whose `pc` is the index (in this level) of the
    /// instruction that could not be lowered.
    pub fn lower(&self) -> Result<Self, Fault> {
        let mut context = self.context.clone();
        let mut out = Vec::with_capacity(self.instructions.len());

        for (index, instruction) in self.instructions.iter().enumerate() {
            let site = LoweringSite {
                source_index: index,
                base: out.len(),
            };
            let block = instruction
                .expand(&mut context, site)
                .map_err(|kind| kind.at(index))?;
            out.extend(block);
        }

        let mut labels = self.labels.clone();
        for (index, instruction) in out.iter().enumerate() {
            if let Some(label) = instruction.label() {
                context.bind_label(label, index);
                labels.insert(label.to_owned());
            }
        }
        context.pin_exit(out.len());
        labels.extend(
            context
                .labels()
                .into_iter()
                .filter(|label| label != EXIT_LABEL || self.labels.contains(EXIT_LABEL)),
        );
        context.set_pc(0);

        debug!(
            level = self.level + 1,
            instructions = out.len(),
            labels = labels.len(),
            "lowered expansion level"
        );
        Ok(Self::new(self.level + 1, out, context, labels))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::ExpansionLevel;
    use crate::{ArgumentRole, Context, FaultKind, Instruction, InstructionKind};

    fn level_of(instructions: Vec<Instruction>) -> ExpansionLevel {
        let mut context = Context::new();
        let mut labels = BTreeSet::new();
        for (index, instruction) in instructions.iter().enumerate() {
            for variable in instruction.referenced_variables() {
                context.declare_variable(&variable);
            }
            if let Some(label) = instruction.label() {
                context.bind_label(label, index);
                labels.insert(label.to_owned());
            }
            if let Some(target) = instruction.jump_target() {
                context.declare_label(target);
                labels.insert(target.to_owned());
            }
        }
        context.pin_exit(instructions.len());
        ExpansionLevel::new(0, instructions, context, labels)
    }

    #[test]
    fn lowering_rebinds_original_labels_to_new_positions() {
        let level = level_of(vec![
            Instruction::new(InstructionKind::ConstantAssignment, "x1")
                .with_argument(ArgumentRole::ConstantValue, "2"),
            Instruction::new(InstructionKind::Increase, "y").with_label(Some("L1".into())),
            Instruction::new(InstructionKind::JumpNotZero, "x1")
                .with_argument(ArgumentRole::JnzLabel, "EXIT"),
        ]);
        assert_eq!(level.context().label_target("L1"), Ok(1));

        let next = level.lower().expect("lowering succeeds");
        assert_eq!(next.level(), 1);
        assert_eq!(next.len(), 5);
        assert_eq!(next.context().label_target("L1"), Ok(3));
        assert_eq!(next.context().label_target("EXIT"), Ok(5));
        assert_eq!(next.context().pc(), 0);
        assert_eq!(level.context().label_target("L1"), Ok(1));
    }

    #[test]
    fn fresh_labels_are_folded_into_the_label_set() {
        let level = level_of(vec![Instruction::new(InstructionKind::JumpZero, "x1")
            .with_argument(ArgumentRole::JzLabel, "EXIT")]);
        let next = level.lower().expect("lowering succeeds");

        assert!(next.labels().contains("L1"));
        assert!(next.labels().contains("EXIT"));
        assert_eq!(next.context().label_target("L1"), Ok(2));
    }

    #[test]
    fn lowering_fault_reports_source_index() {
        let level = level_of(vec![
            Instruction::new(InstructionKind::Increase, "y"),
            Instruction::new(InstructionKind::ConstantAssignment, "y")
                .with_argument(ArgumentRole::ConstantValue, "many"),
        ]);
        let fault = level.lower().expect_err("bad literal");
        assert_eq!(fault.pc, 1);
        assert_eq!(fault.kind, FaultKind::InvalidLiteral("many".into()));
    }

    #[test]
    fn summary_and_usages_describe_the_level() {
        let level = level_of(vec![
            Instruction::new(InstructionKind::Assignment, "y")
                .with_argument(ArgumentRole::AssignedVariable, "x1")
                .with_label(Some("L1".into())),
            Instruction::new(InstructionKind::Decrease, "x1"),
            Instruction::new(InstructionKind::JumpNotZero, "x1")
                .with_argument(ArgumentRole::JnzLabel, "L1"),
        ]);

        let summary = level.summary();
        assert_eq!(summary.primitive, 2);
        assert_eq!(summary.synthetic, 1);
        assert_eq!(level.usages("x1"), vec![0, 1, 2]);
        assert_eq!(level.usages("L1"), vec![0, 2]);
        assert!(level.usages("z9").is_empty());
    }
}
