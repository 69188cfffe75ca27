//! One-level macro lowering of synthetic instructions.
//!
//! Every macro obeys three rules:
//! 1. fresh labels and work variables come from the context's "next free"
//!    allocator, so they never collide with names already in use;
//! 2. each fresh label is bound in the context to the absolute index it will
//!    occupy in the next level as soon as it is allocated;
//! 3. every produced instruction is derived from the lowered instruction.

use std::sync::{Arc, OnceLock};

use super::{ArgumentClass, ArgumentRole, Instruction, InstructionKind, Origin};
use crate::names::{self, EXIT_LABEL};
use crate::{Context, FaultKind};

/// Where a lowered block lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoweringSite {
    /// Index of the instruction being lowered in the current level.
    pub source_index: usize,
    /// Index the block's first instruction will occupy in the next level.
    pub base: usize,
}

struct Block<'a> {
    context: &'a mut Context,
    base: usize,
    origin: Arc<Origin>,
    out: Vec<Instruction>,
}

impl<'a> Block<'a> {
    fn new(source: &Instruction, context: &'a mut Context, site: LoweringSite) -> Self {
        Self {
            context,
            base: site.base,
            origin: Arc::new(Origin {
                instruction: source.clone(),
                index: site.source_index,
            }),
            out: Vec::new(),
        }
    }

    fn label_at(&mut self, offset: usize) -> String {
        let label = self.context.next_free_label();
        self.context.bind_label(&label, self.base + offset);
        label
    }

    fn work_variable(&mut self) -> String {
        let variable = self.context.next_free_work_variable();
        self.context.declare_variable(&variable);
        variable
    }

    fn push(&mut self, instruction: Instruction) {
        self.out
            .push(instruction.derived_from(Arc::clone(&self.origin)));
    }

    fn finish(self) -> Vec<Instruction> {
        self.out
    }
}

fn op(kind: InstructionKind, variable: &str) -> Instruction {
    Instruction::new(kind, variable)
}

fn jump(kind: InstructionKind, variable: &str, role: ArgumentRole, label: &str) -> Instruction {
    Instruction::new(kind, variable).with_argument(role, label)
}

fn jnz(variable: &str, label: &str) -> Instruction {
    jump(InstructionKind::JumpNotZero, variable, ArgumentRole::JnzLabel, label)
}

fn jz(variable: &str, label: &str) -> Instruction {
    jump(InstructionKind::JumpZero, variable, ArgumentRole::JzLabel, label)
}

fn goto(label: &str) -> Instruction {
    jump(InstructionKind::GotoLabel, "", ArgumentRole::GotoLabel, label)
}

fn assign(variable: &str, source: &str) -> Instruction {
    Instruction::new(InstructionKind::Assignment, variable)
        .with_argument(ArgumentRole::AssignedVariable, source)
}

fn literal(text: &str) -> Result<usize, FaultKind> {
    names::parse_literal(text)
        .and_then(|value| usize::try_from(value).ok())
        .ok_or_else(|| FaultKind::InvalidLiteral(text.to_owned()))
}

impl Instruction {
    /// Lowers this instruction one level.
    ///
    /// Primitive and call instructions are returned unchanged (identity
    /// lowering). Synthetic instructions are replaced by their macro, whose
    /// first instruction carries this instruction's label.
    ///
    /// # Errors
    ///
    /// Returns a [`FaultKind`] when a required argument is missing or a
    /// constant argument is not a valid literal.
    pub fn expand(
        &self,
        context: &mut Context,
        site: LoweringSite,
    ) -> Result<Vec<Self>, FaultKind> {
        let v = self.target.as_str();
        let label = self.label.clone();
        let mut block = Block::new(self, context, site);

        match self.kind {
            InstructionKind::ZeroVariable => {
                let again = match &label {
                    Some(own) => own.clone(),
                    None => block.label_at(0),
                };
                block.push(op(InstructionKind::Decrease, v).with_label(Some(again.clone())));
                block.push(jnz(v, &again));
            }
            InstructionKind::GotoLabel => {
                let target = self.require(ArgumentRole::GotoLabel)?;
                let z = block.work_variable();
                block.push(op(InstructionKind::Increase, &z).with_label(label));
                block.push(jnz(&z, target));
            }
            InstructionKind::Assignment => {
                let source = self.require(ArgumentRole::AssignedVariable)?;
                if source == v {
                    block.push(op(InstructionKind::Neutral, v).with_label(label));
                    return Ok(block.finish());
                }
                let drain = block.label_at(3);
                let restore = block.label_at(6);
                let done = block.label_at(10);
                let z = block.work_variable();
                block.push(op(InstructionKind::ZeroVariable, v).with_label(label));
                block.push(jnz(source, &drain));
                block.push(goto(&done));
                block.push(op(InstructionKind::Decrease, source).with_label(Some(drain.clone())));
                block.push(op(InstructionKind::Increase, &z));
                block.push(jnz(source, &drain));
                block.push(op(InstructionKind::Decrease, &z).with_label(Some(restore.clone())));
                block.push(op(InstructionKind::Increase, v));
                block.push(op(InstructionKind::Increase, source));
                block.push(jnz(&z, &restore));
                block.push(op(InstructionKind::Neutral, v).with_label(Some(done)));
            }
            InstructionKind::ConstantAssignment => {
                let count = literal(self.require(ArgumentRole::ConstantValue)?)?;
                block.push(op(InstructionKind::ZeroVariable, v).with_label(label));
                for _ in 0..count {
                    block.push(op(InstructionKind::Increase, v));
                }
            }
            InstructionKind::JumpZero => {
                let target = self.require(ArgumentRole::JzLabel)?;
                let skip = block.label_at(2);
                block.push(jnz(v, &skip).with_label(label));
                block.push(goto(target));
                block.push(op(InstructionKind::Neutral, v).with_label(Some(skip)));
            }
            InstructionKind::JumpEqualConstant => {
                let count = literal(self.require(ArgumentRole::ConstantValue)?)?;
                let target = self.require(ArgumentRole::JeConstantLabel)?;
                let differ = block.label_at(3 + 2 * count);
                let z = block.work_variable();
                block.push(assign(&z, v).with_label(label));
                for _ in 0..count {
                    block.push(jz(&z, &differ));
                    block.push(op(InstructionKind::Decrease, &z));
                }
                block.push(jnz(&z, &differ));
                block.push(goto(target));
                block.push(op(InstructionKind::Neutral, v).with_label(Some(differ)));
            }
            InstructionKind::JumpEqualVariable => {
                let other = self.require(ArgumentRole::VariableName)?;
                let target = self.require(ArgumentRole::JeVariableLabel)?;
                let compare = block.label_at(2);
                let left_done = block.label_at(7);
                let differ = block.label_at(8);
                let left = block.work_variable();
                let right = block.work_variable();
                block.push(assign(&left, v).with_label(label));
                block.push(assign(&right, other));
                block.push(jz(&left, &left_done).with_label(Some(compare.clone())));
                block.push(jz(&right, &differ));
                block.push(op(InstructionKind::Decrease, &left));
                block.push(op(InstructionKind::Decrease, &right));
                block.push(goto(&compare));
                block.push(jz(&right, target).with_label(Some(left_done)));
                block.push(op(InstructionKind::Neutral, v).with_label(Some(differ)));
            }
            InstructionKind::Increase
            | InstructionKind::Decrease
            | InstructionKind::Neutral
            | InstructionKind::JumpNotZero
            | InstructionKind::Quote
            | InstructionKind::JumpEqualFunction => return Ok(vec![self.clone()]),
        }

        Ok(block.finish())
    }
}

static DEPTH_TABLE: OnceLock<[usize; InstructionKind::ALL.len()]> = OnceLock::new();

/// Number of lowering passes after which an instruction of `kind` is fully primitive.
///
/// Primitive and call kinds have depth 0. The table is computed once by
/// lowering a representative instance of each kind against a throwaway context.
#[must_use]
pub fn expansion_depth(kind: InstructionKind) -> usize {
    DEPTH_TABLE.get_or_init(|| InstructionKind::ALL.map(measure_depth))[kind.index()]
}

fn measure_depth(kind: InstructionKind) -> usize {
    if !kind.is_expandable() {
        return 0;
    }
    let sample = representative(kind);
    let mut scratch = Context::new();
    let site = LoweringSite {
        source_index: 0,
        base: 0,
    };
    let children = sample.expand(&mut scratch, site).unwrap_or_default();
    1 + children
        .iter()
        .map(|child| measure_depth(child.kind()))
        .max()
        .unwrap_or(0)
}

fn representative(kind: InstructionKind) -> Instruction {
    let mut sample = Instruction::new(kind, names::input_variable(1));
    for role in kind.required_arguments() {
        let value = match role.class() {
            ArgumentClass::Label => EXIT_LABEL.to_owned(),
            ArgumentClass::Variable => names::input_variable(2),
            ArgumentClass::Literal => "1".to_owned(),
            ArgumentClass::Function | ArgumentClass::CallArguments => String::new(),
        };
        sample = sample.with_argument(*role, value);
    }
    sample
}
