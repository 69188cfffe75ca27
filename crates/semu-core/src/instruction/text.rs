use std::fmt;

use super::{ArgumentRole, Instruction, InstructionKind};

fn arg(instruction: &Instruction, role: ArgumentRole) -> &str {
    instruction.argument(role).unwrap_or("?")
}

fn call_text(instruction: &Instruction) -> String {
    instruction.function_call().map_or_else(
        |_| {
            format!(
                "({},{})",
                arg(instruction, ArgumentRole::FunctionName),
                arg(instruction, ArgumentRole::FunctionArguments)
            )
        },
        |call| call.to_string(),
    )
}

impl Instruction {
    /// Human-readable operand text, e.g. `x1 <- x1 + 1` or `IF z1 != 0 GOTO L2`.
    #[must_use]
    pub fn text(&self) -> String {
        let v = self.target();
        match self.kind() {
            InstructionKind::Increase => format!("{v} <- {v} + 1"),
            InstructionKind::Decrease => format!("{v} <- {v} - 1"),
            InstructionKind::Neutral => format!("{v} <- {v}"),
            InstructionKind::JumpNotZero => {
                format!("IF {v} != 0 GOTO {}", arg(self, ArgumentRole::JnzLabel))
            }
            InstructionKind::ZeroVariable => format!("{v} <- 0"),
            InstructionKind::Assignment => {
                format!("{v} <- {}", arg(self, ArgumentRole::AssignedVariable))
            }
            InstructionKind::ConstantAssignment => {
                format!("{v} <- {}", arg(self, ArgumentRole::ConstantValue))
            }
            InstructionKind::GotoLabel => format!("GOTO {}", arg(self, ArgumentRole::GotoLabel)),
            InstructionKind::JumpZero => {
                format!("IF {v} = 0 GOTO {}", arg(self, ArgumentRole::JzLabel))
            }
            InstructionKind::JumpEqualConstant => format!(
                "IF {v} = {} GOTO {}",
                arg(self, ArgumentRole::ConstantValue),
                arg(self, ArgumentRole::JeConstantLabel)
            ),
            InstructionKind::JumpEqualVariable => format!(
                "IF {v} = {} GOTO {}",
                arg(self, ArgumentRole::VariableName),
                arg(self, ArgumentRole::JeVariableLabel)
            ),
            InstructionKind::Quote => format!("{v} <- {}", call_text(self)),
            InstructionKind::JumpEqualFunction => format!(
                "IF {v} = {} GOTO {}",
                call_text(self),
                arg(self, ArgumentRole::JeFunctionLabel)
            ),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_primitive() { 'B' } else { 'S' };
        write!(
            f,
            "({kind}) [{:<5}] {} ({})",
            self.label().unwrap_or(""),
            self.text(),
            self.cycles()
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::{ArgumentRole, Instruction, InstructionKind};

    #[rstest]
    #[case(Instruction::new(InstructionKind::Increase, "x1"), "x1 <- x1 + 1")]
    #[case(Instruction::new(InstructionKind::ZeroVariable, "y"), "y <- 0")]
    #[case(
        Instruction::new(InstructionKind::JumpNotZero, "z1")
            .with_argument(ArgumentRole::JnzLabel, "L2"),
        "IF z1 != 0 GOTO L2"
    )]
    #[case(
        Instruction::new(InstructionKind::JumpEqualConstant, "x1")
            .with_argument(ArgumentRole::ConstantValue, "4")
            .with_argument(ArgumentRole::JeConstantLabel, "EXIT"),
        "IF x1 = 4 GOTO EXIT"
    )]
    #[case(
        Instruction::new(InstructionKind::Quote, "y")
            .with_argument(ArgumentRole::FunctionName, "Plus")
            .with_argument(ArgumentRole::FunctionArguments, "x1, (Succ,x2)"),
        "y <- (Plus,x1,(Succ,x2))"
    )]
    #[case(
        Instruction::new(InstructionKind::GotoLabel, "")
            .with_argument(ArgumentRole::GotoLabel, "L1"),
        "GOTO L1"
    )]
    fn renders_operand_text(#[case] instruction: Instruction, #[case] expected: &str) {
        assert_eq!(instruction.text(), expected);
    }

    #[test]
    fn display_shows_type_label_and_cost() {
        let instruction = Instruction::new(InstructionKind::Assignment, "y")
            .with_argument(ArgumentRole::AssignedVariable, "x1")
            .with_label(Some("L1".into()));
        assert_eq!(instruction.to_string(), "(S) [L1   ] y <- x1 (4)");
    }
}
