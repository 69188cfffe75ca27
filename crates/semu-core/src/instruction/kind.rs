use std::fmt;

/// Every operation of the instruction set.
///
/// The first four are primitives; the rest are synthetic and defined by a
/// lowering into other instructions (or, for the two call forms, by running
/// another program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InstructionKind {
    /// `V <- V + 1`
    Increase,
    /// `V <- V - 1`, saturating at 0.
    Decrease,
    /// `V <- V`
    Neutral,
    /// `IF V != 0 GOTO L`
    JumpNotZero,
    /// `V <- 0`
    ZeroVariable,
    /// `V <- V'`
    Assignment,
    /// `V <- K`
    ConstantAssignment,
    /// `GOTO L`
    GotoLabel,
    /// `IF V = 0 GOTO L`
    JumpZero,
    /// `IF V = K GOTO L`
    JumpEqualConstant,
    /// `IF V = V' GOTO L`
    JumpEqualVariable,
    /// `V <- (F, args...)`
    Quote,
    /// `IF V = (F, args...) GOTO L`
    JumpEqualFunction,
}

impl InstructionKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Increase,
        Self::Decrease,
        Self::Neutral,
        Self::JumpNotZero,
        Self::ZeroVariable,
        Self::Assignment,
        Self::ConstantAssignment,
        Self::GotoLabel,
        Self::JumpZero,
        Self::JumpEqualConstant,
        Self::JumpEqualVariable,
        Self::Quote,
        Self::JumpEqualFunction,
    ];

    /// Returns `true` for the four irreducible operations.
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Increase | Self::Decrease | Self::Neutral | Self::JumpNotZero
        )
    }

    /// Returns `true` for the kinds that run another program.
    #[must_use]
    pub const fn is_call(self) -> bool {
        matches!(self, Self::Quote | Self::JumpEqualFunction)
    }

    /// Returns `true` when the kind has a macro lowering.
    #[must_use]
    pub const fn is_expandable(self) -> bool {
        !self.is_primitive() && !self.is_call()
    }

    /// Returns `true` when the kind does not need a target variable.
    #[must_use]
    pub const fn is_pure_control(self) -> bool {
        matches!(self, Self::GotoLabel)
    }

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Loader-facing instruction name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Increase => "INCREASE",
            Self::Decrease => "DECREASE",
            Self::Neutral => "NEUTRAL",
            Self::JumpNotZero => "JUMP_NOT_ZERO",
            Self::ZeroVariable => "ZERO_VARIABLE",
            Self::Assignment => "ASSIGNMENT",
            Self::ConstantAssignment => "CONSTANT_ASSIGNMENT",
            Self::GotoLabel => "GOTO_LABEL",
            Self::JumpZero => "JUMP_ZERO",
            Self::JumpEqualConstant => "JUMP_EQUAL_CONSTANT",
            Self::JumpEqualVariable => "JUMP_EQUAL_VARIABLE",
            Self::Quote => "QUOTE",
            Self::JumpEqualFunction => "JUMP_EQUAL_FUNCTION",
        }
    }

    /// Resolves a loader-facing instruction name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Arguments the kind requires, in display order.
    #[must_use]
    pub const fn required_arguments(self) -> &'static [ArgumentRole] {
        match self {
            Self::Increase | Self::Decrease | Self::Neutral | Self::ZeroVariable => &[],
            Self::JumpNotZero => &[ArgumentRole::JnzLabel],
            Self::Assignment => &[ArgumentRole::AssignedVariable],
            Self::ConstantAssignment => &[ArgumentRole::ConstantValue],
            Self::GotoLabel => &[ArgumentRole::GotoLabel],
            Self::JumpZero => &[ArgumentRole::JzLabel],
            Self::JumpEqualConstant => &[ArgumentRole::ConstantValue, ArgumentRole::JeConstantLabel],
            Self::JumpEqualVariable => &[ArgumentRole::VariableName, ArgumentRole::JeVariableLabel],
            Self::Quote => &[ArgumentRole::FunctionName, ArgumentRole::FunctionArguments],
            Self::JumpEqualFunction => &[
                ArgumentRole::FunctionName,
                ArgumentRole::FunctionArguments,
                ArgumentRole::JeFunctionLabel,
            ],
        }
    }

    /// The argument holding this kind's jump target, if it jumps.
    #[must_use]
    pub const fn jump_role(self) -> Option<ArgumentRole> {
        match self {
            Self::JumpNotZero => Some(ArgumentRole::JnzLabel),
            Self::GotoLabel => Some(ArgumentRole::GotoLabel),
            Self::JumpZero => Some(ArgumentRole::JzLabel),
            Self::JumpEqualConstant => Some(ArgumentRole::JeConstantLabel),
            Self::JumpEqualVariable => Some(ArgumentRole::JeVariableLabel),
            Self::JumpEqualFunction => Some(ArgumentRole::JeFunctionLabel),
            Self::Increase
            | Self::Decrease
            | Self::Neutral
            | Self::ZeroVariable
            | Self::Assignment
            | Self::ConstantAssignment
            | Self::Quote => None,
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an argument value denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentClass {
    /// A label name (or `EXIT`).
    Label,
    /// A variable name.
    Variable,
    /// A non-negative integer literal.
    Literal,
    /// A function name.
    Function,
    /// A comma-separated call argument list.
    CallArguments,
}

/// Named roles an instruction argument can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum ArgumentRole {
    JnzLabel,
    AssignedVariable,
    ConstantValue,
    GotoLabel,
    JzLabel,
    JeConstantLabel,
    JeVariableLabel,
    VariableName,
    FunctionName,
    FunctionArguments,
    JeFunctionLabel,
}

impl ArgumentRole {
    /// All roles.
    pub const ALL: [Self; 11] = [
        Self::JnzLabel,
        Self::AssignedVariable,
        Self::ConstantValue,
        Self::GotoLabel,
        Self::JzLabel,
        Self::JeConstantLabel,
        Self::JeVariableLabel,
        Self::VariableName,
        Self::FunctionName,
        Self::FunctionArguments,
        Self::JeFunctionLabel,
    ];

    /// Loader-facing argument name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::JnzLabel => "JNZLabel",
            Self::AssignedVariable => "assignedVariable",
            Self::ConstantValue => "constantValue",
            Self::GotoLabel => "gotoLabel",
            Self::JzLabel => "JZLabel",
            Self::JeConstantLabel => "JEConstantLabel",
            Self::JeVariableLabel => "JEVariableLabel",
            Self::VariableName => "variableName",
            Self::FunctionName => "functionName",
            Self::FunctionArguments => "functionArguments",
            Self::JeFunctionLabel => "JEFunctionLabel",
        }
    }

    /// Resolves a loader-facing argument name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(name.trim()))
    }

    /// What the argument value denotes.
    #[must_use]
    pub const fn class(self) -> ArgumentClass {
        match self {
            Self::JnzLabel
            | Self::GotoLabel
            | Self::JzLabel
            | Self::JeConstantLabel
            | Self::JeVariableLabel
            | Self::JeFunctionLabel => ArgumentClass::Label,
            Self::AssignedVariable | Self::VariableName => ArgumentClass::Variable,
            Self::ConstantValue => ArgumentClass::Literal,
            Self::FunctionName => ArgumentClass::Function,
            Self::FunctionArguments => ArgumentClass::CallArguments,
        }
    }
}

impl fmt::Display for ArgumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ArgumentClass, ArgumentRole, InstructionKind};

    #[test]
    fn exactly_four_primitives() {
        let primitives: Vec<_> = InstructionKind::ALL
            .into_iter()
            .filter(|kind| kind.is_primitive())
            .collect();
        assert_eq!(
            primitives,
            vec![
                InstructionKind::Increase,
                InstructionKind::Decrease,
                InstructionKind::Neutral,
                InstructionKind::JumpNotZero,
            ]
        );
    }

    #[test]
    fn index_matches_position_in_all() {
        for (position, kind) in InstructionKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }

    #[rstest]
    #[case("INCREASE", InstructionKind::Increase)]
    #[case("jump_equal_function", InstructionKind::JumpEqualFunction)]
    #[case(" Quote ", InstructionKind::Quote)]
    fn names_resolve_case_insensitively(#[case] name: &str, #[case] expected: InstructionKind) {
        assert_eq!(InstructionKind::from_name(name), Some(expected));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(InstructionKind::from_name("MULTIPLY"), None);
        assert_eq!(ArgumentRole::from_name("jumpLabel"), None);
    }

    #[test]
    fn every_jump_role_is_a_required_label_argument() {
        for kind in InstructionKind::ALL {
            if let Some(role) = kind.jump_role() {
                assert!(kind.required_arguments().contains(&role));
                assert_eq!(role.class(), ArgumentClass::Label);
            }
        }
    }

    #[test]
    fn argument_names_round_trip() {
        for role in ArgumentRole::ALL {
            assert_eq!(ArgumentRole::from_name(role.name()), Some(role));
        }
    }
}
