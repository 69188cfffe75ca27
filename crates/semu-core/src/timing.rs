use crate::InstructionKind;

/// Single source-of-truth cycle-cost table.
///
/// For the two call kinds the entry is the fixed call overhead; the callee's
/// own cycles are added when the call actually runs.
pub const CYCLE_COST_TABLE: &[(InstructionKind, u64)] = &[
    (InstructionKind::Increase, 1),
    (InstructionKind::Decrease, 1),
    (InstructionKind::Neutral, 0),
    (InstructionKind::JumpNotZero, 2),
    (InstructionKind::ZeroVariable, 1),
    (InstructionKind::Assignment, 4),
    (InstructionKind::ConstantAssignment, 2),
    (InstructionKind::GotoLabel, 1),
    (InstructionKind::JumpZero, 2),
    (InstructionKind::JumpEqualConstant, 2),
    (InstructionKind::JumpEqualVariable, 2),
    (InstructionKind::Quote, 5),
    (InstructionKind::JumpEqualFunction, 6),
];

/// Looks up the fixed cycle cost for an instruction kind.
#[must_use]
pub fn cycle_cost(kind: InstructionKind) -> u64 {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
        .unwrap_or(0)
}
