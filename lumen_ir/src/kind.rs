//! The closed world of value kinds.
//!
//! Every value in the IR carries a [`ValueKind`] discriminant drawn from a
//! single `repr(u8)` enumeration. Abstract classes occupy contiguous ranges
//! delimited by `First*`/`Last*` markers, with the class's own kind sitting
//! right after its `First*` marker. Classification (`is_instruction`,
//! `is_terminator`, ...) is a pair of integer comparisons, and kind dispatch
//! is a single `match` with no reachable default for concrete kinds.
//!
//! The range layout is verified at build time by the `const` assertion block
//! at the bottom of this file; reordering a variant without updating the
//! markers fails the build.

/// Runtime discriminant identifying a value's concrete class.
///
/// Marker variants (`First*`/`Last*`) and abstract-class variants are never
/// carried by a live value; they only delimit dispatch ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ValueKind {
    GlobalObjectProperty,
    Parameter,
    Variable,

    FirstLiteral,
    Literal,
    LiteralNumber,
    LiteralString,
    LiteralBool,
    LastLiteral,

    FirstVariableScope,
    VariableScope,
    ExternalScope,
    LastVariableScope,

    BasicBlock,
    Function,

    FirstInstruction,
    Instruction,
    UnaryOperatorInst,
    BinaryOperatorInst,
    PhiInst,
    MovInst,
    LoadPropertyInst,
    StorePropertyInst,
    CallInst,
    CreateFunctionInst,

    FirstTerminatorInst,
    TerminatorInst,
    BranchInst,
    CondBranchInst,
    ReturnInst,
    LastTerminatorInst,

    LastInstruction,
}

impl ValueKind {
    #[inline]
    const fn in_range(self, first: ValueKind, last: ValueKind) -> bool {
        (first as u8) < (self as u8) && (self as u8) < (last as u8)
    }

    /// Check if this kind is a literal.
    #[inline]
    pub const fn is_literal(self) -> bool {
        self.in_range(ValueKind::FirstLiteral, ValueKind::LastLiteral)
    }

    /// Check if this kind is a variable scope (function or external).
    #[inline]
    pub const fn is_scope(self) -> bool {
        self.in_range(ValueKind::FirstVariableScope, ValueKind::LastVariableScope)
    }

    /// Check if this kind is an instruction.
    #[inline]
    pub const fn is_instruction(self) -> bool {
        self.in_range(ValueKind::FirstInstruction, ValueKind::LastInstruction)
    }

    /// Check if this kind is a terminator instruction.
    #[inline]
    pub const fn is_terminator(self) -> bool {
        self.in_range(ValueKind::FirstTerminatorInst, ValueKind::LastTerminatorInst)
    }

    /// Check if this kind names a concrete class, i.e. one a live value may
    /// carry as its discriminant.
    pub const fn is_concrete(self) -> bool {
        !matches!(
            self,
            ValueKind::FirstLiteral
                | ValueKind::Literal
                | ValueKind::LastLiteral
                | ValueKind::FirstVariableScope
                | ValueKind::LastVariableScope
                | ValueKind::FirstInstruction
                | ValueKind::Instruction
                | ValueKind::FirstTerminatorInst
                | ValueKind::TerminatorInst
                | ValueKind::LastTerminatorInst
                | ValueKind::LastInstruction
        )
    }

    /// The printable class name of a concrete kind.
    ///
    /// # Panics
    ///
    /// Panics on marker and abstract discriminants.
    pub const fn kind_str(self) -> &'static str {
        match self {
            ValueKind::GlobalObjectProperty => "GlobalObjectProperty",
            ValueKind::Parameter => "Parameter",
            ValueKind::Variable => "Variable",
            ValueKind::LiteralNumber => "LiteralNumber",
            ValueKind::LiteralString => "LiteralString",
            ValueKind::LiteralBool => "LiteralBool",
            ValueKind::VariableScope => "VariableScope",
            ValueKind::ExternalScope => "ExternalScope",
            ValueKind::BasicBlock => "BasicBlock",
            ValueKind::Function => "Function",
            ValueKind::UnaryOperatorInst => "UnaryOperatorInst",
            ValueKind::BinaryOperatorInst => "BinaryOperatorInst",
            ValueKind::PhiInst => "PhiInst",
            ValueKind::MovInst => "MovInst",
            ValueKind::LoadPropertyInst => "LoadPropertyInst",
            ValueKind::StorePropertyInst => "StorePropertyInst",
            ValueKind::CallInst => "CallInst",
            ValueKind::CreateFunctionInst => "CreateFunctionInst",
            ValueKind::BranchInst => "BranchInst",
            ValueKind::CondBranchInst => "CondBranchInst",
            ValueKind::ReturnInst => "ReturnInst",
            _ => panic!("Invalid kind"),
        }
    }
}

// Each abstract class must occupy a contiguous range whose first slot is the
// class itself. A variant shuffle that breaks the tree fails compilation
// here rather than mis-dispatching at runtime.
const _: () = {
    assert!(ValueKind::FirstLiteral as u8 + 1 == ValueKind::Literal as u8);
    assert!((ValueKind::Literal as u8) < ValueKind::LiteralNumber as u8);
    assert!((ValueKind::LiteralBool as u8) < ValueKind::LastLiteral as u8);

    assert!(ValueKind::FirstVariableScope as u8 + 1 == ValueKind::VariableScope as u8);
    assert!((ValueKind::ExternalScope as u8) < ValueKind::LastVariableScope as u8);

    assert!(ValueKind::FirstInstruction as u8 + 1 == ValueKind::Instruction as u8);
    assert!((ValueKind::Instruction as u8) < ValueKind::UnaryOperatorInst as u8);
    assert!((ValueKind::LastTerminatorInst as u8) < ValueKind::LastInstruction as u8);

    // The terminator range nests inside the instruction range.
    assert!(ValueKind::FirstTerminatorInst as u8 + 1 == ValueKind::TerminatorInst as u8);
    assert!((ValueKind::FirstInstruction as u8) < ValueKind::FirstTerminatorInst as u8);
    assert!((ValueKind::ReturnInst as u8) < ValueKind::LastTerminatorInst as u8);
};
