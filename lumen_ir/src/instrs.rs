//! The instruction catalog.
//!
//! For each concrete instruction kind this module supplies the textual name,
//! the side-effect summary, the bitset of operands the instruction may write
//! through, and the per-operand legality predicate. Dispatch is a single
//! `match` over the closed kind enumeration; an abstract or marker
//! discriminant reaching one of these tables is a fatal "Invalid kind".

use crate::kind::ValueKind;
use crate::module::Module;
use crate::types::Type;
use crate::value::ValueId;

/// Summary of an instruction's observable effects, in increasing order of
/// pessimism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SideEffectKind {
    /// No observable interaction with the heap or the environment.
    None,
    /// May read mutable state.
    MayRead,
    /// May write mutable state.
    MayWrite,
    /// May do anything, including throwing and re-entering user code.
    Unknown,
}

/// A one-word bitset of operand indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperandBitSet(u64);

impl OperandBitSet {
    pub const EMPTY: OperandBitSet = OperandBitSet(0);

    #[inline]
    pub const fn with(self, index: usize) -> OperandBitSet {
        OperandBitSet(self.0 | 1 << index)
    }

    #[inline]
    pub const fn contains(self, index: usize) -> bool {
        index < 64 && self.0 & (1 << index) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// JavaScript unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Void,
    TypeOf,
    Minus,
    Tilde,
    Not,
}

impl UnaryOp {
    /// The operator's source spelling.
    pub const fn op_str(self) -> &'static str {
        match self {
            UnaryOp::Void => "void",
            UnaryOp::TypeOf => "typeof",
            UnaryOp::Minus => "-",
            UnaryOp::Tilde => "~",
            UnaryOp::Not => "!",
        }
    }

    /// The type the operator always produces.
    pub const fn result_type(self) -> Type {
        match self {
            UnaryOp::Void => Type::undefined_type(),
            UnaryOp::TypeOf => Type::string_type(),
            UnaryOp::Minus | UnaryOp::Tilde => Type::number_type(),
            UnaryOp::Not => Type::boolean_type(),
        }
    }
}

/// JavaScript binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitOr,
    BitXor,
    BitAnd,
    In,
    InstanceOf,
}

impl BinaryOp {
    /// The operator's source spelling.
    pub const fn op_str(self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::StrictEqual => "===",
            BinaryOp::StrictNotEqual => "!==",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::UnsignedRightShift => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
        }
    }

    /// Check if the operator is a comparison producing a boolean.
    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::StrictEqual
                | BinaryOp::StrictNotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
                | BinaryOp::In
                | BinaryOp::InstanceOf
        )
    }

    /// The type the operator always produces.
    pub const fn result_type(self) -> Type {
        if self.is_comparison() {
            return Type::boolean_type();
        }
        match self {
            // `+` concatenates when either side is a string.
            BinaryOp::Add => Type::union_ty(Type::number_type(), Type::string_type()),
            _ => Type::number_type(),
        }
    }
}

/// Per-opcode immediates carried by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstDetail {
    None,
    Unary(UnaryOp),
    Binary(BinaryOp),
}

/// Check if `kind` can appear as an ordinary data operand: a computed value,
/// a literal, a parameter, a variable, or a global property. Blocks,
/// functions and scopes are accepted only by the slots that name them.
const fn is_value_operand(kind: ValueKind) -> bool {
    kind.is_instruction()
        || kind.is_literal()
        || matches!(
            kind,
            ValueKind::Parameter | ValueKind::Variable | ValueKind::GlobalObjectProperty
        )
}

impl Module {
    /// The instruction's symbolic name.
    #[inline]
    pub fn inst_name(&self, inst: ValueId) -> &'static str {
        debug_assert!(self.kind(inst).is_instruction(), "Invalid kind");
        self.kind_str(inst)
    }

    /// The unary operator carried by a `UnaryOperatorInst`.
    pub fn unary_op(&self, inst: ValueId) -> UnaryOp {
        match self.inst(inst).detail {
            InstDetail::Unary(op) => op,
            _ => panic!("Invalid kind: not a unary operator"),
        }
    }

    /// The binary operator carried by a `BinaryOperatorInst`.
    pub fn binary_op(&self, inst: ValueId) -> BinaryOp {
        match self.inst(inst).detail {
            InstDetail::Binary(op) => op,
            _ => panic!("Invalid kind: not a binary operator"),
        }
    }

    /// The derived side-effect summary of an instruction.
    pub fn side_effect(&self, inst: ValueId) -> SideEffectKind {
        match self.kind(inst) {
            ValueKind::UnaryOperatorInst => match self.unary_op(inst) {
                // These never observe or invoke user code.
                UnaryOp::Void | UnaryOp::TypeOf | UnaryOp::Not => SideEffectKind::None,
                // Numeric coercion can call valueOf.
                UnaryOp::Minus | UnaryOp::Tilde => SideEffectKind::Unknown,
            },
            ValueKind::BinaryOperatorInst => match self.binary_op(inst) {
                BinaryOp::StrictEqual | BinaryOp::StrictNotEqual => SideEffectKind::None,
                _ => SideEffectKind::Unknown,
            },
            ValueKind::PhiInst | ValueKind::MovInst | ValueKind::CreateFunctionInst => {
                SideEffectKind::None
            }
            ValueKind::LoadPropertyInst => SideEffectKind::MayRead,
            ValueKind::StorePropertyInst => SideEffectKind::MayWrite,
            ValueKind::CallInst => SideEffectKind::Unknown,
            ValueKind::BranchInst | ValueKind::CondBranchInst | ValueKind::ReturnInst => {
                SideEffectKind::None
            }
            _ => unreachable!("Invalid kind"),
        }
    }

    /// The set of operand indices the instruction may write through.
    pub fn changed_operands(&self, inst: ValueId) -> OperandBitSet {
        match self.kind(inst) {
            // The store mutates the object held in slot 1.
            ValueKind::StorePropertyInst => OperandBitSet::EMPTY.with(1),
            ValueKind::UnaryOperatorInst
            | ValueKind::BinaryOperatorInst
            | ValueKind::PhiInst
            | ValueKind::MovInst
            | ValueKind::LoadPropertyInst
            | ValueKind::CallInst
            | ValueKind::CreateFunctionInst
            | ValueKind::BranchInst
            | ValueKind::CondBranchInst
            | ValueKind::ReturnInst => OperandBitSet::EMPTY,
            _ => unreachable!("Invalid kind"),
        }
    }

    /// The opcode-specific legality predicate: can a value of `kind` occupy
    /// operand slot `index` of `inst`?
    pub fn can_set_operand(&self, inst: ValueId, kind: ValueKind, index: usize) -> bool {
        match self.kind(inst) {
            ValueKind::UnaryOperatorInst | ValueKind::MovInst | ValueKind::ReturnInst => {
                index == 0 && is_value_operand(kind)
            }
            ValueKind::BinaryOperatorInst | ValueKind::LoadPropertyInst => {
                index < 2 && is_value_operand(kind)
            }
            ValueKind::StorePropertyInst => index < 3 && is_value_operand(kind),
            ValueKind::CallInst => is_value_operand(kind),
            ValueKind::PhiInst => {
                // Incoming (value, predecessor) pairs.
                if index % 2 == 0 {
                    is_value_operand(kind)
                } else {
                    matches!(kind, ValueKind::BasicBlock)
                }
            }
            ValueKind::CreateFunctionInst => index == 0 && matches!(kind, ValueKind::Function),
            ValueKind::BranchInst => index == 0 && matches!(kind, ValueKind::BasicBlock),
            ValueKind::CondBranchInst => match index {
                0 => is_value_operand(kind),
                1 | 2 => matches!(kind, ValueKind::BasicBlock),
                _ => false,
            },
            _ => unreachable!("Invalid kind"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::test_module;
    use crate::*;

    #[test]
    fn test_operand_bitset() {
        let set = OperandBitSet::EMPTY.with(1).with(3);
        assert!(set.contains(1));
        assert!(set.contains(3));
        assert!(!set.contains(0));
        assert!(!set.is_empty());
        assert!(OperandBitSet::EMPTY.is_empty());
    }

    #[test]
    fn test_side_effect_summaries() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let x = m.get_literal_number(1.0);
        let y = m.get_literal_number(2.0);

        let eq = m.create_binary_operator(BinaryOp::StrictEqual, x, y);
        let add = m.create_binary_operator(BinaryOp::Add, x, y);
        let load = m.create_load_property(x, y);
        let store = m.create_store_property(x, y, y);
        let call = m.create_call(x, y, &[]);
        for i in [eq, add, load, store, call] {
            m.block_push_back(bb, i);
        }

        assert_eq!(m.side_effect(eq), SideEffectKind::None);
        assert_eq!(m.side_effect(add), SideEffectKind::Unknown);
        assert_eq!(m.side_effect(load), SideEffectKind::MayRead);
        assert_eq!(m.side_effect(store), SideEffectKind::MayWrite);
        assert_eq!(m.side_effect(call), SideEffectKind::Unknown);
    }

    #[test]
    fn test_changed_operands() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let x = m.get_literal_number(1.0);
        let y = m.get_literal_number(2.0);
        let store = m.create_store_property(x, y, y);
        let add = m.create_binary_operator(BinaryOp::Add, x, y);
        m.block_push_back(bb, store);
        m.block_push_back(bb, add);

        assert!(m.changed_operands(store).contains(1));
        assert!(!m.changed_operands(store).contains(0));
        assert!(m.changed_operands(add).is_empty());
    }

    #[test]
    fn test_operand_legality() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);
        let x = m.get_literal_number(1.0);

        let br = m.create_branch(bb);
        m.block_push_back(bb, br);
        assert!(m.can_set_operand(br, ValueKind::BasicBlock, 0));
        assert!(!m.can_set_operand(br, ValueKind::LiteralNumber, 0));

        let cf = m.create_create_function(f);
        m.block_push_back(bb, cf);
        assert!(m.can_set_operand(cf, ValueKind::Function, 0));
        assert!(!m.can_set_operand(cf, ValueKind::BasicBlock, 0));

        let mov = m.create_mov(x);
        m.block_push_back(bb, mov);
        assert!(m.can_set_operand(mov, ValueKind::LiteralNumber, 0));
        assert!(!m.can_set_operand(mov, ValueKind::LiteralNumber, 1));

        let phi = m.create_phi();
        m.block_push_back(bb, phi);
        assert!(m.can_set_operand(phi, ValueKind::MovInst, 0));
        assert!(m.can_set_operand(phi, ValueKind::BasicBlock, 1));
        assert!(!m.can_set_operand(phi, ValueKind::BasicBlock, 2));
    }

    #[test]
    fn test_operator_spellings_and_types() {
        assert_eq!(BinaryOp::StrictEqual.op_str(), "===");
        assert_eq!(UnaryOp::TypeOf.op_str(), "typeof");
        assert!(BinaryOp::Less.result_type().is_boolean_type());
        assert!(BinaryOp::Subtract.result_type().is_number_type());
        assert!(BinaryOp::Add.result_type().can_be_string());
        assert!(UnaryOp::TypeOf.result_type().is_string_type());
    }
}
