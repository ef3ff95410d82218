//! Instructions and the operand vector.
//!
//! An instruction owns an ordered vector of operand slots. A slot is either
//! empty or a [`Use`] naming both the produced value and the position of
//! this instruction inside the producer's user list. Every slot mutation
//! goes through [`Module::set_operand`], which is the single place where
//! use-def edges are registered and unregistered.

use smallvec::SmallVec;

use crate::instrs::{BinaryOp, InstDetail, UnaryOp};
use crate::kind::ValueKind;
use crate::module::Module;
use crate::types::Type;
use crate::value::{Use, ValueId};

/// Opaque half-open source range, provenance for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRange {
    pub start: u32,
    pub end: u32,
}

/// Payload common to all instruction kinds.
pub struct InstructionData {
    /// Owning basic block; the null sentinel while detached.
    pub(crate) parent: ValueId,
    pub(crate) operands: SmallVec<[Option<Use>; 2]>,
    pub(crate) location: SourceRange,
    pub(crate) statement_index: u32,
    pub(crate) detail: InstDetail,
}

impl Module {
    pub(crate) fn alloc_inst(&mut self, kind: ValueKind, detail: InstDetail, ty: Type) -> ValueId {
        debug_assert!(kind.is_instruction(), "Invalid kind");
        self.alloc_value(
            kind,
            ty,
            crate::value::Payload::Inst(InstructionData {
                parent: ValueId::INVALID,
                operands: SmallVec::new(),
                location: SourceRange::default(),
                statement_index: 0,
                detail,
            }),
        )
    }

    // =========================================================================
    // Operand access
    // =========================================================================

    /// The value produced into operand slot `index`, if the slot is set.
    #[inline]
    pub fn operand(&self, inst: ValueId, index: usize) -> Option<ValueId> {
        self.inst(inst).operands[index].map(|u| u.producer)
    }

    /// The number of operand slots.
    #[inline]
    pub fn num_operands(&self, inst: ValueId) -> usize {
        self.inst(inst).operands.len()
    }

    /// The block currently containing `inst`, or the null sentinel while the
    /// instruction is detached.
    #[inline]
    pub fn inst_parent(&self, inst: ValueId) -> ValueId {
        self.inst(inst).parent
    }

    #[inline]
    pub fn inst_location(&self, inst: ValueId) -> SourceRange {
        self.inst(inst).location
    }

    #[inline]
    pub fn set_inst_location(&mut self, inst: ValueId, location: SourceRange) {
        self.inst_mut(inst).location = location;
    }

    #[inline]
    pub fn statement_index(&self, inst: ValueId) -> u32 {
        self.inst(inst).statement_index
    }

    #[inline]
    pub fn set_statement_index(&mut self, inst: ValueId, index: u32) {
        self.inst_mut(inst).statement_index = index;
    }

    // =========================================================================
    // Operand mutation
    // =========================================================================

    /// Append a new operand slot holding `val`.
    pub fn push_operand(&mut self, inst: ValueId, val: Option<ValueId>) {
        self.inst_mut(inst).operands.push(None);
        let last = self.num_operands(inst) - 1;
        self.set_operand(inst, val, last);
    }

    /// Store `val` into operand slot `index`, maintaining both sides of the
    /// use-def registry.
    ///
    /// No-op when the slot already holds `val`. The old edge (if any) is
    /// unregistered first; a non-null `val` must satisfy the opcode's
    /// operand legality predicate.
    pub fn set_operand(&mut self, inst: ValueId, val: Option<ValueId>, index: usize) {
        let current = self.inst(inst).operands[index];
        if current.map(|u| u.producer) == val {
            return;
        }

        if let Some(old) = current {
            debug_assert_eq!(
                self.values[old.producer].users.get(old.index as usize),
                Some(&inst),
                "corrupt use-list"
            );
            self.remove_use(old);
        }

        match val {
            Some(v) => {
                let kind = self.values[v].kind;
                assert!(
                    self.can_set_operand(inst, kind, index),
                    "unsupported operand kind"
                );
                let edge = self.add_user(v, inst);
                self.inst_mut(inst).operands[index] = Some(edge);
            }
            None => self.inst_mut(inst).operands[index] = None,
        }
    }

    /// Clear operand slot `index` and splice it out of the vector.
    pub fn remove_operand(&mut self, inst: ValueId, index: usize) {
        // Clearing first unregisters the edge from the producer.
        self.set_operand(inst, None, index);
        self.inst_mut(inst).operands.remove(index);
    }

    /// Rewrite the lowest operand slot holding `old` to hold `new`.
    ///
    /// # Panics
    ///
    /// Panics if no slot references `old`; that would mean the use-def
    /// registry is corrupt.
    pub fn replace_first_operand_with(&mut self, inst: ValueId, old: ValueId, new: Option<ValueId>) {
        for i in 0..self.num_operands(inst) {
            if self.operand(inst, i) == Some(old) {
                self.set_operand(inst, new, i);
                return;
            }
        }
        unreachable!("can't find operand, invalid use-def chain");
    }

    /// Null out every slot referencing `v` and compact the operand vector.
    pub fn erase_operand(&mut self, inst: ValueId, v: ValueId) {
        for i in 0..self.num_operands(inst) {
            if self.operand(inst, i) == Some(v) {
                self.set_operand(inst, None, i);
            }
        }
        self.inst_mut(inst).operands.retain(|slot| slot.is_some());
        debug_assert!(!self.has_user(v, inst), "corrupt use-list");
    }

    // =========================================================================
    // Structural moves
    // =========================================================================

    fn inst_position(&self, bb: ValueId, inst: ValueId) -> usize {
        self.block(bb)
            .insts
            .iter()
            .position(|&i| i == inst)
            .expect("instruction is not in its parent block")
    }

    /// Attach `inst` immediately before `pos` in `pos`'s block.
    pub fn insert_inst_before(&mut self, inst: ValueId, pos: ValueId) {
        let bb = self.inst(pos).parent;
        let at = self.inst_position(bb, pos);
        self.block_mut(bb).insts.insert(at, inst);
        self.inst_mut(inst).parent = bb;
    }

    /// Attach `inst` immediately after `pos` in `pos`'s block.
    pub fn insert_inst_after(&mut self, inst: ValueId, pos: ValueId) {
        let bb = self.inst(pos).parent;
        let at = self.inst_position(bb, pos);
        self.block_mut(bb).insts.insert(at + 1, inst);
        self.inst_mut(inst).parent = bb;
    }

    /// Unlink `inst` from its current block and reinsert it before `later`,
    /// possibly in a different block. Use-lists are untouched.
    pub fn move_inst_before(&mut self, inst: ValueId, later: ValueId) {
        if inst == later {
            return;
        }
        let cur = self.inst(inst).parent;
        let at = self.inst_position(cur, inst);
        self.block_mut(cur).insts.remove(at);

        let bb = self.inst(later).parent;
        let at = self.inst_position(bb, later);
        self.block_mut(bb).insts.insert(at, inst);
        self.inst_mut(inst).parent = bb;
    }

    /// Unlink `inst` from its block without destroying it or touching its
    /// operands.
    pub fn remove_inst_from_parent(&mut self, inst: ValueId) {
        let bb = self.inst(inst).parent;
        self.block_remove(bb, inst);
    }

    /// Release all of `inst`'s outgoing uses, unlink it, and destroy it.
    pub fn erase_inst_from_parent(&mut self, inst: ValueId) {
        for i in 0..self.num_operands(inst) {
            self.set_operand(inst, None, i);
        }
        let bb = self.inst(inst).parent;
        self.block_erase(bb, inst);
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Build a detached copy of `src` carrying the same kind, type, location
    /// and statement index, with a caller-supplied operand list of matching
    /// arity.
    pub fn clone_inst_with_operands(
        &mut self,
        src: ValueId,
        operands: &[Option<ValueId>],
    ) -> ValueId {
        assert_eq!(
            self.num_operands(src),
            operands.len(),
            "invalid number of operands"
        );
        let kind = self.values[src].kind;
        let ty = self.values[src].ty;
        let (location, statement_index, detail) = {
            let d = self.inst(src);
            (d.location, d.statement_index, d.detail)
        };

        let new = self.alloc_inst(kind, detail, ty);
        self.inst_mut(new).location = location;
        self.inst_mut(new).statement_index = statement_index;
        for &v in operands {
            self.push_operand(new, v);
        }
        new
    }

    /// Create a detached unary operator instruction.
    pub fn create_unary_operator(&mut self, op: UnaryOp, operand: ValueId) -> ValueId {
        let inst = self.alloc_inst(
            ValueKind::UnaryOperatorInst,
            InstDetail::Unary(op),
            op.result_type(),
        );
        self.push_operand(inst, Some(operand));
        inst
    }

    /// Create a detached binary operator instruction.
    pub fn create_binary_operator(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let inst = self.alloc_inst(
            ValueKind::BinaryOperatorInst,
            InstDetail::Binary(op),
            op.result_type(),
        );
        self.push_operand(inst, Some(lhs));
        self.push_operand(inst, Some(rhs));
        inst
    }

    /// Create a detached phi with no entries; add incoming `(value, block)`
    /// pairs with [`add_phi_entry`](Module::add_phi_entry).
    pub fn create_phi(&mut self) -> ValueId {
        self.alloc_inst(ValueKind::PhiInst, InstDetail::None, Type::any_type())
    }

    /// Append one incoming `(value, predecessor)` pair to a phi.
    pub fn add_phi_entry(&mut self, phi: ValueId, value: Option<ValueId>, block: ValueId) {
        self.push_operand(phi, value);
        self.push_operand(phi, Some(block));
    }

    /// Create a detached copy pseudo-instruction.
    pub fn create_mov(&mut self, src: ValueId) -> ValueId {
        let ty = self.values[src].ty;
        let inst = self.alloc_inst(ValueKind::MovInst, InstDetail::None, ty);
        self.push_operand(inst, Some(src));
        inst
    }

    /// Create a detached property load: `object[property]`.
    pub fn create_load_property(&mut self, object: ValueId, property: ValueId) -> ValueId {
        let inst = self.alloc_inst(
            ValueKind::LoadPropertyInst,
            InstDetail::None,
            Type::any_type(),
        );
        self.push_operand(inst, Some(object));
        self.push_operand(inst, Some(property));
        inst
    }

    /// Create a detached property store: `object[property] = value`.
    pub fn create_store_property(
        &mut self,
        value: ValueId,
        object: ValueId,
        property: ValueId,
    ) -> ValueId {
        let inst = self.alloc_inst(
            ValueKind::StorePropertyInst,
            InstDetail::None,
            Type::no_type(),
        );
        self.push_operand(inst, Some(value));
        self.push_operand(inst, Some(object));
        self.push_operand(inst, Some(property));
        inst
    }

    /// Create a detached call: `callee.call(this_val, args...)`.
    pub fn create_call(&mut self, callee: ValueId, this_val: ValueId, args: &[ValueId]) -> ValueId {
        let inst = self.alloc_inst(ValueKind::CallInst, InstDetail::None, Type::any_type());
        self.push_operand(inst, Some(callee));
        self.push_operand(inst, Some(this_val));
        for &a in args {
            self.push_operand(inst, Some(a));
        }
        inst
    }

    /// Create a detached closure-materialization of `function`.
    pub fn create_create_function(&mut self, function: ValueId) -> ValueId {
        let inst = self.alloc_inst(
            ValueKind::CreateFunctionInst,
            InstDetail::None,
            Type::closure_type(),
        );
        self.push_operand(inst, Some(function));
        inst
    }

    /// Create a detached unconditional branch to `dest`.
    pub fn create_branch(&mut self, dest: ValueId) -> ValueId {
        let inst = self.alloc_inst(ValueKind::BranchInst, InstDetail::None, Type::no_type());
        self.push_operand(inst, Some(dest));
        inst
    }

    /// Create a detached conditional branch.
    pub fn create_cond_branch(
        &mut self,
        condition: ValueId,
        true_block: ValueId,
        false_block: ValueId,
    ) -> ValueId {
        let inst = self.alloc_inst(ValueKind::CondBranchInst, InstDetail::None, Type::no_type());
        self.push_operand(inst, Some(condition));
        self.push_operand(inst, Some(true_block));
        self.push_operand(inst, Some(false_block));
        inst
    }

    /// Create a detached return of `value`.
    pub fn create_return(&mut self, value: ValueId) -> ValueId {
        let inst = self.alloc_inst(ValueKind::ReturnInst, InstDetail::None, Type::no_type());
        self.push_operand(inst, Some(value));
        inst
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::test_module;
    use crate::*;

    #[test]
    fn test_set_operand_is_noop_for_same_value() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let x = m.get_literal_number(1.0);
        let mov = m.create_mov(x);
        m.block_push_back(bb, mov);

        m.set_operand(mov, Some(x), 0);
        assert_eq!(m.num_users(x), 1);
        m.verify().unwrap();
    }

    #[test]
    fn test_push_and_remove_operand() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let callee = m.get_literal_number(0.0);
        let this_val = m.get_literal_bool(false);
        let a = m.get_literal_number(1.0);
        let b = m.get_literal_number(2.0);
        let call = m.create_call(callee, this_val, &[a, b]);
        m.block_push_back(bb, call);

        assert_eq!(m.num_operands(call), 4);
        m.remove_operand(call, 2);
        assert_eq!(m.num_operands(call), 3);
        assert_eq!(m.operand(call, 2), Some(b));
        assert!(!m.has_users(a));
        m.verify().unwrap();
    }

    #[test]
    fn test_erase_operand_compacts_all_references() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let x = m.get_literal_number(1.0);
        let add = m.create_binary_operator(BinaryOp::Add, x, x);
        m.block_push_back(bb, add);

        m.erase_operand(add, x);
        assert_eq!(m.num_operands(add), 0);
        assert!(!m.has_user(x, add));
        m.verify().unwrap();
    }

    #[test]
    fn test_replace_first_operand_only_touches_lowest_slot() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let x = m.get_literal_number(1.0);
        let y = m.get_literal_number(2.0);
        let add = m.create_binary_operator(BinaryOp::Add, x, x);
        m.block_push_back(bb, add);

        m.replace_first_operand_with(add, x, Some(y));
        assert_eq!(m.operand(add, 0), Some(y));
        assert_eq!(m.operand(add, 1), Some(x));
        m.verify().unwrap();
    }

    #[test]
    #[should_panic(expected = "unsupported operand kind")]
    fn test_operand_legality_is_enforced() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);
        let x = m.get_literal_number(1.0);
        let br = m.create_branch(bb);
        m.block_push_back(bb, br);

        // A branch target must be a basic block.
        m.set_operand(br, Some(x), 0);
    }

    #[test]
    fn test_clone_inst_with_operands() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let x = m.get_literal_number(1.0);
        let y = m.get_literal_number(2.0);
        let add = m.create_binary_operator(BinaryOp::Add, x, y);
        m.set_statement_index(add, 5);
        m.set_inst_location(add, SourceRange { start: 10, end: 14 });
        m.block_push_back(bb, add);

        let z = m.get_literal_number(3.0);
        let copy = m.clone_inst_with_operands(add, &[Some(z), Some(y)]);

        assert_eq!(m.kind(copy), ValueKind::BinaryOperatorInst);
        assert_eq!(m.binary_op(copy), BinaryOp::Add);
        assert_eq!(m.statement_index(copy), 5);
        assert_eq!(m.inst_location(copy).start, 10);
        assert_eq!(m.operand(copy, 0), Some(z));
        assert_eq!(m.operand(copy, 1), Some(y));
        assert!(!m.inst_parent(copy).is_valid());
        m.verify().unwrap();
    }

    #[test]
    fn test_move_before_across_blocks() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb1 = m.create_basic_block(f);
        let bb2 = m.create_basic_block(f);

        let x = m.get_literal_number(1.0);
        let a = m.create_mov(x);
        let b = m.create_mov(x);
        m.block_push_back(bb1, a);
        m.block_push_back(bb2, b);

        m.move_inst_before(a, b);
        assert!(m.block_insts(bb1).is_empty());
        assert_eq!(m.block_insts(bb2), &[a, b]);
        assert_eq!(m.inst_parent(a), bb2);
        m.verify().unwrap();
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let x = m.get_literal_number(1.0);
        let a = m.create_mov(x);
        m.block_push_back(bb, a);

        let b = m.create_mov(x);
        m.insert_inst_before(b, a);
        let c = m.create_mov(x);
        m.insert_inst_after(c, a);

        assert_eq!(m.block_insts(bb), &[b, a, c]);
        m.verify().unwrap();
    }

    #[test]
    fn test_phi_can_reference_itself() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let bb = m.create_basic_block(f);

        let phi = m.create_phi();
        m.block_push_back(bb, phi);
        m.add_phi_entry(phi, Some(phi), bb);

        assert_eq!(m.operand(phi, 0), Some(phi));
        assert!(m.has_user(phi, phi));
        m.verify().unwrap();
    }
}
