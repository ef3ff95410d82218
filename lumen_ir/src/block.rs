//! Basic blocks.
//!
//! A block owns an insertion-ordered list of instructions. Blocks are
//! values themselves so terminators and phis can reference them as operands.

use crate::module::Module;
use crate::types::Type;
use crate::value::{Payload, ValueId};
use crate::ValueKind;

/// Payload of a `BasicBlock` value.
pub struct BasicBlockData {
    /// Owning function.
    pub(crate) parent: ValueId,
    pub(crate) insts: Vec<ValueId>,
}

impl Module {
    /// Create an empty block at the end of `function`'s block list.
    pub fn create_basic_block(&mut self, function: ValueId) -> ValueId {
        assert!(function.is_valid(), "invalid parent function");
        let bb = self.alloc_value(
            ValueKind::BasicBlock,
            Type::no_type(),
            Payload::Block(BasicBlockData {
                parent: function,
                insts: Vec::new(),
            }),
        );
        self.func_mut(function).blocks.push(bb);
        bb
    }

    /// The function owning `bb`.
    #[inline]
    pub fn block_parent(&self, bb: ValueId) -> ValueId {
        self.block(bb).parent
    }

    /// The block's instructions in document order.
    #[inline]
    pub fn block_insts(&self, bb: ValueId) -> &[ValueId] {
        &self.block(bb).insts
    }

    /// Append `inst` to the end of `bb`.
    pub fn block_push_back(&mut self, bb: ValueId, inst: ValueId) {
        debug_assert!(self.kind(inst).is_instruction(), "Invalid kind");
        self.block_mut(bb).insts.push(inst);
        self.inst_mut(inst).parent = bb;
    }

    /// Unlink `inst` from `bb` without destroying it.
    pub fn block_remove(&mut self, bb: ValueId, inst: ValueId) {
        let at = self
            .block(bb)
            .insts
            .iter()
            .position(|&i| i == inst)
            .expect("instruction is not in its parent block");
        self.block_mut(bb).insts.remove(at);
    }

    /// Unlink `inst` from `bb` and destroy it.
    pub fn block_erase(&mut self, bb: ValueId, inst: ValueId) {
        self.block_remove(bb, inst);
        self.destroy_value(inst);
    }

    /// The block's terminator: its last instruction when that instruction is
    /// of a terminator kind, else `None`.
    pub fn terminator(&self, bb: ValueId) -> Option<ValueId> {
        let &last = self.block(bb).insts.last()?;
        self.kind(last).is_terminator().then_some(last)
    }

    /// Unlink `bb` from its function without destroying it.
    pub fn remove_block_from_parent(&mut self, bb: ValueId) {
        let f = self.block(bb).parent;
        let at = self
            .func(f)
            .blocks
            .iter()
            .position(|&b| b == bb)
            .expect("block is not in its parent function");
        self.func_mut(f).blocks.remove(at);
    }

    /// Drain and destroy `bb`, then unlink it from its function.
    ///
    /// Instructions are erased head-first; each head's remaining uses are
    /// replaced with the null sentinel first, so forward references from
    /// later instructions become empty operand slots rather than dangling
    /// edges. The block must have no users of its own when the drain
    /// completes.
    pub fn erase_block_from_parent(&mut self, bb: ValueId) {
        while let Some(&head) = self.block(bb).insts.first() {
            self.replace_all_uses_with(head, None);
            self.erase_inst_from_parent(head);
        }

        assert!(!self.has_users(bb), "use list is not empty");
        self.remove_block_from_parent(bb);
        self.destroy_value(bb);
    }
}
