//! Value base and use-def registry.
//!
//! Every IR entity (instruction, block, function, parameter, variable,
//! scope, literal, global property) is a value: a kind discriminant, an
//! inferred type, a list of incoming uses, and a kind-specific payload.
//!
//! The use-def machinery keeps one invariant above all others: for every
//! operand slot `(producer, j)` held by an instruction `I`,
//! `producer.users[j] == I`, and conversely every entry of a user list is
//! mirrored by exactly one operand slot. Removal uses swap-with-last on the
//! user list for O(1) edge deletion, patching the back-edge of whichever
//! user got moved into the vacated slot.

use crate::arena::Id;
use crate::block::BasicBlockData;
use crate::context::Identifier;
use crate::function::{FunctionData, ParameterData};
use crate::instr::InstructionData;
use crate::kind::ValueKind;
use crate::module::{GlobalPropertyData, Module};
use crate::scope::{ScopeData, VariableData};
use crate::types::Type;

/// Handle to a value in its module's arena.
pub type ValueId = Id<ValueData>;

/// One use-def edge: the slot in `producer`'s user list that holds the
/// back-pointer to the consuming instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Use {
    pub producer: ValueId,
    pub index: u32,
}

/// A value in the IR graph.
pub struct ValueData {
    pub(crate) kind: ValueKind,
    pub(crate) ty: Type,
    /// Instructions currently referencing this value. Order is unspecified
    /// and not preserved across removals.
    pub(crate) users: Vec<ValueId>,
    pub(crate) payload: Payload,
}

/// Kind-specific storage. The payload variant always agrees with the class
/// of the value's kind; a retired slot holds `Dead`.
pub(crate) enum Payload {
    Inst(InstructionData),
    Block(BasicBlockData),
    Function(FunctionData),
    Param(ParameterData),
    Var(VariableData),
    Scope(ScopeData),
    LiteralNumber(f64),
    LiteralString(Identifier),
    LiteralBool(bool),
    GlobalProperty(GlobalPropertyData),
    Dead,
}

impl Module {
    pub(crate) fn alloc_value(&mut self, kind: ValueKind, ty: Type, payload: Payload) -> ValueId {
        debug_assert!(kind.is_concrete(), "Invalid kind");
        self.values.alloc(ValueData {
            kind,
            ty,
            users: Vec::new(),
            payload,
        })
    }

    // =========================================================================
    // Generic value queries
    // =========================================================================

    /// The kind discriminant of a value.
    #[inline]
    pub fn kind(&self, v: ValueId) -> ValueKind {
        self.values[v].kind
    }

    /// The printable class name of a value.
    #[inline]
    pub fn kind_str(&self, v: ValueId) -> &'static str {
        self.values[v].kind.kind_str()
    }

    /// The inferred type of a value.
    #[inline]
    pub fn value_type(&self, v: ValueId) -> Type {
        self.values[v].ty
    }

    /// Set the inferred type of a value.
    #[inline]
    pub fn set_value_type(&mut self, v: ValueId, ty: Type) {
        self.values[v].ty = ty;
    }

    /// Check if a value's slot has been retired by [`destroy_value`].
    ///
    /// [`destroy_value`]: Module::destroy_value
    #[inline]
    pub fn is_dead(&self, v: ValueId) -> bool {
        matches!(self.values[v].payload, Payload::Dead)
    }

    // =========================================================================
    // User list
    // =========================================================================

    /// The instructions currently referencing `v`, in unspecified order.
    #[inline]
    pub fn users(&self, v: ValueId) -> &[ValueId] {
        &self.values[v].users
    }

    /// The number of instructions referencing `v`, counting one entry per
    /// referencing operand slot.
    #[inline]
    pub fn num_users(&self, v: ValueId) -> usize {
        self.values[v].users.len()
    }

    #[inline]
    pub fn has_users(&self, v: ValueId) -> bool {
        !self.values[v].users.is_empty()
    }

    #[inline]
    pub fn has_one_user(&self, v: ValueId) -> bool {
        self.values[v].users.len() == 1
    }

    /// Check if `inst` appears in `v`'s user list.
    #[inline]
    pub fn has_user(&self, v: ValueId, inst: ValueId) -> bool {
        self.values[v].users.contains(&inst)
    }

    /// Register `user` as referencing `producer`; returns the new edge.
    pub(crate) fn add_user(&mut self, producer: ValueId, user: ValueId) -> Use {
        debug_assert!(self.values[user].kind.is_instruction(), "Invalid kind");
        let users = &mut self.values[producer].users;
        users.push(user);
        Use {
            producer,
            index: users.len() as u32 - 1,
        }
    }

    /// Unregister the edge `u` from its producer's user list.
    ///
    /// The vacated slot is filled by swapping in the last entry; the moved
    /// user's operand holding the old `(producer, last)` back-edge is then
    /// rewritten to point at the new slot.
    pub(crate) fn remove_use(&mut self, u: Use) {
        let moved_user = {
            let users = &mut self.values[u.producer].users;
            assert!(!users.is_empty(), "removing a use from an empty user list");
            users.swap_remove(u.index as usize);
            if u.index as usize == users.len() {
                return;
            }
            users[u.index as usize]
        };

        let old_use = Use {
            producer: u.producer,
            index: self.values[u.producer].users.len() as u32,
        };
        let new_use = Use {
            producer: u.producer,
            index: u.index,
        };
        for slot in self.inst_mut(moved_user).operands.iter_mut() {
            if *slot == Some(old_use) {
                *slot = Some(new_use);
                return;
            }
        }
        unreachable!("can't find user in operand list");
    }

    /// Rewrite every operand referencing `old` to reference `new` instead.
    ///
    /// Each user is asked to replace its first matching operand; a user with
    /// several matching slots reappears in the user list until all of them
    /// have been rewritten. No-op when `new` is `old` itself.
    pub fn replace_all_uses_with(&mut self, old: ValueId, new: Option<ValueId>) {
        if new == Some(old) {
            return;
        }
        // Users unregister themselves as their operands are rewritten, so
        // always look at the current tail of the list.
        while let Some(&user) = self.values[old].users.last() {
            self.replace_first_operand_with(user, old, new);
        }
    }

    /// Erase every operand slot referencing `v` from all of its users,
    /// leaving `v` with an empty user list.
    pub fn remove_all_uses(&mut self, v: ValueId) {
        while let Some(&user) = self.values[v].users.last() {
            self.erase_operand(user, v);
        }
    }

    // =========================================================================
    // Kind-safe downcasts
    // =========================================================================

    pub(crate) fn inst(&self, v: ValueId) -> &InstructionData {
        match &self.values[v].payload {
            Payload::Inst(d) => d,
            _ => panic!("Invalid kind: {} is not an instruction", self.kind_name_for_panic(v)),
        }
    }

    pub(crate) fn inst_mut(&mut self, v: ValueId) -> &mut InstructionData {
        let kind = self.values[v].kind;
        match &mut self.values[v].payload {
            Payload::Inst(d) => d,
            _ => panic!("Invalid kind: {:?} is not an instruction", kind),
        }
    }

    pub(crate) fn block(&self, v: ValueId) -> &BasicBlockData {
        match &self.values[v].payload {
            Payload::Block(d) => d,
            _ => panic!("Invalid kind: {} is not a basic block", self.kind_name_for_panic(v)),
        }
    }

    pub(crate) fn block_mut(&mut self, v: ValueId) -> &mut BasicBlockData {
        let kind = self.values[v].kind;
        match &mut self.values[v].payload {
            Payload::Block(d) => d,
            _ => panic!("Invalid kind: {:?} is not a basic block", kind),
        }
    }

    pub(crate) fn func(&self, v: ValueId) -> &FunctionData {
        match &self.values[v].payload {
            Payload::Function(d) => d,
            _ => panic!("Invalid kind: {} is not a function", self.kind_name_for_panic(v)),
        }
    }

    pub(crate) fn func_mut(&mut self, v: ValueId) -> &mut FunctionData {
        let kind = self.values[v].kind;
        match &mut self.values[v].payload {
            Payload::Function(d) => d,
            _ => panic!("Invalid kind: {:?} is not a function", kind),
        }
    }

    pub(crate) fn param(&self, v: ValueId) -> &ParameterData {
        match &self.values[v].payload {
            Payload::Param(d) => d,
            _ => panic!("Invalid kind: {} is not a parameter", self.kind_name_for_panic(v)),
        }
    }

    pub(crate) fn scope(&self, v: ValueId) -> &ScopeData {
        match &self.values[v].payload {
            Payload::Scope(d) => d,
            _ => panic!("Invalid kind: {} is not a scope", self.kind_name_for_panic(v)),
        }
    }

    pub(crate) fn scope_mut(&mut self, v: ValueId) -> &mut ScopeData {
        let kind = self.values[v].kind;
        match &mut self.values[v].payload {
            Payload::Scope(d) => d,
            _ => panic!("Invalid kind: {:?} is not a scope", kind),
        }
    }

    pub(crate) fn var(&self, v: ValueId) -> &VariableData {
        match &self.values[v].payload {
            Payload::Var(d) => d,
            _ => panic!("Invalid kind: {} is not a variable", self.kind_name_for_panic(v)),
        }
    }

    pub(crate) fn global_prop(&self, v: ValueId) -> &GlobalPropertyData {
        match &self.values[v].payload {
            Payload::GlobalProperty(d) => d,
            _ => panic!("Invalid kind: {} is not a global property", self.kind_name_for_panic(v)),
        }
    }

    pub(crate) fn global_prop_mut(&mut self, v: ValueId) -> &mut GlobalPropertyData {
        let kind = self.values[v].kind;
        match &mut self.values[v].payload {
            Payload::GlobalProperty(d) => d,
            _ => panic!("Invalid kind: {:?} is not a global property", kind),
        }
    }

    fn kind_name_for_panic(&self, v: ValueId) -> &'static str {
        let kind = self.values[v].kind;
        if kind.is_concrete() {
            kind.kind_str()
        } else {
            "<marker>"
        }
    }

    /// The numeric value of a `LiteralNumber`.
    pub fn literal_number_value(&self, v: ValueId) -> f64 {
        match self.values[v].payload {
            Payload::LiteralNumber(x) => x,
            _ => panic!("Invalid kind: {} is not a literal number", self.kind_name_for_panic(v)),
        }
    }

    /// The interned string of a `LiteralString`.
    pub fn literal_string_value(&self, v: ValueId) -> Identifier {
        match self.values[v].payload {
            Payload::LiteralString(s) => s,
            _ => panic!("Invalid kind: {} is not a literal string", self.kind_name_for_panic(v)),
        }
    }

    /// The boolean value of a `LiteralBool`.
    pub fn literal_bool_value(&self, v: ValueId) -> bool {
        match self.values[v].payload {
            Payload::LiteralBool(b) => b,
            _ => panic!("Invalid kind: {} is not a literal bool", self.kind_name_for_panic(v)),
        }
    }

    // =========================================================================
    // Destruction
    // =========================================================================

    /// Kind-dispatched deleter: retire `v`'s slot, cascading into owned
    /// children in document order. No-op on the null sentinel or an already
    /// retired slot. Use-lists are never touched here; callers sever uses
    /// before destroying owned values.
    pub fn destroy_value(&mut self, v: ValueId) {
        if !v.is_valid() {
            return;
        }
        if self.is_dead(v) {
            return;
        }

        match self.values[v].kind {
            ValueKind::Function => {
                let d = self.func(v);
                let mut children: Vec<ValueId> = d.params.clone();
                children.extend(d.this_param);
                children.extend(d.external_scopes.iter().copied());
                children.push(d.function_scope);
                children.extend(d.blocks.iter().copied());
                for c in children {
                    self.destroy_value(c);
                }
            }
            ValueKind::BasicBlock => {
                let insts = self.block(v).insts.clone();
                for i in insts {
                    self.destroy_value(i);
                }
            }
            ValueKind::VariableScope | ValueKind::ExternalScope => {
                let vars = self.scope(v).variables.clone();
                for var in vars {
                    self.destroy_value(var);
                }
            }
            ValueKind::GlobalObjectProperty
            | ValueKind::Parameter
            | ValueKind::Variable
            | ValueKind::LiteralNumber
            | ValueKind::LiteralString
            | ValueKind::LiteralBool => {}
            k if k.is_instruction() => {}
            _ => unreachable!("Invalid kind"),
        }

        self.values[v].payload = Payload::Dead;
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Verify bidirectional use-def consistency over the whole module.
    ///
    /// For every live instruction operand `(p, j)`, `p.users[j]` must be the
    /// instruction; for every user-list entry `p.users[j] = I`, exactly one
    /// operand slot of `I` must hold `(p, j)`.
    pub fn verify(&self) -> Result<(), String> {
        for (id, value) in self.values.iter() {
            if let Payload::Inst(inst) = &value.payload {
                for (k, slot) in inst.operands.iter().enumerate() {
                    let Some(u) = slot else { continue };
                    let producer = self
                        .values
                        .get(u.producer)
                        .ok_or_else(|| format!("{id:?} operand {k}: invalid producer"))?;
                    if producer.users.get(u.index as usize) != Some(&id) {
                        return Err(format!(
                            "{id:?} operand {k}: back-edge {u:?} does not name this instruction"
                        ));
                    }
                }
            }

            for (j, &user) in value.users.iter().enumerate() {
                let Some(Payload::Inst(inst)) = self.values.get(user).map(|v| &v.payload) else {
                    return Err(format!("{id:?} user {j}: {user:?} is not an instruction"));
                };
                let expect = Use {
                    producer: id,
                    index: j as u32,
                };
                let hits = inst.operands.iter().filter(|s| **s == Some(expect)).count();
                if hits != 1 {
                    return Err(format!(
                        "{id:?} user {j}: expected exactly one operand slot holding {expect:?}, found {hits}"
                    ));
                }
            }
        }
        Ok(())
    }
}
