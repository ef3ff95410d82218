//! Functions and parameters.
//!
//! A function owns its blocks, its parameters, the distinguished `this`
//! parameter, its function scope, and any external scopes. Functions are
//! values: a `CreateFunctionInst` materializing a closure holds its target
//! function as an operand, which is what the module-use analysis walks.

use crate::context::Identifier;
use crate::instr::SourceRange;
use crate::module::Module;
use crate::scope::ScopeData;
use crate::types::Type;
use crate::value::{Payload, ValueId};
use crate::ValueKind;

/// How a function was introduced in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Es5Function,
    Es6Constructor,
    Es6Arrow,
    Es6Method,
}

/// Payload of a `Function` value.
pub struct FunctionData {
    pub(crate) is_global: bool,
    pub(crate) blocks: Vec<ValueId>,
    pub(crate) params: Vec<ValueId>,
    pub(crate) this_param: Option<ValueId>,
    pub(crate) function_scope: ValueId,
    pub(crate) external_scopes: Vec<ValueId>,
    pub(crate) original_name: Identifier,
    pub(crate) internal_name: Identifier,
    pub(crate) definition_kind: DefinitionKind,
    pub(crate) strict_mode: bool,
    pub(crate) source_range: SourceRange,
}

/// Payload of a `Parameter` value.
pub struct ParameterData {
    pub(crate) function: ValueId,
    pub(crate) name: Identifier,
}

impl Module {
    /// Create a function and attach it to this module, either at the end of
    /// the function list or immediately before `insert_before`.
    ///
    /// The unique internal name is derived from `original_name` before the
    /// function joins the list; the function scope is created along with the
    /// function.
    ///
    /// # Panics
    ///
    /// Panics when `original_name` is the invalid sentinel or when the
    /// anchor does not belong to this module.
    pub fn create_function(
        &mut self,
        original_name: Identifier,
        definition_kind: DefinitionKind,
        strict_mode: bool,
        is_global: bool,
        source_range: SourceRange,
        insert_before: Option<ValueId>,
    ) -> ValueId {
        assert!(original_name.is_valid(), "function original name must be valid");
        let internal_name = self.derive_unique_internal_name(original_name);

        let f = self.alloc_value(
            ValueKind::Function,
            Type::closure_type(),
            Payload::Function(FunctionData {
                is_global,
                blocks: Vec::new(),
                params: Vec::new(),
                this_param: None,
                function_scope: ValueId::INVALID,
                external_scopes: Vec::new(),
                original_name,
                internal_name,
                definition_kind,
                strict_mode,
                source_range,
            }),
        );

        let scope = self.alloc_value(
            ValueKind::VariableScope,
            Type::no_type(),
            Payload::Scope(ScopeData {
                function: f,
                variables: Vec::new(),
                depth: 0,
            }),
        );
        self.func_mut(f).function_scope = scope;

        match insert_before {
            Some(anchor) => {
                let at = self
                    .functions
                    .iter()
                    .position(|&x| x == anchor)
                    .expect("function to insert before is from a different module");
                self.functions.insert(at, f);
            }
            None => self.functions.push(f),
        }
        f
    }

    /// Shorthand: append a plain, non-strict ES5 function named `name`.
    pub fn create_function_named(&mut self, name: &str) -> ValueId {
        let ident = self.ctx_mut().get_identifier(name);
        self.create_function(
            ident,
            DefinitionKind::Es5Function,
            false,
            false,
            SourceRange::default(),
            None,
        )
    }

    /// The function's blocks in document order.
    #[inline]
    pub fn function_blocks(&self, f: ValueId) -> &[ValueId] {
        &self.func(f).blocks
    }

    /// The function's parameters in construction order, excluding `this`.
    #[inline]
    pub fn function_params(&self, f: ValueId) -> &[ValueId] {
        &self.func(f).params
    }

    /// The distinguished `this` parameter, if one was created.
    #[inline]
    pub fn this_parameter(&self, f: ValueId) -> Option<ValueId> {
        self.func(f).this_param
    }

    /// The function's own lexical scope.
    #[inline]
    pub fn function_scope(&self, f: ValueId) -> ValueId {
        self.func(f).function_scope
    }

    /// The function's external scopes in construction order.
    #[inline]
    pub fn external_scopes(&self, f: ValueId) -> &[ValueId] {
        &self.func(f).external_scopes
    }

    /// The name the function had in source (or was inferred to have).
    #[inline]
    pub fn original_name(&self, f: ValueId) -> Identifier {
        self.func(f).original_name
    }

    /// The module-unique internal name.
    #[inline]
    pub fn internal_name(&self, f: ValueId) -> Identifier {
        self.func(f).internal_name
    }

    /// The module-unique internal name, resolved to its string.
    #[inline]
    pub fn internal_name_str(&self, f: ValueId) -> &str {
        self.ctx().ident_str(self.func(f).internal_name)
    }

    #[inline]
    pub fn definition_kind(&self, f: ValueId) -> DefinitionKind {
        self.func(f).definition_kind
    }

    #[inline]
    pub fn is_strict_mode(&self, f: ValueId) -> bool {
        self.func(f).strict_mode
    }

    /// Check if `f` is the module's global function.
    #[inline]
    pub fn is_global_function(&self, f: ValueId) -> bool {
        self.func(f).is_global
    }

    #[inline]
    pub fn function_source_range(&self, f: ValueId) -> SourceRange {
        self.func(f).source_range
    }

    /// Drain and destroy all of `f`'s blocks, then unlink `f` from the
    /// module's function list. The function itself stays alive; the module
    /// still owns its slot.
    pub fn erase_function_from_parent(&mut self, f: ValueId) {
        while let Some(&bb) = self.func(f).blocks.first() {
            self.replace_all_uses_with(bb, None);
            self.erase_block_from_parent(bb);
        }

        assert!(!self.has_users(f), "use list is not empty");
        let at = self
            .functions
            .iter()
            .position(|&x| x == f)
            .expect("function is not in its parent module");
        self.functions.remove(at);
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Create a parameter of `function`.
    ///
    /// A parameter named `this` becomes the function's distinguished `this`
    /// parameter instead of joining the parameter list.
    pub fn create_parameter(&mut self, function: ValueId, name: Identifier) -> ValueId {
        assert!(function.is_valid(), "invalid parent function");
        let p = self.alloc_value(
            ValueKind::Parameter,
            Type::any_type(),
            Payload::Param(ParameterData { function, name }),
        );
        if self.ctx().ident_str(name) == "this" {
            self.func_mut(function).this_param = Some(p);
        } else {
            self.func_mut(function).params.push(p);
        }
        p
    }

    /// The parameter's name.
    #[inline]
    pub fn param_name(&self, p: ValueId) -> Identifier {
        self.param(p).name
    }

    /// The function owning the parameter.
    #[inline]
    pub fn param_function(&self, p: ValueId) -> ValueId {
        self.param(p).function
    }

    /// Check if `p` is its function's `this` parameter.
    #[inline]
    pub fn is_this_parameter(&self, p: ValueId) -> bool {
        self.func(self.param(p).function).this_param == Some(p)
    }

    /// The parameter's position in its function's parameter list.
    ///
    /// # Panics
    ///
    /// Panics when the parameter is not in the list (e.g. for the `this`
    /// parameter); that would violate the ownership invariant.
    pub fn param_index_in_list(&self, p: ValueId) -> usize {
        let function = self.param(p).function;
        self.func(function)
            .params
            .iter()
            .position(|&x| x == p)
            .expect("cannot find parameter in the function")
    }
}
