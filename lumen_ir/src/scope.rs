//! Lexical scopes and variables.

use crate::context::Identifier;
use crate::module::Module;
use crate::types::Type;
use crate::value::{Payload, ValueId};
use crate::ValueKind;

/// Payload shared by `VariableScope` and `ExternalScope` values.
///
/// The function scope sits at depth 0; external scopes (frames captured
/// from an enclosing compilation) carry strictly negative depths.
pub struct ScopeData {
    pub(crate) function: ValueId,
    pub(crate) variables: Vec<ValueId>,
    pub(crate) depth: i32,
}

/// Payload of a `Variable` value.
pub struct VariableData {
    pub(crate) scope: ValueId,
    pub(crate) name: Identifier,
}

impl Module {
    /// Create an external scope at `depth` and append it to `function`'s
    /// external-scope list.
    ///
    /// # Panics
    ///
    /// Panics when `depth` is not strictly negative.
    pub fn create_external_scope(&mut self, function: ValueId, depth: i32) -> ValueId {
        assert!(depth < 0, "invalid external scope depth");
        let scope = self.alloc_value(
            ValueKind::ExternalScope,
            Type::no_type(),
            Payload::Scope(ScopeData {
                function,
                variables: Vec::new(),
                depth,
            }),
        );
        self.func_mut(function).external_scopes.push(scope);
        scope
    }

    /// The function owning a scope.
    #[inline]
    pub fn scope_function(&self, s: ValueId) -> ValueId {
        self.scope(s).function
    }

    /// The scope's depth: 0 for a function scope, negative for an external
    /// scope.
    #[inline]
    pub fn scope_depth(&self, s: ValueId) -> i32 {
        self.scope(s).depth
    }

    /// The scope's variables in declaration order.
    #[inline]
    pub fn scope_variables(&self, s: ValueId) -> &[ValueId] {
        &self.scope(s).variables
    }

    /// Check if `s` is the global scope: the function scope of the module's
    /// global function.
    pub fn is_global_scope(&self, s: ValueId) -> bool {
        let f = self.scope(s).function;
        self.is_global_function(f) && self.function_scope(f) == s
    }

    /// Create a variable owned by `scope`.
    pub fn create_variable(&mut self, scope: ValueId, name: Identifier) -> ValueId {
        let v = self.alloc_value(
            ValueKind::Variable,
            Type::any_type(),
            Payload::Var(VariableData { scope, name }),
        );
        self.scope_mut(scope).variables.push(v);
        v
    }

    /// The variable's name.
    #[inline]
    pub fn variable_name(&self, v: ValueId) -> Identifier {
        self.var(v).name
    }

    /// The scope owning the variable.
    #[inline]
    pub fn variable_scope(&self, v: ValueId) -> ValueId {
        self.var(v).scope
    }

    /// The variable's position in its scope's list.
    ///
    /// # Panics
    ///
    /// Panics when the variable is not in its scope's list; that would
    /// violate the ownership invariant.
    pub fn variable_index_in_scope(&self, v: ValueId) -> usize {
        let scope = self.var(v).scope;
        self.scope(scope)
            .variables
            .iter()
            .position(|&x| x == v)
            .expect("cannot find variable in the variable list")
    }
}

#[cfg(test)]
mod tests {
    use crate::test_util::test_module;
    use crate::*;

    #[test]
    fn test_external_scopes_keep_construction_order() {
        let mut m = test_module();
        let f = m.create_function_named("f");

        let s1 = m.create_external_scope(f, -1);
        let s2 = m.create_external_scope(f, -3);

        assert_eq!(m.external_scopes(f), &[s1, s2]);
        assert_eq!(m.scope_depth(s1), -1);
        assert_eq!(m.scope_depth(s2), -3);
        assert_eq!(m.kind(s2), ValueKind::ExternalScope);
    }

    #[test]
    #[should_panic(expected = "invalid external scope depth")]
    fn test_external_scope_rejects_non_negative_depth() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        m.create_external_scope(f, 0);
    }

    #[test]
    fn test_variables_register_with_scope() {
        let mut m = test_module();
        let f = m.create_function_named("f");
        let scope = m.function_scope(f);

        let a = m.ctx_mut().get_identifier("a");
        let b = m.ctx_mut().get_identifier("b");
        let va = m.create_variable(scope, a);
        let vb = m.create_variable(scope, b);

        assert_eq!(m.scope_variables(scope), &[va, vb]);
        assert_eq!(m.variable_index_in_scope(va), 0);
        assert_eq!(m.variable_index_in_scope(vb), 1);
        assert_eq!(m.variable_scope(vb), scope);
        assert_eq!(m.ctx().ident_str(m.variable_name(va)), "a");
    }

    #[test]
    fn test_global_scope_identity() {
        let mut m = test_module();
        let name = m.ctx_mut().get_identifier("global");
        let global = m.create_function(
            name,
            DefinitionKind::Es5Function,
            false,
            true,
            SourceRange::default(),
            None,
        );
        let plain = m.create_function_named("f");

        assert!(m.is_global_scope(m.function_scope(global)));
        assert!(!m.is_global_scope(m.function_scope(plain)));

        // An external scope of the global function is not the global scope.
        let ext = m.create_external_scope(global, -1);
        assert!(!m.is_global_scope(ext));
    }
}
