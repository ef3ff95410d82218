//! The module: root of the containment hierarchy.
//!
//! A module owns every value of one compilation unit through a single typed
//! arena, plus the unit-wide caches: literal interning tables, the
//! global-property registry, the internal-name counter map, the CommonJS
//! module table and its lazily built function-use graph. All of these are
//! mutated only through the module-level APIs in this file.

use std::collections::hash_map::Entry;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::context::{Context, Identifier, SegmentRange};
use crate::types::Type;
use crate::value::{Payload, ValueData, ValueId};
use crate::{Arena, ValueKind};

/// Payload of a `GlobalObjectProperty` value.
pub struct GlobalPropertyData {
    /// The property name as an interned `LiteralString` value.
    pub(crate) name: ValueId,
    /// Whether some registration site declared the property (monotonic).
    pub(crate) declared: bool,
}

/// One CommonJS module: its source filename and the wrapper function the
/// module's top-level code was compiled into.
#[derive(Debug, Clone, Copy)]
pub struct CjsModule {
    pub filename: Identifier,
    pub function: ValueId,
}

/// A compilation unit's IR.
pub struct Module {
    ctx: Context,
    pub(crate) values: Arena<ValueData>,
    pub(crate) functions: Vec<ValueId>,

    global_property_map: FxHashMap<Identifier, ValueId>,
    global_property_list: Vec<ValueId>,

    literal_numbers: FxHashMap<u64, ValueId>,
    literal_strings: FxHashMap<Identifier, ValueId>,
    literal_true: ValueId,
    literal_false: ValueId,

    /// Per-base counters backing unique internal name derivation.
    internal_names: FxHashMap<Identifier, u32>,

    cjs_modules: Vec<CjsModule>,
    /// Lazy one-shot cache: which functions each function uses. Never
    /// invalidated; mutating the function graph after the first segment
    /// query can yield stale results.
    cjs_use_graph: FxHashMap<ValueId, FxHashSet<ValueId>>,
}

impl Module {
    /// Create an empty module owning `ctx`.
    pub fn new(ctx: Context) -> Module {
        let mut values = Arena::with_capacity(64);
        let literal_true = values.alloc(ValueData {
            kind: ValueKind::LiteralBool,
            ty: Type::boolean_type(),
            users: Vec::new(),
            payload: Payload::LiteralBool(true),
        });
        let literal_false = values.alloc(ValueData {
            kind: ValueKind::LiteralBool,
            ty: Type::boolean_type(),
            users: Vec::new(),
            payload: Payload::LiteralBool(false),
        });

        Module {
            ctx,
            values,
            functions: Vec::new(),
            global_property_map: FxHashMap::default(),
            global_property_list: Vec::new(),
            literal_numbers: FxHashMap::default(),
            literal_strings: FxHashMap::default(),
            literal_true,
            literal_false,
            internal_names: FxHashMap::default(),
            cjs_modules: Vec::new(),
            cjs_use_graph: FxHashMap::default(),
        }
    }

    /// The context this module was built under. Any value of the module
    /// resolves here through its owning module.
    #[inline]
    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    #[inline]
    pub fn ctx_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    // =========================================================================
    // Function list
    // =========================================================================

    /// The module's functions in insertion order.
    #[inline]
    pub fn functions(&self) -> &[ValueId] {
        &self.functions
    }

    // =========================================================================
    // Global object properties
    // =========================================================================

    /// Look up the property registered under `name`.
    pub fn find_global_property(&self, name: Identifier) -> Option<ValueId> {
        self.global_property_map.get(&name).copied()
    }

    /// Register (or re-register) a global property.
    ///
    /// Returns the existing property when one is already registered under
    /// `name`; in both cases `declared` is OR-ed into the property's flag,
    /// so declaredness never reverts.
    pub fn add_global_property(&mut self, name: Identifier, declared: bool) -> ValueId {
        if let Some(&prop) = self.global_property_map.get(&name) {
            if declared {
                self.global_prop_mut(prop).declared = true;
            }
            return prop;
        }

        let name_lit = self.get_literal_string(name);
        let prop = self.alloc_value(
            ValueKind::GlobalObjectProperty,
            Type::any_type(),
            Payload::GlobalProperty(GlobalPropertyData {
                name: name_lit,
                declared,
            }),
        );
        self.global_property_map.insert(name, prop);
        self.global_property_list.push(prop);
        prop
    }

    /// Unregister and destroy a global property.
    pub fn erase_global_property(&mut self, prop: ValueId) {
        let name = self.literal_string_value(self.global_prop(prop).name);
        self.global_property_map.remove(&name);
        if let Some(at) = self.global_property_list.iter().position(|&p| p == prop) {
            self.global_property_list.remove(at);
            self.destroy_value(prop);
        }
    }

    /// The registered properties in registration order.
    #[inline]
    pub fn global_properties(&self) -> &[ValueId] {
        &self.global_property_list
    }

    /// The property's name as an interned `LiteralString` value.
    #[inline]
    pub fn global_property_name(&self, prop: ValueId) -> ValueId {
        self.global_prop(prop).name
    }

    /// Whether any registration site declared the property.
    #[inline]
    pub fn is_global_property_declared(&self, prop: ValueId) -> bool {
        self.global_prop(prop).declared
    }

    // =========================================================================
    // Literals
    // =========================================================================

    /// The canonical literal for `value`, interned by bit profile: `-0.0`
    /// and `+0.0` are distinct literals, and any one NaN payload is stable.
    pub fn get_literal_number(&mut self, value: f64) -> ValueId {
        let profile = value.to_bits();
        if let Some(&lit) = self.literal_numbers.get(&profile) {
            return lit;
        }
        let lit = self.alloc_value(
            ValueKind::LiteralNumber,
            Type::number_type(),
            Payload::LiteralNumber(value),
        );
        self.literal_numbers.insert(profile, lit);
        lit
    }

    /// The canonical literal for the interned string `value`.
    pub fn get_literal_string(&mut self, value: Identifier) -> ValueId {
        if let Some(&lit) = self.literal_strings.get(&value) {
            return lit;
        }
        let lit = self.alloc_value(
            ValueKind::LiteralString,
            Type::string_type(),
            Payload::LiteralString(value),
        );
        self.literal_strings.insert(value, lit);
        lit
    }

    /// One of the module's two resident boolean literals.
    #[inline]
    pub fn get_literal_bool(&self, value: bool) -> ValueId {
        if value {
            self.literal_true
        } else {
            self.literal_false
        }
    }

    // =========================================================================
    // Internal names
    // =========================================================================

    /// Strip a trailing `" <digits>#"` suffix, if the tail has exactly that
    /// shape: a space, one or more decimal digits, then `#`.
    fn strip_internal_name_suffix(&mut self, original: Identifier) -> Identifier {
        let stripped = {
            let s = self.ctx.ident_str(original);
            let b = s.as_bytes();
            let n = b.len();
            if n < 3 || b[n - 1] != b'#' || !b[n - 2].is_ascii_digit() {
                return original;
            }
            let mut i = n - 2;
            while i > 0 && b[i - 1].is_ascii_digit() {
                i -= 1;
            }
            if i == 0 || b[i - 1] != b' ' {
                return original;
            }
            s[..i - 1].to_owned()
        };
        self.ctx.get_identifier(&stripped)
    }

    /// Derive a module-unique internal name from a requested original name.
    ///
    /// A generated-looking `" <digits>#"` tail is stripped first, so feeding
    /// a derived name back in re-derives from the same base. The first
    /// request for a base returns it unchanged; every later request appends
    /// `" <counter>#"`.
    pub fn derive_unique_internal_name(&mut self, original_name: Identifier) -> Identifier {
        assert!(original_name.is_valid(), "original name must be valid");
        let base = self.strip_internal_name_suffix(original_name);

        match self.internal_names.entry(base) {
            Entry::Vacant(e) => {
                // First sight of this base: claim it undecorated.
                e.insert(0);
                base
            }
            Entry::Occupied(mut e) => {
                *e.get_mut() += 1;
                let n = *e.get();
                let derived = format!("{} {}#", self.ctx.ident_str(base), n);
                self.ctx.get_identifier(&derived)
            }
        }
    }

    // =========================================================================
    // CommonJS modules
    // =========================================================================

    /// Register the wrapper function of the next CommonJS module; modules
    /// are indexed by registration order.
    pub fn register_cjs_module(&mut self, filename: Identifier, function: ValueId) {
        debug_assert!(matches!(self.kind(function), ValueKind::Function), "Invalid kind");
        self.cjs_modules.push(CjsModule { filename, function });
    }

    /// The registered CommonJS modules in index order.
    #[inline]
    pub fn cjs_modules(&self) -> &[CjsModule] {
        &self.cjs_modules
    }

    /// Build the function-uses-function graph if it has not been built yet.
    ///
    /// For every function `f` and every instruction using `f`, an edge is
    /// added from the function containing that instruction to `f`. The graph
    /// is a single-shot cache and is never invalidated.
    pub fn populate_cjs_module_use_graph(&mut self) {
        if !self.cjs_use_graph.is_empty() {
            return;
        }

        let mut edges: Vec<(ValueId, ValueId)> = Vec::new();
        for &f in &self.functions {
            for &user in &self.values[f].users {
                let block = self.inst(user).parent;
                let using_function = self.block(block).parent;
                edges.push((using_function, f));
            }
        }
        for (from, to) in edges {
            self.cjs_use_graph.entry(from).or_default().insert(to);
        }
    }

    /// The set of functions reachable from the wrapper functions of the
    /// CommonJS modules with indices in `range` (inclusive): everything that
    /// must be emitted when generating that segment.
    pub fn get_functions_in_segment(&mut self, range: SegmentRange) -> FxHashSet<ValueId> {
        self.populate_cjs_module_use_graph();

        let mut result = FxHashSet::default();
        let mut worklist: Vec<ValueId> = (range.first..=range.last)
            .map(|i| self.cjs_modules[i as usize].function)
            .collect();

        while let Some(cur) = worklist.pop() {
            if !result.insert(cur) {
                continue;
            }
            if let Some(targets) = self.cjs_use_graph.get(&cur) {
                worklist.extend(targets.iter().copied());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use crate::test_util::test_module;
    use crate::*;

    #[test]
    fn test_number_interning_by_bit_profile() {
        let mut m = test_module();
        let a = m.get_literal_number(3.14);
        let b = m.get_literal_number(3.14);
        assert_eq!(a, b);
        assert_eq!(m.literal_number_value(a), 3.14);

        // -0.0 and +0.0 differ bitwise, so they intern separately.
        let neg = m.get_literal_number(-0.0);
        let pos = m.get_literal_number(0.0);
        assert_ne!(neg, pos);

        let nan1 = m.get_literal_number(f64::NAN);
        let nan2 = m.get_literal_number(f64::NAN);
        assert_eq!(nan1, nan2);
    }

    #[test]
    fn test_string_interning_by_identifier() {
        let mut m = test_module();
        let hello = m.ctx_mut().get_identifier("hello");
        let world = m.ctx_mut().get_identifier("world");

        let a = m.get_literal_string(hello);
        let b = m.get_literal_string(hello);
        let c = m.get_literal_string(world);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(m.literal_string_value(a), hello);
    }

    #[test]
    fn test_bool_literals_are_stable_singletons() {
        let mut m = test_module();
        assert_eq!(m.get_literal_bool(true), m.get_literal_bool(true));
        assert_eq!(m.get_literal_bool(false), m.get_literal_bool(false));
        assert_ne!(m.get_literal_bool(true), m.get_literal_bool(false));
        assert!(m.literal_bool_value(m.get_literal_bool(true)));
    }

    #[test]
    fn test_global_property_declaredness_is_monotonic() {
        let mut m = test_module();
        let x = m.ctx_mut().get_identifier("x");

        let p1 = m.add_global_property(x, false);
        assert!(!m.is_global_property_declared(p1));

        let p2 = m.add_global_property(x, true);
        assert_eq!(p1, p2);
        assert!(m.is_global_property_declared(p1));

        // A later undeclared registration does not clear the flag.
        let p3 = m.add_global_property(x, false);
        assert_eq!(p1, p3);
        assert!(m.is_global_property_declared(p1));
    }

    #[test]
    fn test_erase_global_property() {
        let mut m = test_module();
        let x = m.ctx_mut().get_identifier("x");
        let y = m.ctx_mut().get_identifier("y");
        let px = m.add_global_property(x, true);
        let py = m.add_global_property(y, false);

        m.erase_global_property(px);
        assert_eq!(m.find_global_property(x), None);
        assert_eq!(m.global_properties(), &[py]);
        assert!(m.is_dead(px));

        // The name can be registered again, producing a fresh property.
        let px2 = m.add_global_property(x, false);
        assert_ne!(px, px2);
        assert!(!m.is_global_property_declared(px2));
    }

    #[test]
    fn test_unique_internal_name_sequence() {
        let mut m = test_module();
        let f = m.ctx_mut().get_identifier("f");
        let f1 = m.ctx_mut().get_identifier("f 1#");

        let a = m.derive_unique_internal_name(f);
        let b = m.derive_unique_internal_name(f);
        let c = m.derive_unique_internal_name(f1);
        let d = m.derive_unique_internal_name(f);

        assert_eq!(m.ctx().ident_str(a), "f");
        assert_eq!(m.ctx().ident_str(b), "f 1#");
        assert_eq!(m.ctx().ident_str(c), "f 2#");
        assert_eq!(m.ctx().ident_str(d), "f 3#");
    }

    #[test]
    fn test_unique_internal_name_strips_fresh_suffix() {
        let mut m = test_module();
        let decorated = m.ctx_mut().get_identifier("f 3#");
        let derived = m.derive_unique_internal_name(decorated);
        assert_eq!(m.ctx().ident_str(derived), "f");
    }

    #[test]
    fn test_suffix_stripping_requires_exact_shape() {
        let mut m = test_module();
        for name in ["f#", "f 3", "f3#", "f #", "3#"] {
            let id = m.ctx_mut().get_identifier(name);
            let derived = m.derive_unique_internal_name(id);
            assert_eq!(m.ctx().ident_str(derived), name, "{name} should not strip");
        }
    }

    #[test]
    fn test_unique_internal_name_is_injective() {
        let mut m = test_module();
        let inputs = ["f", "f", "f 1#", "g", "f", "g 2#", "g"];
        let mut seen = FxHashSet::default();
        for name in inputs {
            let id = m.ctx_mut().get_identifier(name);
            let derived = m.derive_unique_internal_name(id);
            assert!(seen.insert(derived), "duplicate internal name");
        }
    }

    #[test]
    fn test_cjs_segment_reachability() {
        let mut m = test_module();
        let w0 = m.create_function_named("w0");
        let w1 = m.create_function_named("w1");
        let w2 = m.create_function_named("w2");
        let w3 = m.create_function_named("w3");

        // w0 uses w1, w1 uses w2; w3 is isolated.
        let b0 = m.create_basic_block(w0);
        let c1 = m.create_create_function(w1);
        m.block_push_back(b0, c1);

        let b1 = m.create_basic_block(w1);
        let c2 = m.create_create_function(w2);
        m.block_push_back(b1, c2);

        for (i, w) in [w0, w1, w2, w3].into_iter().enumerate() {
            let name = m.ctx_mut().get_identifier(&format!("m{i}.js"));
            m.register_cjs_module(name, w);
        }

        let seg0 = m.get_functions_in_segment(SegmentRange { first: 0, last: 0 });
        let expect0: FxHashSet<_> = [w0, w1, w2].into_iter().collect();
        assert_eq!(seg0, expect0);

        let seg3 = m.get_functions_in_segment(SegmentRange { first: 3, last: 3 });
        let expect3: FxHashSet<_> = [w3].into_iter().collect();
        assert_eq!(seg3, expect3);

        let all = m.get_functions_in_segment(SegmentRange { first: 0, last: 3 });
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_cjs_use_graph_is_memoized() {
        let mut m = test_module();
        let w0 = m.create_function_named("w0");
        let w1 = m.create_function_named("w1");

        let b0 = m.create_basic_block(w0);
        let c1 = m.create_create_function(w1);
        m.block_push_back(b0, c1);

        let name0 = m.ctx_mut().get_identifier("m0.js");
        let name1 = m.ctx_mut().get_identifier("m1.js");
        m.register_cjs_module(name0, w0);
        m.register_cjs_module(name1, w1);

        let first = m.get_functions_in_segment(SegmentRange { first: 0, last: 0 });
        assert!(first.contains(&w1));

        // New edges after the first query are not observed: the graph is a
        // one-shot cache.
        let w2 = m.create_function_named("w2");
        let c2 = m.create_create_function(w2);
        m.block_push_back(b0, c2);
        let again = m.get_functions_in_segment(SegmentRange { first: 0, last: 0 });
        assert!(!again.contains(&w2));
    }
}
