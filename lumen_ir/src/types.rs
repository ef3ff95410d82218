//! Symbolic type lattice.
//!
//! A [`Type`] is a bitmask over the closed [`TypeKind`] enumeration. The
//! lattice operations are bitwise: union is `|`, intersection is `&`, the
//! empty mask is the bottom element and the full mask is `any`. Closure and
//! regexp types carry the object bit as well, since both are objects; the
//! printer suppresses the redundant `object` annotation for them.

use std::fmt;

/// An element of the closed enumeration spanning the [`Type`] bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeKind {
    Undefined = 0,
    Null,
    Boolean,
    String,
    Number,
    Object,
    Closure,
    RegExp,
}

/// Number of type kinds; bits at or above this index are never set.
pub const NUM_TYPE_KINDS: u16 = 8;

const fn bit(kind: TypeKind) -> u16 {
    1 << kind as u16
}

/// Printable name of a type kind, in the IR's textual convention.
pub const fn type_kind_str(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Undefined => "undefined",
        TypeKind::Null => "null",
        TypeKind::Boolean => "boolean",
        TypeKind::String => "string",
        TypeKind::Number => "number",
        TypeKind::Object => "object",
        TypeKind::Closure => "closure",
        TypeKind::RegExp => "regexp",
    }
}

const ALL_KINDS: [TypeKind; NUM_TYPE_KINDS as usize] = [
    TypeKind::Undefined,
    TypeKind::Null,
    TypeKind::Boolean,
    TypeKind::String,
    TypeKind::Number,
    TypeKind::Object,
    TypeKind::Closure,
    TypeKind::RegExp,
];

/// The symbolic type of an IR value: a bitmask over [`TypeKind`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Type {
    bitmask: u16,
}

impl Type {
    const ANY_BITS: u16 = (1 << NUM_TYPE_KINDS) - 1;
    // Closures and regexps are objects.
    const CLOSURE_BITS: u16 = bit(TypeKind::Object) | bit(TypeKind::Closure);
    const REGEXP_BITS: u16 = bit(TypeKind::Object) | bit(TypeKind::RegExp);

    /// The empty type: no kind bits set.
    #[inline]
    pub const fn no_type() -> Type {
        Type { bitmask: 0 }
    }

    /// The unknown type: every kind bit set.
    #[inline]
    pub const fn any_type() -> Type {
        Type {
            bitmask: Self::ANY_BITS,
        }
    }

    #[inline]
    pub const fn undefined_type() -> Type {
        Type {
            bitmask: bit(TypeKind::Undefined),
        }
    }

    #[inline]
    pub const fn null_type() -> Type {
        Type {
            bitmask: bit(TypeKind::Null),
        }
    }

    #[inline]
    pub const fn boolean_type() -> Type {
        Type {
            bitmask: bit(TypeKind::Boolean),
        }
    }

    #[inline]
    pub const fn string_type() -> Type {
        Type {
            bitmask: bit(TypeKind::String),
        }
    }

    #[inline]
    pub const fn number_type() -> Type {
        Type {
            bitmask: bit(TypeKind::Number),
        }
    }

    #[inline]
    pub const fn object_type() -> Type {
        Type {
            bitmask: bit(TypeKind::Object),
        }
    }

    #[inline]
    pub const fn closure_type() -> Type {
        Type {
            bitmask: Self::CLOSURE_BITS,
        }
    }

    #[inline]
    pub const fn reg_exp_type() -> Type {
        Type {
            bitmask: Self::REGEXP_BITS,
        }
    }

    /// Lattice join of two types.
    #[inline]
    pub const fn union_ty(a: Type, b: Type) -> Type {
        Type {
            bitmask: a.bitmask | b.bitmask,
        }
    }

    /// Lattice meet of two types.
    #[inline]
    pub const fn intersect_ty(a: Type, b: Type) -> Type {
        Type {
            bitmask: a.bitmask & b.bitmask,
        }
    }

    /// Widen this type in place to cover `other` as well.
    #[inline]
    pub fn union_with(&mut self, other: Type) {
        self.bitmask |= other.bitmask;
    }

    /// Narrow this type in place to the kinds shared with `other`.
    #[inline]
    pub fn intersect_with(&mut self, other: Type) {
        self.bitmask &= other.bitmask;
    }

    /// Check if every kind of `self` is also a kind of `other`.
    #[inline]
    pub const fn is_subset_of(self, other: Type) -> bool {
        self.bitmask & !other.bitmask == 0
    }

    #[inline]
    pub const fn is_no_type(self) -> bool {
        self.bitmask == 0
    }

    #[inline]
    pub const fn is_any_type(self) -> bool {
        self.bitmask == Self::ANY_BITS
    }

    // Exact-kind queries: the type is precisely the named kind.

    #[inline]
    pub const fn is_undefined_type(self) -> bool {
        self.bitmask == bit(TypeKind::Undefined)
    }

    #[inline]
    pub const fn is_null_type(self) -> bool {
        self.bitmask == bit(TypeKind::Null)
    }

    #[inline]
    pub const fn is_boolean_type(self) -> bool {
        self.bitmask == bit(TypeKind::Boolean)
    }

    #[inline]
    pub const fn is_string_type(self) -> bool {
        self.bitmask == bit(TypeKind::String)
    }

    #[inline]
    pub const fn is_number_type(self) -> bool {
        self.bitmask == bit(TypeKind::Number)
    }

    #[inline]
    pub const fn is_object_type(self) -> bool {
        self.bitmask == bit(TypeKind::Object)
    }

    #[inline]
    pub const fn is_closure_type(self) -> bool {
        self.bitmask == Self::CLOSURE_BITS
    }

    #[inline]
    pub const fn is_reg_exp_type(self) -> bool {
        self.bitmask == Self::REGEXP_BITS
    }

    // Possibility queries: the named kind is among the set bits.

    #[inline]
    pub const fn can_be_undefined(self) -> bool {
        self.bitmask & bit(TypeKind::Undefined) != 0
    }

    #[inline]
    pub const fn can_be_null(self) -> bool {
        self.bitmask & bit(TypeKind::Null) != 0
    }

    #[inline]
    pub const fn can_be_boolean(self) -> bool {
        self.bitmask & bit(TypeKind::Boolean) != 0
    }

    #[inline]
    pub const fn can_be_string(self) -> bool {
        self.bitmask & bit(TypeKind::String) != 0
    }

    #[inline]
    pub const fn can_be_number(self) -> bool {
        self.bitmask & bit(TypeKind::Number) != 0
    }

    #[inline]
    pub const fn can_be_object(self) -> bool {
        self.bitmask & bit(TypeKind::Object) != 0
    }

    #[inline]
    pub const fn can_be_closure(self) -> bool {
        self.bitmask & bit(TypeKind::Closure) != 0
    }

    #[inline]
    pub const fn can_be_reg_exp(self) -> bool {
        self.bitmask & bit(TypeKind::RegExp) != 0
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in ALL_KINDS {
            // The object annotation is redundant for closures and regexps.
            if matches!(kind, TypeKind::Object) && (self.can_be_closure() || self.can_be_reg_exp())
            {
                continue;
            }
            if self.bitmask & bit(kind) != 0 {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(type_kind_str(kind))?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_and_intersect() {
        let t = Type::union_ty(Type::number_type(), Type::string_type());
        assert!(t.can_be_number());
        assert!(t.can_be_string());
        assert!(!t.can_be_object());
        assert!(Type::number_type().is_subset_of(t));

        let meet = Type::intersect_ty(t, Type::number_type());
        assert!(meet.is_number_type());

        let empty = Type::intersect_ty(Type::number_type(), Type::string_type());
        assert!(empty.is_no_type());
    }

    #[test]
    fn test_exact_vs_possible() {
        assert!(Type::number_type().is_number_type());
        let widened = Type::union_ty(Type::number_type(), Type::undefined_type());
        assert!(!widened.is_number_type());
        assert!(widened.can_be_number());
        assert!(widened.can_be_undefined());
    }

    #[test]
    fn test_closure_implies_object() {
        assert!(Type::closure_type().can_be_object());
        assert!(Type::reg_exp_type().can_be_object());
        assert!(Type::closure_type().is_closure_type());
        assert!(!Type::closure_type().is_object_type());
    }

    #[test]
    fn test_print_enumeration_order() {
        let t = Type::union_ty(Type::string_type(), Type::undefined_type());
        assert_eq!(t.to_string(), "undefined|string");

        let t = Type::union_ty(Type::number_type(), Type::boolean_type());
        assert_eq!(t.to_string(), "boolean|number");
    }

    #[test]
    fn test_print_suppresses_object_for_closure_and_regexp() {
        assert_eq!(Type::closure_type().to_string(), "closure");
        assert_eq!(Type::reg_exp_type().to_string(), "regexp");
        assert_eq!(Type::object_type().to_string(), "object");

        let both = Type::union_ty(Type::closure_type(), Type::reg_exp_type());
        assert_eq!(both.to_string(), "closure|regexp");
    }

    #[test]
    fn test_print_empty_and_any() {
        assert_eq!(Type::no_type().to_string(), "");
        // `any` covers closure, so the object bit is suppressed.
        assert_eq!(
            Type::any_type().to_string(),
            "undefined|null|boolean|string|number|closure|regexp"
        );
    }

    #[test]
    fn test_print_stable_under_union() {
        // Union printing contains exactly the union's kind names.
        let a = Type::union_ty(Type::null_type(), Type::number_type());
        let b = Type::union_ty(Type::number_type(), Type::string_type());
        let u = Type::union_ty(a, b);
        assert_eq!(u.to_string(), "null|string|number");
    }
}
