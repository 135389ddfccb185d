//! Compact interned type handle.
//!
//! `TypeHandle` is the canonical runtime type representation: it is what
//! gets threaded through generated instructions and call signatures.
//!
//! # Design
//!
//! - 8 bytes, `Copy`, `repr(C)` so it can live inside the flat runtime
//!   value encoding
//! - Primitive handles are fixed constants whose table index equals the
//!   `BaseType` discriminant
//! - Handle equality is O(1) and equivalent to structural type equality
//!   for handles produced by the same table
//! - Container handles cache the element base type so hot element-access
//!   paths can pick an encoding without a table indirection

use std::fmt;

use crate::base::BaseType;

/// Compact, stable reference to an entry in a [`TypeTable`](crate::TypeTable).
///
/// Two handles are equal iff they have the same base type and the same
/// table index. `element_base` is derived from the entry, so the derived
/// `PartialEq` is equivalent to that rule.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(C)]
pub struct TypeHandle {
    index: u32,
    base: BaseType,
    element_base: BaseType,
}

impl TypeHandle {
    /// The `undefined` type.
    pub const UNDEFINED: Self = Self::primitive(BaseType::Undefined);
    /// The `any` type.
    pub const ANY: Self = Self::primitive(BaseType::Any);
    /// The `void` type.
    pub const VOID: Self = Self::primitive(BaseType::Void);
    /// The `bool` type.
    pub const BOOL: Self = Self::primitive(BaseType::Bool);
    /// The `int` type.
    pub const INT: Self = Self::primitive(BaseType::Int);
    /// The `double` type.
    pub const DOUBLE: Self = Self::primitive(BaseType::Double);
    /// The `string` type.
    pub const STRING: Self = Self::primitive(BaseType::String);
    /// The `json` type.
    pub const JSON: Self = Self::primitive(BaseType::Json);
    /// The `typeid` type.
    pub const TYPEID: Self = Self::primitive(BaseType::Typeid);

    pub(crate) const fn primitive(base: BaseType) -> Self {
        Self {
            index: base as u32,
            base,
            element_base: BaseType::Undefined,
        }
    }

    /// Handle for a struct entry at `index`.
    #[inline]
    pub(crate) const fn make_struct(index: u32) -> Self {
        Self {
            index,
            base: BaseType::Struct,
            element_base: BaseType::Undefined,
        }
    }

    /// Handle for a vector entry at `index` with the given element kind.
    #[inline]
    pub(crate) const fn make_vector(index: u32, element_base: BaseType) -> Self {
        Self {
            index,
            base: BaseType::Vector,
            element_base,
        }
    }

    /// Handle for a dict entry at `index` with the given value kind.
    #[inline]
    pub(crate) const fn make_dict(index: u32, value_base: BaseType) -> Self {
        Self {
            index,
            base: BaseType::Dict,
            element_base: value_base,
        }
    }

    /// Handle for a function entry at `index`.
    #[inline]
    pub(crate) const fn make_function(index: u32) -> Self {
        Self {
            index,
            base: BaseType::Function,
            element_base: BaseType::Undefined,
        }
    }

    /// The base-type discriminator.
    #[inline]
    pub const fn base_type(self) -> BaseType {
        self.base
    }

    /// The table index this handle refers to.
    #[inline]
    pub const fn lookup_index(self) -> u32 {
        self.index
    }

    /// Cached element base type: the element kind for vectors, the value
    /// kind for dicts, `Undefined` for everything else.
    #[inline]
    pub const fn element_base_type(self) -> BaseType {
        self.element_base
    }

    /// Whether this handle refers to a reserved primitive slot.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        !self.base.is_composite()
    }

    /// Whether values of this type are refcounted heap aggregates.
    #[inline]
    pub const fn is_rc_kind(self) -> bool {
        self.base.is_rc_kind()
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_primitive() {
            write!(f, "TypeHandle::{}", self.base.name().to_uppercase())
        } else if self.element_base == BaseType::Undefined {
            write!(f, "TypeHandle({}#{})", self.base, self.index)
        } else {
            write!(
                f,
                "TypeHandle({}<{}>#{})",
                self.base, self.element_base, self.index
            )
        }
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_primitive() {
            write!(f, "{}", self.base)
        } else {
            write!(f, "type#{}", self.index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_indices_match_discriminants() {
        assert_eq!(TypeHandle::UNDEFINED.lookup_index(), 0);
        assert_eq!(TypeHandle::ANY.lookup_index(), 1);
        assert_eq!(TypeHandle::VOID.lookup_index(), 2);
        assert_eq!(TypeHandle::BOOL.lookup_index(), 3);
        assert_eq!(TypeHandle::INT.lookup_index(), 4);
        assert_eq!(TypeHandle::DOUBLE.lookup_index(), 5);
        assert_eq!(TypeHandle::STRING.lookup_index(), 6);
        assert_eq!(TypeHandle::JSON.lookup_index(), 7);
        assert_eq!(TypeHandle::TYPEID.lookup_index(), 8);
    }

    #[test]
    fn handle_is_copy_and_comparable() {
        let a = TypeHandle::INT;
        let b = a;
        assert_eq!(a, b);
        assert_ne!(TypeHandle::INT, TypeHandle::DOUBLE);
        assert_eq!(
            TypeHandle::make_vector(20, BaseType::Int),
            TypeHandle::make_vector(20, BaseType::Int)
        );
    }

    #[test]
    fn container_handles_cache_element_base() {
        let v = TypeHandle::make_vector(17, BaseType::Double);
        assert_eq!(v.base_type(), BaseType::Vector);
        assert_eq!(v.element_base_type(), BaseType::Double);
        assert_eq!(v.lookup_index(), 17);

        let d = TypeHandle::make_dict(18, BaseType::String);
        assert_eq!(d.base_type(), BaseType::Dict);
        assert_eq!(d.element_base_type(), BaseType::String);
    }

    #[test]
    fn rc_kind_follows_base() {
        assert!(TypeHandle::STRING.is_rc_kind());
        assert!(TypeHandle::make_struct(30).is_rc_kind());
        assert!(!TypeHandle::INT.is_rc_kind());
        assert!(!TypeHandle::TYPEID.is_rc_kind());
    }
}
