//! Container element encoding policy.
//!
//! A container's backing storage either packs elements inline as raw
//! scalars, or holds one independently refcounted handle per element.
//! The choice is a pure function of the element type and is identical for
//! the interpreter and the native backend — the two must agree on physical
//! layout for values to cross between them.
//!
//! Policy: a vector packs inline iff its element base type is a scalar
//! (bool, int, double, typeid). Dict values are always external. This is a
//! deliberate conservative decision, not an inferred heuristic.

use crate::base::BaseType;
use crate::core::Type;

/// Physical storage of container elements.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ElementStorage {
    /// Elements packed contiguously as raw scalars; the container owns
    /// the storage, elements own nothing.
    Inplace,
    /// One owning, independently refcounted handle per element.
    External,
}

impl ElementStorage {
    /// Storage for a vector whose element kind is `element_base`.
    #[inline]
    pub const fn for_vector_element(element_base: BaseType) -> Self {
        if element_base.is_inplace_scalar() {
            ElementStorage::Inplace
        } else {
            ElementStorage::External
        }
    }

    /// Storage for a dict value. Always external.
    #[inline]
    pub const fn for_dict_value(_value_base: BaseType) -> Self {
        ElementStorage::External
    }
}

/// Storage for a vector with the given element type.
#[inline]
pub fn vector_element_storage(element: &Type) -> ElementStorage {
    ElementStorage::for_vector_element(element.base_type())
}

/// Storage for a dict with the given value type.
#[inline]
pub fn dict_value_storage(value: &Type) -> ElementStorage {
    ElementStorage::for_dict_value(value.base_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Member;

    #[test]
    fn scalar_vector_elements_pack_inline() {
        assert_eq!(vector_element_storage(&Type::Bool), ElementStorage::Inplace);
        assert_eq!(vector_element_storage(&Type::Int), ElementStorage::Inplace);
        assert_eq!(
            vector_element_storage(&Type::Double),
            ElementStorage::Inplace
        );
        assert_eq!(
            vector_element_storage(&Type::Typeid),
            ElementStorage::Inplace
        );
    }

    #[test]
    fn aggregate_vector_elements_are_external() {
        assert_eq!(
            vector_element_storage(&Type::String),
            ElementStorage::External
        );
        assert_eq!(
            vector_element_storage(&Type::Json),
            ElementStorage::External
        );
        assert_eq!(
            vector_element_storage(&Type::vector(Type::Int)),
            ElementStorage::External
        );
        assert_eq!(
            vector_element_storage(&Type::struct_def(vec![Member::new("a", Type::Int)])),
            ElementStorage::External
        );
    }

    #[test]
    fn dict_values_are_always_external() {
        assert_eq!(dict_value_storage(&Type::Int), ElementStorage::External);
        assert_eq!(dict_value_storage(&Type::String), ElementStorage::External);
    }
}
