//! Base-type discriminant for tag-driven dispatch.
//!
//! Every type has a `BaseType` identifying its kind. The discriminant order
//! is load-bearing: the first [`TypeTable`](crate::TypeTable) slots are
//! reserved in exactly this order, so a primitive's table index equals its
//! discriminant.

use std::fmt;

/// Type kind discriminant (u8).
///
/// Discriminants 0..=8 are value-carrying primitives, 9..=12 are the
/// composite kinds, 13 is the unresolved-identifier placeholder that must
/// never survive semantic analysis.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum BaseType {
    /// Uninitialized / not-yet-known type.
    Undefined = 0,
    /// Wildcard type, usable only inside function signatures.
    Any = 1,
    /// No-value type for functions that return nothing.
    Void = 2,
    /// Boolean.
    Bool = 3,
    /// 64-bit signed integer.
    Int = 4,
    /// 64-bit IEEE 754 floating point.
    Double = 5,
    /// UTF-8 string.
    String = 6,
    /// Opaque json document.
    Json = 7,
    /// First-class type value.
    Typeid = 8,

    /// Struct with ordered named members.
    Struct = 9,
    /// Vector with a single element type.
    Vector = 10,
    /// Dictionary with string keys and a single value type.
    Dict = 11,
    /// Function with return type, parameters and purity.
    Function = 12,

    /// Unresolved identifier placeholder (pre-semantic-analysis only).
    Unresolved = 13,
}

impl BaseType {
    /// Kinds whose runtime encoding is a pointer to a refcounted heap block.
    #[inline]
    pub const fn is_rc_kind(self) -> bool {
        matches!(
            self,
            BaseType::String
                | BaseType::Json
                | BaseType::Struct
                | BaseType::Vector
                | BaseType::Dict
                | BaseType::Function
        )
    }

    /// Kinds packable as raw scalars inside a container's backing storage.
    #[inline]
    pub const fn is_inplace_scalar(self) -> bool {
        matches!(
            self,
            BaseType::Bool | BaseType::Int | BaseType::Double | BaseType::Typeid
        )
    }

    /// Kinds built from component types.
    #[inline]
    pub const fn is_composite(self) -> bool {
        matches!(
            self,
            BaseType::Struct | BaseType::Vector | BaseType::Dict | BaseType::Function
        )
    }

    /// Human-readable name, matching source syntax where one exists.
    pub const fn name(self) -> &'static str {
        match self {
            BaseType::Undefined => "undefined",
            BaseType::Any => "any",
            BaseType::Void => "void",
            BaseType::Bool => "bool",
            BaseType::Int => "int",
            BaseType::Double => "double",
            BaseType::String => "string",
            BaseType::Json => "json",
            BaseType::Typeid => "typeid",
            BaseType::Struct => "struct",
            BaseType::Vector => "vector",
            BaseType::Dict => "dict",
            BaseType::Function => "function",
            BaseType::Unresolved => "<unresolved>",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_are_fixed() {
        assert_eq!(BaseType::Undefined as u8, 0);
        assert_eq!(BaseType::Any as u8, 1);
        assert_eq!(BaseType::Void as u8, 2);
        assert_eq!(BaseType::Bool as u8, 3);
        assert_eq!(BaseType::Int as u8, 4);
        assert_eq!(BaseType::Double as u8, 5);
        assert_eq!(BaseType::String as u8, 6);
        assert_eq!(BaseType::Json as u8, 7);
        assert_eq!(BaseType::Typeid as u8, 8);
        assert_eq!(BaseType::Struct as u8, 9);
        assert_eq!(BaseType::Vector as u8, 10);
        assert_eq!(BaseType::Dict as u8, 11);
        assert_eq!(BaseType::Function as u8, 12);
        assert_eq!(BaseType::Unresolved as u8, 13);
    }

    #[test]
    fn rc_and_inplace_kinds_are_disjoint() {
        let all = [
            BaseType::Undefined,
            BaseType::Any,
            BaseType::Void,
            BaseType::Bool,
            BaseType::Int,
            BaseType::Double,
            BaseType::String,
            BaseType::Json,
            BaseType::Typeid,
            BaseType::Struct,
            BaseType::Vector,
            BaseType::Dict,
            BaseType::Function,
            BaseType::Unresolved,
        ];
        for bt in all {
            assert!(
                !(bt.is_rc_kind() && bt.is_inplace_scalar()),
                "{bt} is both refcounted and inplace"
            );
        }
    }

    #[test]
    fn composite_kinds() {
        assert!(BaseType::Struct.is_composite());
        assert!(BaseType::Vector.is_composite());
        assert!(BaseType::Dict.is_composite());
        assert!(BaseType::Function.is_composite());
        assert!(!BaseType::Int.is_composite());
        assert!(!BaseType::String.is_composite());
    }
}
