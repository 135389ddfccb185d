//! Boxed structural type tree.
//!
//! `Type` is what semantic analysis hands to the [`TypeTable`](crate::TypeTable):
//! a fully resolved tree where composite kinds own their component types by
//! value. Equality and hashing are structural and order-sensitive.

use std::fmt;

use crate::base::BaseType;

/// Function purity marker.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Purity {
    /// May not touch the outside world; calls are referentially transparent.
    Pure,
    /// May perform effects.
    Impure,
}

/// One named struct member.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Member {
    /// Member name as written in the declaration.
    pub name: String,
    /// Fully resolved member type.
    pub ty: Type,
}

impl Member {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Member {
            name: name.into(),
            ty,
        }
    }
}

/// Struct definition: ordered named members.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StructDef {
    /// Members in declaration order. Order is part of structural identity.
    pub members: Vec<Member>,
}

impl StructDef {
    /// Convenience constructor.
    pub fn new(members: Vec<Member>) -> Self {
        StructDef { members }
    }
}

/// Structural description of a value's shape.
///
/// The variant set is closed; all dispatch over it is exhaustive `match`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    /// Uninitialized / not-yet-known.
    Undefined,
    /// Signature wildcard; has no values.
    Any,
    /// No value.
    Void,
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Double,
    /// UTF-8 string.
    String,
    /// Opaque json document.
    Json,
    /// First-class type value.
    Typeid,
    /// Struct with ordered named members.
    Struct(StructDef),
    /// Vector of one element type.
    Vector(Box<Type>),
    /// Dictionary with string keys and one value type.
    Dict(Box<Type>),
    /// Function type.
    Function {
        /// Return type.
        ret: Box<Type>,
        /// Parameter types in declaration order.
        params: Vec<Type>,
        /// Purity marker.
        purity: Purity,
    },
    /// Unresolved identifier placeholder. Must never reach interning.
    Unresolved(String),
}

impl Type {
    /// Create a vector type.
    pub fn vector(element: Type) -> Self {
        Type::Vector(Box::new(element))
    }

    /// Create a dict type.
    pub fn dict(value: Type) -> Self {
        Type::Dict(Box::new(value))
    }

    /// Create a struct type.
    pub fn struct_def(members: Vec<Member>) -> Self {
        Type::Struct(StructDef::new(members))
    }

    /// Create a function type.
    pub fn function(ret: Type, params: Vec<Type>, purity: Purity) -> Self {
        Type::Function {
            ret: Box::new(ret),
            params,
            purity,
        }
    }

    /// The base-type discriminator of this type.
    pub const fn base_type(&self) -> BaseType {
        match self {
            Type::Undefined => BaseType::Undefined,
            Type::Any => BaseType::Any,
            Type::Void => BaseType::Void,
            Type::Bool => BaseType::Bool,
            Type::Int => BaseType::Int,
            Type::Double => BaseType::Double,
            Type::String => BaseType::String,
            Type::Json => BaseType::Json,
            Type::Typeid => BaseType::Typeid,
            Type::Struct(_) => BaseType::Struct,
            Type::Vector(_) => BaseType::Vector,
            Type::Dict(_) => BaseType::Dict,
            Type::Function { .. } => BaseType::Function,
            Type::Unresolved(_) => BaseType::Unresolved,
        }
    }

    /// First `Unresolved` placeholder name reachable in this tree, if any.
    pub fn find_unresolved(&self) -> Option<&str> {
        match self {
            Type::Unresolved(name) => Some(name),
            Type::Struct(def) => def.members.iter().find_map(|m| m.ty.find_unresolved()),
            Type::Vector(elem) | Type::Dict(elem) => elem.find_unresolved(),
            Type::Function { ret, params, .. } => ret
                .find_unresolved()
                .or_else(|| params.iter().find_map(Type::find_unresolved)),
            _ => None,
        }
    }

    /// Whether this tree contains no `Unresolved` placeholder anywhere.
    pub fn is_fully_resolved(&self) -> bool {
        self.find_unresolved().is_none()
    }
}

impl fmt::Display for Type {
    /// Compact one-line rendering, e.g. `[int]`, `{string: double}`,
    /// `struct {a: int, b: [double]}`, `func string(int, bool) pure`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Struct(def) => {
                write!(f, "struct {{")?;
                for (i, m) in def.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", m.name, m.ty)?;
                }
                write!(f, "}}")
            }
            Type::Vector(elem) => write!(f, "[{elem}]"),
            Type::Dict(value) => write!(f, "{{string: {value}}}"),
            Type::Function {
                ret,
                params,
                purity,
            } => {
                write!(f, "func {ret}(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                let p = match purity {
                    Purity::Pure => "pure",
                    Purity::Impure => "impure",
                };
                write!(f, ") {p}")
            }
            Type::Unresolved(name) => write!(f, "<unresolved `{name}`>"),
            other => write!(f, "{}", other.base_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_is_order_sensitive() {
        let a = Type::struct_def(vec![
            Member::new("x", Type::Int),
            Member::new("y", Type::Double),
        ]);
        let b = Type::struct_def(vec![
            Member::new("y", Type::Double),
            Member::new("x", Type::Int),
        ]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn resolution_check_recurses() {
        let ok = Type::vector(Type::struct_def(vec![Member::new("a", Type::Int)]));
        assert!(ok.is_fully_resolved());

        let bad = Type::vector(Type::struct_def(vec![Member::new(
            "a",
            Type::Unresolved("point".to_string()),
        )]));
        assert!(!bad.is_fully_resolved());
    }

    #[test]
    fn display_is_compact() {
        let t = Type::dict(Type::vector(Type::Int));
        assert_eq!(t.to_string(), "{string: [int]}");

        let f = Type::function(Type::String, vec![Type::Int, Type::Bool], Purity::Pure);
        assert_eq!(f.to_string(), "func string(int, bool) pure");
    }
}
