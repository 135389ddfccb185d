//! The `Value` tree.

use std::collections::BTreeMap;
use std::fmt;

use lyra_types::{StructDef, Type, TypeHandle};

use crate::composite::{DictValue, FunctionValue, StructValue, VectorValue};

/// Boxed runtime value, mirroring the [`Type`] variants.
///
/// Construct values through the factory methods; they keep the carried
/// type information consistent with the payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Uninitialized value.
    Undefined,
    /// The no-value result of a void call.
    Void,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Opaque json document.
    Json(serde_json::Value),
    /// First-class type value.
    Typeid(TypeHandle),
    /// Struct instance.
    Struct(StructValue),
    /// Vector instance.
    Vector(VectorValue),
    /// Dict instance.
    Dict(DictValue),
    /// Symbolic function reference.
    Function(FunctionValue),
}

impl Value {
    /// Create an integer value.
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a double value.
    #[inline]
    pub fn double(d: f64) -> Self {
        Value::Double(d)
    }

    /// Create a bool value.
    #[inline]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a json value.
    pub fn json(doc: serde_json::Value) -> Self {
        Value::Json(doc)
    }

    /// Create a typeid value.
    #[inline]
    pub fn typeid(handle: TypeHandle) -> Self {
        Value::Typeid(handle)
    }

    /// Create a struct value.
    ///
    /// # Panics
    /// If the member count does not match the definition.
    pub fn struct_value(def: StructDef, members: Vec<Value>) -> Self {
        assert_eq!(
            def.members.len(),
            members.len(),
            "struct value arity does not match its definition"
        );
        Value::Struct(StructValue { def, members })
    }

    /// Create a vector value.
    pub fn vector(element_type: Type, elements: Vec<Value>) -> Self {
        Value::Vector(VectorValue {
            element_type,
            elements,
        })
    }

    /// Create a dict value.
    pub fn dict(value_type: Type, entries: BTreeMap<String, Value>) -> Self {
        Value::Dict(DictValue {
            value_type,
            entries,
        })
    }

    /// Create a function value.
    pub fn function(function_type: Type, link_name: impl Into<String>) -> Self {
        Value::Function(FunctionValue {
            function_type,
            link_name: link_name.into(),
        })
    }

    /// The full structural type of this value.
    pub fn value_type(&self) -> Type {
        match self {
            Value::Undefined => Type::Undefined,
            Value::Void => Type::Void,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Double(_) => Type::Double,
            Value::String(_) => Type::String,
            Value::Json(_) => Type::Json,
            Value::Typeid(_) => Type::Typeid,
            Value::Struct(s) => Type::Struct(s.def.clone()),
            Value::Vector(v) => Type::vector(v.element_type.clone()),
            Value::Dict(d) => Type::dict(d.value_type.clone()),
            Value::Function(f) => f.function_type.clone(),
        }
    }

    /// Read an integer, if that is what this is.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Read a bool, if that is what this is.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read a string slice, if that is what this is.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Member value by name, for struct values.
    pub fn struct_member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(s) => s.iter().find(|(n, _)| *n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Compact one-line rendering for traces and error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Void => write!(f, "void"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Json(doc) => write!(f, "{doc}"),
            Value::Typeid(handle) => write!(f, "{handle}"),
            Value::Struct(s) => {
                write!(f, "{{")?;
                for (i, (name, value)) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Vector(v) => {
                write!(f, "[")?;
                for (i, e) in v.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "]")
            }
            Value::Dict(d) => {
                write!(f, "{{")?;
                for (i, (k, v)) in d.entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "{}", func.link_name),
        }
    }
}
