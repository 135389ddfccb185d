//! Composite value payloads.

use std::collections::BTreeMap;

use lyra_types::{StructDef, Type};

use crate::value::Value;

/// Struct instance: the definition plus one value per member, in
/// declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    /// Member names and types.
    pub def: StructDef,
    /// Member values, parallel to `def.members`.
    pub members: Vec<Value>,
}

impl StructValue {
    /// Iterate `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.def
            .members
            .iter()
            .zip(&self.members)
            .map(|(m, v)| (m.name.as_str(), v))
    }
}

/// Vector instance. The element type is carried so an empty vector still
/// knows its full type.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorValue {
    /// Element type shared by every element.
    pub element_type: Type,
    /// Elements in order.
    pub elements: Vec<Value>,
}

/// Dict instance: string keys, ordered entries.
#[derive(Clone, Debug, PartialEq)]
pub struct DictValue {
    /// Value type shared by every entry.
    pub value_type: Type,
    /// Entries ordered by key.
    pub entries: BTreeMap<String, Value>,
}

/// Symbolic function reference. Functions are values only by name; the
/// body lives with the execution engine that resolves `link_name`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionValue {
    /// The full function type, purity included.
    pub function_type: Type,
    /// Link-time name the engines resolve to an implementation.
    pub link_name: String,
}
