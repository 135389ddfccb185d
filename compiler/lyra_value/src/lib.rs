//! Boxed tree values for Lyra.
//!
//! [`Value`] is the canonical value representation outside the execution
//! engines: built-in library functions and host embedders construct
//! `Value`s, and the runtime converts them to and from the flat encoding.
//!
//! Values are pure trees. `Clone` is an independent deep copy; nothing at
//! this layer is shared or refcounted. Composite values carry enough
//! structural type information that the full [`lyra_types::Type`] of any
//! value is recoverable without consulting a type table.

mod composite;
mod value;

pub use composite::{DictValue, FunctionValue, StructValue, VectorValue};
pub use value::Value;
