//! Lyra runtime value core.
//!
//! This crate holds the flat value representation shared by the
//! interpreter and the native-code backend:
//!
//! - [`RuntimeValue`]: an 8-byte untagged union — scalars by value,
//!   aggregates as a pointer to a refcounted heap block
//! - [`Heap`]: block allocation with live/total counters
//! - [`to_runtime_value`] / [`from_runtime_value`]: the only sanctioned
//!   crossing between boxed [`lyra_value::Value`] trees and the flat form
//! - [`retain_value`] / [`release_deep`]: the sanctioned lifetime
//!   operations at every ownership-transfer point (assignment, scope exit,
//!   function return)
//! - element access over aggregates with catchable out-of-range errors
//!
//! # Ownership model
//!
//! A `RuntimeValue` of aggregate type is an owning handle: whoever holds
//! it owes exactly one `release_deep`. Copying a handle without
//! `retain_value` creates a borrow, not an owner. Reference counts are
//! plain cells — one heap is owned by one execution instance, and sharing
//! a single instance across threads is out of scope.
//!
//! # Safety
//!
//! The union is untagged; the declared [`TypeHandle`](lyra_types::TypeHandle)
//! travels separately, exactly as it does through generated code. Heap
//! blocks carry a kind tag and a magic word in their header, so every cast
//! from a handle back to a block is checked — a disagreement between the
//! declared type and the physical block is a `TypeMismatch`, which
//! indicates a compiler defect upstream, never a user error.

mod access;
mod convert;
mod encoded;
mod error;
mod heap;
mod lifecycle;

pub use access::{dict_get, dict_size, struct_member, vector_get, vector_size};
pub use convert::{
    from_runtime_string, from_runtime_value, to_runtime_string, to_runtime_value,
};
pub use encoded::RuntimeValue;
pub use error::RuntimeError;
pub use heap::{
    AllocHeader, BlockKind, DictBlock, FunctionBlock, Heap, HeapBlock, JsonBlock, StringBlock,
    StructBlock, VectorBlock,
};
pub use lifecycle::{release_deep, retain_value};

// The flat encoding must stay pointer-sized: it is passed in registers by
// generated code.
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::RuntimeValue;
    const _: () = assert!(std::mem::size_of::<RuntimeValue>() == 8);
}

#[cfg(test)]
mod tests;
