//! Element access over flat aggregates.
//!
//! The returned values are borrowed copies: reading never touches
//! reference counts, and the caller must `retain_value` before storing a
//! result anywhere that outlives the aggregate. Out-of-range indexes and
//! missing keys are catchable [`RuntimeError::InvalidAggregateAccess`]
//! errors; a value that is not the aggregate its handle claims is a
//! `TypeMismatch`.

use crate::encoded::RuntimeValue;
use crate::error::RuntimeError;
use crate::heap::{DictBlock, StructBlock, VectorBlock};

/// Number of elements in a vector value.
pub fn vector_size(value: RuntimeValue) -> Result<usize, RuntimeError> {
    let block = unsafe { &*value.block::<VectorBlock>()? };
    Ok(block.elements.len())
}

/// Element of a vector value by index.
pub fn vector_get(value: RuntimeValue, index: usize) -> Result<RuntimeValue, RuntimeError> {
    let block = unsafe { &*value.block::<VectorBlock>()? };
    block
        .elements
        .get(index)
        .copied()
        .ok_or_else(|| RuntimeError::index_out_of_range(index, block.elements.len()))
}

/// Number of entries in a dict value.
pub fn dict_size(value: RuntimeValue) -> Result<usize, RuntimeError> {
    let block = unsafe { &*value.block::<DictBlock>()? };
    Ok(block.entries.len())
}

/// Entry of a dict value by key.
pub fn dict_get(value: RuntimeValue, key: &str) -> Result<RuntimeValue, RuntimeError> {
    let block = unsafe { &*value.block::<DictBlock>()? };
    block
        .entries
        .get(key)
        .copied()
        .ok_or_else(|| RuntimeError::key_not_found(key))
}

/// Member of a struct value by declaration index.
pub fn struct_member(value: RuntimeValue, index: usize) -> Result<RuntimeValue, RuntimeError> {
    let block = unsafe { &*value.block::<StructBlock>()? };
    block
        .members
        .get(index)
        .copied()
        .ok_or_else(|| RuntimeError::no_such_member(index, block.members.len()))
}
