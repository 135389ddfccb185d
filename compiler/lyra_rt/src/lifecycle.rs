//! Reference-count lifecycle over flat values.
//!
//! Every ownership transfer in generated code and the interpreter goes
//! through these two functions: `retain_value` when a handle is copied
//! into a new owner, `release_deep` when an owner lets go. When a release
//! drops the count to zero the children are released first and the block
//! is freed after, so no block outlives its owners and no child is freed
//! while a parent still points at it.
//!
//! A corrupt value here means the caller's ownership bookkeeping is
//! already broken, so these functions panic instead of returning errors.

use lyra_types::{BaseType, ElementStorage, Type, TypeHandle, TypeTable};

use crate::encoded::RuntimeValue;
use crate::heap::{
    DictBlock, FunctionBlock, Heap, HeapBlock, JsonBlock, StringBlock, StructBlock, VectorBlock,
};

/// Add one owner to a refcounted value. No-op for scalar types.
///
/// # Panics
/// If the declared type is refcounted but the value does not point at a
/// live block.
pub fn retain_value(value: RuntimeValue, handle: TypeHandle) {
    if !handle.base_type().is_rc_kind() {
        return;
    }
    unsafe {
        match value.live_header() {
            Some(header) => (*header).rc_inc(),
            None => panic!("retain of {}: no live block", handle.base_type()),
        }
    }
}

/// Drop one owner from a value, freeing it and releasing its children
/// if this was the last one. No-op for scalar types.
///
/// # Panics
/// If the declared type is refcounted but the value does not point at a
/// live block of the matching kind, or if `handle` resolves to a type
/// this table never interned.
pub fn release_deep(types: &TypeTable, heap: &Heap, value: RuntimeValue, handle: TypeHandle) {
    match handle.base_type() {
        BaseType::String => unsafe {
            let ptr = checked::<StringBlock>(value);
            if (*ptr).header().rc_dec() == 0 {
                heap.free_block(ptr);
            }
        },
        BaseType::Json => unsafe {
            let ptr = checked::<JsonBlock>(value);
            if (*ptr).header().rc_dec() == 0 {
                heap.free_block(ptr);
            }
        },
        BaseType::Function => unsafe {
            let ptr = checked::<FunctionBlock>(value);
            if (*ptr).header().rc_dec() == 0 {
                heap.free_block(ptr);
            }
        },
        BaseType::Vector => unsafe {
            let ptr = checked::<VectorBlock>(value);
            if (*ptr).header().rc_dec() == 0 {
                release_vector_children(types, heap, &*ptr);
                heap.free_block(ptr);
            }
        },
        BaseType::Dict => unsafe {
            let ptr = checked::<DictBlock>(value);
            if (*ptr).header().rc_dec() == 0 {
                release_dict_children(types, heap, &*ptr);
                heap.free_block(ptr);
            }
        },
        BaseType::Struct => unsafe {
            let ptr = checked::<StructBlock>(value);
            if (*ptr).header().rc_dec() == 0 {
                release_struct_children(types, heap, &*ptr);
                heap.free_block(ptr);
            }
        },
        _ => {}
    }
}

/// Cast to a block of kind `T`, panicking on corruption.
unsafe fn checked<T: HeapBlock>(value: RuntimeValue) -> *mut T {
    match value.block::<T>() {
        Ok(ptr) => ptr,
        Err(err) => panic!("release of corrupt value: {err}"),
    }
}

fn release_vector_children(types: &TypeTable, heap: &Heap, block: &VectorBlock) {
    // Inplace elements are raw scalars and own nothing.
    if block.storage == ElementStorage::External {
        for elem in &block.elements {
            release_deep(types, heap, *elem, block.element_type);
        }
    }
}

fn release_dict_children(types: &TypeTable, heap: &Heap, block: &DictBlock) {
    if block.storage == ElementStorage::External {
        for entry in block.entries.values() {
            release_deep(types, heap, *entry, block.value_type);
        }
    }
}

fn release_struct_children(types: &TypeTable, heap: &Heap, block: &StructBlock) {
    let Type::Struct(def) = types.lookup_type(block.struct_type) else {
        panic!(
            "struct block carries non-struct type {}",
            block.struct_type
        );
    };
    assert_eq!(
        def.members.len(),
        block.members.len(),
        "struct block member count disagrees with its definition"
    );
    for (member, slot) in def.members.iter().zip(&block.members) {
        let member_handle = match types.lookup_itype(&member.ty) {
            Ok(handle) => handle,
            Err(err) => panic!("struct member type was never interned: {err}"),
        };
        // release_deep is a no-op for scalar members.
        release_deep(types, heap, *slot, member_handle);
    }
}
