//! Crossing between the boxed [`Value`] tree and the flat encoding.
//!
//! `to_runtime_value` interns every type it encounters, so the flat value
//! always has a table entry describing it. `from_runtime_value` is the
//! inverse and takes the declared handle from the caller, the same way
//! generated code receives it.
//!
//! These functions deref block pointers inside the values they are given.
//! They are not marked `unsafe` because the conversion pipeline only ever
//! hands them values it produced itself, paired with the handle they were
//! produced under. A conversion error is fatal to the caller, so partially
//! built children are not unwound on failure.

use std::collections::BTreeMap;

use lyra_types::{
    dict_value_storage, vector_element_storage, BaseType, ElementStorage, Type, TypeHandle,
    TypeTable,
};
use lyra_value::Value;

use crate::encoded::RuntimeValue;
use crate::error::RuntimeError;
use crate::heap::{
    DictBlock, FunctionBlock, Heap, JsonBlock, StringBlock, StructBlock, VectorBlock,
};

/// Lower a boxed value tree into the flat encoding.
///
/// Aggregates allocate heap blocks with refcount 1; the returned value
/// owns them. Every composite type in the tree is interned as a side
/// effect.
pub fn to_runtime_value(
    types: &mut TypeTable,
    heap: &Heap,
    value: &Value,
) -> Result<RuntimeValue, RuntimeError> {
    match value {
        Value::Undefined | Value::Void => Ok(RuntimeValue::undefined()),
        Value::Bool(b) => Ok(RuntimeValue::from_bool(*b)),
        Value::Int(n) => Ok(RuntimeValue::from_int(*n)),
        Value::Double(d) => Ok(RuntimeValue::from_double(*d)),
        Value::Typeid(handle) => Ok(RuntimeValue::from_typeid(*handle)),
        Value::String(s) => Ok(RuntimeValue::from_block(heap.alloc_string(s.clone()))),
        Value::Json(doc) => Ok(RuntimeValue::from_block(heap.alloc_json(doc.clone()))),
        Value::Vector(v) => {
            let element_handle = types.intern_type(&v.element_type)?;
            types.intern_type(&value.value_type())?;
            let storage = vector_element_storage(&v.element_type);
            let mut elements = Vec::with_capacity(v.elements.len());
            for elem in &v.elements {
                elements.push(match storage {
                    ElementStorage::Inplace => encode_inplace_scalar(&v.element_type, elem)?,
                    ElementStorage::External => to_runtime_value(types, heap, elem)?,
                });
            }
            Ok(RuntimeValue::from_block(heap.alloc_vector(
                element_handle,
                storage,
                elements,
            )))
        }
        Value::Dict(d) => {
            let value_handle = types.intern_type(&d.value_type)?;
            types.intern_type(&value.value_type())?;
            let storage = dict_value_storage(&d.value_type);
            let mut entries = BTreeMap::new();
            for (key, entry) in &d.entries {
                entries.insert(key.clone(), to_runtime_value(types, heap, entry)?);
            }
            Ok(RuntimeValue::from_block(heap.alloc_dict(
                value_handle,
                storage,
                entries,
            )))
        }
        Value::Struct(s) => {
            let struct_handle = types.intern_type(&value.value_type())?;
            let mut members = Vec::with_capacity(s.members.len());
            for member in &s.members {
                members.push(to_runtime_value(types, heap, member)?);
            }
            Ok(RuntimeValue::from_block(
                heap.alloc_struct(struct_handle, members),
            ))
        }
        Value::Function(f) => {
            types.intern_type(&f.function_type)?;
            Ok(RuntimeValue::from_block(
                heap.alloc_function(f.link_name.clone()),
            ))
        }
    }
}

/// Encode one inplace vector element. The element must be the scalar the
/// vector's element type declares.
fn encode_inplace_scalar(element_type: &Type, elem: &Value) -> Result<RuntimeValue, RuntimeError> {
    match (element_type, elem) {
        (Type::Bool, Value::Bool(b)) => Ok(RuntimeValue::from_bool(*b)),
        (Type::Int, Value::Int(n)) => Ok(RuntimeValue::from_int(*n)),
        (Type::Double, Value::Double(d)) => Ok(RuntimeValue::from_double(*d)),
        (Type::Typeid, Value::Typeid(h)) => Ok(RuntimeValue::from_typeid(*h)),
        _ => Err(RuntimeError::mismatch(element_type, elem.value_type())),
    }
}

/// Lift a flat value back into a boxed tree, guided by its declared
/// handle. The flat value keeps its references; the result is an
/// independent deep copy.
pub fn from_runtime_value(
    types: &TypeTable,
    value: RuntimeValue,
    handle: TypeHandle,
) -> Result<Value, RuntimeError> {
    match handle.base_type() {
        BaseType::Undefined => Ok(Value::Undefined),
        BaseType::Void => Ok(Value::Void),
        BaseType::Bool => Ok(Value::Bool(unsafe { value.as_bool() })),
        BaseType::Int => Ok(Value::Int(unsafe { value.as_int() })),
        BaseType::Double => Ok(Value::Double(unsafe { value.as_double() })),
        BaseType::Typeid => Ok(Value::Typeid(unsafe { value.as_typeid() })),
        BaseType::String => {
            let block = unsafe { &*value.block::<StringBlock>()? };
            Ok(Value::String(block.data.clone()))
        }
        BaseType::Json => {
            let block = unsafe { &*value.block::<JsonBlock>()? };
            Ok(Value::Json(block.doc.clone()))
        }
        BaseType::Vector => {
            let Type::Vector(element_type) = types.lookup_type(handle) else {
                return Err(RuntimeError::mismatch("vector", types.lookup_type(handle)));
            };
            let block = unsafe { &*value.block::<VectorBlock>()? };
            let mut elements = Vec::with_capacity(block.elements.len());
            for elem in &block.elements {
                elements.push(match block.storage {
                    ElementStorage::Inplace => decode_inplace_scalar(element_type, *elem)?,
                    ElementStorage::External => {
                        from_runtime_value(types, *elem, block.element_type)?
                    }
                });
            }
            Ok(Value::vector((**element_type).clone(), elements))
        }
        BaseType::Dict => {
            let Type::Dict(value_type) = types.lookup_type(handle) else {
                return Err(RuntimeError::mismatch("dict", types.lookup_type(handle)));
            };
            let block = unsafe { &*value.block::<DictBlock>()? };
            let mut entries = BTreeMap::new();
            for (key, entry) in &block.entries {
                entries.insert(
                    key.clone(),
                    from_runtime_value(types, *entry, block.value_type)?,
                );
            }
            Ok(Value::dict((**value_type).clone(), entries))
        }
        BaseType::Struct => {
            let Type::Struct(def) = types.lookup_type(handle) else {
                return Err(RuntimeError::mismatch("struct", types.lookup_type(handle)));
            };
            let block = unsafe { &*value.block::<StructBlock>()? };
            if block.members.len() != def.members.len() {
                return Err(RuntimeError::mismatch(
                    format!("struct with {} members", def.members.len()),
                    format!("struct block with {} members", block.members.len()),
                ));
            }
            let mut members = Vec::with_capacity(def.members.len());
            for (member, slot) in def.members.iter().zip(&block.members) {
                let member_handle = types.lookup_itype(&member.ty)?;
                members.push(from_runtime_value(types, *slot, member_handle)?);
            }
            Ok(Value::struct_value(def.clone(), members))
        }
        BaseType::Function => {
            let function_type = types.lookup_type(handle).clone();
            let block = unsafe { &*value.block::<FunctionBlock>()? };
            Ok(Value::function(function_type, block.link_name.clone()))
        }
        BaseType::Any | BaseType::Unresolved => Err(RuntimeError::mismatch(
            "a concrete type",
            handle.base_type(),
        )),
    }
}

/// Decode one inplace vector element back into a boxed scalar.
fn decode_inplace_scalar(element_type: &Type, elem: RuntimeValue) -> Result<Value, RuntimeError> {
    match element_type {
        Type::Bool => Ok(Value::Bool(unsafe { elem.as_bool() })),
        Type::Int => Ok(Value::Int(unsafe { elem.as_int() })),
        Type::Double => Ok(Value::Double(unsafe { elem.as_double() })),
        Type::Typeid => Ok(Value::Typeid(unsafe { elem.as_typeid() })),
        other => Err(RuntimeError::mismatch("an inplace scalar", other)),
    }
}

/// Allocate a string block directly, without a `Value` detour.
pub fn to_runtime_string(heap: &Heap, text: impl Into<String>) -> RuntimeValue {
    RuntimeValue::from_block(heap.alloc_string(text.into()))
}

/// Read a string value back out as an owned `String`.
pub fn from_runtime_string(value: RuntimeValue) -> Result<String, RuntimeError> {
    let block = unsafe { &*value.block::<StringBlock>()? };
    Ok(block.data.clone())
}
