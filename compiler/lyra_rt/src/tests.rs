//! Tests for the flat value encoding, conversion, lifecycle, and access.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;

use lyra_types::{ElementStorage, Member, Purity, StructDef, Type, TypeHandle, TypeTable};
use lyra_value::Value;

use super::*;

fn fixture() -> (TypeTable, Heap) {
    (TypeTable::new(), Heap::new())
}

// ── Scalars ─────────────────────────────────────────────────────────────

#[test]
fn scalars_round_trip_without_allocating() {
    let (mut types, heap) = fixture();
    let cases = [
        (Value::bool(true), TypeHandle::BOOL),
        (Value::int(-42), TypeHandle::INT),
        (Value::double(2.5), TypeHandle::DOUBLE),
        (Value::typeid(TypeHandle::STRING), TypeHandle::TYPEID),
    ];
    for (value, handle) in cases {
        let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
        let back = from_runtime_value(&types, flat, handle).unwrap();
        assert_eq!(back, value);
    }
    assert_eq!(heap.alive_count(), 0);
}

#[test]
fn typeid_cells_are_fully_initialized() {
    // TypeHandle leaves two padding bytes in the 8-byte cell; equal
    // handles must produce bit-identical cells for raw reads.
    let a = RuntimeValue::from_typeid(TypeHandle::STRING);
    let b = RuntimeValue::from_typeid(TypeHandle::STRING);
    assert_eq!(format!("{a:?}"), format!("{b:?}"));
    assert_eq!(unsafe { a.as_typeid() }, TypeHandle::STRING);
}

#[test]
fn undefined_and_void_lift_back_as_themselves() {
    let (mut types, heap) = fixture();
    let flat = to_runtime_value(&mut types, &heap, &Value::Undefined).unwrap();
    assert_eq!(
        from_runtime_value(&types, flat, TypeHandle::UNDEFINED).unwrap(),
        Value::Undefined
    );
    assert_eq!(
        from_runtime_value(&types, flat, TypeHandle::VOID).unwrap(),
        Value::Void
    );
}

// ── Strings and json ────────────────────────────────────────────────────

#[test]
fn string_round_trip_allocates_one_block() {
    let (mut types, heap) = fixture();
    let value = Value::string("hello");
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    assert_eq!(heap.alive_count(), 1);

    let back = from_runtime_value(&types, flat, TypeHandle::STRING).unwrap();
    assert_eq!(back, value);

    release_deep(&types, &heap, flat, TypeHandle::STRING);
    assert_eq!(heap.alive_count(), 0);
    assert_eq!(heap.free_count(), 1);
}

#[test]
fn string_helpers_round_trip() {
    let (types, heap) = fixture();
    let flat = to_runtime_string(&heap, "runtime text");
    assert_eq!(from_runtime_string(flat).unwrap(), "runtime text");
    release_deep(&types, &heap, flat, TypeHandle::STRING);
    assert_eq!(heap.alive_count(), 0);
}

#[test]
fn json_round_trips_as_an_opaque_document() {
    let (mut types, heap) = fixture();
    let doc = serde_json::json!({"pi": 3.14, "tags": ["a", "b"]});
    let value = Value::json(doc.clone());
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    let back = from_runtime_value(&types, flat, TypeHandle::JSON).unwrap();
    assert_eq!(back, Value::Json(doc));
    release_deep(&types, &heap, flat, TypeHandle::JSON);
    assert_eq!(heap.alive_count(), 0);
}

// ── Vectors ─────────────────────────────────────────────────────────────

#[test]
fn int_vector_packs_inline_in_a_single_block() {
    let (mut types, heap) = fixture();
    let value = Value::vector(Type::Int, vec![Value::int(1), Value::int(2), Value::int(3)]);
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    // Inplace scalars: the vector block is the only allocation.
    assert_eq!(heap.alive_count(), 1);

    let handle = types.lookup_itype(&Type::vector(Type::Int)).unwrap();
    assert_eq!(vector_size(flat).unwrap(), 3);
    let back = from_runtime_value(&types, flat, handle).unwrap();
    assert_eq!(back, value);

    release_deep(&types, &heap, flat, handle);
    assert_eq!(heap.alive_count(), 0);
}

#[test]
fn string_vector_holds_one_block_per_element() {
    let (mut types, heap) = fixture();
    let value = Value::vector(
        Type::String,
        vec![Value::string("a"), Value::string("b"), Value::string("c")],
    );
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    assert_eq!(heap.alive_count(), 4);

    let handle = types.lookup_itype(&Type::vector(Type::String)).unwrap();
    let back = from_runtime_value(&types, flat, handle).unwrap();
    assert_eq!(back, value);

    release_deep(&types, &heap, flat, handle);
    assert_eq!(heap.alive_count(), 0);
}

#[test]
fn lowering_interns_the_container_type_itself() {
    let (mut types, heap) = fixture();

    let vector = to_runtime_value(
        &mut types,
        &heap,
        &Value::vector(Type::Int, vec![Value::int(1)]),
    )
    .unwrap();
    let dict = to_runtime_value(&mut types, &heap, &Value::dict(Type::String, BTreeMap::new()))
        .unwrap();

    // The handles callers need for from_runtime_value and release_deep
    // must be obtainable by pure lookup after lowering.
    let vector_handle = types
        .lookup_itype(&Type::vector(Type::Int))
        .expect("vector type interned by lowering");
    let dict_handle = types
        .lookup_itype(&Type::dict(Type::String))
        .expect("dict type interned by lowering");

    release_deep(&types, &heap, vector, vector_handle);
    release_deep(&types, &heap, dict, dict_handle);
    assert_eq!(heap.alive_count(), 0);
}

#[test]
fn vector_get_reads_inplace_elements() {
    let (mut types, heap) = fixture();
    let value = Value::vector(Type::Int, vec![Value::int(10), Value::int(20)]);
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    let elem = vector_get(flat, 1).unwrap();
    assert_eq!(unsafe { elem.as_int() }, 20);

    let handle = types.lookup_itype(&Type::vector(Type::Int)).unwrap();
    release_deep(&types, &heap, flat, handle);
}

#[test]
fn vector_get_out_of_range_is_catchable() {
    let (mut types, heap) = fixture();
    let value = Value::vector(Type::Int, vec![Value::int(1)]);
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    let err = vector_get(flat, 5).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidAggregateAccess { .. }));

    let handle = types.lookup_itype(&Type::vector(Type::Int)).unwrap();
    release_deep(&types, &heap, flat, handle);
}

// ── Dicts ───────────────────────────────────────────────────────────────

#[test]
fn dict_round_trips_with_ordered_keys() {
    let (mut types, heap) = fixture();
    let mut entries = BTreeMap::new();
    entries.insert("zebra".to_string(), Value::int(1));
    entries.insert("apple".to_string(), Value::int(2));
    let value = Value::dict(Type::Int, entries);

    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    let handle = types.lookup_itype(&Type::dict(Type::Int)).unwrap();
    assert_eq!(dict_size(flat).unwrap(), 2);
    assert_eq!(unsafe { dict_get(flat, "apple").unwrap().as_int() }, 2);

    let back = from_runtime_value(&types, flat, handle).unwrap();
    assert_eq!(back, value);

    release_deep(&types, &heap, flat, handle);
    assert_eq!(heap.alive_count(), 0);
}

#[test]
fn dict_get_missing_key_is_catchable() {
    let (mut types, heap) = fixture();
    let value = Value::dict(Type::Int, BTreeMap::new());
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    let err = dict_get(flat, "absent").unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidAggregateAccess { .. }));

    let handle = types.lookup_itype(&Type::dict(Type::Int)).unwrap();
    release_deep(&types, &heap, flat, handle);
}

// ── Structs ─────────────────────────────────────────────────────────────

fn point_def() -> StructDef {
    StructDef::new(vec![
        Member::new("x", Type::Int),
        Member::new("label", Type::String),
    ])
}

#[test]
fn struct_round_trips_and_exposes_members_by_index() {
    let (mut types, heap) = fixture();
    let value = Value::struct_value(point_def(), vec![Value::int(5), Value::string("origin")]);
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    // One struct block plus the string member's block.
    assert_eq!(heap.alive_count(), 2);

    let handle = types
        .lookup_itype(&Type::Struct(point_def()))
        .unwrap();
    assert_eq!(unsafe { struct_member(flat, 0).unwrap().as_int() }, 5);
    assert_eq!(
        from_runtime_string(struct_member(flat, 1).unwrap()).unwrap(),
        "origin"
    );

    let back = from_runtime_value(&types, flat, handle).unwrap();
    assert_eq!(back, value);

    release_deep(&types, &heap, flat, handle);
    assert_eq!(heap.alive_count(), 0);
}

#[test]
fn struct_member_out_of_range_is_catchable() {
    let (mut types, heap) = fixture();
    let value = Value::struct_value(point_def(), vec![Value::int(1), Value::string("a")]);
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    let err = struct_member(flat, 2).unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidAggregateAccess { .. }));

    let handle = types.lookup_itype(&Type::Struct(point_def())).unwrap();
    release_deep(&types, &heap, flat, handle);
}

// ── Functions ───────────────────────────────────────────────────────────

#[test]
fn function_reference_round_trips_by_link_name() {
    let (mut types, heap) = fixture();
    let fn_type = Type::function(Type::Int, vec![Type::Int], Purity::Pure);
    let value = Value::function(fn_type.clone(), "lyra_abs");
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();

    let handle = types.lookup_itype(&fn_type).unwrap();
    let back = from_runtime_value(&types, flat, handle).unwrap();
    assert_eq!(back, value);

    release_deep(&types, &heap, flat, handle);
    assert_eq!(heap.alive_count(), 0);
}

// ── Lifecycle ───────────────────────────────────────────────────────────

#[test]
fn retain_adds_an_owner() {
    let (types, heap) = fixture();
    let flat = to_runtime_string(&heap, "shared");
    retain_value(flat, TypeHandle::STRING);

    release_deep(&types, &heap, flat, TypeHandle::STRING);
    assert_eq!(heap.alive_count(), 1, "one owner left, block must survive");

    release_deep(&types, &heap, flat, TypeHandle::STRING);
    assert_eq!(heap.alive_count(), 0);
}

#[test]
fn retain_increments_the_visible_count() {
    let (types, heap) = fixture();
    let flat = to_runtime_string(&heap, "counted");
    let header = unsafe { &*flat.live_header().unwrap() };
    assert_eq!(header.rc_count(), 1);

    retain_value(flat, TypeHandle::STRING);
    assert_eq!(header.rc_count(), 2);

    release_deep(&types, &heap, flat, TypeHandle::STRING);
    assert_eq!(header.rc_count(), 1);
    release_deep(&types, &heap, flat, TypeHandle::STRING);
}

#[test]
fn retain_and_release_ignore_scalars() {
    let (types, heap) = fixture();
    let flat = RuntimeValue::from_int(7);
    retain_value(flat, TypeHandle::INT);
    release_deep(&types, &heap, flat, TypeHandle::INT);
    assert_eq!(heap.allocation_count(), 0);
}

#[test]
fn releasing_a_nested_aggregate_frees_every_block() {
    let (mut types, heap) = fixture();
    // struct { name: string, tags: [string] }
    let def = StructDef::new(vec![
        Member::new("name", Type::String),
        Member::new("tags", Type::vector(Type::String)),
    ]);
    let value = Value::struct_value(
        def.clone(),
        vec![
            Value::string("widget"),
            Value::vector(Type::String, vec![Value::string("new"), Value::string("hot")]),
        ],
    );
    let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
    // struct + name + vector + 2 tag strings
    assert_eq!(heap.alive_count(), 5);

    let handle = types.lookup_itype(&Type::Struct(def)).unwrap();
    release_deep(&types, &heap, flat, handle);
    assert_eq!(heap.alive_count(), 0);
    assert_eq!(heap.free_count(), 5);
}

#[test]
fn shared_child_survives_releasing_one_parent() {
    let (mut types, heap) = fixture();
    let child = to_runtime_string(&heap, "shared child");
    retain_value(child, TypeHandle::STRING);

    // Two vectors, each an owner of the same string.
    let elem_handle = types.intern_type(&Type::String).unwrap();
    let vec_handle = types.intern_type(&Type::vector(Type::String)).unwrap();
    let a = RuntimeValue::from_block(heap.alloc_vector(
        elem_handle,
        ElementStorage::External,
        vec![child],
    ));
    let b = RuntimeValue::from_block(heap.alloc_vector(
        elem_handle,
        ElementStorage::External,
        vec![child],
    ));
    assert_eq!(heap.alive_count(), 3);

    release_deep(&types, &heap, a, vec_handle);
    assert_eq!(heap.alive_count(), 2, "child still owned by b");

    release_deep(&types, &heap, b, vec_handle);
    assert_eq!(heap.alive_count(), 0);
}

// ── Type safety ─────────────────────────────────────────────────────────

#[test]
fn aggregate_access_with_the_wrong_kind_is_a_mismatch() {
    let (types, heap) = fixture();
    let flat = to_runtime_string(&heap, "not a vector");
    let err = vector_size(flat).unwrap_err();
    assert!(matches!(err, RuntimeError::TypeMismatch { .. }));

    let err = dict_get(flat, "k").unwrap_err();
    assert!(matches!(err, RuntimeError::TypeMismatch { .. }));

    release_deep(&types, &heap, flat, TypeHandle::STRING);
}

#[test]
fn lifting_a_scalar_as_an_aggregate_is_rejected() {
    let (types, _heap) = fixture();
    let flat = RuntimeValue::undefined();
    let err = from_runtime_value(&types, flat, TypeHandle::STRING).unwrap_err();
    assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
}

#[test]
fn lowering_an_unresolvable_type_fails() {
    let (mut types, heap) = fixture();
    let value = Value::vector(Type::Unresolved("mystery".to_string()), vec![]);
    let err = to_runtime_value(&mut types, &heap, &value).unwrap_err();
    assert!(matches!(err, RuntimeError::Type(_)));
    assert_eq!(heap.alive_count(), 0);
}

// ── Property tests ──────────────────────────────────────────────────────

mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn int_vectors_round_trip(xs in proptest::collection::vec(any::<i64>(), 0..64)) {
            let (mut types, heap) = fixture();
            let value = Value::vector(Type::Int, xs.into_iter().map(Value::int).collect());
            let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
            let handle = types.lookup_itype(&Type::vector(Type::Int)).unwrap();

            let back = from_runtime_value(&types, flat, handle).unwrap();
            prop_assert_eq!(&back, &value);

            release_deep(&types, &heap, flat, handle);
            prop_assert_eq!(heap.alive_count(), 0);
        }

        #[test]
        fn string_dicts_round_trip_and_release_cleanly(
            entries in proptest::collection::btree_map("[a-z]{1,8}", ".{0,16}", 0..16)
        ) {
            let (mut types, heap) = fixture();
            let boxed = entries
                .into_iter()
                .map(|(k, v)| (k, Value::string(v)))
                .collect();
            let value = Value::dict(Type::String, boxed);
            let flat = to_runtime_value(&mut types, &heap, &value).unwrap();
            let handle = types.lookup_itype(&Type::dict(Type::String)).unwrap();

            let back = from_runtime_value(&types, flat, handle).unwrap();
            prop_assert_eq!(&back, &value);

            release_deep(&types, &heap, flat, handle);
            prop_assert_eq!(heap.alive_count(), 0);
        }
    }
}
