//! Append-only structural type table.
//!
//! The table deduplicates structurally equal types and assigns each
//! distinct one a stable index for the lifetime of the process. Interning a
//! composite type interns its component types first, so every entry refers
//! only to earlier entries — the table is a DAG by construction order.
//!
//! There is deliberately no shared global table: each execution instance
//! owns one and passes it explicitly, so independent interpreter instances
//! can coexist on separate threads with no shared mutable state.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::base::BaseType;
use crate::core::Type;
use crate::error::TypeError;
use crate::handle::TypeHandle;

/// Registry of structurally distinct types.
///
/// The first [`TypeTable::FIRST_COMPOSITE`] slots are reserved in
/// [`BaseType`] discriminant order: the nine primitives, one placeholder
/// per composite kind (they keep index numbering aligned with the
/// discriminants), and the unresolved sentinel. Composite entries start at
/// index 14 and are appended in interning order.
pub struct TypeTable {
    /// Entry storage, indexed by `TypeHandle::lookup_index`.
    entries: Vec<Type>,
    /// Structural dedup map. Primitives map to their reserved slots.
    dedup: FxHashMap<Type, u32>,
}

#[allow(
    clippy::len_without_is_empty,
    reason = "the table always holds its reserved slots; see has_only_reserved"
)]
impl TypeTable {
    /// Index of the first non-reserved entry.
    pub const FIRST_COMPOSITE: u32 = 14;

    /// Create a table with the reserved slots seeded.
    pub fn new() -> Self {
        // Slot order must match the BaseType discriminants.
        let entries = vec![
            Type::Undefined,
            Type::Any,
            Type::Void,
            Type::Bool,
            Type::Int,
            Type::Double,
            Type::String,
            Type::Json,
            Type::Typeid,
            // Placeholders holding the struct/vector/dict/function slots.
            Type::Undefined,
            Type::Undefined,
            Type::Undefined,
            Type::Undefined,
            Type::Unresolved(String::new()),
        ];

        let mut dedup = FxHashMap::default();
        for ty in [
            Type::Undefined,
            Type::Any,
            Type::Void,
            Type::Bool,
            Type::Int,
            Type::Double,
            Type::String,
            Type::Json,
            Type::Typeid,
        ] {
            let index = ty.base_type() as u32;
            dedup.insert(ty, index);
        }

        let table = TypeTable { entries, dedup };
        debug_assert!(table.check_invariant());
        table
    }

    /// Intern a fully resolved type, returning its stable handle.
    ///
    /// A structurally equal entry returns its existing handle and adds
    /// nothing. Otherwise every component type is interned first — the
    /// element type for vector/dict, the member types for struct in
    /// declared order, the return type then every parameter for function —
    /// and the new entry is appended last.
    ///
    /// # Errors
    /// [`TypeError::UnresolvedType`] if the tree contains an
    /// unresolved-identifier placeholder. That is a defect in the caller's
    /// pipeline, not a user error.
    pub fn intern_type(&mut self, ty: &Type) -> Result<TypeHandle, TypeError> {
        if let Some(name) = ty.find_unresolved() {
            return Err(TypeError::UnresolvedType {
                name: name.to_string(),
            });
        }

        if let Some(&index) = self.dedup.get(ty) {
            return Ok(Self::handle_for_entry(index, ty));
        }

        // Dedup misses are always composites; primitives are pre-seeded.
        let handle = match ty {
            Type::Struct(def) => {
                for member in &def.members {
                    self.intern_type(&member.ty)?;
                }
                let index = self.append(ty);
                TypeHandle::make_struct(index)
            }
            Type::Vector(elem) => {
                let elem_handle = self.intern_type(elem)?;
                let index = self.append(ty);
                TypeHandle::make_vector(index, elem_handle.base_type())
            }
            Type::Dict(value) => {
                let value_handle = self.intern_type(value)?;
                let index = self.append(ty);
                TypeHandle::make_dict(index, value_handle.base_type())
            }
            Type::Function { ret, params, .. } => {
                self.intern_type(ret)?;
                for param in params {
                    self.intern_type(param)?;
                }
                let index = self.append(ty);
                TypeHandle::make_function(index)
            }
            _ => unreachable!("primitive types are pre-interned"),
        };

        debug_assert!(self.check_invariant());
        Ok(handle)
    }

    /// Pure lookup: the handle of an already interned type.
    ///
    /// # Errors
    /// [`TypeError::NotFound`] if the type was never interned;
    /// [`TypeError::UnresolvedType`] if it contains a placeholder.
    pub fn lookup_itype(&self, ty: &Type) -> Result<TypeHandle, TypeError> {
        if let Some(name) = ty.find_unresolved() {
            return Err(TypeError::UnresolvedType {
                name: name.to_string(),
            });
        }
        match self.dedup.get(ty) {
            Some(&index) => Ok(Self::handle_for_entry(index, ty)),
            None => Err(TypeError::NotFound {
                type_desc: ty.to_string(),
            }),
        }
    }

    /// The entry a handle refers to.
    ///
    /// # Panics
    /// If the handle was not produced by this table.
    pub fn lookup_type(&self, handle: TypeHandle) -> &Type {
        let index = handle.lookup_index() as usize;
        match self.entries.get(index) {
            Some(entry) => entry,
            None => panic!("type handle {handle:?} does not belong to this table"),
        }
    }

    /// Number of entries, reserved slots included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds only the reserved slots. A fresh table is
    /// never empty in the `len() == 0` sense, so there is deliberately no
    /// `is_empty`.
    pub fn has_only_reserved(&self) -> bool {
        self.entries.len() as u32 <= Self::FIRST_COMPOSITE
    }

    /// Verify the reserved slots are intact.
    pub fn check_invariant(&self) -> bool {
        self.entries.len() >= Self::FIRST_COMPOSITE as usize
            && self.entries[BaseType::Undefined as usize] == Type::Undefined
            && self.entries[BaseType::Any as usize] == Type::Any
            && self.entries[BaseType::Void as usize] == Type::Void
            && self.entries[BaseType::Bool as usize] == Type::Bool
            && self.entries[BaseType::Int as usize] == Type::Int
            && self.entries[BaseType::Double as usize] == Type::Double
            && self.entries[BaseType::String as usize] == Type::String
            && self.entries[BaseType::Json as usize] == Type::Json
            && self.entries[BaseType::Typeid as usize] == Type::Typeid
            && self.entries[BaseType::Struct as usize] == Type::Undefined
            && self.entries[BaseType::Vector as usize] == Type::Undefined
            && self.entries[BaseType::Dict as usize] == Type::Undefined
            && self.entries[BaseType::Function as usize] == Type::Undefined
            && self.entries[BaseType::Unresolved as usize] == Type::Unresolved(String::new())
    }

    /// Log every entry at debug level.
    pub fn dump(&self) {
        for (index, entry) in self.entries.iter().enumerate() {
            debug!(index, %entry, "type table entry");
        }
    }

    fn append(&mut self, ty: &Type) -> u32 {
        let index = match u32::try_from(self.entries.len()) {
            Ok(index) => index,
            Err(_) => panic!("type table exceeded u32::MAX entries"),
        };
        self.entries.push(ty.clone());
        self.dedup.insert(ty.clone(), index);
        trace!(index, entry = %ty, "interned type");
        index
    }

    /// Derive the handle for an entry. The element base type for
    /// vector/dict handles comes straight off the structural type, which is
    /// what makes the cached discriminator trustworthy.
    fn handle_for_entry(index: u32, ty: &Type) -> TypeHandle {
        match ty {
            Type::Struct(_) => TypeHandle::make_struct(index),
            Type::Vector(elem) => TypeHandle::make_vector(index, elem.base_type()),
            Type::Dict(value) => TypeHandle::make_dict(index, value.base_type()),
            Type::Function { .. } => TypeHandle::make_function(index),
            primitive => TypeHandle::primitive(primitive.base_type()),
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
