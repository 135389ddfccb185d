//! Type system core for Lyra.
//!
//! This crate provides two type representations:
//! - [`Type`]: the boxed structural tree handed over by semantic analysis
//! - [`TypeHandle`]: the compact interned handle used at runtime and by
//!   the code generators
//!
//! Use [`TypeTable`] to intern types and get `TypeHandle`s. Interning is
//! structural: two structurally equal types always receive the same handle,
//! and handle equality is O(1). There is no process-global table — every
//! interpreter or codegen instance owns its `TypeTable` and passes it
//! explicitly.

mod base;
mod core;
mod error;
mod handle;
mod policy;
mod table;

pub use base::BaseType;
pub use core::{Member, Purity, StructDef, Type};
pub use error::TypeError;
pub use handle::TypeHandle;
pub use policy::{dict_value_storage, vector_element_storage, ElementStorage};
pub use table::TypeTable;

// Size assertions to prevent accidental regressions. TypeHandle is threaded
// through every generated instruction, so its size is load-bearing.
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{BaseType, TypeHandle};
    const _: () = assert!(std::mem::size_of::<TypeHandle>() == 8);
    const _: () = assert!(std::mem::size_of::<BaseType>() == 1);
}
