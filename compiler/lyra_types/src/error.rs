//! Type table errors.
//!
//! Both variants indicate a defect earlier in the pipeline (semantic
//! analysis handed something over unfinished, or a handle was fabricated
//! without interning), not a user error. Callers treat them as fatal.

/// Error from [`TypeTable`](crate::TypeTable) operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// Interning reached an unresolved-identifier placeholder.
    #[error("cannot intern unresolved type `{name}`")]
    UnresolvedType {
        /// The placeholder identifier.
        name: String,
    },

    /// Pure lookup of a type that was never interned.
    #[error("type `{type_desc}` has not been interned")]
    NotFound {
        /// Compact rendering of the missing type.
        type_desc: String,
    },
}
