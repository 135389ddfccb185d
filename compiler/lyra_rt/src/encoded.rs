//! The 8-byte untagged runtime value.
//!
//! A `RuntimeValue` is a plain 64-bit cell with no type tag: scalars are
//! stored inline and aggregates as a raw block pointer. All meaning comes
//! from the [`TypeHandle`](lyra_types::TypeHandle) the caller pairs with
//! it, which is why every reader is `unsafe` and states what it assumes.
//!
//! Copying a `RuntimeValue` never touches reference counts. Ownership
//! moves are expressed through [`retain_value`](crate::retain_value) and
//! [`release_deep`](crate::release_deep).

use std::fmt;

use lyra_types::TypeHandle;

use crate::error::RuntimeError;
use crate::heap::{AllocHeader, HeapBlock};

/// One runtime value: a scalar inline or an aggregate by pointer.
#[repr(C)]
pub union RuntimeValue {
    bits: u64,
    bool_value: bool,
    int_value: i64,
    double_value: f64,
    typeid_value: TypeHandle,
    block: *mut AllocHeader,
}

// Plain 64-bit copy; refcounts are managed out of band.
impl Copy for RuntimeValue {}

impl Clone for RuntimeValue {
    fn clone(&self) -> Self {
        *self
    }
}

impl RuntimeValue {
    /// An all-zero cell, used for undefined and void slots.
    #[inline]
    pub fn undefined() -> Self {
        RuntimeValue { bits: 0 }
    }

    #[inline]
    pub fn from_bool(value: bool) -> Self {
        let mut out = Self::undefined();
        out.bool_value = value;
        out
    }

    #[inline]
    pub fn from_int(value: i64) -> Self {
        RuntimeValue { int_value: value }
    }

    #[inline]
    pub fn from_double(value: f64) -> Self {
        RuntimeValue {
            double_value: value,
        }
    }

    #[inline]
    pub fn from_typeid(value: TypeHandle) -> Self {
        // TypeHandle has trailing padding; zero the cell first so the
        // whole 64 bits stay initialized for raw reads.
        let mut out = Self::undefined();
        out.typeid_value = value;
        out
    }

    /// Wrap a freshly allocated block. The cell takes over the block's
    /// initial reference.
    #[inline]
    pub(crate) fn from_block<T: HeapBlock>(ptr: *mut T) -> Self {
        RuntimeValue {
            block: ptr.cast::<AllocHeader>(),
        }
    }

    /// Read the cell as a bool.
    ///
    /// # Safety
    /// The value must have been constructed with [`RuntimeValue::from_bool`].
    #[inline]
    pub unsafe fn as_bool(self) -> bool {
        self.bool_value
    }

    /// Read the cell as an int.
    ///
    /// # Safety
    /// The value must have been constructed with [`RuntimeValue::from_int`].
    #[inline]
    pub unsafe fn as_int(self) -> i64 {
        self.int_value
    }

    /// Read the cell as a double.
    ///
    /// # Safety
    /// The value must have been constructed with [`RuntimeValue::from_double`].
    #[inline]
    pub unsafe fn as_double(self) -> f64 {
        self.double_value
    }

    /// Read the cell as a type handle.
    ///
    /// # Safety
    /// The value must have been constructed with [`RuntimeValue::from_typeid`].
    #[inline]
    pub unsafe fn as_typeid(self) -> TypeHandle {
        self.typeid_value
    }

    /// Cast the cell to a live block of kind `T`, verifying the header.
    ///
    /// Rejects null pointers, blocks whose magic word is gone, and blocks
    /// of a different physical kind. This is the runtime's only defense
    /// against a handle paired with the wrong value, so every aggregate
    /// path goes through it.
    ///
    /// # Safety
    /// The value must either hold a pointer obtained from
    /// [`Heap`](crate::Heap) allocation or be all-zero. It must not point
    /// at freed memory that has since been reused.
    pub(crate) unsafe fn block<T: HeapBlock>(self) -> Result<*mut T, RuntimeError> {
        let ptr = self.block;
        if ptr.is_null() {
            return Err(RuntimeError::mismatch(T::KIND.name(), "null value"));
        }
        let header = &*ptr;
        if !header.is_alive() {
            return Err(RuntimeError::mismatch(T::KIND.name(), "dead block"));
        }
        if header.kind() != T::KIND {
            return Err(RuntimeError::mismatch(T::KIND.name(), header.kind().name()));
        }
        Ok(ptr.cast::<T>())
    }

    /// The header of the block this cell points at, if it points at a
    /// live one.
    ///
    /// # Safety
    /// Same contract as [`RuntimeValue::block`].
    pub(crate) unsafe fn live_header(self) -> Option<*const AllocHeader> {
        let ptr = self.block;
        if ptr.is_null() {
            return None;
        }
        if (*ptr).is_alive() {
            Some(ptr.cast_const())
        } else {
            None
        }
    }
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // No tag to dispatch on; show the raw bits.
        write!(f, "RuntimeValue({:#018x})", unsafe { self.bits })
    }
}
