//! Refcounted heap blocks.
//!
//! Every aggregate value lives in exactly one heap block. A block starts
//! with an [`AllocHeader`] carrying a magic word, a kind tag, and the
//! reference count; the payload follows. The kind tag is what makes casts
//! from an untagged handle back to a concrete block checkable.
//!
//! Blocks are allocated as ordinary boxed structs and handed out as raw
//! pointers. The payload containers hold plain `RuntimeValue` copies, so
//! dropping a block never recursively frees children — deep release is the
//! job of [`release_deep`](crate::release_deep), which walks children
//! explicitly before freeing.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use lyra_types::{ElementStorage, TypeHandle};

use crate::encoded::RuntimeValue;

/// Magic word of a live block.
pub(crate) const MAGIC_ALIVE: u32 = 0xDABB_AD00;
/// Magic word written just before a block is freed.
pub(crate) const MAGIC_DEAD: u32 = 0xDEAD_BEEF;

/// Physical kind of a heap block.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum BlockKind {
    /// UTF-8 string buffer.
    String,
    /// Opaque json document.
    Json,
    /// Vector backing storage.
    Vector,
    /// Dict backing storage.
    Dict,
    /// Struct member block.
    Struct,
    /// Function reference.
    Function,
}

impl BlockKind {
    /// Lowercase name for error messages.
    pub const fn name(self) -> &'static str {
        match self {
            BlockKind::String => "string block",
            BlockKind::Json => "json block",
            BlockKind::Vector => "vector block",
            BlockKind::Dict => "dict block",
            BlockKind::Struct => "struct block",
            BlockKind::Function => "function block",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Header at the start of every heap block.
#[derive(Debug)]
#[repr(C)]
pub struct AllocHeader {
    magic: Cell<u32>,
    kind: BlockKind,
    rc: Cell<i64>,
}

impl AllocHeader {
    fn new(kind: BlockKind) -> Self {
        AllocHeader {
            magic: Cell::new(MAGIC_ALIVE),
            kind,
            rc: Cell::new(1),
        }
    }

    /// The physical kind of the block this header fronts.
    #[inline]
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Current reference count.
    #[inline]
    pub fn rc_count(&self) -> i64 {
        self.rc.get()
    }

    /// Whether the magic word still marks this block live.
    #[inline]
    pub(crate) fn is_alive(&self) -> bool {
        self.magic.get() == MAGIC_ALIVE
    }

    #[inline]
    pub(crate) fn rc_inc(&self) {
        self.rc.set(self.rc.get() + 1);
    }

    /// Decrement and return the new count.
    #[inline]
    pub(crate) fn rc_dec(&self) -> i64 {
        let next = self.rc.get() - 1;
        self.rc.set(next);
        next
    }

    #[inline]
    fn poison(&self) {
        self.magic.set(MAGIC_DEAD);
    }
}

/// A heap block: header first, payload after.
///
/// The header-first layout is what allows an untagged handle to be
/// inspected before its payload type is trusted.
pub trait HeapBlock {
    /// The kind tag this block type is stamped with.
    const KIND: BlockKind;

    /// The block's header.
    fn header(&self) -> &AllocHeader;
}

/// String buffer block.
#[repr(C)]
pub struct StringBlock {
    pub(crate) header: AllocHeader,
    /// The string payload.
    pub data: String,
}

/// Json document block.
#[repr(C)]
pub struct JsonBlock {
    pub(crate) header: AllocHeader,
    /// The document payload.
    pub doc: serde_json::Value,
}

/// Vector backing storage.
///
/// The element type handle and storage policy are recorded at allocation
/// so releasing does not need a table lookup on the hot path.
#[repr(C)]
pub struct VectorBlock {
    pub(crate) header: AllocHeader,
    /// Full handle of the element type.
    pub element_type: TypeHandle,
    /// How `elements` is to be interpreted: raw scalars or owning handles.
    pub storage: ElementStorage,
    /// Elements in index order.
    pub elements: Vec<RuntimeValue>,
}

/// Dict backing storage. Keys are owned by the map itself; only the
/// values can be refcounted handles.
#[repr(C)]
pub struct DictBlock {
    pub(crate) header: AllocHeader,
    /// Full handle of the value type.
    pub value_type: TypeHandle,
    /// How entry values are stored.
    pub storage: ElementStorage,
    /// Entries ordered by key.
    pub entries: BTreeMap<String, RuntimeValue>,
}

/// Struct member block: one slot per member, declaration order.
#[repr(C)]
pub struct StructBlock {
    pub(crate) header: AllocHeader,
    /// Handle of the struct type (resolves to the member definitions).
    pub struct_type: TypeHandle,
    /// Member values in declaration order.
    pub members: Vec<RuntimeValue>,
}

/// Function reference block.
#[repr(C)]
pub struct FunctionBlock {
    pub(crate) header: AllocHeader,
    /// Link-time name the engines resolve to an implementation.
    pub link_name: String,
}

macro_rules! impl_heap_block {
    ($block:ty, $kind:expr) => {
        impl HeapBlock for $block {
            const KIND: BlockKind = $kind;

            fn header(&self) -> &AllocHeader {
                &self.header
            }
        }
    };
}

impl_heap_block!(StringBlock, BlockKind::String);
impl_heap_block!(JsonBlock, BlockKind::Json);
impl_heap_block!(VectorBlock, BlockKind::Vector);
impl_heap_block!(DictBlock, BlockKind::Dict);
impl_heap_block!(StructBlock, BlockKind::Struct);
impl_heap_block!(FunctionBlock, BlockKind::Function);

/// Block allocator with bookkeeping.
///
/// One `Heap` is owned by one execution instance and passed explicitly,
/// like the type table. The counters exist so ownership bugs show up as
/// counter drift in tests rather than as silent leaks.
pub struct Heap {
    alive: Cell<usize>,
    allocated: Cell<u64>,
    freed: Cell<u64>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Heap {
            alive: Cell::new(0),
            allocated: Cell::new(0),
            freed: Cell::new(0),
        }
    }

    /// Number of currently live blocks.
    pub fn alive_count(&self) -> usize {
        self.alive.get()
    }

    /// Total blocks ever allocated.
    pub fn allocation_count(&self) -> u64 {
        self.allocated.get()
    }

    /// Total blocks ever freed.
    pub fn free_count(&self) -> u64 {
        self.freed.get()
    }

    /// Allocate a string block with refcount 1.
    pub fn alloc_string(&self, data: impl Into<String>) -> *mut StringBlock {
        self.alloc(StringBlock {
            header: AllocHeader::new(BlockKind::String),
            data: data.into(),
        })
    }

    /// Allocate a json block with refcount 1.
    pub fn alloc_json(&self, doc: serde_json::Value) -> *mut JsonBlock {
        self.alloc(JsonBlock {
            header: AllocHeader::new(BlockKind::Json),
            doc,
        })
    }

    /// Allocate a vector block with refcount 1.
    pub fn alloc_vector(
        &self,
        element_type: TypeHandle,
        storage: ElementStorage,
        elements: Vec<RuntimeValue>,
    ) -> *mut VectorBlock {
        self.alloc(VectorBlock {
            header: AllocHeader::new(BlockKind::Vector),
            element_type,
            storage,
            elements,
        })
    }

    /// Allocate a dict block with refcount 1.
    pub fn alloc_dict(
        &self,
        value_type: TypeHandle,
        storage: ElementStorage,
        entries: BTreeMap<String, RuntimeValue>,
    ) -> *mut DictBlock {
        self.alloc(DictBlock {
            header: AllocHeader::new(BlockKind::Dict),
            value_type,
            storage,
            entries,
        })
    }

    /// Allocate a struct block with refcount 1.
    pub fn alloc_struct(
        &self,
        struct_type: TypeHandle,
        members: Vec<RuntimeValue>,
    ) -> *mut StructBlock {
        self.alloc(StructBlock {
            header: AllocHeader::new(BlockKind::Struct),
            struct_type,
            members,
        })
    }

    /// Allocate a function block with refcount 1.
    pub fn alloc_function(&self, link_name: impl Into<String>) -> *mut FunctionBlock {
        self.alloc(FunctionBlock {
            header: AllocHeader::new(BlockKind::Function),
            link_name: link_name.into(),
        })
    }

    fn alloc<T: HeapBlock>(&self, block: T) -> *mut T {
        self.alive.set(self.alive.get() + 1);
        self.allocated.set(self.allocated.get() + 1);
        trace!(kind = %T::KIND, alive = self.alive.get(), "alloc block");
        Box::into_raw(Box::new(block))
    }

    /// Free a block unconditionally, dropping its payload.
    ///
    /// Children are NOT released; the caller must have done that already.
    ///
    /// # Safety
    /// `ptr` must have come from [`Heap::alloc`] on this heap, be live,
    /// and never be used again afterwards.
    pub(crate) unsafe fn free_block<T: HeapBlock>(&self, ptr: *mut T) {
        let block = &*ptr;
        debug_assert!(block.header().is_alive(), "double free of {}", T::KIND);
        block.header().poison();
        trace!(kind = %T::KIND, alive = self.alive.get() - 1, "free block");
        drop(Box::from_raw(ptr));
        self.alive.set(self.alive.get() - 1);
        self.freed.set(self.freed.get() + 1);
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
