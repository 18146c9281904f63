//! Heap Allocator - Global Allocator over a static arena
//!
//! Provides `#[global_allocator]` support using `linked_list_allocator` for
//! heap management. The boot image has no memory map to grow into, so the
//! heap is one fixed region handed over at start-up.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    GlobalAlloc trait                     │
//! │                   (alloc/dealloc/etc)                    │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    HeapAllocator                         │
//! │              (linked_list_allocator::Heap)               │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          static arena  /  caller-provided buffer         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! // In the boot image:
//! #[global_allocator]
//! static ALLOCATOR: irisboot_hwinit::heap::HeapAllocator =
//!     irisboot_hwinit::heap::HeapAllocator::new();
//!
//! // First thing after entry:
//! irisboot_hwinit::heap::init_static_heap().ok();
//!
//! // Disk sessions are boxed from here on.
//! ```

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

/// Size of the built-in arena (disk sessions, EEPROM word buffers).
pub const STATIC_HEAP_SIZE: usize = 64 * 1024;

/// Smallest buffer `init_heap_with_buffer` accepts.
pub const MIN_HEAP_SIZE: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════
// HEAP STATE
// ═══════════════════════════════════════════════════════════════════════════

/// Heap metadata
struct HeapState {
    /// The actual heap allocator
    heap: linked_list_allocator::Heap,
    /// Base address of heap region
    base: usize,
    /// Size of heap region
    size: usize,
}

/// Global heap state
static HEAP: Mutex<Option<HeapState>> = Mutex::new(None);

/// Heap initialized flag (for fast path check)
static HEAP_INITIALIZED: AtomicBool = AtomicBool::new(false);

#[repr(align(16))]
struct Arena([u8; STATIC_HEAP_SIZE]);

static mut ARENA: Arena = Arena([0; STATIC_HEAP_SIZE]);

// ═══════════════════════════════════════════════════════════════════════════
// HEAP ALLOCATOR
// ═══════════════════════════════════════════════════════════════════════════

/// Global heap allocator.
///
/// This is the type you use with `#[global_allocator]`.
pub struct HeapAllocator;

impl HeapAllocator {
    /// Create new (uninitialized) heap allocator.
    pub const fn new() -> Self {
        Self
    }
}

unsafe impl GlobalAlloc for HeapAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // Fast path: heap not initialized
        if !HEAP_INITIALIZED.load(Ordering::Acquire) {
            return ptr::null_mut();
        }

        let mut guard = HEAP.lock();
        match guard.as_mut() {
            Some(state) => state
                .heap
                .allocate_first_fit(layout)
                .map(|p| p.as_ptr())
                .unwrap_or(ptr::null_mut()),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if ptr.is_null() || !HEAP_INITIALIZED.load(Ordering::Acquire) {
            return;
        }

        let mut guard = HEAP.lock();
        if let Some(state) = guard.as_mut() {
            if let Some(nn) = NonNull::new(ptr) {
                state.heap.deallocate(nn, layout);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// INITIALIZATION
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize heap with a caller-provided buffer.
///
/// # Safety
/// - Buffer must be valid for `size` bytes and not used for anything else
/// - Buffer must outlive every allocation made from it
pub unsafe fn init_heap_with_buffer(buffer: *mut u8, size: usize) -> Result<(), &'static str> {
    if buffer.is_null() || size < MIN_HEAP_SIZE {
        return Err("invalid buffer");
    }

    let mut guard = HEAP.lock();
    if guard.is_some() {
        return Err("heap already initialized");
    }

    let mut heap = linked_list_allocator::Heap::empty();
    heap.init(buffer, size);

    *guard = Some(HeapState {
        heap,
        base: buffer as usize,
        size,
    });

    HEAP_INITIALIZED.store(true, Ordering::Release);
    Ok(())
}

/// Initialize heap over the built-in static arena.
pub fn init_static_heap() -> Result<(), &'static str> {
    // SAFETY: ARENA is only ever handed to the allocator, and the
    // already-initialized check below makes that happen at most once.
    unsafe {
        let base = ptr::addr_of_mut!(ARENA) as *mut u8;
        init_heap_with_buffer(base, STATIC_HEAP_SIZE)
    }
}

/// Check if heap is initialized.
pub fn is_heap_initialized() -> bool {
    HEAP_INITIALIZED.load(Ordering::Acquire)
}

/// Get heap statistics: (size, used, free).
pub fn heap_stats() -> Option<(usize, usize, usize)> {
    let guard = HEAP.lock();
    guard
        .as_ref()
        .map(|state| (state.size, state.heap.used(), state.heap.free()))
}
