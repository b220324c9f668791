//! # brkalloc - A Thread-Safe Break-Pointer Allocator
//!
//! This crate provides `malloc`/`calloc`/`realloc`/`free`-style operations on
//! top of a heap that grows and shrinks by moving a single break pointer,
//! the way `sbrk(2)` does.
//!
//! ## Overview
//!
//! Every allocation is a block: a header followed by the caller's payload.
//! Headers form a singly-linked list in the order the heap grew:
//!
//! ```text
//!   Block List:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌────┬──────┬────┬──────┬────┬──────┬────┬──────┐                  │
//!   │   │ H1 │  P1  │ H2 │  P2  │ H3 │  P3  │ H4 │  P4  │                  │
//!   │   └────┴──────┴────┴──────┴────┴──────┴────┴──────┘                  │
//!   │     │          ▲ │          ▲ │          ▲        ▲                  │
//!   │     └──next────┘ └──next────┘ └──next────┘        │                  │
//!   │    head                                  tail   Program              │
//!   │                                                  Break               │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   allocate: first free block that is large enough, else grow the heap.
//!   release:  tail at the break is given back, anything else is marked free.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   brkalloc
//!   ├── align      - Alignment macro (align!) and checked rounding
//!   ├── block      - Block header layout (internal)
//!   ├── extender   - HeapExtender trait, Sbrk and Arena backends
//!   ├── allocator  - Allocator: allocate / zero_allocate / resize / release
//!   ├── report     - HeapReport returned by inspect()
//!   └── global     - The process heap (feature "sbrk")
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brkalloc::{Allocator, Arena};
//!
//! fn main() {
//!     let allocator = Allocator::new(Arena::with_capacity(64 * 1024));
//!
//!     let ptr = allocator.allocate(8).unwrap().cast::<u64>();
//!
//!     unsafe {
//!         ptr.write(42);
//!         println!("Value: {}", ptr.read());
//!
//!         allocator.release(Some(ptr.cast()));
//!     }
//!
//!     println!("{}", allocator.inspect());
//! }
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   Single Allocation:
//!   ┌───────────────────────┬────────────────────────────────┬─────────┐
//!   │    Block Header       │         User Data              │ padding │
//!   │  ┌─────────────────┐  │                                │         │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │         │
//!   │  │ is_free: false  │  │  │     N bytes usable       │  │         │
//!   │  │ next: null/ptr  │  │  └──────────────────────────┘  │         │
//!   │  └─────────────────┘  │                                │         │
//!   │  multiple of 16 bytes │                                │ to 16   │
//!   └───────────────────────┴────────────────────────────────┴─────────┘
//!                           ▲
//!                           └── Pointer returned to user (16-byte aligned)
//! ```
//!
//! ## Limitations
//!
//! - **No splitting**: a reused block keeps its full size, whatever was asked.
//! - **No coalescing**: adjacent free blocks stay separate.
//! - **Tail-only trimming**: only the block at the break is given back, and
//!   blocks freed earlier are not given back when they become the tail.
//! - **One lock**: every operation is serialized.
//!
//! ## Safety
//!
//! `release` and `resize` trust their pointer argument: it must come from the
//! same allocator and still be live. Double release is undefined behavior.

pub mod align;
mod allocator;
mod block;
pub mod extender;
#[cfg(feature = "sbrk")]
pub mod global;
mod report;

pub use allocator::Allocator;
pub use block::HEADER_SIZE;
#[cfg(feature = "sbrk")]
pub use extender::Sbrk;
pub use extender::{Arena, GrowthFailed, HeapExtender};
pub use report::{BlockInfo, HeapReport};
