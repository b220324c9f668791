//! The process heap, shared by the whole program.
//!
//! These functions drive a single [`Allocator`] backed by [`Sbrk`]. Nothing
//! else in the process may shrink the program break below memory handed out
//! here.

use std::ptr::NonNull;

use crate::{allocator::Allocator, extender::Sbrk, report::HeapReport};

static HEAP: Allocator<Sbrk> = Allocator::new(Sbrk);

/// The allocator behind the free functions of this module.
pub fn heap() -> &'static Allocator<Sbrk> {
  &HEAP
}

pub fn init() {
  HEAP.init();
}

pub fn shutdown() {
  HEAP.shutdown();
}

pub fn allocate(size: usize) -> Option<NonNull<u8>> {
  HEAP.allocate(size)
}

pub fn zero_allocate(
  count: usize,
  element_size: usize,
) -> Option<NonNull<u8>> {
  HEAP.zero_allocate(count, element_size)
}

/// See [`Allocator::resize`].
///
/// # Safety
///
/// `payload` must be `None` or a live pointer returned by this module.
pub unsafe fn resize(
  payload: Option<NonNull<u8>>,
  new_size: usize,
) -> Option<NonNull<u8>> {
  unsafe { HEAP.resize(payload, new_size) }
}

/// See [`Allocator::release`].
///
/// # Safety
///
/// `payload` must be `None` or a live pointer returned by this module, and
/// must not be released twice.
pub unsafe fn release(payload: Option<NonNull<u8>>) {
  unsafe { HEAP.release(payload) }
}

pub fn inspect() -> HeapReport {
  HEAP.inspect()
}
