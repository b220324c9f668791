//! Where the allocator gets its address space from.
//!
//! A [`HeapExtender`] moves a break pointer: the first address past the heap.
//! Growing hands out the bytes between the old and the new break, shrinking
//! gives the top of the heap back.

use std::{
  alloc::{self, Layout},
  error::Error,
  fmt,
  ptr::NonNull,
};

#[cfg(feature = "sbrk")]
use libc::{c_void, intptr_t, sbrk};

use crate::align::HEAP_ALIGN;

/// The break pointer could not be moved by the requested amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthFailed {
  pub requested: isize,
}

impl fmt::Display for GrowthFailed {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "moving the program break by {} bytes failed", self.requested)
  }
}

impl Error for GrowthFailed {}

/// Backend moving a contiguous break pointer.
///
/// # Safety
///
/// A successful positive `extend(delta)` must return the start of `delta`
/// fresh, writable bytes nobody else uses, and that region must stay valid
/// until the break is moved back below it.
pub unsafe trait HeapExtender {
  /// Moves the break by `delta` bytes and returns the previous break.
  ///
  /// A zero delta only reports the current break.
  ///
  /// # Safety
  ///
  /// A negative delta must only give back memory nothing refers to anymore.
  unsafe fn extend(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, GrowthFailed>;

  /// Current break address.
  fn query_break(&mut self) -> usize;
}

/// The process heap, driven through `sbrk(2)`.
///
/// There is only one program break per process; two allocators backed by
/// `Sbrk` must not coexist. Use [`crate::global`] instead of building one.
#[cfg(feature = "sbrk")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

#[cfg(feature = "sbrk")]
unsafe impl HeapExtender for Sbrk {
  unsafe fn extend(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, GrowthFailed> {
    let previous = unsafe { sbrk(delta as intptr_t) };

    if previous == usize::MAX as *mut c_void {
      return Err(GrowthFailed { requested: delta });
    }

    NonNull::new(previous.cast::<u8>()).ok_or(GrowthFailed { requested: delta })
  }

  fn query_break(&mut self) -> usize {
    unsafe { sbrk(0) as usize }
  }
}

/// A private, fixed-size region with its own break pointer.
///
/// Every arena is independent, so any number of allocators can run side by
/// side. The region is released when the arena is dropped.
#[derive(Debug)]
pub struct Arena {
  base: NonNull<u8>,
  capacity: usize,
  brk: usize,
}

// The arena owns its region exclusively.
unsafe impl Send for Arena {}

impl Arena {
  /// Reserves `capacity` bytes of 16-byte aligned memory.
  ///
  /// # Panics
  ///
  /// Panics if `capacity` exceeds `isize::MAX` once rounded, and aborts
  /// through [`alloc::handle_alloc_error`] when the system is out of memory.
  pub fn with_capacity(capacity: usize) -> Self {
    let layout = Self::layout(capacity);
    let base = unsafe { alloc::alloc(layout) };

    match NonNull::new(base) {
      Some(base) => Self { base, capacity, brk: 0 },
      None => alloc::handle_alloc_error(layout),
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes between the start of the arena and its break.
  pub fn used(&self) -> usize {
    self.brk
  }

  fn layout(capacity: usize) -> Layout {
    Layout::from_size_align(capacity.max(HEAP_ALIGN), HEAP_ALIGN).expect("arena capacity overflows isize")
  }
}

unsafe impl HeapExtender for Arena {
  unsafe fn extend(
    &mut self,
    delta: isize,
  ) -> Result<NonNull<u8>, GrowthFailed> {
    let previous = unsafe { self.base.add(self.brk) };

    if delta >= 0 {
      if delta as usize > self.capacity - self.brk {
        return Err(GrowthFailed { requested: delta });
      }
      self.brk += delta as usize;
    } else {
      let shrink = delta.unsigned_abs();
      if shrink > self.brk {
        return Err(GrowthFailed { requested: delta });
      }
      self.brk -= shrink;
    }

    Ok(previous)
  }

  fn query_break(&mut self) -> usize {
    self.base.as_ptr() as usize + self.brk
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), Self::layout(self.capacity)) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_arena_grow_and_shrink() {
    let mut arena = Arena::with_capacity(256);
    let start = arena.query_break();

    assert_eq!(start % HEAP_ALIGN, 0);

    unsafe {
      let first = arena.extend(64).unwrap();
      assert_eq!(first.as_ptr() as usize, start);
      assert_eq!(arena.query_break(), start + 64);

      let second = arena.extend(32).unwrap();
      assert_eq!(second.as_ptr() as usize, start + 64);
      assert_eq!(arena.used(), 96);

      let previous = arena.extend(-32).unwrap();
      assert_eq!(previous.as_ptr() as usize, start + 96);
      assert_eq!(arena.query_break(), start + 64);

      let query = arena.extend(0).unwrap();
      assert_eq!(query.as_ptr() as usize, start + 64);
    }
  }

  #[test]
  fn test_arena_exhaustion() {
    let mut arena = Arena::with_capacity(128);

    unsafe {
      arena.extend(100).unwrap();
      assert_eq!(arena.extend(29), Err(GrowthFailed { requested: 29 }));
      assert!(arena.extend(28).is_ok());
      assert_eq!(arena.used(), 128);
      assert_eq!(arena.extend(-129), Err(GrowthFailed { requested: -129 }));
    }

    assert_eq!(arena.capacity(), 128);
  }

  #[test]
  fn test_growth_failed_message() {
    let err = GrowthFailed { requested: 48 };
    assert_eq!(err.to_string(), "moving the program break by 48 bytes failed");
  }

  #[cfg(feature = "sbrk")]
  #[test]
  fn test_sbrk_query() {
    let mut heap = Sbrk;
    assert_ne!(heap.query_break(), 0);
  }
}
